use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a train/test partition, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded RNG and carve off the test rows.
///
/// The test size is `ceil(n * test_fraction)`, capped so at least one row is
/// left for training. The same `(n, test_fraction, seed)` always yields the
/// same partition.
#[must_use]
pub fn train_test_indices(n: usize, test_fraction: f64, seed: u64) -> Split {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let wanted = (n as f64 * test_fraction).ceil().max(0.0) as usize;
    let test_len = wanted.min(n.saturating_sub(1));

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test = indices[..test_len].to_vec();
    let mut train = indices[test_len..].to_vec();
    test.sort_unstable();
    train.sort_unstable();

    Split { train, test }
}
