//! Inference side of adcast.
//!
//! Turns a loosely-typed ad description into a feature vector aligned with the
//! training-time [`FeatureSchema`], then runs it through one linear model per
//! target metric. Artifacts written by `adcast-training` are read back through
//! [`ArtifactStore`] into an immutable [`ModelBundle`].

pub mod align;
pub mod artifacts;
pub mod encoding;
pub mod error;
pub mod linear;
pub mod predictor;
pub mod schema;
pub mod value;

pub use align::{align, FeatureVector};
pub use artifacts::ArtifactStore;
pub use encoding::{expand_record, indicator_column};
pub use error::{AlignError, ArtifactError, ModelError};
pub use linear::LinearModel;
pub use predictor::{predict, ModelBundle, Prediction};
pub use schema::{FeatureSchema, SchemaDocument};
pub use value::{Record, Value};
