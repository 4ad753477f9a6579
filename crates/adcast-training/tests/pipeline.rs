//! End-to-end tests for `run_training`.
//!
//! Each test writes a synthetic campaigns/ads/events dataset to a temporary
//! directory. Outcome counts are exact linear functions of the ad attributes,
//! so a correct pipeline recovers them and predictions can be checked against
//! the generating formula.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use adcast_core::PipelineConfig;
use adcast_model::{align, ArtifactStore, Record, Value};
use adcast_training::{run_training, train_test_indices, TrainingError};

const PLATFORMS: [&str; 3] = ["Facebook", "Instagram", "YouTube"];
const AD_TYPES: [&str; 2] = ["Image", "Video"];
const GENDERS: [&str; 2] = ["Female", "Male"];
const AGE_GROUPS: [&str; 3] = ["18-24", "25-34", "35-44"];
const INTERESTS: [&str; 3] = ["Fashion", "Sports", "Tech"];

struct Ad {
    campaign: usize,
    platform: &'static str,
    ad_type: &'static str,
    gender: &'static str,
    age: &'static str,
    interests: &'static str,
}

fn campaign_duration(c: usize) -> usize {
    5 + (c * 7) % 13
}

fn campaign_budget(c: usize) -> usize {
    100 * (1 + (c * 5) % 9)
}

fn purchases(ad: &Ad) -> usize {
    1 + 2 * usize::from(ad.ad_type == "Video")
        + 3 * usize::from(ad.platform == "Instagram")
        + usize::from(ad.age == "25-34")
}

fn clicks(ad: &Ad, duration: fn(usize) -> usize) -> usize {
    10 + 2 * duration(ad.campaign)
        + 5 * usize::from(ad.platform == "YouTube")
        + 4 * usize::from(ad.gender == "Male")
}

fn shares(ad: &Ad) -> usize {
    campaign_budget(ad.campaign) / 100 + 2 * usize::from(ad.interests == "Sports")
}

fn base_ads(n: usize) -> Vec<Ad> {
    (0..n)
        .map(|i| Ad {
            campaign: 1 + (i / 5) % 12,
            platform: PLATFORMS[i % 3],
            ad_type: AD_TYPES[(i / 3) % 2],
            gender: GENDERS[(i / 5) % 2],
            age: AGE_GROUPS[(i / 4) % 3],
            interests: INTERESTS[(i / 6) % 3],
        })
        .collect()
}

fn write_dataset(dir: &Path, ads: &[Ad]) {
    write_dataset_with(dir, ads, campaign_duration);
}

fn write_dataset_with(dir: &Path, ads: &[Ad], duration: fn(usize) -> usize) {
    let mut campaigns =
        String::from("campaign_id,name,start_date,end_date,duration_days,total_budget\n");
    for c in 1..=12 {
        writeln!(
            campaigns,
            "{c},Campaign {c},2024-01-{c:02},2024-02-{c:02},{},{}",
            duration(c),
            campaign_budget(c)
        )
        .unwrap();
    }

    let mut ads_csv = String::from(
        "ad_id,campaign_id,ad_platform,ad_type,target_gender,target_age_group,target_interests\n",
    );
    let mut events = String::from("event_id,ad_id,timestamp,event_type\n");
    let mut event_id = 0;
    for (i, ad) in ads.iter().enumerate() {
        let ad_id = i + 1;
        writeln!(
            ads_csv,
            "{ad_id},{},{},{},{},{},{}",
            ad.campaign, ad.platform, ad.ad_type, ad.gender, ad.age, ad.interests
        )
        .unwrap();

        let outcomes = [
            ("Purchase", purchases(ad)),
            ("Click", clicks(ad, duration)),
            ("Share", shares(ad)),
            ("Impression", 3 + i % 4),
        ];
        for (event_type, count) in outcomes {
            for _ in 0..count {
                event_id += 1;
                writeln!(events, "{event_id},{ad_id},2024-01-15 10:00:00,{event_type}").unwrap();
            }
        }
    }

    fs::write(dir.join("campaigns.csv"), campaigns).unwrap();
    fs::write(dir.join("ads.csv"), ads_csv).unwrap();
    fs::write(dir.join("ad_events.csv"), events).unwrap();
}

fn sample_request() -> Record {
    let body = serde_json::json!({
        "total_budget": "500",
        "duration_days": 10,
        "ad_platform": "Facebook",
        "ad_type": "Video",
        "target_gender": "Female",
        "target_age_group": "18-24",
        "target_interests": "Sports"
    });
    Record::from_json(&body).expect("record")
}

fn targets() -> Vec<String> {
    PipelineConfig::default().targets
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn coefficient(store: &ArtifactStore, target: &str, column: &str) -> f64 {
    let bundle = store.load_bundle(&targets()).expect("bundle");
    let index = bundle
        .schema()
        .columns()
        .iter()
        .position(|c| c == column)
        .expect("column in schema");
    let model = bundle
        .models()
        .iter()
        .find(|m| m.target() == target)
        .expect("model for target");
    model.coefficients()[index]
}

#[test]
fn training_writes_schema_and_one_model_per_target() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(60));

    let report = run_training(data.path(), out.path(), &PipelineConfig::default())
        .expect("training succeeds");
    assert_eq!(report.ads, 60);
    assert_eq!(report.test_rows, 12);
    assert_eq!(report.train_rows, 48);
    assert_eq!(report.targets.len(), 3);

    let store = ArtifactStore::new(out.path());
    for target in targets() {
        assert!(store.model_path(&target).exists(), "{target} model missing");
    }
    assert!(store.report_path().exists());

    let schema = store.load_schema().expect("schema");
    assert_eq!(
        schema.columns(),
        [
            "duration_days",
            "total_budget",
            "ad_platform_Instagram",
            "ad_platform_YouTube",
            "ad_type_Video",
            "target_gender_Male",
            "target_age_group_25-34",
            "target_age_group_35-44",
            "target_interests_Sports",
            "target_interests_Tech",
        ]
    );
    assert_eq!(schema.fingerprint(), report.schema_fingerprint);
}

#[test]
fn end_to_end_prediction_recovers_generating_formula() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(60));
    let report = run_training(data.path(), out.path(), &PipelineConfig::default())
        .expect("training succeeds");
    for target in &report.targets {
        assert!(
            target.train_r2.is_some_and(|r2| r2 > 0.999_999),
            "{} train r2 {:?}",
            target.target,
            target.train_r2
        );
    }

    let bundle = ArtifactStore::new(out.path())
        .load_bundle(&targets())
        .expect("bundle");
    let prediction = bundle.predict_record(&sample_request()).expect("predict");

    let json = serde_json::to_value(&prediction).unwrap();
    let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["predicted_click", "predicted_purchase", "predicted_share"]
    );

    // Facebook / Video / Female / 18-24 / Sports, 10 days, budget 500
    assert_close(prediction.get("purchase").unwrap(), 3.0);
    assert_close(prediction.get("click").unwrap(), 30.0);
    assert_close(prediction.get("share").unwrap(), 7.0);
}

#[test]
fn retraining_is_deterministic() {
    let data = tempfile::tempdir().unwrap();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(60));

    run_training(data.path(), first.path(), &PipelineConfig::default()).unwrap();
    run_training(data.path(), second.path(), &PipelineConfig::default()).unwrap();

    let a = ArtifactStore::new(first.path());
    let b = ArtifactStore::new(second.path());
    assert_eq!(
        fs::read(a.schema_path()).unwrap(),
        fs::read(b.schema_path()).unwrap()
    );
    for target in targets() {
        assert_eq!(
            fs::read(a.model_path(&target)).unwrap(),
            fs::read(b.model_path(&target)).unwrap(),
            "{target} model differs between runs"
        );
    }
}

#[test]
fn new_category_widens_schema_without_disturbing_old_requests() {
    let data = tempfile::tempdir().unwrap();
    let before = tempfile::tempdir().unwrap();
    let after = tempfile::tempdir().unwrap();

    write_dataset(data.path(), &base_ads(60));
    run_training(data.path(), before.path(), &PipelineConfig::default()).unwrap();

    let mut ads = base_ads(60);
    for i in 0..9 {
        ads.push(Ad {
            campaign: 1 + i,
            platform: "TikTok",
            ad_type: AD_TYPES[i % 2],
            gender: GENDERS[(i / 2) % 2],
            age: AGE_GROUPS[i % 3],
            interests: INTERESTS[(i + 1) % 3],
        });
    }
    write_dataset(data.path(), &ads);
    run_training(data.path(), after.path(), &PipelineConfig::default()).unwrap();

    let old_schema = ArtifactStore::new(before.path()).load_schema().unwrap();
    let new_schema = ArtifactStore::new(after.path()).load_schema().unwrap();
    assert_eq!(new_schema.len(), old_schema.len() + 1);
    assert!(new_schema.contains("ad_platform_TikTok"));

    let request = sample_request();
    let old_vector = align(&request, &old_schema).unwrap();
    let new_vector = align(&request, &new_schema).unwrap();
    assert_eq!(new_vector.get("ad_platform_TikTok"), Some(0.0));
    for column in old_schema.columns() {
        assert_eq!(old_vector.get(column), new_vector.get(column), "{column}");
    }

    let bundle = ArtifactStore::new(after.path())
        .load_bundle(&targets())
        .unwrap();
    let prediction = bundle.predict_record(&request).unwrap();
    assert_close(prediction.get("click").unwrap(), 30.0);
}

#[test]
fn single_target_configuration_writes_single_model() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(60));

    let config = PipelineConfig {
        targets: vec!["purchase".to_string()],
        ..PipelineConfig::default()
    };
    run_training(data.path(), out.path(), &config).unwrap();

    let store = ArtifactStore::new(out.path());
    assert!(store.model_path("purchase").exists());
    assert!(!store.model_path("click").exists());

    let bundle = store.load_bundle(&config.targets).unwrap();
    let prediction = bundle.predict_record(&sample_request()).unwrap();
    assert_eq!(prediction.len(), 1);
    assert_close(prediction.get("purchase").unwrap(), 3.0);
}

#[test]
fn missing_join_key_aborts_before_writing() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(60));

    let ads = fs::read_to_string(data.path().join("ads.csv")).unwrap();
    fs::write(data.path().join("ads.csv"), ads.replacen("ad_id", "id", 1)).unwrap();

    let err = run_training(data.path(), out.path(), &PipelineConfig::default()).unwrap_err();
    assert!(
        matches!(err, TrainingError::MissingColumn { ref table, ref column }
            if table == "ads" && column == "ad_id"),
        "unexpected error: {err:?}"
    );
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn failed_retrain_keeps_previous_artifacts() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(60));
    run_training(data.path(), out.path(), &PipelineConfig::default()).unwrap();
    let previous = fs::read(ArtifactStore::new(out.path()).schema_path()).unwrap();

    let config = PipelineConfig {
        categorical_columns: vec!["ad_placement".to_string()],
        ..PipelineConfig::default()
    };
    let err = run_training(data.path(), out.path(), &config).unwrap_err();
    assert!(matches!(err, TrainingError::MissingColumn { .. }));

    let store = ArtifactStore::new(out.path());
    assert_eq!(fs::read(store.schema_path()).unwrap(), previous);
    store.load_bundle(&targets()).expect("old bundle still loads");
}

#[test]
fn missing_source_file_is_io_error() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let err = run_training(data.path(), out.path(), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, TrainingError::Io { .. }), "unexpected error: {err:?}");
}

#[test]
fn aligned_sample_request_matches_schema_layout() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(60));
    run_training(data.path(), out.path(), &PipelineConfig::default()).unwrap();

    let schema = ArtifactStore::new(out.path()).load_schema().unwrap();
    let vector = align(&sample_request(), &schema).unwrap();
    assert_eq!(vector.schema().columns(), schema.columns());
    assert_eq!(vector.get("total_budget"), Some(500.0));
    assert_eq!(vector.get("duration_days"), Some(10.0));
    assert_eq!(vector.get("ad_type_Video"), Some(1.0));
    assert_eq!(vector.get("target_interests_Sports"), Some(1.0));
    assert_eq!(vector.get("ad_platform_Instagram"), Some(0.0));

    let mut bad = sample_request();
    bad.insert("total_budget", Value::Text("abc".to_string()));
    assert!(align(&bad, &schema).is_err());
}

#[test]
fn constant_duration_column_still_fits_exactly() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset_with(data.path(), &base_ads(60), |_| 10);

    let report = run_training(data.path(), out.path(), &PipelineConfig::default())
        .expect("training succeeds with a constant column");
    for target in &report.targets {
        assert!(target.intercept.is_finite(), "{} intercept", target.target);
        assert!(
            target.train_r2.is_some_and(|r2| r2 > 0.999_999),
            "{} train r2 {:?}",
            target.target,
            target.train_r2
        );
        assert!(
            target.test_r2.map_or(true, |r2| r2 >= 0.0),
            "{} test r2 {:?}",
            target.target,
            target.test_r2
        );
    }

    let store = ArtifactStore::new(out.path());
    assert_close(coefficient(&store, "click", "duration_days"), 0.0);

    let bundle = store.load_bundle(&targets()).unwrap();
    let prediction = bundle.predict_record(&sample_request()).unwrap();
    assert_close(prediction.get("purchase").unwrap(), 3.0);
    assert_close(prediction.get("click").unwrap(), 30.0);
    assert_close(prediction.get("share").unwrap(), 7.0);
}

#[test]
fn category_seen_only_in_test_rows_gets_zero_weight() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default();

    let mut ads = base_ads(61);
    let split = train_test_indices(ads.len(), config.test_fraction, config.split_seed);
    ads[split.test[0]].platform = "TikTok";
    write_dataset(data.path(), &ads);

    let report = run_training(data.path(), out.path(), &config).expect("training succeeds");
    let store = ArtifactStore::new(out.path());
    assert!(store.load_schema().unwrap().contains("ad_platform_TikTok"));
    for target in targets() {
        assert_close(coefficient(&store, &target, "ad_platform_TikTok"), 0.0);
    }
    // TikTok ads generate outcomes like Facebook, the reference platform
    for target in &report.targets {
        assert!(
            target.test_r2.is_some_and(|r2| r2 > 0.999_999),
            "{} test r2 {:?}",
            target.target,
            target.test_r2
        );
    }
}

#[test]
fn fewer_ads_than_features_still_trains() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path(), &base_ads(8));

    let report = run_training(data.path(), out.path(), &PipelineConfig::default())
        .expect("training succeeds on an underdetermined design");
    assert!(report.train_rows < report.features);

    let bundle = ArtifactStore::new(out.path())
        .load_bundle(&targets())
        .unwrap();
    for model in bundle.models() {
        assert!(model.intercept().is_finite());
        assert!(model.coefficients().iter().all(|c| c.is_finite()));
    }
    for target in &report.targets {
        assert!(
            target.train_r2.map_or(true, |r2| r2 > 0.999_999),
            "{} train r2 {:?}",
            target.target,
            target.train_r2
        );
        assert!(target.train_mae < 1e-6, "{} train mae", target.target);
    }
    assert!(bundle.predict_record(&sample_request()).is_ok());
}
