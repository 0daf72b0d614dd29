//! Prediction adapter.
//!
//! Inference only: the classifier is trained offline and exported as a JSON
//! artifact (see [`forest`]). The rest of the service sees it through the
//! [`Predictor`] trait and never inspects its internals.

pub mod encoder;
pub mod forest;

use log::{debug, error};
use serde_json::Value;
use thiserror::Error;

use crate::error::{ServiceError, ServiceResult};
use crate::profile::{UserProfile, parse_f64, parse_i64, parse_text};

pub use forest::ForestPredictor;

/// Failures inside a predictor.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("unknown category '{value}' for feature '{feature}'")]
    UnknownCategory { feature: String, value: String },

    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("malformed model: {0}")]
    Malformed(String),

    #[error("predictor returned no label")]
    EmptyOutput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A trained classifier: one label per input row.
pub trait Predictor: Send + Sync {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<String>, ModelError>;
}

// ---------------------------------------------------------------------------
// FeatureRow – the seven model inputs
// ---------------------------------------------------------------------------

/// Fields a prediction needs, in the order they are validated and reported.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "percentile",
    "rank",
    "branch",
    "seat_type",
    "category",
    "score_type",
    "gender",
];

pub const NUMERIC_FEATURES: [&str; 2] = ["percentile", "rank"];
pub const CATEGORICAL_FEATURES: [&str; 5] = ["branch", "seat_type", "category", "score_type", "gender"];

/// One input row for the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub percentile: f64,
    pub rank: i64,
    pub branch: String,
    pub seat_type: String,
    pub category: String,
    pub score_type: String,
    pub gender: String,
}

impl FeatureRow {
    /// Validate a profile. Every absent field is reported at once; if none is
    /// absent, every malformed one is.
    pub fn from_profile(profile: &UserProfile) -> ServiceResult<Self> {
        let fields: [(&str, Option<&Value>); 7] = [
            ("percentile", profile.percentile.as_ref()),
            ("rank", profile.rank.as_ref()),
            ("branch", profile.branch.as_ref()),
            ("seat_type", profile.seat_type.as_ref()),
            ("category", profile.category.as_ref()),
            ("score_type", profile.score_type.as_ref()),
            ("gender", profile.gender.as_ref()),
        ];

        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::missing_fields(missing));
        }

        let mut invalid = Vec::new();
        let percentile = profile.percentile.as_ref().and_then(parse_f64);
        if percentile.is_none() {
            invalid.push("percentile".to_string());
        }
        let rank = profile.rank.as_ref().and_then(parse_i64);
        if rank.is_none() {
            invalid.push("rank".to_string());
        }
        let mut text = |name: &str, value: &Option<Value>| {
            let parsed = value.as_ref().and_then(parse_text);
            if parsed.is_none() {
                invalid.push(name.to_string());
            }
            parsed.unwrap_or_default()
        };
        let branch = text("branch", &profile.branch);
        let seat_type = text("seat_type", &profile.seat_type);
        let category = text("category", &profile.category);
        let score_type = text("score_type", &profile.score_type);
        let gender = text("gender", &profile.gender);

        match (percentile, rank) {
            (Some(percentile), Some(rank)) if invalid.is_empty() => Ok(FeatureRow {
                percentile,
                rank,
                branch,
                seat_type,
                category,
                score_type,
                gender,
            }),
            _ => Err(ServiceError::invalid_fields(invalid)),
        }
    }

    /// Value of a categorical feature by column name.
    pub fn categorical(&self, name: &str) -> Option<&str> {
        match name {
            "branch" => Some(&self.branch),
            "seat_type" => Some(&self.seat_type),
            "category" => Some(&self.category),
            "score_type" => Some(&self.score_type),
            "gender" => Some(&self.gender),
            _ => None,
        }
    }

    /// Value of a numeric feature by column name.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        match name {
            "percentile" => Some(self.percentile),
            "rank" => Some(self.rank as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Predict the most likely college for a profile.
pub fn predict(predictor: &dyn Predictor, profile: &UserProfile) -> ServiceResult<String> {
    let row = FeatureRow::from_profile(profile)?;
    debug!(
        "predict: percentile={} rank={} branch={} seat_type={}",
        row.percentile, row.rank, row.branch, row.seat_type
    );

    let labels = predictor.predict(std::slice::from_ref(&row)).map_err(|e| {
        error!("prediction failed: {e}");
        ServiceError::Prediction(e.to_string())
    })?;
    labels
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Prediction(ModelError::EmptyOutput.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(Vec<String>);

    impl Predictor for Fixed {
        fn predict(&self, _rows: &[FeatureRow]) -> Result<Vec<String>, ModelError> {
            Ok(self.0.clone())
        }
    }

    struct Rejecting;

    impl Predictor for Rejecting {
        fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<String>, ModelError> {
            Err(ModelError::UnknownCategory {
                feature: "gender".into(),
                value: rows[0].gender.clone(),
            })
        }
    }

    fn full_profile() -> UserProfile {
        UserProfile {
            percentile: Some(json!(93.4)),
            rank: Some(json!("5120")),
            branch: Some(json!("CS")),
            seat_type: Some(json!("GOPENS")),
            category: Some(json!("OPEN")),
            score_type: Some(json!("MHT-CET")),
            gender: Some(json!("Female")),
            ..Default::default()
        }
    }

    #[test]
    fn builds_feature_row() {
        let row = FeatureRow::from_profile(&full_profile()).unwrap();
        assert_eq!(row.rank, 5120);
        assert_eq!(row.categorical("gender"), Some("Female"));
        assert_eq!(row.numeric("percentile"), Some(93.4));
        assert_eq!(row.numeric("gender"), None);
    }

    #[test]
    fn reports_single_missing_field() {
        let mut profile = full_profile();
        profile.branch = None;
        match FeatureRow::from_profile(&profile).unwrap_err() {
            ServiceError::Validation { fields, message } => {
                assert_eq!(fields, vec!["branch"]);
                assert_eq!(message, "Missing fields: branch");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reports_every_missing_field_in_order() {
        let profile = UserProfile {
            percentile: Some(json!(90)),
            seat_type: Some(json!("GOPENS")),
            ..Default::default()
        };
        match FeatureRow::from_profile(&profile).unwrap_err() {
            ServiceError::Validation { fields, .. } => {
                assert_eq!(fields, vec!["rank", "branch", "category", "score_type", "gender"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reports_malformed_fields() {
        let mut profile = full_profile();
        profile.rank = Some(json!("first"));
        profile.gender = Some(json!(1));
        match FeatureRow::from_profile(&profile).unwrap_err() {
            ServiceError::Validation { fields, message } => {
                assert_eq!(fields, vec!["rank", "gender"]);
                assert_eq!(message, "Invalid fields: rank, gender");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn returns_first_label() {
        let predictor = Fixed(vec!["ABC College, Pune".into()]);
        assert_eq!(predict(&predictor, &full_profile()).unwrap(), "ABC College, Pune");
    }

    #[test]
    fn predictor_failures_become_prediction_errors() {
        let err = predict(&Rejecting, &full_profile()).unwrap_err();
        assert_eq!(err.kind(), "prediction");

        let err = predict(&Fixed(Vec::new()), &full_profile()).unwrap_err();
        assert_eq!(err, ServiceError::Prediction("predictor returned no label".into()));
    }
}
