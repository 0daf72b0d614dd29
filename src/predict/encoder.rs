use serde::{Deserialize, Serialize};

use super::{CATEGORICAL_FEATURES, FeatureRow, ModelError, NUMERIC_FEATURES};

/// What to do with a categorical value the encoder was not fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    /// Encode as all zeros.
    #[default]
    Ignore,
    /// Reject the row.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub feature: String,
    pub categories: Vec<String>,
}

/// One-hot encoder for the categorical features followed by the numeric
/// features passed through unchanged.
///
/// Output layout: `[onehot(cat_0) .. onehot(cat_n), num_0 .. num_m]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEncoder {
    pub categorical: Vec<CategoricalColumn>,
    pub numeric: Vec<String>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

impl ColumnEncoder {
    /// Check that every named feature is one the model can be fed.
    pub fn validate(&self) -> Result<(), ModelError> {
        for col in &self.categorical {
            if !CATEGORICAL_FEATURES.contains(&col.feature.as_str()) {
                return Err(ModelError::UnknownFeature(col.feature.clone()));
            }
        }
        for name in &self.numeric {
            if !NUMERIC_FEATURES.contains(&name.as_str()) {
                return Err(ModelError::UnknownFeature(name.clone()));
            }
        }
        Ok(())
    }

    /// Width of an encoded row.
    pub fn width(&self) -> usize {
        self.categorical
            .iter()
            .map(|c| c.categories.len())
            .sum::<usize>()
            + self.numeric.len()
    }

    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
        let mut out = Vec::with_capacity(self.width());

        for col in &self.categorical {
            let value = row
                .categorical(&col.feature)
                .ok_or_else(|| ModelError::UnknownFeature(col.feature.clone()))?;
            let hit = col.categories.iter().position(|c| c == value);
            if hit.is_none() && self.handle_unknown == HandleUnknown::Error {
                return Err(ModelError::UnknownCategory {
                    feature: col.feature.clone(),
                    value: value.to_string(),
                });
            }
            out.extend((0..col.categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
        }

        for name in &self.numeric {
            let value = row
                .numeric(name)
                .ok_or_else(|| ModelError::UnknownFeature(name.clone()))?;
            out.push(value);
        }

        Ok(out)
    }
}
