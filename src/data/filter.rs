use std::collections::BTreeSet;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::model::{AdmissionRecord, DatasetStore};
use crate::error::{ServiceError, ServiceResult};
use crate::profile::{UserProfile, parse_f64, parse_text_list};

/// Score type used when a query does not name one.
pub const DEFAULT_SCORE_TYPE: &str = "MHT-CET";

// ---------------------------------------------------------------------------
// Query: validated recommendation filters
// ---------------------------------------------------------------------------

/// A validated recommendation query.
///
/// An empty selection set means "no restriction" for that column. The score
/// type filter is never skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendQuery {
    pub percentile: f64,
    pub cities: BTreeSet<String>,
    pub branches: BTreeSet<String>,
    pub seat_types: BTreeSet<String>,
    pub score_type: String,
    /// Accepted but not used for filtering.
    pub category: Option<String>,
}

impl RecommendQuery {
    /// A query with no optional filters.
    pub fn new(percentile: f64) -> Self {
        RecommendQuery {
            percentile,
            cities: BTreeSet::new(),
            branches: BTreeSet::new(),
            seat_types: BTreeSet::new(),
            score_type: DEFAULT_SCORE_TYPE.to_string(),
            category: None,
        }
    }

    /// Validate the recommendation fields of a profile.
    ///
    /// A bad percentile is reported on its own. Otherwise every malformed
    /// filter field is listed together. Score type falls back to
    /// [`DEFAULT_SCORE_TYPE`] only when it is absent, null or blank.
    pub fn from_profile(profile: &UserProfile) -> ServiceResult<Self> {
        let percentile = profile
            .percentile
            .as_ref()
            .and_then(parse_f64)
            .ok_or_else(|| {
                ServiceError::invalid("percentile", "Invalid or missing percentile value.")
            })?;

        let mut invalid = Vec::new();
        let cities = selection(profile.cities.as_ref(), "cities", &mut invalid);
        let branches = selection(profile.branches.as_ref(), "branches", &mut invalid);
        let seat_types = selection(profile.seat_types.as_ref(), "seat_types", &mut invalid);

        let score_type = match profile.score_type.as_ref() {
            None => DEFAULT_SCORE_TYPE.to_string(),
            Some(Value::String(s)) if s.trim().is_empty() => DEFAULT_SCORE_TYPE.to_string(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => {
                invalid.push("score_type".to_string());
                String::new()
            }
        };

        if !invalid.is_empty() {
            return Err(ServiceError::invalid_fields(invalid));
        }

        Ok(RecommendQuery {
            percentile,
            cities,
            branches,
            seat_types,
            score_type,
            category: profile
                .category
                .as_ref()
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_lowercase()),
        })
    }
}

/// A selection set from an optional list field; records `field` in
/// `invalid` when the value is not a list of strings.
fn selection(value: Option<&Value>, field: &str, invalid: &mut Vec<String>) -> BTreeSet<String> {
    match value.map(parse_text_list) {
        None => BTreeSet::new(),
        Some(Some(values)) => values.into_iter().collect(),
        Some(None) => {
            invalid.push(field.to_string());
            BTreeSet::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

fn in_selection(value: Option<&String>, selected: &BTreeSet<String>) -> bool {
    selected.is_empty() || value.is_some_and(|v| selected.contains(v))
}

/// Return indices of cutoff rows that pass every predicate, in table order.
///
/// Predicates form a conjunction applied in this order:
/// 1. minimum percentile ≤ candidate percentile
/// 2. derived city ∈ selected cities
/// 3. branch ∈ selected branches
/// 4. score type equals the selection, ignoring case
/// 5. seat type ∈ selected seat types
pub fn filtered_indices(store: &DatasetStore, query: &RecommendQuery) -> Vec<usize> {
    let score_type = query.score_type.to_lowercase();
    store
        .cutoffs
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            rec.min_percentile.is_some_and(|min| min <= query.percentile)
                && in_selection(rec.city.as_ref(), &query.cities)
                && in_selection(rec.branch.as_ref(), &query.branches)
                && rec
                    .score_type
                    .as_ref()
                    .is_some_and(|s| s.to_lowercase() == score_type)
                && in_selection(rec.seat_type.as_ref(), &query.seat_types)
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Recommendation: projected, ranked output row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub college_name: String,
    pub branch: Option<String>,
    pub seat_type: Option<String>,
    pub min: f64,
    pub city_guess: Option<String>,
}

impl Recommendation {
    fn from_record(rec: &AdmissionRecord, min: f64) -> Self {
        Recommendation {
            college_name: rec.college_name.clone(),
            branch: rec.branch.clone(),
            seat_type: rec.seat_type.clone(),
            min,
            city_guess: rec.city.clone(),
        }
    }
}

/// Colleges the candidate qualifies for, highest cutoff first.
///
/// The sort is stable: rows with equal cutoffs keep their table order. No
/// limit is applied and an empty list is a valid answer.
pub fn recommend(store: &DatasetStore, query: &RecommendQuery) -> Vec<Recommendation> {
    if let Some(category) = &query.category {
        debug!("category '{category}' is accepted but not applied as a filter");
    }

    let mut results: Vec<Recommendation> = filtered_indices(store, query)
        .into_iter()
        .filter_map(|i| {
            let rec = &store.cutoffs[i];
            rec.min_percentile.map(|min| Recommendation::from_record(rec, min))
        })
        .collect();
    results.sort_by(|a, b| b.min.total_cmp(&a.min));

    debug!(
        "recommend: percentile={} score_type={} → {} of {} rows",
        query.percentile,
        query.score_type,
        results.len(),
        store.cutoffs.len()
    );
    results
}
