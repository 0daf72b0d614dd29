use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use super::model::{DatasetStore, HistoricalRecord};
use super::rng::Mt19937;
use crate::error::{ServiceError, ServiceResult};

/// Half-width of the percentile window used by [`college_stats`].
pub const PERCENTILE_WINDOW: f64 = 5.0;

// ---------------------------------------------------------------------------
// College stats: raw historical rows for one college
// ---------------------------------------------------------------------------

/// A validated college-stats query.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsQuery {
    pub college_name: String,
    pub branch: Option<String>,
    pub percentile: Option<f64>,
}

impl StatsQuery {
    /// Validate raw string arguments. Empty strings count as absent.
    pub fn from_params(
        college: Option<&str>,
        branch: Option<&str>,
        percentile: Option<&str>,
    ) -> ServiceResult<Self> {
        let college_name = non_empty(college)
            .ok_or_else(|| ServiceError::invalid("college", "College name is required."))?;
        let percentile = match non_empty(percentile) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| ServiceError::invalid("percentile", "Invalid percentile."))?,
            ),
            None => None,
        };
        Ok(StatsQuery {
            college_name,
            branch: non_empty(branch),
            percentile,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub branch: Option<String>,
    pub percentile: Option<f64>,
    pub seat_type: Option<String>,
}

impl From<&HistoricalRecord> for StatsRow {
    fn from(rec: &HistoricalRecord) -> Self {
        StatsRow {
            branch: rec.branch.clone(),
            percentile: rec.percentile,
            seat_type: rec.seat_type.clone(),
        }
    }
}

fn within_window(value: Option<f64>, center: f64) -> bool {
    value.is_some_and(|p| p >= center - PERCENTILE_WINDOW && p <= center + PERCENTILE_WINDOW)
}

/// Historical rows for a college, optionally narrowed to a branch and a
/// ±5 percentile window. Rows keep table order; nothing is ranked.
pub fn college_stats(store: &DatasetStore, query: &StatsQuery) -> Vec<StatsRow> {
    store
        .history
        .iter()
        .filter(|rec| rec.college_name.as_deref() == Some(query.college_name.as_str()))
        .filter(|rec| {
            query
                .branch
                .as_deref()
                .map_or(true, |b| rec.branch.as_deref() == Some(b))
        })
        .filter(|rec| {
            query
                .percentile
                .map_or(true, |p| within_window(rec.percentile, p))
        })
        .map(StatsRow::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Branch trend: average percentile per synthetic year
// ---------------------------------------------------------------------------

/// How synthetic years are assigned to historical rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub seed: u32,
    /// Labels drawn for each row. Must not be empty.
    pub years: Vec<i32>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            seed: 42,
            years: vec![2021, 2022, 2023],
        }
    }
}

/// Assign one year label per row, in row order, from a freshly seeded generator.
pub fn assign_years(row_count: usize, config: &TrendConfig) -> Vec<i32> {
    if config.years.is_empty() {
        return Vec::new();
    }
    let max = (config.years.len() - 1) as u32;
    let mut rng = Mt19937::new(config.seed);
    (0..row_count)
        .map(|_| config.years[rng.bounded(max) as usize])
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    /// Mean of the non-null percentiles of the year, `None` if there were none.
    pub average_percentile: Option<f64>,
}

/// Validate both arguments and compute the trend.
pub fn branch_trend_for(
    store: &DatasetStore,
    config: &TrendConfig,
    college: Option<&str>,
    branch: Option<&str>,
) -> ServiceResult<Vec<TrendPoint>> {
    match (non_empty(college), non_empty(branch)) {
        (Some(college), Some(branch)) => branch_trend(store, config, &college, &branch),
        (college, branch) => {
            let mut fields = Vec::new();
            if college.is_none() {
                fields.push("college".to_string());
            }
            if branch.is_none() {
                fields.push("branch".to_string());
            }
            Err(ServiceError::Validation {
                message: "College and branch are required".to_string(),
                fields,
            })
        }
    }
}

/// Average percentile per assigned year for one college and branch, ordered
/// by year. Years are assigned over the whole table before filtering, so a
/// row's label depends only on its position.
pub fn branch_trend(
    store: &DatasetStore,
    config: &TrendConfig,
    college_name: &str,
    branch: &str,
) -> ServiceResult<Vec<TrendPoint>> {
    let years = assign_years(store.history.len(), config);

    // year → (sum, count of non-null percentiles)
    let mut groups: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (rec, year) in store.history.iter().zip(years) {
        if rec.college_name.as_deref() != Some(college_name) || rec.branch.as_deref() != Some(branch)
        {
            continue;
        }
        let entry = groups.entry(year).or_insert((0.0, 0));
        if let Some(p) = rec.percentile {
            entry.0 += p;
            entry.1 += 1;
        }
    }

    if groups.is_empty() {
        return Err(ServiceError::NotFound(
            "No data found for the given college and branch".to_string(),
        ));
    }
    debug!(
        "branch_trend: {college_name} / {branch} → {} year groups",
        groups.len()
    );

    Ok(groups
        .into_iter()
        .map(|(year, (sum, count))| TrendPoint {
            year,
            average_percentile: (count > 0).then(|| sum / count as f64),
        })
        .collect())
}
