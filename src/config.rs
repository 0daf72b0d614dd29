use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use log::warn;

use crate::data::stats::TrendConfig;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub cutoff_path: PathBuf,
    pub historical_path: PathBuf,
    pub model_path: PathBuf,
    pub trend: TrendConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source. Unset variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_raw = var("CET_BIND_ADDR", "127.0.0.1:5000");
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid CET_BIND_ADDR '{bind_raw}'"))?;

        let data_dir = PathBuf::from(var("CET_DATA_DIR", "data"));
        let cutoff_path = data_dir.join(var("CET_CUTOFF_FILE", "kaggle_pivot_min_descending.csv"));
        let historical_path = data_dir.join(var("CET_HISTORICAL_FILE", "kaggle_sw_raw.csv"));
        let model_path = PathBuf::from(var("CET_MODEL_PATH", "model.json"));

        let defaults = TrendConfig::default();
        let seed_raw = var("CET_TREND_SEED", &defaults.seed.to_string());
        let seed = seed_raw.parse::<u32>().unwrap_or_else(|_| {
            warn!("CET_TREND_SEED '{seed_raw}' is not a u32, using {}", defaults.seed);
            defaults.seed
        });

        let years_raw = var("CET_TREND_YEARS", "2021,2022,2023");
        let years = years_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i32>()
                    .with_context(|| format!("invalid year '{s}' in CET_TREND_YEARS"))
            })
            .collect::<Result<Vec<_>>>()?;
        if years.is_empty() {
            bail!("CET_TREND_YEARS must name at least one year");
        }

        Ok(ServiceConfig {
            bind_addr,
            cutoff_path,
            historical_path,
            model_path,
            trend: TrendConfig { seed, years },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(cfg.cutoff_path, PathBuf::from("data/kaggle_pivot_min_descending.csv"));
        assert_eq!(cfg.historical_path, PathBuf::from("data/kaggle_sw_raw.csv"));
        assert_eq!(cfg.model_path, PathBuf::from("model.json"));
        assert_eq!(cfg.trend, TrendConfig::default());
    }

    #[test]
    fn overrides_and_fallbacks() {
        let cfg = config(&[
            ("CET_DATA_DIR", "/srv/cet"),
            ("CET_HISTORICAL_FILE", "raw.parquet"),
            ("CET_TREND_SEED", "not-a-number"),
            ("CET_TREND_YEARS", "2019, 2020"),
        ])
        .unwrap();
        assert_eq!(cfg.historical_path, PathBuf::from("/srv/cet/raw.parquet"));
        assert_eq!(cfg.trend.seed, 42);
        assert_eq!(cfg.trend.years, vec![2019, 2020]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("CET_BIND_ADDR", "localhost")]).is_err());
        assert!(config(&[("CET_TREND_YEARS", "soon")]).is_err());
        assert!(config(&[("CET_TREND_YEARS", " , ")]).is_err());
    }
}
