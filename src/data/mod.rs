/// Data layer: tables, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table → DatasetStore
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ DatasetStore │  cutoff rows (+ derived city), historical rows
///   └──────────────┘
///        │
///        ├──────────────┬──────────────┐
///        ▼              ▼              ▼
///   ┌──────────┐   ┌──────────┐   ┌──────────┐
///   │  filter   │   │  stats    │   │  facets   │
///   └──────────┘   └──────────┘   └──────────┘
///   ranked cutoffs  history rows,   distinct
///                   year trend      filter values
/// ```

pub mod facets;
pub mod filter;
pub mod loader;
pub mod model;
pub mod rng;
pub mod stats;
