/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  Make → Model → Transmission → Fuel → Year  → Table
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  popularity, histogram, boxes, top-N, metrics
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
