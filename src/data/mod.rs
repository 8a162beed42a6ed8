/// Data layer: core types, ingestion, analytics and export.
///
/// Architecture:
/// ```text
///  results .csv / scoring service response
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  validate + parse → BatchDataset
///   └──────────┘
///        │
///        ├──────────────────────────┐
///        ▼                          ▼
///   ┌──────────┐              ┌──────────┐
///   │  stats    │  whole set   │  filter   │  search / grade predicate
///   └──────────┘              └──────────┘
///                                   │
///                                   ▼
///                             ┌──────────┐
///                             │   view    │  stable sort → Page
///                             └──────────┘
///                                   │
///                                   ▼
///                             ┌──────────┐
///                             │  export   │  current view → .csv
///                             └──────────┘
/// ```

pub mod category;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod student;
pub mod view;
