pub mod loader;
pub mod series;
pub mod snapshot;
pub mod stooq;
pub mod synthetic;

// Re-exports for convenient access (e.g. `use crate::market_data::SeriesStore`).
pub use loader::load_symbol;
pub use series::SeriesStore;
pub use snapshot::Snapshot;
pub use stooq::StooqClient;
