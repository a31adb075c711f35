pub mod config;
pub mod error;
pub mod market;
pub mod signal;

pub use config::{BacktestConfig, SizingPolicy, DEFAULT_PRICE_BOUNDS};
pub use error::BacktestError;
pub use market::{dedup_snapshots, BookSnapshot, Resolution, Side};
pub use signal::EntrySignal;
