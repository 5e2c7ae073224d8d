pub mod filter;
pub mod trend;

#[cfg(test)]
pub(crate) mod fixtures;

pub use filter::filter_offers;
pub use trend::{PriceTrendAggregator, TrendConfig, TrendError};
