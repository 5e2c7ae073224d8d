pub mod offer;
pub mod search;
pub mod trend;
