pub mod models;

pub use models::offer::{Itinerary, Offer, Price, Segment};
pub use models::search::{FilterSpec, SearchContext};
pub use models::trend::PriceDataPoint;
