use farewatch_shared::{FilterSpec, Offer, Price, PriceDataPoint, SearchContext};
use serde::Serialize;
use uuid::Uuid;

use crate::phase::SearchPhase;

/// Read-only view of the orchestrator state handed to the display layer
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchSnapshot {
    pub search_id: Option<Uuid>,
    pub phase: SearchPhase,
    pub context: Option<SearchContext>,
    pub offers: Vec<Offer>,
    pub filtered_offers: Vec<Offer>,
    pub filters: FilterSpec,
    pub price_series: Vec<PriceDataPoint>,
    pub loading: bool,
    pub price_loading: bool,
    pub error: Option<String>,
    /// Validating airlines across all offers, for building the airline filter
    pub airlines: Vec<String>,
    pub cheapest_price: Option<Price>,
}

pub(crate) fn airlines(offers: &[Offer]) -> Vec<String> {
    let mut codes: Vec<String> = offers
        .iter()
        .flat_map(|o| o.validating_airlines.iter().cloned())
        .collect();
    codes.sort();
    codes.dedup();
    codes
}

pub(crate) fn cheapest_price(offers: &[Offer]) -> Option<Price> {
    offers
        .iter()
        .min_by(|a, b| a.price.amount.cmp(&b.price.amount))
        .map(|o| o.price.clone())
}
