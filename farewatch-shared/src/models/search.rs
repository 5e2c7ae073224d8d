use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Route, dates and party size of one search. Fixed for the lifetime of the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate, // Just date, no time component
    pub return_date: Option<NaiveDate>,
    pub passengers: u32,
}

/// User-chosen constraints over a result set.
///
/// `None` / empty means "no constraint" for that field. The whole spec is
/// replaced on every change, never patched field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Exact maximum stop count an offer must have
    #[serde(default)]
    pub stops: Option<u32>,
    /// Inclusive price ceiling
    #[serde(default)]
    pub max_price: Option<Decimal>,
    /// Acceptable validating airline codes
    #[serde(default)]
    pub airlines: BTreeSet<String>,
}

impl FilterSpec {
    pub fn is_unconstrained(&self) -> bool {
        self.stops.is_none() && self.max_price.is_none() && self.airlines.is_empty()
    }
}
