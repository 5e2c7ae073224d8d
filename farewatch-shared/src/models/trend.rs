use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One calendar day of the price trend series.
///
/// `price` is `None` when nothing is known for the day; `sample_count` is the
/// number of offers the price was averaged from (1 for a fetched price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDataPoint {
    pub date: NaiveDate,
    pub price: Option<Decimal>,
    pub sample_count: u32,
}

impl PriceDataPoint {
    pub fn unknown(date: NaiveDate) -> Self {
        Self {
            date,
            price: None,
            sample_count: 0,
        }
    }

    pub fn is_known(&self) -> bool {
        self.price.is_some()
    }
}
