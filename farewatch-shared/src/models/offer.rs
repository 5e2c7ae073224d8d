use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Total price of an offer, in a single currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency: String,
}

impl Price {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// One physical flight leg between two airports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub departure_airport: String,
    pub departure_at: NaiveDateTime, // Local time at the departure airport
    pub arrival_airport: String,
    pub arrival_at: NaiveDateTime,
    pub carrier_code: String,
    pub flight_number: String,
    pub stops: u32,
    pub duration_minutes: u32,
}

/// One directional trip made of one or more segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    pub segments: Vec<Segment>,
    pub duration_minutes: u32,
}

impl Itinerary {
    pub fn first_departure(&self) -> Option<NaiveDateTime> {
        self.segments.first().map(|s| s.departure_at)
    }

    pub fn max_stops(&self) -> u32 {
        self.segments.iter().map(|s| s.stops).max().unwrap_or(0)
    }
}

/// A priced flight proposal as returned by the flight source.
///
/// `itineraries[0]` is the outbound leg; a second entry, when present, is the
/// return leg. Offers are never modified after they are received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub price: Price,
    pub itineraries: Vec<Itinerary>,
    pub bookable_seats: u32,
    pub validating_airlines: Vec<String>,
}

impl Offer {
    pub fn outbound(&self) -> Option<&Itinerary> {
        self.itineraries.first()
    }

    pub fn inbound(&self) -> Option<&Itinerary> {
        self.itineraries.get(1)
    }

    pub fn is_round_trip(&self) -> bool {
        self.inbound().is_some()
    }

    /// Calendar day of the outbound leg's first departure
    pub fn departure_date(&self) -> Option<NaiveDate> {
        self.outbound()
            .and_then(Itinerary::first_departure)
            .map(|at| at.date())
    }

    /// Highest stop count over every segment of every itinerary
    pub fn max_stops(&self) -> u32 {
        self.itineraries
            .iter()
            .map(Itinerary::max_stops)
            .max()
            .unwrap_or(0)
    }

    pub fn is_validated_by(&self, airline: &str) -> bool {
        self.validating_airlines.iter().any(|code| code == airline)
    }
}
