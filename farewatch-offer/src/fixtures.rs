use chrono::{NaiveDate, NaiveTime};
use farewatch_shared::{Itinerary, Offer, Price, Segment};
use rust_decimal::Decimal;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One-way offer departing `day` at 09:30 with one segment per entry of `stops`
pub fn offer(id: &str, day: &str, amount: Decimal, stops: &[u32], airlines: &[&str]) -> Offer {
    let departure = date(day).and_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    let segments = stops
        .iter()
        .enumerate()
        .map(|(n, &stops)| Segment {
            departure_airport: if n == 0 { "JFK".to_string() } else { "ORD".to_string() },
            departure_at: departure + chrono::Duration::hours(4 * n as i64),
            arrival_airport: "LAX".to_string(),
            arrival_at: departure + chrono::Duration::hours(4 * n as i64 + 3),
            carrier_code: airlines.first().copied().unwrap_or("AA").to_string(),
            flight_number: format!("{}", 100 + n),
            stops,
            duration_minutes: 180,
        })
        .collect();

    Offer {
        id: id.to_string(),
        price: Price::new(amount, "USD"),
        itineraries: vec![Itinerary { segments, duration_minutes: 180 * stops.len() as u32 }],
        bookable_seats: 9,
        validating_airlines: airlines.iter().map(|a| a.to_string()).collect(),
    }
}
