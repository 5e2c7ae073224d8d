//! Wire types of the flight offers search API and their domain mapping

use chrono::NaiveDateTime;
use farewatch_shared::{Itinerary, Offer, Price, Segment};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct FlightOffersResponse {
    #[serde(default)]
    pub data: Vec<FlightOfferDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOfferDto {
    pub id: String,
    #[serde(default)]
    pub number_of_bookable_seats: u32,
    pub itineraries: Vec<ItineraryDto>,
    pub price: PriceDto,
    #[serde(default)]
    pub validating_airline_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItineraryDto {
    pub duration: Option<String>,
    pub segments: Vec<SegmentDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDto {
    pub departure: EndpointDto,
    pub arrival: EndpointDto,
    pub carrier_code: String,
    pub number: String,
    #[serde(default)]
    pub number_of_stops: u32,
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDto {
    pub iata_code: String,
    pub at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct PriceDto {
    pub currency: String,
    pub total: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorsResponse {
    #[serde(default)]
    pub errors: Vec<ErrorDto>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDto {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub source: Option<ErrorSourceDto>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorSourceDto {
    pub parameter: Option<String>,
}

impl From<FlightOfferDto> for Offer {
    fn from(dto: FlightOfferDto) -> Self {
        Offer {
            id: dto.id,
            price: Price::new(dto.price.total, dto.price.currency),
            itineraries: dto.itineraries.into_iter().map(Itinerary::from).collect(),
            bookable_seats: dto.number_of_bookable_seats,
            validating_airlines: dto.validating_airline_codes,
        }
    }
}

impl From<ItineraryDto> for Itinerary {
    fn from(dto: ItineraryDto) -> Self {
        let segments: Vec<Segment> = dto.segments.into_iter().map(Segment::from).collect();
        let duration_minutes = dto
            .duration
            .as_deref()
            .and_then(parse_duration_minutes)
            .unwrap_or_else(|| segments.iter().fold(0u32, |total, s| total.saturating_add(s.duration_minutes)));
        Itinerary { segments, duration_minutes }
    }
}

impl From<SegmentDto> for Segment {
    fn from(dto: SegmentDto) -> Self {
        Segment {
            departure_airport: dto.departure.iata_code,
            departure_at: dto.departure.at,
            arrival_airport: dto.arrival.iata_code,
            arrival_at: dto.arrival.at,
            flight_number: dto.number,
            carrier_code: dto.carrier_code,
            stops: dto.number_of_stops,
            duration_minutes: dto.duration.as_deref().and_then(parse_duration_minutes).unwrap_or(0),
        }
    }
}

/// Minutes in an ISO 8601 duration such as `PT7H5M` or `P1DT2H`
pub fn parse_duration_minutes(value: &str) -> Option<u32> {
    let rest = value.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };

    let mut minutes = 0u32;
    for (part, units) in [(date_part, &[('D', 24 * 60)][..]), (time_part, &[('H', 60), ('M', 1), ('S', 0)][..])] {
        let mut digits = String::new();
        for c in part.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let factor = units.iter().find(|(unit, _)| *unit == c)?.1;
            let n: u32 = digits.parse().ok()?;
            minutes = minutes.checked_add(n.checked_mul(factor)?)?;
            digits.clear();
        }
        if !digits.is_empty() {
            return None;
        }
    }
    Some(minutes)
}
