use async_trait::async_trait;
use chrono::NaiveDate;
use farewatch_shared::{Offer, SearchContext};
use rust_decimal::Decimal;

/// Failures reported by a flight source
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// Expired or rejected credential
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Malformed parameters or a rejection by the source
    #[error("Request rejected: {message}{}", parameter_suffix(.parameter))]
    Request {
        message: String,
        parameter: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

fn parameter_suffix(parameter: &Option<String>) -> String {
    parameter
        .as_ref()
        .map(|p| format!(" (parameter: {})", p))
        .unwrap_or_default()
}

impl SourceError {
    pub fn request(message: impl Into<String>) -> Self {
        SourceError::Request {
            message: message.into(),
            parameter: None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, SourceError::Auth(_))
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// External supplier of priced flight offers
#[async_trait]
pub trait FlightSource: Send + Sync {
    /// Search offers for a route, dates and party size
    async fn search_offers(&self, context: &SearchContext) -> SourceResult<Vec<Offer>>;

    /// Cheapest total price for a one-way trip on `date`.
    ///
    /// `Ok(None)` means the source has no offers for that day; it is not an error.
    async fn min_price_for_date(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        passengers: u32,
    ) -> SourceResult<Option<Decimal>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_includes_parameter() {
        let err = SourceError::Request {
            message: "Date/Time is in the past".to_string(),
            parameter: Some("departureDate".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Request rejected: Date/Time is in the past (parameter: departureDate)"
        );
        assert_eq!(SourceError::request("bad").to_string(), "Request rejected: bad");
    }

    #[test]
    fn test_only_auth_errors_trigger_reauth() {
        assert!(SourceError::Auth("expired".to_string()).is_auth());
        assert!(!SourceError::request("bad").is_auth());
        assert!(!SourceError::Transport("reset".to_string()).is_auth());
    }
}
