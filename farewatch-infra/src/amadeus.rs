use async_trait::async_trait;
use chrono::NaiveDate;
use farewatch_core::{AccessToken, FlightApi, SourceError, SourceResult};
use farewatch_shared::{Offer, SearchContext};
use reqwest::{Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::app_config::SourceConfig;
use crate::dto::{ErrorsResponse, FlightOffersResponse, TokenResponse};

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";

/// Offers returned by a single cheapest-price lookup
const PRICE_LOOKUP_LIMIT: u32 = 10;

/// HTTP transport for the Amadeus self-service flight offers API
pub struct AmadeusApi {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    max_offers: u32,
}

impl AmadeusApi {
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("farewatch/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            max_offers: config.max_offers,
        })
    }

    async fn get_offers(&self, token: &str, query: &[(&str, String)]) -> SourceResult<Vec<Offer>> {
        let url = format!("{}{}", self.base_url, FLIGHT_OFFERS_PATH);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let body: FlightOffersResponse = read_json(response).await?;
        Ok(body.data.into_iter().map(Offer::from).collect())
    }
}

#[async_trait]
impl FlightApi for AmadeusApi {
    async fn exchange_token(&self) -> SourceResult<AccessToken> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let token: TokenResponse = read_json(response).await?;
        tracing::info!("Obtained access token valid for {}s", token.expires_in);
        Ok(AccessToken::new(token.access_token, token.expires_in))
    }

    async fn search_offers(&self, token: &str, context: &SearchContext) -> SourceResult<Vec<Offer>> {
        let mut query = vec![
            ("originLocationCode", context.origin.clone()),
            ("destinationLocationCode", context.destination.clone()),
            ("departureDate", context.departure_date.to_string()),
            ("adults", context.passengers.to_string()),
            ("max", self.max_offers.to_string()),
        ];
        if let Some(return_date) = context.return_date {
            query.push(("returnDate", return_date.to_string()));
        }

        self.get_offers(token, &query).await
    }

    async fn min_price_for_date(
        &self,
        token: &str,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        passengers: u32,
    ) -> SourceResult<Option<Decimal>> {
        let query = [
            ("originLocationCode", origin.to_string()),
            ("destinationLocationCode", destination.to_string()),
            ("departureDate", date.to_string()),
            ("adults", passengers.to_string()),
            ("max", PRICE_LOOKUP_LIMIT.to_string()),
        ];

        let offers = self.get_offers(token, &query).await?;
        Ok(offers.iter().map(|o| o.price.amount).min())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> SourceResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
}

/// Map a non-success response to the source error taxonomy
pub fn status_error(status: StatusCode, body: &str) -> SourceError {
    let errors: ErrorsResponse = serde_json::from_str(body).unwrap_or_default();
    let first = errors.errors.into_iter().next();

    let message = first
        .as_ref()
        .and_then(|e| e.detail.clone().or_else(|| e.title.clone()))
        .unwrap_or_else(|| format!("HTTP {}", status));

    if status == StatusCode::UNAUTHORIZED {
        return SourceError::Auth(message);
    }

    SourceError::Request {
        message,
        parameter: first.and_then(|e| e.source).and_then(|s| s.parameter),
    }
}

fn transport_error(err: reqwest::Error) -> SourceError {
    SourceError::Transport(err.to_string())
}
