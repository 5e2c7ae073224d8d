use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use farewatch_shared::{Offer, SearchContext};
use rust_decimal::Decimal;
use std::future::Future;
use tokio::sync::Mutex;

use crate::source::{FlightSource, SourceResult};

/// Bearer token issued by the source's token exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in_seconds: i64) -> Self {
        Self {
            value: value.into(),
            expires_at: Utc::now() + Duration::seconds(expires_in_seconds),
        }
    }
}

/// Raw, token-taking transport of a flight source.
///
/// Implementations do no retrying and no caching; see [`AuthenticatedSource`].
#[async_trait]
pub trait FlightApi: Send + Sync {
    /// Exchange client credentials for a fresh access token
    async fn exchange_token(&self) -> SourceResult<AccessToken>;

    async fn search_offers(&self, token: &str, context: &SearchContext) -> SourceResult<Vec<Offer>>;

    async fn min_price_for_date(
        &self,
        token: &str,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        passengers: u32,
    ) -> SourceResult<Option<Decimal>>;
}

/// Cached access token owned by a single [`AuthenticatedSource`]
pub struct TokenCache {
    slot: Mutex<Option<AccessToken>>,
    /// Tokens this close to expiry are treated as already expired
    expiry_margin: Duration,
}

impl TokenCache {
    pub fn new(expiry_margin: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            expiry_margin,
        }
    }

    /// Return the cached token, exchanging a new one if missing or about to expire.
    ///
    /// The slot stays locked during the exchange so concurrent callers wait for
    /// one refresh instead of each starting their own.
    pub async fn get_or_refresh<A>(&self, api: &A) -> SourceResult<String>
    where
        A: FlightApi + ?Sized,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.expires_at - self.expiry_margin > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Access token missing or expired, exchanging credentials");
        let token = api.exchange_token().await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    /// Drop the cached token if it is still `stale`.
    ///
    /// A token refreshed by another caller in the meantime is left alone.
    pub async fn invalidate(&self, stale: &str) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|t| t.value == stale) {
            *slot = None;
        }
    }

    pub async fn cached(&self) -> Option<AccessToken> {
        self.slot.lock().await.clone()
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Duration::seconds(30))
    }
}

/// How authentication failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-authenticate and retry this many times after an auth failure
    pub reauth_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { reauth_attempts: 1 }
    }
}

/// A [`FlightSource`] that manages its own token: cached between calls,
/// refreshed on expiry and on an authentication failure.
pub struct AuthenticatedSource<A> {
    api: A,
    tokens: TokenCache,
    policy: RetryPolicy,
}

impl<A: FlightApi> AuthenticatedSource<A> {
    pub fn new(api: A, policy: RetryPolicy) -> Self {
        Self {
            api,
            tokens: TokenCache::default(),
            policy,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    async fn with_auth<T, F, Fut>(&self, call: F) -> SourceResult<T>
    where
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = SourceResult<T>> + Send,
        T: Send,
    {
        let mut retries = 0;
        loop {
            let token = self.tokens.get_or_refresh(&self.api).await?;
            match call(token.clone()).await {
                Err(err) if err.is_auth() && retries < self.policy.reauth_attempts => {
                    retries += 1;
                    tracing::warn!("{}, re-authenticating", err);
                    self.tokens.invalidate(&token).await;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<A: FlightApi> FlightSource for AuthenticatedSource<A> {
    async fn search_offers(&self, context: &SearchContext) -> SourceResult<Vec<Offer>> {
        self.with_auth(|token| async move { self.api.search_offers(&token, context).await })
            .await
    }

    async fn min_price_for_date(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        passengers: u32,
    ) -> SourceResult<Option<Decimal>> {
        self.with_auth(|token| async move {
            self.api
                .min_price_for_date(&token, origin, destination, date, passengers)
                .await
        })
        .await
    }
}
