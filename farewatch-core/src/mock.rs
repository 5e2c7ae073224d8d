use async_trait::async_trait;
use chrono::NaiveDate;
use farewatch_shared::{Offer, SearchContext};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::source::{FlightSource, SourceError, SourceResult};

/// Scripted in-memory flight source for tests and local runs
#[derive(Default)]
pub struct MockFlightSource {
    offers: Vec<Offer>,
    search_error: Option<SourceError>,
    prices: HashMap<NaiveDate, Decimal>,
    failing_dates: HashSet<NaiveDate>,
    latency: Option<Duration>,
    search_calls: AtomicUsize,
    price_requests: Mutex<Vec<NaiveDate>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFlightSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offers(mut self, offers: Vec<Offer>) -> Self {
        self.offers = offers;
        self
    }

    pub fn with_search_error(mut self, error: SourceError) -> Self {
        self.search_error = Some(error);
        self
    }

    /// Cheapest price returned for `date`; other dates have no offers
    pub fn with_price(mut self, date: NaiveDate, price: Decimal) -> Self {
        self.prices.insert(date, price);
        self
    }

    pub fn with_failing_date(mut self, date: NaiveDate) -> Self {
        self.failing_dates.insert(date);
        self
    }

    /// Delay applied to every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Dates passed to `min_price_for_date`, in call order
    pub fn price_requests(&self) -> Vec<NaiveDate> {
        self.price_requests
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Highest number of price lookups that were in progress at once
    pub fn max_concurrent_price_requests(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl FlightSource for MockFlightSource {
    async fn search_offers(&self, context: &SearchContext) -> SourceResult<Vec<Offer>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            "Mock search {} -> {} on {}",
            context.origin,
            context.destination,
            context.departure_date
        );
        self.simulate_latency().await;

        match &self.search_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.offers.clone()),
        }
    }

    async fn min_price_for_date(
        &self,
        _origin: &str,
        _destination: &str,
        date: NaiveDate,
        _passengers: u32,
    ) -> SourceResult<Option<Decimal>> {
        if let Ok(mut calls) = self.price_requests.lock() {
            calls.push(date);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.simulate_latency().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_dates.contains(&date) {
            return Err(SourceError::Transport(format!("simulated failure for {}", date)));
        }
        Ok(self.prices.get(&date).copied())
    }
}
