use farewatch_core::FlightSource;
use farewatch_offer::trend::build_series;
use farewatch_offer::{filter_offers, PriceTrendAggregator, TrendConfig};
use farewatch_shared::{FilterSpec, Offer, PriceDataPoint, SearchContext};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::phase::{SearchError, SearchEvent, SearchPhase};
use crate::snapshot::{self, SearchSnapshot};

#[derive(Debug, Default)]
struct SearchState {
    search_id: Option<Uuid>,
    phase: SearchPhase,
    context: Option<SearchContext>,
    offers: Vec<Offer>,
    filters: FilterSpec,
    filtered: Vec<Offer>,
    price_series: Vec<PriceDataPoint>,
    price_loading: bool,
    error: Option<String>,
}

/// Owns the current search and keeps the filtered offers and price trend in
/// step with it.
///
/// Every search and filter change takes a new generation number. Results of
/// a run are committed only while its generation is still the latest, so a
/// slow, superseded run can never overwrite a newer one.
pub struct SearchOrchestrator {
    source: Arc<dyn FlightSource>,
    aggregator: PriceTrendAggregator,
    state: RwLock<SearchState>,
    generation: AtomicU64,
}

impl SearchOrchestrator {
    pub fn new(source: Arc<dyn FlightSource>, config: TrendConfig) -> Self {
        Self {
            aggregator: PriceTrendAggregator::new(source.clone(), config),
            source,
            state: RwLock::new(SearchState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Start a new search, discarding the previous results and filters
    pub async fn submit_search(&self, context: SearchContext) -> Result<SearchSnapshot, SearchError> {
        let generation = {
            let mut state = self.state.write().await;
            let phase = state.phase.next(SearchEvent::SubmitSearch)?;
            let generation = self.next_generation();
            *state = SearchState {
                search_id: Some(Uuid::new_v4()),
                phase,
                context: Some(context.clone()),
                ..SearchState::default()
            };
            tracing::info!(
                "Search {} -> {} on {} started (generation {})",
                context.origin,
                context.destination,
                context.departure_date,
                generation
            );
            generation
        };

        let result = self.source.search_offers(&context).await;

        let offers = {
            let mut state = self.state.write().await;
            if !self.is_current(generation) {
                tracing::debug!("Discarding results of superseded search (generation {})", generation);
                return Ok(Self::snapshot_of(&state));
            }

            match result {
                Err(e) => {
                    tracing::error!("Flight search failed: {}", e);
                    state.phase = state.phase.next(SearchEvent::SourceFailed)?;
                    state.offers.clear();
                    state.filtered.clear();
                    state.price_series.clear();
                    state.error = Some(e.to_string());
                    return Ok(Self::snapshot_of(&state));
                }
                Ok(offers) => {
                    tracing::info!("Search returned {} offers", offers.len());
                    state.phase = state.phase.next(SearchEvent::SourceSucceeded)?;
                    state.offers = offers.clone();
                    state.filtered = filter_offers(&offers, &state.filters);
                    state.price_loading = !state.filtered.is_empty();
                    state.filtered.clone()
                }
            }
        };

        if !offers.is_empty() {
            self.refresh_trend(generation, offers, Some(context)).await;
        }

        Ok(self.snapshot().await)
    }

    /// Replace the filter spec and recompute the filtered offers and trend
    pub async fn change_filters(&self, filters: FilterSpec) -> Result<SearchSnapshot, SearchError> {
        let (generation, filtered, context) = {
            let mut state = self.state.write().await;
            state.phase = state.phase.next(SearchEvent::ChangeFilters)?;
            let generation = self.next_generation();

            let filtered = filter_offers(&state.offers, &filters);
            tracing::debug!(
                "Filters changed (generation {}): {} of {} offers match",
                generation,
                filtered.len(),
                state.offers.len()
            );
            state.filters = filters;
            state.filtered = filtered.clone();
            if filtered.is_empty() {
                state.price_series.clear();
                state.price_loading = false;
            } else {
                state.price_loading = true;
            }
            (generation, filtered, state.context.clone())
        };

        if !filtered.is_empty() {
            self.refresh_trend(generation, filtered, context).await;
        }

        Ok(self.snapshot().await)
    }

    pub async fn snapshot(&self) -> SearchSnapshot {
        let state = self.state.read().await;
        Self::snapshot_of(&state)
    }

    async fn refresh_trend(&self, generation: u64, offers: Vec<Offer>, context: Option<SearchContext>) {
        // Local days are known right away; publish them before gap filling
        if let Ok(skeleton) = build_series(&offers, self.aggregator.config().range_padding_days) {
            let mut state = self.state.write().await;
            if self.is_current(generation) {
                state.price_series = skeleton;
            }
        }

        let series = match self.aggregator.aggregate(&offers, context.as_ref()).await {
            Ok(series) => Some(series),
            Err(e) if context.is_some() => {
                tracing::warn!("Price trend aggregation failed ({}), retrying without search context", e);
                match self.aggregator.aggregate(&offers, None).await {
                    Ok(series) => Some(series),
                    Err(e) => {
                        tracing::error!("Price trend aggregation failed: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::error!("Price trend aggregation failed: {}", e);
                None
            }
        };

        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            tracing::debug!("Discarding price trend of superseded generation {}", generation);
            return;
        }
        // On failure the last published series stays in place
        if let Some(series) = series {
            state.price_series = series;
        }
        state.price_loading = false;
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn snapshot_of(state: &SearchState) -> SearchSnapshot {
        SearchSnapshot {
            search_id: state.search_id,
            phase: state.phase,
            context: state.context.clone(),
            offers: state.offers.clone(),
            filtered_offers: state.filtered.clone(),
            filters: state.filters.clone(),
            price_series: state.price_series.clone(),
            loading: state.phase == SearchPhase::Searching,
            price_loading: state.price_loading,
            error: state.error.clone(),
            airlines: snapshot::airlines(&state.offers),
            cheapest_price: snapshot::cheapest_price(&state.filtered),
        }
    }
}
