use chrono::{Days, NaiveDate};
use farewatch_core::FlightSource;
use farewatch_shared::{Offer, PriceDataPoint, SearchContext};
use futures_util::future::join_all;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Tuning of the price trend series and its gap-fill throttle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendConfig {
    /// Price lookups issued concurrently per batch
    pub batch_size: usize,
    /// Pause between two consecutive batches
    pub inter_batch_delay: Duration,
    /// Days appended after the latest departure date
    pub range_padding_days: u64,
    /// Upper bound for the whole gap-fill phase
    pub gap_fill_timeout: Option<Duration>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            inter_batch_delay: Duration::from_millis(200),
            range_padding_days: 5,
            gap_fill_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrendError {
    #[error("Date range starting at {0} exceeds the supported calendar")]
    DateOutOfRange(NaiveDate),

    #[error("Gap fill did not finish within {0:?}")]
    GapFillTimedOut(Duration),
}

/// Builds the continuous per-day price series shown in the trend chart
pub struct PriceTrendAggregator {
    source: Arc<dyn FlightSource>,
    config: TrendConfig,
}

impl PriceTrendAggregator {
    pub fn new(source: Arc<dyn FlightSource>, config: TrendConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Aggregate `offers` into one point per day, from the earliest departure
    /// to the latest departure plus the configured padding.
    ///
    /// With a search context, days without offers are looked up from the
    /// flight source. Lookup failures leave the day unknown.
    pub async fn aggregate(
        &self,
        offers: &[Offer],
        context: Option<&SearchContext>,
    ) -> Result<Vec<PriceDataPoint>, TrendError> {
        let series = build_series(offers, self.config.range_padding_days)?;

        let context = match context {
            Some(context) if !series.is_empty() => context,
            _ => return Ok(series),
        };

        match self.config.gap_fill_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fill_gaps(series, context))
                .await
                .map_err(|_| TrendError::GapFillTimedOut(limit)),
            None => Ok(self.fill_gaps(series, context).await),
        }
    }

    async fn fill_gaps(
        &self,
        mut series: Vec<PriceDataPoint>,
        context: &SearchContext,
    ) -> Vec<PriceDataPoint> {
        let gaps: Vec<(usize, NaiveDate)> = series
            .iter()
            .enumerate()
            .filter(|(_, point)| !point.is_known())
            .map(|(index, point)| (index, point.date))
            .collect();

        if gaps.is_empty() {
            return series;
        }

        let batch_size = self.config.batch_size.max(1);
        tracing::debug!(
            "Filling {} price gaps for {} -> {} in batches of {}",
            gaps.len(),
            context.origin,
            context.destination,
            batch_size
        );

        for (batch_no, batch) in gaps.chunks(batch_size).enumerate() {
            if batch_no > 0 {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }

            let lookups = batch.iter().map(|&(index, date)| async move {
                let result = self
                    .source
                    .min_price_for_date(&context.origin, &context.destination, date, context.passengers)
                    .await;
                (index, date, result)
            });

            for (index, date, result) in join_all(lookups).await {
                match result {
                    Ok(Some(price)) => {
                        let point = &mut series[index];
                        point.price = Some(round_whole(price));
                        point.sample_count = 1;
                    }
                    Ok(None) => tracing::debug!("No offers on {} for gap fill", date),
                    Err(e) => tracing::warn!("Gap fill lookup for {} failed: {}", date, e),
                }
            }
        }

        series
    }
}

/// Average offer price per outbound departure day
fn daily_averages(offers: &[Offer]) -> BTreeMap<NaiveDate, (Decimal, u32)> {
    let mut days: BTreeMap<NaiveDate, (Decimal, u32)> = BTreeMap::new();
    for offer in offers {
        let Some(date) = offer.departure_date() else {
            tracing::warn!("Offer {} has no outbound segment, skipping", offer.id);
            continue;
        };
        let entry = days.entry(date).or_insert((Decimal::ZERO, 0));
        entry.0 += offer.price.amount;
        entry.1 += 1;
    }
    days
}

/// Gap-free series over `[earliest, latest + padding]` from local offers only
pub fn build_series(offers: &[Offer], padding_days: u64) -> Result<Vec<PriceDataPoint>, TrendError> {
    let days = daily_averages(offers);

    let (Some((&earliest, _)), Some((&latest, _))) = (days.first_key_value(), days.last_key_value()) else {
        return Ok(Vec::new());
    };
    let end = latest
        .checked_add_days(Days::new(padding_days))
        .ok_or(TrendError::DateOutOfRange(earliest))?;

    let series = earliest
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| match days.get(&date) {
            Some(&(sum, count)) => PriceDataPoint {
                date,
                price: Some(round_whole(sum / Decimal::from(count))),
                sample_count: count,
            },
            None => PriceDataPoint::unknown(date),
        })
        .collect();

    Ok(series)
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, offer};
    use farewatch_core::MockFlightSource;
    use rust_decimal_macros::dec;
    use tokio::time::Instant;

    fn context() -> SearchContext {
        SearchContext {
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            departure_date: date("2024-06-01"),
            return_date: None,
            passengers: 2,
        }
    }

    fn scenario_offers() -> Vec<Offer> {
        vec![
            offer("1", "2024-06-01", dec!(100), &[0], &["AA"]),
            offer("2", "2024-06-01", dec!(200), &[0], &["AA"]),
            offer("3", "2024-06-03", dec!(150), &[0], &["AA"]),
        ]
    }

    fn aggregator(source: Arc<MockFlightSource>) -> PriceTrendAggregator {
        PriceTrendAggregator::new(source, TrendConfig::default())
    }

    #[tokio::test]
    async fn test_local_series_without_context() {
        let source = Arc::new(MockFlightSource::new());
        let series = aggregator(source.clone())
            .aggregate(&scenario_offers(), None)
            .await
            .unwrap();

        assert_eq!(series.len(), 8);
        assert_eq!(series[0], PriceDataPoint { date: date("2024-06-01"), price: Some(dec!(150)), sample_count: 2 });
        assert_eq!(series[1], PriceDataPoint::unknown(date("2024-06-02")));
        assert_eq!(series[2], PriceDataPoint { date: date("2024-06-03"), price: Some(dec!(150)), sample_count: 1 });
        for (n, point) in series[3..].iter().enumerate() {
            assert_eq!(point.date, date("2024-06-04") + Days::new(n as u64));
            assert!(!point.is_known());
            assert_eq!(point.sample_count, 0);
        }
        assert_eq!(series.last().unwrap().date, date("2024-06-08"));
        assert!(source.price_requests().is_empty());
    }

    #[tokio::test]
    async fn test_series_is_contiguous_and_sized_by_range() {
        let offers = vec![
            offer("1", "2024-02-27", dec!(80), &[0], &["AA"]),
            offer("2", "2024-03-02", dec!(95), &[0], &["AA"]),
            offer("3", "2024-02-28", dec!(90), &[0], &["AA"]),
        ];
        let series = build_series(&offers, 5).unwrap();

        // 2024 is a leap year: Feb 27 .. Mar 2 spans 4 days
        assert_eq!(series.len(), 4 + 6);
        for pair in series.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn test_average_rounds_half_away_from_zero() {
        let offers = vec![
            offer("1", "2024-06-01", dec!(100.25), &[0], &["AA"]),
            offer("2", "2024-06-01", dec!(100.75), &[0], &["AA"]),
            offer("3", "2024-06-01", dec!(101.50), &[0], &["AA"]),
            offer("4", "2024-06-02", dec!(99.49), &[0], &["AA"]),
        ];
        let series = build_series(&offers, 0).unwrap();

        // (100.25 + 100.75 + 101.50) / 3 = 100.8333..
        assert_eq!(series[0].price, Some(dec!(101)));
        assert_eq!(series[0].sample_count, 3);
        assert_eq!(series[1].price, Some(dec!(99)));
    }

    #[test]
    fn test_range_overflow_is_reported() {
        let mut last_day = offer("1", "2024-01-01", dec!(10), &[0], &["AA"]);
        last_day.itineraries[0].segments[0].departure_at = NaiveDate::MAX.and_hms_opt(10, 0, 0).unwrap();
        let offers = vec![last_day];

        assert!(matches!(build_series(&offers, 5), Err(TrendError::DateOutOfRange(_))));
    }

    #[tokio::test]
    async fn test_gap_fill_uses_source_prices() {
        let source = Arc::new(
            MockFlightSource::new()
                .with_price(date("2024-06-02"), dec!(119.6))
                .with_price(date("2024-06-07"), dec!(88)),
        );
        let series = aggregator(source.clone())
            .aggregate(&scenario_offers(), Some(&context()))
            .await
            .unwrap();

        assert_eq!(series[1], PriceDataPoint { date: date("2024-06-02"), price: Some(dec!(120)), sample_count: 1 });
        assert_eq!(series[3], PriceDataPoint::unknown(date("2024-06-04")));
        assert_eq!(series[6].price, Some(dec!(88)));
        // Local days are never looked up
        let requested = source.price_requests();
        assert_eq!(requested.len(), 6);
        assert!(!requested.contains(&date("2024-06-01")));
        assert!(!requested.contains(&date("2024-06-03")));
    }

    #[tokio::test]
    async fn test_failed_lookup_does_not_abort_batch() {
        let source = Arc::new(
            MockFlightSource::new()
                .with_failing_date(date("2024-06-02"))
                .with_price(date("2024-06-04"), dec!(140))
                .with_price(date("2024-06-05"), dec!(145)),
        );
        let series = aggregator(source.clone())
            .aggregate(&scenario_offers(), Some(&context()))
            .await
            .unwrap();

        assert_eq!(series[1], PriceDataPoint::unknown(date("2024-06-02")));
        assert_eq!(series[3].price, Some(dec!(140)));
        assert_eq!(series[4].price, Some(dec!(145)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gap_fill_is_batched_and_throttled() {
        // 2024-06-01 plus padding of 11 days leaves 11 gaps: batches of 5, 5, 1
        let offers = vec![offer("1", "2024-06-01", dec!(300), &[0], &["AA"])];
        let source = Arc::new(MockFlightSource::new().with_latency(Duration::from_millis(50)));
        let config = TrendConfig { range_padding_days: 11, ..TrendConfig::default() };
        let aggregator = PriceTrendAggregator::new(source.clone(), config);

        let started = Instant::now();
        let series = aggregator.aggregate(&offers, Some(&context())).await.unwrap();

        assert_eq!(series.len(), 12);
        assert_eq!(source.price_requests().len(), 11);
        assert_eq!(source.max_concurrent_price_requests(), 5);
        // Three batches of 50ms lookups with two 200ms pauses in between
        let expected = Duration::from_millis(3 * 50 + 2 * 200);
        assert!(started.elapsed() >= expected && started.elapsed() < expected + Duration::from_millis(10));
        // Batches run in index order
        let requested = source.price_requests();
        assert_eq!(requested[..5].iter().max(), Some(&date("2024-06-06")));
        assert_eq!(requested[10], date("2024-06-12"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gap_fill_timeout() {
        let source = Arc::new(MockFlightSource::new().with_latency(Duration::from_secs(10)));
        let config = TrendConfig { gap_fill_timeout: Some(Duration::from_secs(1)), ..TrendConfig::default() };
        let aggregator = PriceTrendAggregator::new(source, config);

        let result = aggregator.aggregate(&scenario_offers(), Some(&context())).await;
        assert_eq!(result, Err(TrendError::GapFillTimedOut(Duration::from_secs(1))));

        // The context-free path is unaffected
        assert_eq!(aggregator.aggregate(&scenario_offers(), None).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_empty_offers_skip_fetching() {
        let source = Arc::new(MockFlightSource::new().with_price(date("2024-06-02"), dec!(1)));
        let series = aggregator(source.clone()).aggregate(&[], Some(&context())).await.unwrap();

        assert!(series.is_empty());
        assert!(source.price_requests().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_is_idempotent() {
        let source = Arc::new(MockFlightSource::new().with_price(date("2024-06-05"), dec!(175.5)));
        let aggregator = aggregator(source);

        let first = aggregator.aggregate(&scenario_offers(), Some(&context())).await.unwrap();
        let second = aggregator.aggregate(&scenario_offers(), Some(&context())).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[4].price, Some(dec!(176)));
    }
}
