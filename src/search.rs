// Accommodation search: candidate filtering, availability reconciliation and
// result assembly, plus the service running them as one pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::availability::AvailabilityOracle;
use crate::config::SearchSettings;
use crate::error::{OracleError, SearchError, ValidationError};
use crate::model::{Accommodation, AccommodationId};
use crate::pricing::compute_stay_total;
use crate::store::AccommodationStore;

// Search request as received from the outside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub location: String,
    pub guest_number: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub min_price: f64,
    pub max_price: f64,
}

/// Validated, immutable search criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    location: String,
    guest_count: u32,
    start: NaiveDate,
    end: NaiveDate,
    min_price: f64,
    max_price: f64,
}

impl SearchCriteria {
    pub fn new(
        location: impl Into<String>,
        guest_count: i64,
        start: NaiveDate,
        end: NaiveDate,
        min_price: f64,
        max_price: f64,
    ) -> Result<Self, ValidationError> {
        let guest_count = u32::try_from(guest_count)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or(ValidationError::InvalidGuestCount(guest_count))?;

        if end <= start {
            return Err(ValidationError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        // Written negated so NaN is rejected too
        if !(min_price >= 0.0) {
            return Err(ValidationError::NegativePrice(min_price));
        }
        if !(max_price >= min_price) {
            return Err(ValidationError::InvalidPriceRange {
                min: min_price,
                max: max_price,
            });
        }

        Ok(Self {
            location: location.into(),
            guest_count,
            start,
            end,
            min_price,
            max_price,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn guest_count(&self) -> u32 {
        self.guest_count
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn min_price(&self) -> f64 {
        self.min_price
    }

    pub fn max_price(&self) -> f64 {
        self.max_price
    }
}

impl TryFrom<SearchRequest> for SearchCriteria {
    type Error = ValidationError;

    fn try_from(request: SearchRequest) -> Result<Self, Self::Error> {
        SearchCriteria::new(
            request.location,
            request.guest_number,
            request.start,
            request.end,
            request.min_price,
            request.max_price,
        )
    }
}

// An accommodation that passed the structural and price filters, pending
// availability confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub accommodation: Accommodation,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: AccommodationId,
    pub host_id: String,
    pub name: String,
    pub location: String,
    pub main_photo: String,
    pub rating: f32,
    pub total_price: f64,
    pub unit_price: f64,
    pub price_type: String,
}

/// Keeps accommodations at the requested location that fit the guest count
/// and whose stay total lies in `[min_price, max_price]`. Input order is kept.
pub fn filter_candidates<I>(accommodations: I, criteria: &SearchCriteria) -> Vec<Candidate>
where
    I: IntoIterator<Item = Accommodation>,
{
    accommodations
        .into_iter()
        .filter(|a| {
            a.location == criteria.location && a.guest_capacity.admits(criteria.guest_count)
        })
        .filter_map(|accommodation| {
            let total_price = compute_stay_total(
                &accommodation,
                criteria.start,
                criteria.end,
                criteria.guest_count,
            );
            (criteria.min_price <= total_price && total_price <= criteria.max_price).then_some(
                Candidate {
                    accommodation,
                    total_price,
                },
            )
        })
        .collect()
}

/// Keeps the candidates the availability oracle confirmed, in candidate order.
///
/// Every reported identifier must be well formed and belong to a candidate;
/// anything else fails the whole search.
pub fn reconcile(
    candidates: Vec<Candidate>,
    available_ids: &[String],
) -> Result<Vec<Candidate>, SearchError> {
    let candidate_ids: HashSet<&AccommodationId> =
        candidates.iter().map(|c| &c.accommodation.id).collect();

    let mut available = HashSet::with_capacity(available_ids.len());
    for raw in available_ids {
        let id = AccommodationId::parse(raw).map_err(|_| {
            SearchError::OracleMalformedResponse(format!("invalid identifier {:?}", raw))
        })?;
        if !candidate_ids.contains(&id) {
            return Err(SearchError::OracleMalformedResponse(format!(
                "identifier {} was not requested",
                id
            )));
        }
        available.insert(id);
    }

    Ok(candidates
        .into_iter()
        .filter(|c| available.contains(&c.accommodation.id))
        .collect())
}

pub fn assemble(accommodation: &Accommodation, total_price: f64) -> SearchResult {
    SearchResult {
        id: accommodation.id.clone(),
        host_id: accommodation.host_id.clone(),
        name: accommodation.name.clone(),
        location: accommodation.location.clone(),
        main_photo: accommodation.main_photo.clone(),
        rating: accommodation.rating,
        total_price,
        unit_price: accommodation.default_price.price,
        price_type: accommodation.default_price.pricing_mode.label().to_string(),
    }
}

// Per-request metadata
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub correlation_id: String,
    pub deadline: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct SearchStats {
    searches_total: AtomicUsize,
    searches_succeeded: AtomicUsize,
    searches_failed: AtomicUsize,
    searches_rejected: AtomicUsize,
    oracle_calls: AtomicUsize,
    candidates_seen: AtomicUsize,
    results_returned: AtomicUsize,
    total_latency_us: AtomicU64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchStatsReport {
    pub searches_total: usize,
    pub searches_succeeded: usize,
    pub searches_failed: usize,
    pub searches_rejected: usize,
    pub oracle_calls: usize,
    pub candidates_seen: usize,
    pub results_returned: usize,
    pub average_latency_ms: f64,
}

pub struct SearchService<S, O> {
    store: Arc<S>,
    oracle: Arc<O>,
    settings: SearchSettings,
    stats: SearchStats,
}

impl<S: AccommodationStore, O: AvailabilityOracle> SearchService<S, O> {
    pub fn new(store: Arc<S>, oracle: Arc<O>, settings: SearchSettings) -> Self {
        Self {
            store,
            oracle,
            settings,
            stats: SearchStats::default(),
        }
    }

    /// Validates the request, then runs filter -> availability -> assembly.
    ///
    /// Either every result is confirmed available or the search fails.
    #[instrument(
        skip(self, request, ctx),
        fields(correlation_id = %ctx.correlation_id, location = %request.location)
    )]
    pub async fn search(
        &self,
        request: SearchRequest,
        ctx: &RequestContext,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let started = Instant::now();
        self.stats.searches_total.fetch_add(1, Ordering::SeqCst);

        let criteria = match SearchCriteria::try_from(request) {
            Ok(criteria) => criteria,
            Err(err) => {
                warn!(error = %err, "Rejected search request");
                self.stats.searches_rejected.fetch_add(1, Ordering::SeqCst);
                return Err(err.into());
            }
        };

        let result = self.run(&criteria, ctx).await;

        self.stats
            .total_latency_us
            .fetch_add(started.elapsed().as_micros() as u64, Ordering::SeqCst);
        match &result {
            Ok(results) => {
                self.stats.searches_succeeded.fetch_add(1, Ordering::SeqCst);
                self.stats
                    .results_returned
                    .fetch_add(results.len(), Ordering::SeqCst);
                info!(results = results.len(), "Search completed");
            }
            Err(err) => {
                self.stats.searches_failed.fetch_add(1, Ordering::SeqCst);
                warn!(error = %err, "Search failed");
            }
        }
        result
    }

    async fn run(
        &self,
        criteria: &SearchCriteria,
        ctx: &RequestContext,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let stored = self
            .store
            .find_by_location_and_capacity(criteria.location(), criteria.guest_count())
            .await?;

        let candidates = filter_candidates(stored, criteria);
        self.stats
            .candidates_seen
            .fetch_add(candidates.len(), Ordering::SeqCst);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<AccommodationId> = candidates
            .iter()
            .map(|c| c.accommodation.id.clone())
            .collect();
        let timeout = self.oracle_timeout(ctx);
        // tokio's timeout polls once before checking, so an exhausted budget
        // has to stop here
        if timeout.is_zero() {
            return Err(SearchError::OracleTimeout(0));
        }

        self.stats.oracle_calls.fetch_add(1, Ordering::SeqCst);
        let available = tokio::time::timeout(
            timeout,
            self.oracle
                .filter_available(&ids, criteria.start(), criteria.end()),
        )
        .await
        .map_err(|_| SearchError::OracleTimeout(timeout.as_millis() as u64))?
        .map_err(|err| match err {
            OracleError::Timeout(ms) => SearchError::OracleTimeout(ms),
            other => SearchError::OracleUnavailable(other),
        })?;

        let confirmed = reconcile(candidates, &available)?;
        Ok(confirmed
            .iter()
            .map(|c| assemble(&c.accommodation, c.total_price))
            .collect())
    }

    // Host listing priced at the default nightly rate
    pub async fn list_by_host(&self, host_id: &str) -> Result<Vec<SearchResult>, SearchError> {
        let accommodations = self.store.list_by_host(host_id).await?;
        Ok(accommodations
            .iter()
            .map(|a| assemble(a, a.default_price.price))
            .collect())
    }

    fn oracle_timeout(&self, ctx: &RequestContext) -> Duration {
        let configured = self.settings.oracle_timeout();
        ctx.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(configured, |remaining| remaining.min(configured))
    }

    pub fn stats(&self) -> SearchStatsReport {
        let total = self.stats.searches_total.load(Ordering::SeqCst);
        let rejected = self.stats.searches_rejected.load(Ordering::SeqCst);
        let executed = total.saturating_sub(rejected);
        let latency_us = self.stats.total_latency_us.load(Ordering::SeqCst);

        SearchStatsReport {
            searches_total: total,
            searches_succeeded: self.stats.searches_succeeded.load(Ordering::SeqCst),
            searches_failed: self.stats.searches_failed.load(Ordering::SeqCst),
            searches_rejected: rejected,
            oracle_calls: self.stats.oracle_calls.load(Ordering::SeqCst),
            candidates_seen: self.stats.candidates_seen.load(Ordering::SeqCst),
            results_returned: self.stats.results_returned.load(Ordering::SeqCst),
            average_latency_ms: if executed == 0 {
                0.0
            } else {
                latency_us as f64 / executed as f64 / 1000.0
            },
        }
    }
}
