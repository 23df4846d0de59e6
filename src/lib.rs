// Accommodation search service library

pub mod accommodation_service;
pub mod availability;
pub mod config;
pub mod dto;
pub mod error;
pub mod model;
pub mod pricing;
pub mod rating;
pub mod search;
pub mod store;
pub mod telemetry;

// Re-export key types for convenience
pub use accommodation_service::AccommodationService;
pub use availability::{
    AvailabilityOracle, HttpAvailabilityOracle, InMemoryAvailabilityOracle, TracedOracle,
};
pub use config::{OracleConfig, SearchSettings, ServiceConfig};
pub use error::{
    AccommodationError, ConfigError, OracleError, RatingError, SearchError, StoreError,
    ValidationError,
};
pub use model::{
    Accommodation, AccommodationId, DateRange, DefaultPrice, GuestCapacity, PricingMode,
    SpecialPrice,
};
pub use pricing::{compute_stay_total, resolve_nightly_price};
pub use rating::{RatingChange, RatingFeed};
pub use search::{
    assemble, filter_candidates, reconcile, Candidate, RequestContext, SearchCriteria,
    SearchRequest, SearchResult, SearchService, SearchStatsReport,
};
pub use store::{AccommodationStore, InMemoryAccommodationStore};
