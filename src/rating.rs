// Rating change feed: applies externally computed ratings to the search index

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::RatingError;
use crate::model::AccommodationId;
use crate::store::AccommodationStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub accommodation_id: String,
    pub rating: f32,
}

pub fn decode(payload: &[u8]) -> Result<RatingChange, RatingError> {
    let change: RatingChange =
        serde_json::from_slice(payload).map_err(|e| RatingError::Malformed(e.to_string()))?;
    if !change.rating.is_finite() {
        return Err(RatingError::Malformed(format!("rating {}", change.rating)));
    }
    Ok(change)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RatingFeedReport {
    pub applied: usize,
    pub dropped: usize,
}

pub struct RatingFeed<S> {
    store: Arc<S>,
}

impl<S: AccommodationStore> RatingFeed<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // Sets the rating; applying the same change twice is harmless
    pub async fn apply(&self, change: &RatingChange) -> Result<(), RatingError> {
        let id = AccommodationId::parse(&change.accommodation_id)?;
        self.store.update_rating(&id, change.rating).await?;
        Ok(())
    }

    /// Decodes and applies one message. Failures are logged and the message
    /// dropped; returns whether the rating was applied.
    pub async fn handle(&self, payload: &[u8]) -> bool {
        let outcome = match decode(payload) {
            Ok(change) => self.apply(&change).await.map(|_| change),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(change) => {
                debug!(
                    accommodation_id = %change.accommodation_id,
                    rating = change.rating,
                    "Rating updated"
                );
                true
            }
            Err(err) => {
                warn!(error = %err, "Dropping rating change");
                false
            }
        }
    }

    // Consumes messages until the stream ends
    pub async fn run<St>(&self, messages: St) -> RatingFeedReport
    where
        St: Stream<Item = Bytes> + Send,
    {
        let mut report = RatingFeedReport::default();
        let mut messages = Box::pin(messages);
        while let Some(payload) = messages.next().await {
            if self.handle(&payload).await {
                report.applied += 1;
            } else {
                report.dropped += 1;
            }
        }
        report
    }
}
