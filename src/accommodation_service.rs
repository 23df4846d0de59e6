// Host-facing write side of the search index

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::dto::{map_special_prices, AccommodationDto, SpecialPriceDto};
use crate::error::{AccommodationError, ValidationError};
use crate::model::{overlapping_special_prices, Accommodation, AccommodationId, SpecialPrice};
use crate::store::AccommodationStore;

pub struct AccommodationService<S> {
    store: Arc<S>,
}

// Overlaps are stored as given; the first interval in storage order wins
fn flag_overlaps(id: &AccommodationId, prices: &[SpecialPrice]) {
    let overlaps = overlapping_special_prices(prices);
    if !overlaps.is_empty() {
        warn!(
            accommodation_id = %id,
            overlaps = ?overlaps,
            "Overlapping special prices, earliest stored interval takes precedence"
        );
    }
}

impl<S: AccommodationStore> AccommodationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, dto), fields(accommodation_id = %dto.accommodation_id))]
    pub async fn add(&self, dto: AccommodationDto) -> Result<AccommodationId, AccommodationError> {
        let accommodation = Accommodation::try_from(dto)?;
        let id = accommodation.id.clone();
        flag_overlaps(&id, &accommodation.special_prices);

        self.store.insert(accommodation).await?;
        info!("Accommodation added");
        Ok(id)
    }

    #[instrument(skip(self, dto), fields(accommodation_id = %dto.accommodation_id))]
    pub async fn edit(&self, dto: AccommodationDto) -> Result<(), AccommodationError> {
        let accommodation = Accommodation::try_from(dto)?;
        self.store.update(accommodation).await?;
        info!("Accommodation edited");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AccommodationError> {
        let id = AccommodationId::parse(id)?;
        self.store.delete(&id).await?;
        info!("Accommodation deleted");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Accommodation, AccommodationError> {
        let id = AccommodationId::parse(id)?;
        Ok(self.store.get(&id).await?)
    }

    pub async fn get_all(&self) -> Result<Vec<Accommodation>, AccommodationError> {
        Ok(self.store.get_all().await?)
    }

    pub async fn list_by_host(
        &self,
        host_id: &str,
    ) -> Result<Vec<Accommodation>, AccommodationError> {
        Ok(self.store.list_by_host(host_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_default_price(
        &self,
        id: &str,
        price: f64,
    ) -> Result<(), AccommodationError> {
        if !(price >= 0.0) {
            return Err(ValidationError::NegativePrice(price).into());
        }
        let id = AccommodationId::parse(id)?;
        self.store.update_default_price(&id, price).await?;
        Ok(())
    }

    #[instrument(skip(self, prices), fields(count = prices.len()))]
    pub async fn update_special_prices(
        &self,
        id: &str,
        prices: &[SpecialPriceDto],
    ) -> Result<(), AccommodationError> {
        let id = AccommodationId::parse(id)?;
        let mapped = map_special_prices(prices);
        if let Some(negative) = mapped.iter().find(|p| !(p.price >= 0.0)) {
            return Err(ValidationError::NegativePrice(negative.price).into());
        }
        flag_overlaps(&id, &mapped);

        self.store.update_special_prices(&id, mapped).await?;
        Ok(())
    }

    pub async fn special_prices(&self, id: &str) -> Result<Vec<SpecialPrice>, AccommodationError> {
        Ok(self.get(id).await?.special_prices)
    }
}
