// Accommodation storage capability and its in-memory implementation

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::model::{Accommodation, AccommodationId, SpecialPrice};

// Storage surface the services depend on
#[async_trait]
pub trait AccommodationStore: Send + Sync + 'static {
    async fn get(&self, id: &AccommodationId) -> Result<Accommodation, StoreError>;

    // Full scan in storage order
    async fn get_all(&self) -> Result<Vec<Accommodation>, StoreError>;

    // Exact location match with `min <= guest_count <= max`, storage order kept
    async fn find_by_location_and_capacity(
        &self,
        location: &str,
        guest_count: u32,
    ) -> Result<Vec<Accommodation>, StoreError>;

    async fn list_by_host(&self, host_id: &str) -> Result<Vec<Accommodation>, StoreError>;

    async fn insert(&self, accommodation: Accommodation) -> Result<(), StoreError>;

    // Replaces the descriptive fields (name, location, photo, capacity, default
    // price); rating, host and special prices are left untouched
    async fn update(&self, accommodation: Accommodation) -> Result<(), StoreError>;

    async fn delete(&self, id: &AccommodationId) -> Result<(), StoreError>;

    async fn update_rating(&self, id: &AccommodationId, rating: f32) -> Result<(), StoreError>;

    async fn update_default_price(
        &self,
        id: &AccommodationId,
        price: f64,
    ) -> Result<(), StoreError>;

    async fn update_special_prices(
        &self,
        id: &AccommodationId,
        special_prices: Vec<SpecialPrice>,
    ) -> Result<(), StoreError>;
}

/// Vector-backed store; insertion order is the scan order.
///
/// Every read clones records under the lock, so a reader sees each record
/// either entirely before or entirely after a concurrent write.
#[derive(Debug, Default)]
pub struct InMemoryAccommodationStore {
    accommodations: RwLock<Vec<Accommodation>>,
}

impl InMemoryAccommodationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accommodations(accommodations: Vec<Accommodation>) -> Self {
        Self {
            accommodations: RwLock::new(accommodations),
        }
    }

    pub fn len(&self) -> usize {
        self.accommodations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accommodations.read().is_empty()
    }

    fn modify<F>(&self, id: &AccommodationId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Accommodation),
    {
        let mut accommodations = self.accommodations.write();
        let accommodation = accommodations
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        apply(accommodation);
        Ok(())
    }

    fn select<P>(&self, predicate: P) -> Vec<Accommodation>
    where
        P: Fn(&Accommodation) -> bool,
    {
        self.accommodations
            .read()
            .iter()
            .filter(|a| predicate(a))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AccommodationStore for InMemoryAccommodationStore {
    async fn get(&self, id: &AccommodationId) -> Result<Accommodation, StoreError> {
        self.accommodations
            .read()
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_all(&self) -> Result<Vec<Accommodation>, StoreError> {
        Ok(self.accommodations.read().clone())
    }

    async fn find_by_location_and_capacity(
        &self,
        location: &str,
        guest_count: u32,
    ) -> Result<Vec<Accommodation>, StoreError> {
        Ok(self.select(|a| a.location == location && a.guest_capacity.admits(guest_count)))
    }

    async fn list_by_host(&self, host_id: &str) -> Result<Vec<Accommodation>, StoreError> {
        Ok(self.select(|a| a.host_id == host_id))
    }

    async fn insert(&self, accommodation: Accommodation) -> Result<(), StoreError> {
        let mut accommodations = self.accommodations.write();
        if accommodations.iter().any(|a| a.id == accommodation.id) {
            return Err(StoreError::AlreadyExists(accommodation.id.to_string()));
        }
        accommodations.push(accommodation);
        Ok(())
    }

    async fn update(&self, accommodation: Accommodation) -> Result<(), StoreError> {
        let id = accommodation.id.clone();
        self.modify(&id, move |existing| {
            existing.name = accommodation.name;
            existing.location = accommodation.location;
            existing.main_photo = accommodation.main_photo;
            existing.guest_capacity = accommodation.guest_capacity;
            existing.default_price = accommodation.default_price;
        })
    }

    async fn delete(&self, id: &AccommodationId) -> Result<(), StoreError> {
        let mut accommodations = self.accommodations.write();
        let before = accommodations.len();
        accommodations.retain(|a| &a.id != id);
        if accommodations.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn update_rating(&self, id: &AccommodationId, rating: f32) -> Result<(), StoreError> {
        self.modify(id, |a| a.rating = rating)
    }

    async fn update_default_price(
        &self,
        id: &AccommodationId,
        price: f64,
    ) -> Result<(), StoreError> {
        self.modify(id, |a| a.default_price.price = price)
    }

    async fn update_special_prices(
        &self,
        id: &AccommodationId,
        special_prices: Vec<SpecialPrice>,
    ) -> Result<(), StoreError> {
        self.modify(id, move |a| a.special_prices = special_prices)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::*;
    use chrono::NaiveDate;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn accommodation(
        id: &str,
        location: &str,
        capacity: (u32, u32),
        price: f64,
        mode: PricingMode,
    ) -> Accommodation {
        Accommodation {
            id: AccommodationId::parse(id).unwrap(),
            host_id: "host-1".to_string(),
            name: format!("Accommodation {}", &id[id.len() - 4..]),
            location: location.to_string(),
            main_photo: "photo.jpg".to_string(),
            rating: 0.0,
            guest_capacity: GuestCapacity {
                min: capacity.0,
                max: capacity.1,
            },
            default_price: DefaultPrice {
                price,
                pricing_mode: mode,
            },
            special_prices: Vec::new(),
        }
    }
}
