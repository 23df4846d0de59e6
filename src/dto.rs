// Inbound accommodation registration payload and its mapping to the model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;
use crate::model::{
    Accommodation, AccommodationId, DateRange, DefaultPrice, GuestCapacity, SpecialPrice,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialPriceDto {
    pub price: f64,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationDto {
    pub accommodation_id: String,
    #[serde(default)]
    pub host_id: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub main_photo: String,
    pub min_guest_number: i64,
    pub max_guest_number: i64,
    pub default_price: f64,
    pub price_type: String,
    #[serde(default)]
    pub special_price: Vec<SpecialPriceDto>,
}

// Accepts RFC3339 timestamps (taken in UTC) or plain YYYY-MM-DD dates
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

// Entries with unparseable dates are skipped
pub fn map_special_prices(prices: &[SpecialPriceDto]) -> Vec<SpecialPrice> {
    prices
        .iter()
        .filter_map(|dto| match (parse_date(&dto.start_date), parse_date(&dto.end_date)) {
            (Some(start), Some(end)) => Some(SpecialPrice {
                price: dto.price,
                date_range: DateRange::new(start, end),
            }),
            _ => {
                warn!(
                    start = %dto.start_date,
                    end = %dto.end_date,
                    "Skipping special price with unparseable dates"
                );
                None
            }
        })
        .collect()
}

fn capacity(min: i64, max: i64) -> Result<GuestCapacity, ValidationError> {
    let invalid = || ValidationError::InvalidCapacity { min, max };
    let min = u32::try_from(min).map_err(|_| invalid())?;
    let max = u32::try_from(max).map_err(|_| invalid())?;
    GuestCapacity::new(min, max)
}

impl TryFrom<AccommodationDto> for Accommodation {
    type Error = ValidationError;

    fn try_from(dto: AccommodationDto) -> Result<Self, Self::Error> {
        if !(dto.default_price >= 0.0) {
            return Err(ValidationError::NegativePrice(dto.default_price));
        }

        Ok(Accommodation {
            id: AccommodationId::parse(&dto.accommodation_id)?,
            guest_capacity: capacity(dto.min_guest_number, dto.max_guest_number)?,
            default_price: DefaultPrice {
                price: dto.default_price,
                pricing_mode: dto.price_type.parse()?,
            },
            special_prices: map_special_prices(&dto.special_price),
            host_id: dto.host_id,
            name: dto.name,
            location: dto.location,
            main_photo: dto.main_photo,
            rating: 0.0,
        })
    }
}
