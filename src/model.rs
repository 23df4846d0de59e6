// Accommodation data model held by the search index

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

const ID_LEN: usize = 24;

/// Opaque accommodation identifier: 24 lowercase hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccommodationId(String);

impl AccommodationId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.len() != ID_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidId(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn generate() -> Self {
        let bytes: [u8; ID_LEN / 2] = rand::random();
        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccommodationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccommodationId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccommodationId> for String {
    fn from(id: AccommodationId) -> Self {
        id.0
    }
}

impl fmt::Display for AccommodationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// How the nightly rate is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingMode {
    PerUnit,
    PerGuest,
}

impl PricingMode {
    /// Stable label used in search results.
    pub fn label(self) -> &'static str {
        match self {
            PricingMode::PerUnit => "perApartment",
            PricingMode::PerGuest => "perPerson",
        }
    }

    pub fn guest_multiplier(self, guest_count: u32) -> f64 {
        match self {
            PricingMode::PerUnit => 1.0,
            PricingMode::PerGuest => f64::from(guest_count),
        }
    }
}

impl FromStr for PricingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PerApartmentUnit" | "PerUnit" => Ok(PricingMode::PerUnit),
            "PerGuest" => Ok(PricingMode::PerGuest),
            other => Err(ValidationError::InvalidPricingMode(other.to_string())),
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Half-open calendar range [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialPrice {
    pub price: f64,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultPrice {
    pub price: f64,
    pub pricing_mode: PricingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCapacity {
    pub min: u32,
    pub max: u32,
}

impl GuestCapacity {
    pub fn new(min: u32, max: u32) -> Result<Self, ValidationError> {
        if min < 1 || max < min {
            return Err(ValidationError::InvalidCapacity {
                min: i64::from(min),
                max: i64::from(max),
            });
        }
        Ok(Self { min, max })
    }

    pub fn admits(&self, guest_count: u32) -> bool {
        self.min <= guest_count && guest_count <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: AccommodationId,
    pub host_id: String,
    pub name: String,
    pub location: String,
    pub main_photo: String,
    pub rating: f32,
    pub guest_capacity: GuestCapacity,
    pub default_price: DefaultPrice,
    // Storage order matters: the first interval covering a date wins
    #[serde(default)]
    pub special_prices: Vec<SpecialPrice>,
}

/// Index pairs `(i, j)` with `i < j` whose special-price ranges overlap.
///
/// Overlaps are legal but resolved by storage order, so callers surface them
/// as a data-quality concern.
pub fn overlapping_special_prices(prices: &[SpecialPrice]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in prices.iter().enumerate() {
        for (j, b) in prices.iter().enumerate().skip(i + 1) {
            if a.date_range.overlaps(&b.date_range) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}
