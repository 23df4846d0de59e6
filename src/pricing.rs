// Nightly price resolution and stay cost aggregation
//
// Everything here is a pure function of its inputs.

use chrono::NaiveDate;

use crate::model::{Accommodation, SpecialPrice};

/// Price for a single night.
///
/// Special prices are scanned in storage order and the first interval covering
/// `date` (half-open `[start, end)`) wins. Falls back to `default_price`.
pub fn resolve_nightly_price(
    date: NaiveDate,
    default_price: f64,
    special_prices: &[SpecialPrice],
) -> f64 {
    special_prices
        .iter()
        .find(|special| special.date_range.contains(date))
        .map_or(default_price, |special| special.price)
}

/// Whole nights between two dates, zero when `end <= start`.
pub fn nights_between(start: NaiveDate, end: NaiveDate) -> u32 {
    u32::try_from((end - start).num_days()).unwrap_or(0)
}

/// Total price of a stay from `start` (first night) up to `end` (checkout day).
pub fn compute_stay_total(
    accommodation: &Accommodation,
    start: NaiveDate,
    end: NaiveDate,
    guest_count: u32,
) -> f64 {
    let nights = nights_between(start, end) as usize;
    let multiplier = accommodation
        .default_price
        .pricing_mode
        .guest_multiplier(guest_count);

    start
        .iter_days()
        .take(nights)
        .map(|night| {
            resolve_nightly_price(
                night,
                accommodation.default_price.price,
                &accommodation.special_prices,
            ) * multiplier
        })
        .sum()
}
