use accommodation_search::config::SearchSettings;
use accommodation_search::model::{
    Accommodation, AccommodationId, DateRange, DefaultPrice, GuestCapacity, PricingMode,
    SpecialPrice,
};
use accommodation_search::search::{
    filter_candidates, RequestContext, SearchCriteria, SearchRequest,
};
use accommodation_search::{InMemoryAccommodationStore, InMemoryAvailabilityOracle, SearchService};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{thread_rng, Rng};
use std::sync::Arc;

const LOCATIONS: [&str; 4] = ["Tropical Paradise", "Mountain Retreat", "City Centre", "Lake Side"];

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

// Random inventory with a few overlapping special prices per accommodation
fn inventory(count: usize) -> Vec<Accommodation> {
    let mut rng = thread_rng();
    (0..count)
        .map(|i| {
            let min = rng.gen_range(1..=3);
            let special_prices = (0..rng.gen_range(0..4))
                .map(|_| {
                    let start = rng.gen_range(1..25);
                    SpecialPrice {
                        price: rng.gen_range(40.0..400.0),
                        date_range: DateRange::new(date(start), date(start + rng.gen_range(1..5))),
                    }
                })
                .collect();

            Accommodation {
                id: AccommodationId::generate(),
                host_id: format!("host{}", i % 50),
                name: format!("accommodation{}", i),
                location: LOCATIONS[i % LOCATIONS.len()].to_string(),
                main_photo: format!("photo{}.jpg", i),
                rating: rng.gen_range(1.0..5.0),
                guest_capacity: GuestCapacity {
                    min,
                    max: min + rng.gen_range(0..5),
                },
                default_price: DefaultPrice {
                    price: rng.gen_range(30.0..300.0),
                    pricing_mode: if rng.gen_bool(0.5) {
                        PricingMode::PerUnit
                    } else {
                        PricingMode::PerGuest
                    },
                },
                special_prices,
            }
        })
        .collect()
}

pub fn search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("accommodation_search");
    let criteria =
        SearchCriteria::new("Tropical Paradise", 2, date(1), date(15), 0.0, 5000.0).unwrap();

    for size in [100, 1_000, 10_000].iter() {
        let accommodations = inventory(*size);

        group.bench_with_input(BenchmarkId::new("filter_candidates", size), size, |b, _| {
            b.iter(|| black_box(filter_candidates(accommodations.clone(), &criteria)))
        });

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let oracle = Arc::new(InMemoryAvailabilityOracle::new());
        for accommodation in accommodations.iter().step_by(3) {
            oracle.book(&accommodation.id, DateRange::new(date(5), date(8)));
        }
        let service = SearchService::new(
            Arc::new(InMemoryAccommodationStore::with_accommodations(accommodations.clone())),
            oracle,
            SearchSettings::default(),
        );
        let request = SearchRequest {
            location: "Tropical Paradise".to_string(),
            guest_number: 2,
            start: date(1),
            end: date(15),
            min_price: 0.0,
            max_price: 5000.0,
        };

        group.bench_with_input(BenchmarkId::new("search_pipeline", size), size, |b, _| {
            b.iter(|| {
                let results = runtime
                    .block_on(service.search(request.clone(), &RequestContext::default()))
                    .unwrap();
                black_box(results)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, search_benchmark);
criterion_main!(benches);
