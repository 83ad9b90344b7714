use chrono_tz::Tz;
use criterion::{criterion_group, criterion_main, Criterion};
use smart_display_api::models::ForecastEntry;
use smart_display_api::services::rain::{
    aggregate_today_probability, compute_rain_periods, DEFAULT_RAIN_THRESHOLD,
};
use std::hint::black_box;

/// Five days of 3-hour slots with an alternating wet/dry pattern.
fn five_day_forecast() -> Vec<ForecastEntry> {
    let start = 1_777_852_800; // 2026-05-04T00:00:00Z
    (0..40)
        .map(|i| {
            let chance = match i % 5 {
                0 | 1 => 0.7,
                2 => 0.35,
                _ => 0.1,
            };
            ForecastEntry::new(start + i * 3 * 3600, chance).expect("valid chance")
        })
        .collect()
}

fn benchmark_rain_aggregation(c: &mut Criterion) {
    let entries = five_day_forecast();
    let tz: Tz = "Europe/Berlin".parse().expect("valid timezone");

    let mut group = c.benchmark_group("rain_aggregation");

    group.bench_function("aggregate_today_probability", |b| {
        b.iter(|| aggregate_today_probability(black_box(&entries)))
    });

    group.bench_function("compute_rain_periods", |b| {
        b.iter(|| compute_rain_periods(black_box(&entries), DEFAULT_RAIN_THRESHOLD, &tz))
    });

    group.finish();
}

criterion_group!(benches, benchmark_rain_aggregation);
criterion_main!(benches);
