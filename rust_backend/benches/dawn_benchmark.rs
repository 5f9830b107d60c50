use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dawn_calendar::config::CalendarConfig;
use dawn_calendar::core::{Location, ReferenceData};
use dawn_calendar::services::{CalendarEngine, DawnSearch, TwilightResolver};

const SYNODIC_DAYS: f64 = 29.530588;

fn config() -> CalendarConfig {
    CalendarConfig::default()
}

fn reference() -> ReferenceData {
    let base = Utc.with_ymd_and_hms(2023, 1, 6, 23, 8, 0).unwrap();
    let moons: Vec<_> = (0..40)
        .map(|i| base + Duration::milliseconds((i as f64 * SYNODIC_DAYS * 86_400_000.0) as i64))
        .collect();
    let new_years = vec![moons[2], moons[15], moons[27], moons[39]];
    ReferenceData::from_instants(moons, new_years).unwrap()
}

fn bench_resolve_dawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_dawn");
    let resolver = TwilightResolver::from_config(&config());
    let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();

    let cases = [
        ("london", Location::new(51.5074, -0.1278, "Europe/London").unwrap()),
        ("reykjavik", Location::new(64.1466, -21.9426, "Atlantic/Reykjavik").unwrap()),
        ("tromso", Location::new(69.6492, 18.9553, "Europe/Oslo").unwrap()),
    ];
    for (name, location) in &cases {
        group.bench_with_input(BenchmarkId::new("midsummer", name), location, |b, loc| {
            b.iter(|| resolver.resolve_dawn(black_box(loc), black_box(date)));
        });
    }

    group.finish();
}

fn bench_count_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("dawn_cycles");
    let config = config();
    let search = DawnSearch::new(TwilightResolver::from_config(&config), config.search);
    let location = Location::new(51.5074, -0.1278, "Europe/London").unwrap();
    let t = Utc.with_ymd_and_hms(2024, 1, 11, 11, 27, 0).unwrap();

    group.bench_function("first_dawn_after", |b| {
        b.iter(|| search.first_dawn_after(black_box(t), &location));
    });

    let start = search.first_dawn_after(t, &location).unwrap().unwrap();
    let end = search
        .first_dawn_after(t + Duration::days(29), &location)
        .unwrap()
        .unwrap();
    group.bench_function("count_one_month", |b| {
        b.iter(|| search.count_dawn_cycles(black_box(&start), black_box(&end), &location));
    });

    group.finish();
}

fn bench_build_year(c: &mut Criterion) {
    let mut group = c.benchmark_group("calendar");
    group.sample_size(10);

    let engine = CalendarEngine::from_config(Arc::new(reference()), &config());
    let location = Location::new(51.5074, -0.1278, "Europe/London").unwrap();
    group.bench_function("build_year_2024", |b| {
        b.iter(|| engine.build_multi_year_calendar(black_box(2024), black_box(2024), &location));
    });

    group.finish();
}

criterion_group!(benches, bench_resolve_dawn, bench_count_cycles, bench_build_year);
criterion_main!(benches);
