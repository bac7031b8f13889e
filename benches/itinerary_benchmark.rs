use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use globetrotter::{
    assemble_itinerary, Activity, Pace, PublicProfile, TripPreferences, TripStore,
};
use rand::{seq::SliceRandom, thread_rng, Rng};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;

const CATEGORIES: [&str; 5] = ["Food & Dining", "Attraction", "Activity", "Shopping", "Hidden Gem"];

fn preferences(days: i64) -> TripPreferences {
    let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    TripPreferences {
        trip_name: "Benchmark Trip".to_string(),
        start_date: start,
        end_date: start + Duration::days(days - 1),
        locations: "Japan".to_string(),
        interests: "Food, Temples".to_string(),
        pace: Pace::Normal,
        budget_per_person: 4000.0,
        num_travelers: 2,
        must_visits: "Kyoto".to_string(),
        description: String::new(),
        cover_photo_url: String::new(),
    }
}

// A model reply with `days` days of `per_day` activities each
fn model_reply(start: NaiveDate, days: i64, per_day: u32) -> String {
    let mut rng = thread_rng();
    let days: Vec<Value> = (0..days)
        .map(|d| {
            let activities: Vec<Value> = (0..per_day)
                .map(|a| {
                    let hour = 8 + a % 12;
                    json!({
                        "title": format!("Stop {}-{}", d, a),
                        "start_time": format!("{:02}:00", hour),
                        "end_time": format!("{:02}:45", hour),
                        "duration_minutes": 45,
                        "cost": rng.gen_range(0.0..150.0),
                        "currency": "USD",
                        "location": "Kyoto",
                        "notes": "Arrive early.",
                        "confidence": "medium",
                        "category": CATEGORIES.choose(&mut rng).copied().unwrap_or("Other")
                    })
                })
                .collect();
            json!({
                "date": (start + Duration::days(d)).format("%Y-%m-%d").to_string(),
                "day_summary": format!("Day {}", d + 1),
                "activities": activities
            })
        })
        .collect();

    json!({
        "trip_name": "Benchmark Trip",
        "est_total_cost": 3200.0,
        "currency": "USD",
        "days": days
    })
    .to_string()
}

pub fn assemble_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble_itinerary");

    for days in [3i64, 14, 30].iter() {
        let prefs = preferences(*days);
        let reply = model_reply(prefs.start_date, *days, 6);
        group.bench_with_input(BenchmarkId::from_parameter(days), &reply, |b, reply| {
            b.iter(|| {
                let itinerary =
                    assemble_itinerary(&prefs, PublicProfile::anonymous(), black_box(reply))
                        .unwrap();
                black_box(itinerary.activity_count())
            });
        });
    }

    group.finish();
}

pub fn trip_store_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("trip_store");

    for trips in [10usize, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(trips), trips, |b, &trips| {
            b.iter(|| {
                let store = Arc::new(TripStore::new());
                let prefs = preferences(7);
                let reply = model_reply(prefs.start_date, 7, 4);
                let mut ids = Vec::with_capacity(trips);
                for _ in 0..trips {
                    let trip =
                        assemble_itinerary(&prefs, PublicProfile::anonymous(), &reply).unwrap();
                    ids.push((trip.id.clone(), trip.days[0].id.clone()));
                    store.save(trip);
                }
                let ids = Arc::new(ids);

                // Concurrent readers and activity editors
                let mut handles = vec![];
                for _ in 0..4 {
                    let store = Arc::clone(&store);
                    let ids = Arc::clone(&ids);
                    handles.push(thread::spawn(move || {
                        let mut rng = thread_rng();
                        for _ in 0..250 {
                            let (trip_id, day_id) = ids.choose(&mut rng).unwrap();
                            if rng.gen_bool(0.8) {
                                black_box(store.get(trip_id));
                            } else {
                                let _ = store.upsert_activity(trip_id, day_id, Activity::new_default());
                            }
                        }
                    }));
                }
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(store.list().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, assemble_benchmark, trip_store_benchmark);
criterion_main!(benches);
