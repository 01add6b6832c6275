use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use statmerge::defaults::health_job;
use statmerge::merge::{merge_tables, GroupBy};
use statmerge::table::{CompositeKey, LoadedTable, Record};

const STATUSES: [&str; 3] = [
    "Fair (not good, not bad) health",
    "Good/very good health",
    "Bad/very bad health",
];

fn row(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}

/// 200 countries over 30 years, every key present on both sides.
fn synthetic_tables() -> (LoadedTable, LoadedTable) {
    let mut expenditure = LoadedTable::new();
    let mut status = LoadedTable::new();
    for country in 0..200 {
        let country = format!("Country {country}");
        for year in 1990..2020 {
            let year = year.to_string();
            expenditure.insert_row(
                CompositeKey::new(&country, &year),
                None,
                row(&[
                    ("Reference area", &country),
                    ("TIME_PERIOD", &year),
                    ("OBS_VALUE", "10.5"),
                ]),
            );
            for health_status in STATUSES {
                status.insert_row(
                    CompositeKey::new(&country, &year),
                    Some(health_status.to_string()),
                    row(&[
                        ("Reference area", &country),
                        ("TIME_PERIOD", &year),
                        ("Health status", health_status),
                        ("OBS_VALUE", "33.3"),
                    ]),
                );
            }
        }
    }
    (expenditure, status)
}

fn merge_tables_benchmark(c: &mut Criterion) {
    let job = health_job();
    let (expenditure, status) = synthetic_tables();

    c.bench_function("merge health tables by year", |b| {
        b.iter(|| {
            merge_tables(
                black_box(&expenditure),
                black_box(&status),
                &job.left.rename,
                &job.right.rename,
                &job.fields,
                GroupBy::Year,
            )
        })
    });
}

criterion_group!(benches, merge_tables_benchmark);
criterion_main!(benches);
