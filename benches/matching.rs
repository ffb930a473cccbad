use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use tally_sync::{
    columns::{CanonicalColumns, ColumnMapping},
    config::{AmbiguityPolicy, KeyColumns},
    data::{CellValue, Table},
    differ::{diff_matches, shared_columns},
    matcher::RowMatcher,
};

const SUBJECTS: [&str; 6] = ["CS", "MA", "PH", "EN", "HI", "BI"];
const DAYS: [&str; 4] = ["M W", "TR", "MWF", "F"];

fn headers() -> Vec<String> {
    ["Subj", "Crs No", "Sec", "Days", "Room", "Instructor", "Enrolled"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

fn generate_schedule(rows: usize, room_offset: usize) -> Table {
    let data = (0..rows)
        .map(|i| {
            vec![
                CellValue::text(SUBJECTS[i % SUBJECTS.len()]),
                CellValue::Number((100 + i / 24) as f64),
                CellValue::Number((i % 4 + 1) as f64),
                CellValue::text(DAYS[(i / 4) % DAYS.len()]),
                CellValue::Number(((i + room_offset) % 400) as f64),
                CellValue::text(format!("Instructor {}", i % 97)),
                CellValue::Number((i % 40) as f64),
            ]
        })
        .collect();
    Table::new(headers(), data)
}

fn bench_matching(c: &mut Criterion) {
    let tally = generate_schedule(20_000, 0);
    let target = generate_schedule(20_000, 7);
    let tally_columns = CanonicalColumns::from_headers(tally.headers());
    let target_columns = CanonicalColumns::from_headers(target.headers());
    let keys = KeyColumns::default();

    let mut group = c.benchmark_group("reconcile_plan");

    group.bench_function("match_rows", |b| {
        b.iter(|| {
            RowMatcher::new(
                &tally,
                &tally_columns,
                &target,
                &target_columns,
                &keys,
                AmbiguityPolicy::FirstMatch,
            )
            .expect("key columns present")
            .run()
        });
    });

    group.bench_function("match_and_diff", |b| {
        b.iter_batched(
            || ColumnMapping::build(&tally_columns, &target_columns),
            |mapping| {
                let outcome = RowMatcher::new(
                    &tally,
                    &tally_columns,
                    &target,
                    &target_columns,
                    &keys,
                    AmbiguityPolicy::FirstMatch,
                )
                .expect("key columns present")
                .run();
                let columns = shared_columns(&mapping, &tally_columns, &target_columns, &keys);
                diff_matches(&tally, &target, &outcome.pairs, &columns)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
