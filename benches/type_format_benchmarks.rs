//! Type formatting and definition parsing benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pgschema::datatype::{get_full_type, parse_length_precision, parse_type_name};
use pgschema::rule::parse_rule_definition;
use pgschema::Row;
use serde_json::json;
use std::time::Duration;

const FORMAT_CASES: &[(&str, u32, i32)] = &[
    ("numeric", 0, 655_366),
    ("character varying", 1, 54),
    ("timestamp with time zone", 0, 3),
    ("\"char\"", 0, -1),
    ("interval", 0, 0x7fff_ffff),
    ("integer", 0, -1),
];

fn bench_get_full_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_full_type");
    for (name, dims, typmod) in FORMAT_CASES {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| get_full_type(Some("pg_catalog"), black_box(name), *dims, *typmod));
        });
    }
    group.finish();
}

fn bench_parse_type_name(c: &mut Criterion) {
    let displayed: Vec<String> = FORMAT_CASES
        .iter()
        .map(|(name, dims, typmod)| get_full_type(Some("pg_catalog"), name, *dims, *typmod))
        .collect();

    c.bench_function("parse_type_name", |b| {
        b.iter(|| {
            for full in &displayed {
                black_box(parse_type_name(full));
                black_box(parse_length_precision(full, true, true));
            }
        });
    });
}

fn bench_rule_definition(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_rule_definition");
    for actions in [1usize, 10, 100] {
        let body = (0..actions)
            .map(|i| format!(" INSERT INTO log VALUES ({i}, old.a);"))
            .collect::<String>();
        let mut row = Row::new();
        row.insert(
            "definition".to_string(),
            json!(format!(
                "CREATE RULE r AS\n    ON UPDATE TO public.t\n   WHERE (old.a <> new.a) DO INSTEAD ({body}\n);"
            )),
        );
        row.insert("ev_type".to_string(), json!(2));
        row.insert("is_instead".to_string(), json!(true));
        let rows = vec![row];

        group.bench_with_input(BenchmarkId::from_parameter(actions), &rows, |b, rows| {
            b.iter(|| parse_rule_definition(black_box(rows)));
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_get_full_type, bench_parse_type_name, bench_rule_definition
}
criterion_main!(benches);
