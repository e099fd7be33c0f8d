use criterion::{criterion_group, criterion_main, Criterion};
use slrgen::grammar::RuleDef;
use std::{env, fs, hint::black_box, path::PathBuf};

criterion_main!(benches);
criterion_group!(benches, bench_arithmetic, bench_larger);

fn bench_arithmetic(c: &mut Criterion) {
    bench_compute(c, "arithmetic");
    bench_compute(c, "arithmetic_paren");
}

fn bench_larger(c: &mut Criterion) {
    bench_compute(c, "ambiguous");
    bench_compute(c, "json");
    bench_compute(c, "statements");
}

fn bench_compute(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let source =
        fs::read_to_string(project_root.join(format!("tests/grammars/{}.json", grammar_name)))
            .unwrap();
    let rules: Vec<RuleDef> = serde_json::from_str(&source).unwrap();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("compute", |b| {
        b.iter(|| black_box(slrgen::compute(&rules).unwrap()));
    });
    group.bench_function("to_output", |b| {
        let tables = slrgen::compute(&rules).unwrap();
        b.iter(|| black_box(tables.to_output()));
    });
    group.finish();
}
