//! Analyzer and scan throughput benchmarks
//!
//! Run with: cargo bench --bench analyzer

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;

use repo_index::config::{ConfigOverrides, IndexConfig, RepoIdentity};
use repo_index::{analyze, Database, Lang, ScanOptions, Scanner};

/// Synthetic ES module with `functions` functions of mixed shapes
fn synthetic_module(functions: usize) -> String {
    let mut src = String::from("import { helper } from './helper.js';\nimport lodash from 'lodash';\n\n");
    for i in 0..functions {
        match i % 3 {
            0 => src.push_str(&format!(
                "/**\n * Handles case {i}\n */\nexport async function handler{i}(input) {{\n  if (input && input.ready) {{\n    for (const item of input.items) {{\n      await helper(item);\n    }}\n  }} else if (input) {{\n    return null;\n  }}\n  return input ? 1 : 0;\n}}\n\n"
            )),
            1 => src.push_str(&format!(
                "const arrow{i} = (a, b) => {{\n  // combine values\n  return a || b;\n}};\n\n"
            )),
            _ => src.push_str(&format!(
                "function plain{i}(x) {{\n  switch (x) {{\n    case 1: return 'one';\n    case 2: return 'two';\n    default: return lodash.noop();\n  }}\n}}\n\n"
            )),
        }
    }
    src
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    for size in [10usize, 100, 1000] {
        let source = synthetic_module(size);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| analyze(Lang::JavaScript, "src/module.js", black_box(src)))
        });
    }
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().expect("temp dir");
    for i in 0..50 {
        let path = dir.path().join("src").join(format!("module{i}.js"));
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(&path, synthetic_module(20)).expect("write module");
    }
    let config = IndexConfig::resolve(dir.path(), &ConfigOverrides::default(), |_| {
        RepoIdentity::fallback()
    })
    .expect("config");

    let mut group = c.benchmark_group("scan");
    group.sample_size(10);
    group.bench_function("full_50_files", |b| {
        b.iter(|| {
            let db = Database::open_in_memory().expect("db");
            Scanner::new(&db, &config)
                .scan(ScanOptions::default())
                .expect("scan")
        })
    });
    group.finish();
}

criterion_group!(benches, bench_analyze, bench_scan);
criterion_main!(benches);
