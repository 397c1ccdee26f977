//! Benchmark harness for the module linker.
//!
//! Uses criterion for reliable benchmarking.
//! Run with: cargo bench -p esmlink_linker

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use esmlink_linker::{
    DeclarationSpec, ExportSpec, ImportSpec, MemoryLoader, ModuleSource, NameSpec, Program, ReExportSpec,
    ReExportSpecKind,
};
use esmlink_options::LinkerOptions;

fn leaf(names: usize) -> ModuleSource {
    let mut source = ModuleSource::default();
    for i in 0..names {
        let name = format!("value{i}");
        source.declarations.push(DeclarationSpec {
            name: name.clone(),
            kind: Default::default(),
            mutability: Default::default(),
            value: Some(serde_json::json!(i)),
        });
        source.exports.push(ExportSpec { local: name, exported: None, type_only: false });
    }
    source
}

fn star_from(specifier: &str) -> ReExportSpec {
    ReExportSpec {
        from: specifier.to_string(),
        kind: ReExportSpecKind::Star,
        type_only: false,
    }
}

fn entry_importing(specifier: &str, names: usize) -> ModuleSource {
    ModuleSource {
        imports: vec![ImportSpec {
            from: specifier.to_string(),
            default: None,
            namespace: Some("all".to_string()),
            names: (0..names).map(|i| NameSpec::Plain(format!("value{i}"))).collect(),
            type_only: false,
        }],
        ..ModuleSource::default()
    }
}

/// `entry -> m0 -> m1 -> ... -> leaf`, every hop an `export *`.
fn generate_chain(depth: usize, names: usize) -> MemoryLoader {
    let mut loader = MemoryLoader::new().with_module("entry", entry_importing("./m0.js", names));
    for i in 0..depth {
        let source = ModuleSource {
            re_exports: vec![star_from(&format!("./m{}.js", i + 1))],
            ..ModuleSource::default()
        };
        loader.insert(format!("m{i}"), source);
    }
    loader.insert(format!("m{depth}"), leaf(names));
    loader
}

/// `entry -> top`, `top` re-exports every middle module, every middle
/// module re-exports `base`.
fn generate_diamond(width: usize, names: usize) -> MemoryLoader {
    let top = ModuleSource {
        re_exports: (0..width).map(|i| star_from(&format!("./mid{i}.js"))).collect(),
        ..ModuleSource::default()
    };
    let mut loader = MemoryLoader::new()
        .with_module("entry", entry_importing("./top.js", names))
        .with_module("top", top)
        .with_module("base", leaf(names));
    for i in 0..width {
        let source = ModuleSource {
            re_exports: vec![star_from("./base.js")],
            ..ModuleSource::default()
        };
        loader.insert(format!("mid{i}"), source);
    }
    loader
}

fn load_and_link(loader: &MemoryLoader) {
    let mut loader = loader.clone();
    let mut program = Program::new(LinkerOptions::default());
    program.load(&mut loader, "entry").unwrap();
    let linked = program.link().unwrap();
    black_box(linked.evaluation_order().len());
}

// ============================================================================
// Linker Benchmarks
// ============================================================================

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    for depth in [10, 100, 500] {
        let loader = generate_chain(depth, 20);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &loader, |b, loader| {
            b.iter(|| load_and_link(black_box(loader)));
        });
    }
    group.finish();
}

fn bench_diamond(c: &mut Criterion) {
    let mut group = c.benchmark_group("diamond");
    for width in [10, 100, 500] {
        let loader = generate_diamond(width, 20);
        group.bench_with_input(BenchmarkId::from_parameter(width), &loader, |b, loader| {
            b.iter(|| load_and_link(black_box(loader)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain, bench_diamond);
criterion_main!(benches);
