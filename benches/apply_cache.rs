//! Apply-engine benchmarks.
//!
//! These measure the compiler and apply engine on regular circuit
//! families, exercising the unique table and both computed tables with
//! realistic access patterns.
//!
//! Run with:
//! ```bash
//! cargo bench --bench apply_cache
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use qmdd_rs::circuit::{Compiler, Gate, GateKind};
use qmdd_rs::qmdd::Qmdd;

/// A ladder of overlapping CNOT/Toffoli gates over `n` variables.
fn toffoli_ladder(n: u32) -> Vec<Gate> {
    let mut gates = Vec::new();
    for i in 0..n.saturating_sub(1) {
        gates.push(Gate::new(GateKind::Toffoli, vec![i, i + 1]));
    }
    for i in 0..n.saturating_sub(2) {
        gates.push(Gate::new(GateKind::Toffoli, vec![i, i + 1, i + 2]));
    }
    gates
}

/// Hadamard on every variable, twice: heavy on weight arithmetic, and the
/// second pass must collapse everything back to the identity.
fn hadamard_sandwich(n: u32) -> Vec<Gate> {
    let mut gates = Vec::new();
    for _ in 0..2 {
        for i in 0..n {
            gates.push(Gate::new(GateKind::Hadamard, vec![i]));
        }
    }
    gates
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for &n in &[4u32, 8, 12] {
        let gates = toffoli_ladder(n);
        group.bench_with_input(BenchmarkId::new("toffoli_ladder", n), &n, |b, &n| {
            b.iter(|| {
                let mut dd = Qmdd::with_bits(n, 16);
                let mut compiler = Compiler::new(&mut dd);
                compiler.compile(&gates)
            })
        });
    }

    for &n in &[4u32, 8] {
        let gates = hadamard_sandwich(n);
        group.bench_with_input(BenchmarkId::new("hadamard_sandwich", n), &n, |b, &n| {
            b.iter(|| {
                let mut dd = Qmdd::with_bits(n, 16);
                let mut compiler = Compiler::new(&mut dd);
                compiler.compile(&gates)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
