//! # qmdd-rs: Quantum Multiple-valued Decision Diagrams in Rust
//!
//! **`qmdd-rs`** compiles textual descriptions of reversible/quantum
//! circuits into **Quantum Multiple-valued Decision Diagrams (QMDDs)** and
//! renders them with Graphviz.
//!
//! ## What is a QMDD?
//!
//! A QMDD represents the 2ⁿ×2ⁿ unitary matrix of an n-variable circuit as
//! a shared, weighted directed acyclic graph: every node splits its matrix
//! into four quadrants, every edge carries a scalar factor, and a single
//! terminal stands for the scalar 1. With a fixed variable order and a
//! fixed weight-normalization rule the representation is **canonical** ---
//! two circuits implement the same matrix iff their diagrams are the same
//! edge. Equivalence checking becomes pointer comparison.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: all operations go through the
//!   [`Qmdd`][crate::qmdd::Qmdd] manager, which owns the node pool, the
//!   weight interner, and the operation caches, and enforces the canonical
//!   form on every construction path.
//! - **Exact Arithmetic**: edge weights are complex numbers over ℚ[√2]
//!   ([`Weight`][crate::weight::Weight]), closed under every supported
//!   gate. No floating point, no drift, no near-duplicate nodes.
//! - **Performance First**: hash-consing plus direct-mapped computed
//!   tables keep repeated subproblems cheap.
//! - **Full Gate Set**: Toffoli and Fredkin with arbitrary controls,
//!   Pauli-Y/Z, √NOT and its inverse, Hadamard, and the π/4 rotations.
//!
//! ## Basic Usage
//!
//! ```rust
//! use qmdd_rs::circuit::{Compiler, Gate, GateKind};
//! use qmdd_rs::qmdd::Qmdd;
//!
//! // 1. Create a manager for two variables.
//! let mut dd = Qmdd::new(2);
//! let mut compiler = Compiler::new(&mut dd);
//!
//! // 2. Compile a CNOT (control 0, target 1), twice.
//! let cnot = Gate::new(GateKind::Toffoli, vec![0, 1]);
//! let e = compiler.compile(&[cnot.clone(), cnot]);
//!
//! // 3. CNOT is self-inverse: the result is the identity edge.
//! assert_eq!(e, compiler.identity());
//! ```
//!
//! ## Core Components
//!
//! - **[`qmdd`]**: the heart of the library; the manager and the
//!   `add`/`mul`/`kro` apply engine.
//! - **[`circuit`]**: per-gate diagram construction and the gate-stream
//!   driver.
//! - **[`parser`]**: the textual circuit format.
//! - **[`dot`]**: Graphviz visualization.

pub mod cache;
pub mod circuit;
pub mod debug;
pub mod dot;
pub mod interner;
pub mod node;
pub mod parser;
pub mod qmdd;
pub mod table;
pub mod types;
pub mod utils;
pub mod weight;
