//! Compiling a gate stream into a single QMDD matrix.
//!
//! Every gate first becomes its own N-variable diagram, assembled
//! bottom-up out of single-variable building blocks (identity, NOT,
//! projections, and the gate matrix itself) glued with Kronecker products;
//! the per-gate diagram is then multiplied into the running accumulator.
//! Compiling the empty circuit yields the N-variable identity.

use log::debug;

use crate::qmdd::Qmdd;
use crate::types::{Edge, EdgeOp, WeightId, P2};
use crate::weight::{Sqrt2, Weight};

/// Gate opcodes of the circuit format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GateKind {
    /// NOT with any number of controls (`t`).
    Toffoli,
    /// Controlled swap (`f`); expanded into three Toffolis.
    Fredkin,
    /// Pauli-Y (`y`).
    PauliY,
    /// Pauli-Z (`z`).
    PauliZ,
    /// Square root of NOT (`v`).
    SqrtNot,
    /// Inverse square root of NOT (`v'`).
    SqrtNotInv,
    /// Hadamard (`h`).
    Hadamard,
    /// π/4 phase rotation (`q`).
    Phase,
    /// Inverse π/4 phase rotation (`q'`).
    PhaseInv,
}

/// One gate instruction.
///
/// Operands are variable ids in strictly increasing order. The last
/// operand is the target (the last *two* are the swap targets for
/// Fredkin); everything before it is a control.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Gate {
    pub kind: GateKind,
    pub vars: Vec<u32>,
}

impl Gate {
    pub fn new(kind: GateKind, vars: Vec<u32>) -> Self {
        Gate { kind, vars }
    }
}

/// Weight tuples of the single-variable building blocks, in slot order
/// 00 / 01 / 10 / 11.
fn identity_weights() -> [Weight; P2] {
    [Weight::ONE, Weight::ZERO, Weight::ZERO, Weight::ONE]
}

fn not_weights() -> [Weight; P2] {
    [Weight::ZERO, Weight::ONE, Weight::ONE, Weight::ZERO]
}

fn project_zero_weights() -> [Weight; P2] {
    [Weight::ONE, Weight::ZERO, Weight::ZERO, Weight::ZERO]
}

fn project_one_weights() -> [Weight; P2] {
    [Weight::ZERO, Weight::ZERO, Weight::ZERO, Weight::ONE]
}

/// The 2×2 matrix a gate applies to its target variable.
fn gate_weights(kind: GateKind) -> [Weight; P2] {
    let half = |re, im| Weight::new(Sqrt2::rational(re, 2), Sqrt2::rational(im, 2));
    match kind {
        GateKind::Toffoli => not_weights(),
        GateKind::Fredkin => unreachable!("controlled swap is expanded before matrix selection"),
        GateKind::PauliY => [Weight::ZERO, -Weight::I, Weight::I, Weight::ZERO],
        GateKind::PauliZ => [
            Weight::ONE,
            Weight::ZERO,
            Weight::ZERO,
            Weight::rational(-1, 1),
        ],
        GateKind::SqrtNot => [half(1, 1), half(1, -1), half(1, -1), half(1, 1)],
        GateKind::SqrtNotInv => [half(1, -1), half(1, 1), half(1, 1), half(1, -1)],
        GateKind::Hadamard => {
            let r = Weight::one_over_sqrt2();
            [r, r, r, -r]
        }
        GateKind::Phase => [
            Weight::ONE,
            Weight::ZERO,
            Weight::ZERO,
            Weight::one_over_sqrt2() + Weight::i_over_sqrt2(),
        ],
        GateKind::PhaseInv => [
            Weight::ONE,
            Weight::ZERO,
            Weight::ZERO,
            Weight::one_over_sqrt2() - Weight::i_over_sqrt2(),
        ],
    }
}

/// A gate lowered to the form the per-variable assembly consumes: a
/// target with a set of controls, either of which may sit above or below
/// the other. Parsed gates always have the target last; microcoded
/// expansions do not.
#[derive(Debug, Clone)]
enum Instr {
    Unary {
        kind: GateKind,
        controls: Vec<u32>,
        target: u32,
    },
    Swap {
        controls: Vec<u32>,
        a: u32,
        b: u32,
    },
}

fn lower(gate: &Gate) -> Instr {
    let n = gate.vars.len();
    match gate.kind {
        GateKind::Fredkin => {
            assert!(n >= 2, "controlled swap needs two targets");
            Instr::Swap {
                controls: gate.vars[..n - 2].to_vec(),
                a: gate.vars[n - 2],
                b: gate.vars[n - 1],
            }
        }
        kind => {
            assert!(n >= 1, "gate needs a target");
            Instr::Unary {
                kind,
                controls: gate.vars[..n - 1].to_vec(),
                target: gate.vars[n - 1],
            }
        }
    }
}

/// Builds per-gate diagrams against a [`Qmdd`] and accumulates their
/// product.
pub struct Compiler<'a> {
    dd: &'a mut Qmdd,
    /// `identity_tail[k]` is the identity over variables `[k, N)`;
    /// `identity_tail[N]` is the scalar 1. Controls need these to emit
    /// identity below their |0⟩ branch.
    identity_tail: Vec<Edge>,
}

impl<'a> Compiler<'a> {
    pub fn new(dd: &'a mut Qmdd) -> Self {
        let n = dd.num_vars() as usize;
        let mut identity_tail = vec![dd.unit_edge(); n + 1];
        for var in (0..n).rev() {
            let id = block(dd, var as u32, identity_weights());
            let below = identity_tail[var + 1];
            identity_tail[var] = dd.apply(id, below, EdgeOp::Kro);
        }
        Self { dd, identity_tail }
    }

    /// The N-variable identity: the compilation of the empty circuit.
    pub fn identity(&self) -> Edge {
        self.identity_tail[0]
    }

    pub fn qmdd(&mut self) -> &mut Qmdd {
        self.dd
    }

    /// Compile a gate sequence into the product of its gate matrices.
    ///
    /// Gates apply in stream order, so the accumulator is updated as
    /// `acc := G · acc`. A controlled swap pushes its three-Toffoli
    /// expansion onto an explicit stack of instruction streams and the
    /// same loop drains it in place.
    pub fn compile(&mut self, gates: &[Gate]) -> Edge {
        let mut acc = self.identity();

        let instrs: Vec<Instr> = gates.iter().map(lower).collect();
        let mut streams: Vec<std::vec::IntoIter<Instr>> = vec![instrs.into_iter()];

        while let Some(stream) = streams.last_mut() {
            let Some(instr) = stream.next() else {
                streams.pop();
                continue;
            };
            match instr {
                Instr::Swap { controls, a, b } => {
                    debug!("swap({:?}; {}, {})", controls, a, b);
                    assert!(a < b, "swap targets out of variable order");
                    let mut with_a = controls.clone();
                    with_a.push(a);
                    with_a.sort_unstable();
                    let expansion = vec![
                        Instr::Unary {
                            kind: GateKind::Toffoli,
                            controls: vec![b],
                            target: a,
                        },
                        Instr::Unary {
                            kind: GateKind::Toffoli,
                            controls: with_a,
                            target: b,
                        },
                        Instr::Unary {
                            kind: GateKind::Toffoli,
                            controls: vec![b],
                            target: a,
                        },
                    ];
                    streams.push(expansion.into_iter());
                }
                Instr::Unary {
                    kind,
                    controls,
                    target,
                } => {
                    debug!("{:?}({:?}; {})", kind, controls, target);
                    let gate = self.gate_diagram(kind, &controls, target);
                    acc = self.dd.apply(gate, acc, EdgeOp::Mul);
                }
            }
        }

        acc
    }

    /// Assemble the N-variable diagram of one single-target gate,
    /// variable by variable from the bottom up.
    ///
    /// `active` accumulates the branch on which every control seen so far
    /// is |1⟩ (the gate matrix ends up on it); `inactive` accumulates the
    /// branches on which some control below the target is |0⟩ (they must
    /// emit identity at the target level and keep following controls
    /// above it).
    fn gate_diagram(&mut self, kind: GateKind, controls: &[u32], target: u32) -> Edge {
        let mut active = self.dd.unit_edge();
        let mut inactive = self.dd.zero_edge();

        for var in (0..self.dd.num_vars()).rev() {
            let is_control = controls.contains(&var);
            if var > target {
                if is_control {
                    // |1⟩ carries the gate down; |0⟩ is identity below and
                    // stays alive for controls further up.
                    let p1 = block(self.dd, var, project_one_weights());
                    let p0 = block(self.dd, var, project_zero_weights());
                    let tail = self.identity_tail[var as usize + 1];
                    let off = self.dd.apply(p0, tail, EdgeOp::Kro);
                    let on = self.dd.apply(p1, inactive, EdgeOp::Kro);
                    inactive = self.dd.apply(off, on, EdgeOp::Add);
                    active = self.dd.apply(p1, active, EdgeOp::Kro);
                } else {
                    let id = block(self.dd, var, identity_weights());
                    active = self.dd.apply(id, active, EdgeOp::Kro);
                    inactive = self.dd.apply(id, inactive, EdgeOp::Kro);
                }
            } else if var == target {
                let id = block(self.dd, var, identity_weights());
                let matrix = block(self.dd, var, gate_weights(kind));
                let skip = self.dd.apply(id, inactive, EdgeOp::Kro);
                let hit = self.dd.apply(matrix, active, EdgeOp::Kro);
                active = self.dd.apply(skip, hit, EdgeOp::Add);
            } else if is_control {
                let p1 = block(self.dd, var, project_one_weights());
                let p0 = block(self.dd, var, project_zero_weights());
                let tail = self.identity_tail[var as usize + 1];
                let off = self.dd.apply(p0, tail, EdgeOp::Kro);
                let on = self.dd.apply(p1, active, EdgeOp::Kro);
                active = self.dd.apply(off, on, EdgeOp::Add);
            } else {
                let id = block(self.dd, var, identity_weights());
                active = self.dd.apply(id, active, EdgeOp::Kro);
            }
        }

        active
    }
}

/// The single-variable node of a building block: normalized weights over
/// four terminal children, with the extracted factor on the edge.
fn block(dd: &mut Qmdd, var: u32, weights: [Weight; P2]) -> Edge {
    let t = dd.terminal();
    let mut w = weights.map(|x| dd.intern(x));
    let factor = dd.normalize(&mut w);
    if factor == WeightId::ZERO {
        return dd.zero_edge();
    }
    let v = dd.make_node(var, [t; P2], w);
    Edge::new(factor, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn test_identity_tail() {
        let mut dd = Qmdd::new(2);
        let compiler = Compiler::new(&mut dd);
        let id = compiler.identity();
        let tail1 = compiler.identity_tail[1];
        let unit = compiler.identity_tail[2];
        let dd = compiler.dd;

        assert_eq!(unit, dd.unit_edge());
        assert_eq!(id.w, WeightId::ONE);
        assert_eq!(dd.variable(id.v), 0);
        // The diagonal of the top identity points at the identity below.
        assert_eq!(
            dd.weights(id.v),
            [WeightId::ONE, WeightId::ZERO, WeightId::ZERO, WeightId::ONE]
        );
        assert_eq!(dd.children(id.v)[0], tail1.v);
        assert_eq!(dd.children(id.v)[3], tail1.v);
    }

    #[test]
    fn test_block_normalizes() {
        let mut dd = Qmdd::new(1);
        // Hadamard: the 1/√2 factor moves onto the edge, slots read
        // (1, 1, 1, -1).
        let h = block(&mut dd, 0, gate_weights(GateKind::Hadamard));
        assert_eq!(dd.weight_value(h.w), Weight::one_over_sqrt2());
        let w = dd.weights(h.v);
        assert_eq!(w[0], WeightId::ONE);
        assert_eq!(w[1], WeightId::ONE);
        assert_eq!(w[2], WeightId::ONE);
        assert_eq!(dd.weight_value(w[3]), Weight::rational(-1, 1));

        // Pauli-Y: factor -i, slots (0, 1, -1, 0).
        let y = block(&mut dd, 0, gate_weights(GateKind::PauliY));
        assert_eq!(dd.weight_value(y.w), -Weight::I);
        let w = dd.weights(y.v);
        assert_eq!(w[0], WeightId::ZERO);
        assert_eq!(w[1], WeightId::ONE);
        assert_eq!(dd.weight_value(w[2]), Weight::rational(-1, 1));
        assert_eq!(w[3], WeightId::ZERO);
    }

    #[test]
    fn test_single_not() {
        // An unconditional NOT on the second of two variables compiles to
        // identity ⊗ NOT.
        let mut dd = Qmdd::new(2);
        let mut compiler = Compiler::new(&mut dd);
        let e = compiler.compile(&[Gate::new(GateKind::Toffoli, vec![1])]);
        let dd = compiler.dd;

        assert_eq!(e.w, WeightId::ONE);
        assert_eq!(dd.variable(e.v), 0);
        assert_eq!(
            dd.weights(e.v),
            [WeightId::ONE, WeightId::ZERO, WeightId::ZERO, WeightId::ONE]
        );
        let child = dd.children(e.v)[0];
        assert_eq!(dd.children(e.v)[3], child);
        assert_eq!(dd.variable(child), 1);
        assert_eq!(
            dd.weights(child),
            [WeightId::ZERO, WeightId::ONE, WeightId::ONE, WeightId::ZERO]
        );
        assert_eq!(dd.children(child), [dd.terminal(); P2]);
    }

    #[test]
    fn test_cnot_structure() {
        // CNOT = P0 ⊗ I + P1 ⊗ X.
        let mut dd = Qmdd::new(2);
        let mut compiler = Compiler::new(&mut dd);
        let e = compiler.compile(&[Gate::new(GateKind::Toffoli, vec![0, 1])]);
        let dd = compiler.dd;

        assert_eq!(e.w, WeightId::ONE);
        assert_eq!(dd.variable(e.v), 0);
        assert_eq!(
            dd.weights(e.v),
            [WeightId::ONE, WeightId::ZERO, WeightId::ZERO, WeightId::ONE]
        );
        let children = dd.children(e.v);
        // Slot 0 is the identity branch, slot 3 the NOT branch.
        assert_eq!(
            dd.weights(children[0]),
            [WeightId::ONE, WeightId::ZERO, WeightId::ZERO, WeightId::ONE]
        );
        assert_eq!(
            dd.weights(children[3]),
            [WeightId::ZERO, WeightId::ONE, WeightId::ONE, WeightId::ZERO]
        );
    }

    #[test]
    fn test_self_inverse_gates() {
        for kind in [
            GateKind::Toffoli,
            GateKind::Hadamard,
            GateKind::PauliY,
            GateKind::PauliZ,
        ] {
            let mut dd = Qmdd::new(2);
            let mut compiler = Compiler::new(&mut dd);
            let gate = Gate::new(kind, vec![1]);
            let e = compiler.compile(&[gate.clone(), gate]);
            assert_eq!(e, compiler.identity(), "{:?} twice is not identity", kind);
        }
    }

    #[test]
    fn test_controlled_self_inverse() {
        let mut dd = Qmdd::new(3);
        let mut compiler = Compiler::new(&mut dd);
        let toffoli = Gate::new(GateKind::Toffoli, vec![0, 1, 2]);
        let e = compiler.compile(&[toffoli.clone(), toffoli]);
        assert_eq!(e, compiler.identity());
    }

    #[test]
    fn test_sqrt_not_squares_to_not() {
        let mut dd = Qmdd::new(1);
        let mut compiler = Compiler::new(&mut dd);
        let v = Gate::new(GateKind::SqrtNot, vec![0]);
        let vv = compiler.compile(&[v.clone(), v]);

        let mut dd2 = Qmdd::new(1);
        let mut compiler2 = Compiler::new(&mut dd2);
        let not = compiler2.compile(&[Gate::new(GateKind::Toffoli, vec![0])]);

        // Compare across managers structurally: same root weight and the
        // same single-node weight tuple.
        let w_vv = compiler.dd.weight_value(vv.w);
        let w_not = compiler2.dd.weight_value(not.w);
        assert_eq!(w_vv, w_not);
        let t_vv: Vec<Weight> = compiler
            .dd
            .weights(vv.v)
            .iter()
            .map(|&w| compiler.dd.weight_value(w))
            .collect();
        let t_not: Vec<Weight> = compiler2
            .dd
            .weights(not.v)
            .iter()
            .map(|&w| compiler2.dd.weight_value(w))
            .collect();
        assert_eq!(t_vv, t_not);
    }

    #[test]
    fn test_sqrt_not_inverse_cancels() {
        let mut dd = Qmdd::new(2);
        let mut compiler = Compiler::new(&mut dd);
        let e = compiler.compile(&[
            Gate::new(GateKind::SqrtNot, vec![1]),
            Gate::new(GateKind::SqrtNotInv, vec![1]),
        ]);
        assert_eq!(e, compiler.identity());
    }

    #[test]
    fn test_phase_composition() {
        // T eight times is the identity; T then T' likewise.
        let mut dd = Qmdd::new(1);
        let mut compiler = Compiler::new(&mut dd);
        let q = Gate::new(GateKind::Phase, vec![0]);
        let e = compiler.compile(&vec![q; 8]);
        assert_eq!(e, compiler.identity());

        let mut dd = Qmdd::new(1);
        let mut compiler = Compiler::new(&mut dd);
        let e = compiler.compile(&[
            Gate::new(GateKind::Phase, vec![0]),
            Gate::new(GateKind::PhaseInv, vec![0]),
        ]);
        assert_eq!(e, compiler.identity());
    }

    #[test]
    fn test_fredkin_matches_manual_swap() {
        // A controlled swap must equal P0(a) ⊗ I + P1(a) ⊗ SWAP(b, c)
        // built directly out of blocks: identical edge, not just equal
        // matrices.
        let mut dd = Qmdd::new(3);
        let mut compiler = Compiler::new(&mut dd);
        let fredkin = compiler.compile(&[Gate::new(GateKind::Fredkin, vec![0, 1, 2])]);
        let tail1 = compiler.identity_tail[1];
        let dd = compiler.dd;

        let raise = [Weight::ZERO, Weight::ONE, Weight::ZERO, Weight::ZERO];
        let lower = [Weight::ZERO, Weight::ZERO, Weight::ONE, Weight::ZERO];

        // SWAP = P0⊗P0 + |0⟩⟨1|⊗|1⟩⟨0| + |1⟩⟨0|⊗|0⟩⟨1| + P1⊗P1.
        let mut terms = Vec::new();
        for (b_w, c_w) in [
            (project_zero_weights(), project_zero_weights()),
            (raise, lower),
            (lower, raise),
            (project_one_weights(), project_one_weights()),
        ] {
            let top = block(dd, 1, b_w);
            let bottom = block(dd, 2, c_w);
            terms.push(dd.apply(top, bottom, EdgeOp::Kro));
        }
        let mut swap = dd.zero_edge();
        for term in terms {
            swap = dd.apply(swap, term, EdgeOp::Add);
        }

        let p0 = block(dd, 0, project_zero_weights());
        let p1 = block(dd, 0, project_one_weights());
        let off = dd.apply(p0, tail1, EdgeOp::Kro);
        let on = dd.apply(p1, swap, EdgeOp::Kro);
        let manual = dd.apply(off, on, EdgeOp::Add);

        assert_eq!(fredkin, manual);
    }

    #[test]
    fn test_uncontrolled_fredkin_is_swap() {
        // f with two operands swaps them outright: |01⟩ and |10⟩ columns
        // exchange, the diagonal stays.
        let mut dd = Qmdd::new(2);
        let mut compiler = Compiler::new(&mut dd);
        let e = compiler.compile(&[Gate::new(GateKind::Fredkin, vec![0, 1])]);
        let dd = compiler.dd;

        // Top node of SWAP: blocks (P0, |0⟩⟨1|, |1⟩⟨0|, P1).
        assert_eq!(e.w, WeightId::ONE);
        let children = dd.children(e.v);
        let weights = dd.weights(e.v);
        assert_eq!(weights, [WeightId::ONE; P2]);
        assert_eq!(
            dd.weights(children[0]),
            [WeightId::ONE, WeightId::ZERO, WeightId::ZERO, WeightId::ZERO]
        );
        assert_eq!(
            dd.weights(children[1]),
            [WeightId::ZERO, WeightId::ZERO, WeightId::ONE, WeightId::ZERO]
        );
        assert_eq!(
            dd.weights(children[2]),
            [WeightId::ZERO, WeightId::ONE, WeightId::ZERO, WeightId::ZERO]
        );
        assert_eq!(
            dd.weights(children[3]),
            [WeightId::ZERO, WeightId::ZERO, WeightId::ZERO, WeightId::ONE]
        );
    }

    #[test]
    fn test_fredkin_self_inverse() {
        let mut dd = Qmdd::new(3);
        let mut compiler = Compiler::new(&mut dd);
        let f = Gate::new(GateKind::Fredkin, vec![0, 1, 2]);
        let e = compiler.compile(&[f.clone(), f]);
        assert_eq!(e, compiler.identity());
    }

    #[test]
    fn test_empty_circuit_is_identity() {
        let mut dd = Qmdd::new(3);
        let mut compiler = Compiler::new(&mut dd);
        let e = compiler.compile(&[]);
        assert_eq!(e, compiler.identity());
        assert_ne!(e.v, NodeId::INVALID);
    }
}
