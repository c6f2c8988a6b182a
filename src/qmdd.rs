//! The QMDD manager: hash-consed nodes, interned weights, and the
//! recursive apply engine.
//!
//! All operations go through a [`Qmdd`] instance. The manager enforces the
//! canonical form on every construction path:
//!
//! - [`make_node`][Qmdd::make_node] is the sole node constructor and
//!   applies the no-redundancy rule;
//! - [`normalize`][Qmdd::normalize] is the sole producer of outgoing
//!   weight tuples, scaling the first non-zero slot to 1 and handing the
//!   extracted factor back to the incoming edge;
//! - the unique table deduplicates everything else.
//!
//! Together these guarantee that structurally equal matrices are
//! represented by identical edges, which is what makes the equivalence
//! checks in the test suite plain `==` comparisons.

use log::debug;

use crate::cache::OpCache;
use crate::interner::WeightTable;
use crate::node::Node;
use crate::table::UniqueTable;
use crate::types::{Edge, EdgeOp, NodeId, WeightId, WeightOp, P, P2};
use crate::weight::Weight;

/// Default table size (in bits): `2^20` nodes.
pub const DEFAULT_BITS: usize = 20;

pub struct Qmdd {
    nodes: UniqueTable,
    weights: WeightTable,
    edge_cache: OpCache<(Edge, Edge, EdgeOp), Edge>,
    weight_cache: OpCache<(WeightId, WeightId, WeightOp), WeightId>,
    num_vars: u32,
}

impl Qmdd {
    pub fn new(num_vars: u32) -> Self {
        Self::with_bits(num_vars, DEFAULT_BITS)
    }

    /// Create a manager for `num_vars` circuit variables with `2^bits`
    /// node capacity. Variable ids run over `[0, num_vars)`; `num_vars`
    /// itself is the terminal's variable.
    pub fn with_bits(num_vars: u32, bits: usize) -> Self {
        Self {
            nodes: UniqueTable::new(bits, num_vars),
            weights: WeightTable::new(),
            edge_cache: OpCache::new(bits),
            weight_cache: OpCache::new(bits),
            num_vars,
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn terminal(&self) -> NodeId {
        self.nodes.terminal()
    }

    pub fn is_terminal(&self, v: NodeId) -> bool {
        self.variable(v) == self.num_vars
    }

    pub fn variable(&self, v: NodeId) -> u32 {
        self.nodes.node(v).var
    }

    pub fn children(&self, v: NodeId) -> [NodeId; P2] {
        self.nodes.node(v).children
    }

    pub fn weights(&self, v: NodeId) -> [WeightId; P2] {
        self.nodes.node(v).weights
    }

    /// Number of allocated nodes, terminal included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct interned weights.
    pub fn num_weights(&self) -> usize {
        self.weights.len()
    }

    pub fn weight_value(&self, w: WeightId) -> Weight {
        self.weights.value(w)
    }

    pub fn intern(&mut self, w: Weight) -> WeightId {
        self.weights.insert(w)
    }

    /// The edge representing the all-zero matrix.
    pub fn zero_edge(&self) -> Edge {
        Edge::new(WeightId::ZERO, self.terminal())
    }

    /// The edge representing the scalar 1 (identity over zero variables).
    pub fn unit_edge(&self) -> Edge {
        Edge::new(WeightId::ONE, self.terminal())
    }

    /// The `i`-th outgoing edge of `e.v`, *without* `e.w` applied.
    pub fn edge_out(&self, e: Edge, i: usize) -> Edge {
        let node = self.nodes.node(e.v);
        Edge::new(node.weights[i], node.children[i])
    }

    /// The `i`-th outgoing edge of `e.v` with `e.w` multiplied in.
    fn scaled_out(&mut self, e: Edge, i: usize) -> Edge {
        let out = self.edge_out(e, i);
        Edge::new(self.apply_weight(e.w, out.w, WeightOp::Mul), out.v)
    }
}

// Weight arithmetic on interned ids.
impl Qmdd {
    /// Apply a weight operation, memoized in the weight computed table.
    ///
    /// # Panics
    ///
    /// Panics on division by the zero weight.
    pub fn apply_weight(&mut self, w0: WeightId, w1: WeightId, op: WeightOp) -> WeightId {
        // Identities that resolve at the id level, no table needed.
        match op {
            WeightOp::Add => {
                if w0 == WeightId::ZERO {
                    return w1;
                }
                if w1 == WeightId::ZERO {
                    return w0;
                }
            }
            WeightOp::Sub => {
                if w1 == WeightId::ZERO {
                    return w0;
                }
            }
            WeightOp::Mul => {
                if w0 == WeightId::ZERO || w1 == WeightId::ZERO {
                    return WeightId::ZERO;
                }
                if w0 == WeightId::ONE {
                    return w1;
                }
                if w1 == WeightId::ONE {
                    return w0;
                }
            }
            WeightOp::Div => {
                assert_ne!(w1, WeightId::ZERO, "division by zero weight");
                if w0 == WeightId::ZERO || w1 == WeightId::ONE {
                    return w0;
                }
            }
        }

        if let Some(res) = self.weight_cache.get(&(w0, w1, op)) {
            return res;
        }

        let a = self.weights.value(w0);
        let b = self.weights.value(w1);
        let value = match op {
            WeightOp::Add => a + b,
            WeightOp::Sub => a - b,
            WeightOp::Mul => a * b,
            WeightOp::Div => a / b,
        };
        let res = self.weights.insert(value);

        self.weight_cache.insert((w0, w1, op), res);
        res
    }
}

// Node construction.
impl Qmdd {
    /// The sole node constructor.
    ///
    /// Callers must pass weights normalized by [`normalize`][Qmdd::normalize]
    /// (first non-zero slot equal to 1).
    pub fn make_node(&mut self, var: u32, children: [NodeId; P2], weights: [WeightId; P2]) -> NodeId {
        debug_assert!(var < self.num_vars, "Variable out of range");

        // No-redundancy rule: a node whose four outgoing edges agree
        // collapses into its child. The caller keeps the weight context.
        if children.iter().all(|&c| c == children[0]) && weights.iter().all(|&w| w == weights[0]) {
            debug!("make_node(var = {}): collapsed to {}", var, children[0]);
            return children[0];
        }

        self.nodes.insert(Node::new(var, children, weights))
    }

    /// Scale an outgoing weight tuple to canonical form.
    ///
    /// The first non-zero slot becomes 1 and every later slot is divided by
    /// the extracted factor, which is returned for the caller to fold into
    /// the incoming edge. An all-zero tuple returns the zero weight; the
    /// caller must form a zero edge instead of building a node.
    pub fn normalize(&mut self, weights: &mut [WeightId; P2]) -> WeightId {
        let Some(k) = weights.iter().position(|&w| w != WeightId::ZERO) else {
            return WeightId::ZERO;
        };
        let factor = weights[k];
        weights[k] = WeightId::ONE;
        for j in k + 1..P2 {
            weights[j] = self.apply_weight(weights[j], factor, WeightOp::Div);
        }
        factor
    }

    /// Normalize, build the node, and fold the extracted factor into the
    /// returned edge.
    fn reduce(&mut self, var: u32, children: [NodeId; P2], mut weights: [WeightId; P2]) -> Edge {
        let factor = self.normalize(&mut weights);
        if factor == WeightId::ZERO {
            return self.zero_edge();
        }
        let v = self.make_node(var, children, weights);
        Edge::new(factor, v)
    }
}

// The apply engine.
impl Qmdd {
    /// Apply an edge operation, memoized in the computed table.
    pub fn apply(&mut self, e0: Edge, e1: Edge, op: EdgeOp) -> Edge {
        if let Some(res) = self.edge_cache.get(&(e0, e1, op)) {
            debug!("cache: apply({}, {}, {:?}) -> {}", e0, e1, op, res);
            return res;
        }

        let res = match op {
            EdgeOp::Add => self.add(e0, e1),
            EdgeOp::Mul => self.mul(e0, e1),
            EdgeOp::Kro => self.kro(e0, e1),
        };
        debug!("computed: apply({}, {}, {:?}) -> {}", e0, e1, op, res);

        self.edge_cache.insert((e0, e1, op), res);
        res
    }

    /// Matrix sum.
    fn add(&mut self, e0: Edge, e1: Edge) -> Edge {
        if self.is_terminal(e0.v) {
            if e0.w == WeightId::ZERO {
                return e1;
            }
            if self.is_terminal(e1.v) {
                let w = self.apply_weight(e0.w, e1.w, WeightOp::Add);
                return Edge::new(w, e1.v);
            }
        }
        if self.is_terminal(e1.v) && e1.w == WeightId::ZERO {
            return e0;
        }

        // Addition commutes; canonicalize the argument order so both
        // orders share one cache entry chain.
        if self.variable(e0.v) > self.variable(e1.v) {
            return self.apply(e1, e0, EdgeOp::Add);
        }

        let x = self.variable(e0.v);
        let same_level = self.variable(e1.v) == x;

        let mut children = [NodeId::INVALID; P2];
        let mut weights = [WeightId::ZERO; P2];
        for i in 0..P2 {
            let q0 = self.scaled_out(e0, i);
            // An operand whose top variable sits deeper contributes itself
            // as every block (the collapse convention).
            let q1 = if same_level { self.scaled_out(e1, i) } else { e1 };
            let z = self.apply(q0, q1, EdgeOp::Add);
            children[i] = z.v;
            weights[i] = z.w;
        }

        self.reduce(x, children, weights)
    }

    /// Matrix product, block-wise: `z[i][j] = Σ_k e0[i][k] · e1[k][j]`.
    fn mul(&mut self, e0: Edge, e1: Edge) -> Edge {
        // A terminal operand is a scalar; it multiplies into the other
        // side's incoming weight.
        if self.is_terminal(e0.v) {
            if e0.w == WeightId::ZERO {
                return e0;
            }
            if e0.w == WeightId::ONE {
                return e1;
            }
            let w = self.apply_weight(e0.w, e1.w, WeightOp::Mul);
            return Edge::new(w, e1.v);
        }
        if self.is_terminal(e1.v) {
            if e1.w == WeightId::ZERO {
                return e1;
            }
            if e1.w == WeightId::ONE {
                return e0;
            }
            let w = self.apply_weight(e0.w, e1.w, WeightOp::Mul);
            return Edge::new(w, e0.v);
        }

        // The product does not commute, so there is no argument-order
        // canonicalization here; an operand whose top variable sits deeper
        // contributes itself as every block instead.
        let x0 = self.variable(e0.v);
        let x1 = self.variable(e1.v);
        let x = x0.min(x1);

        let mut children = [NodeId::INVALID; P2];
        let mut weights = [WeightId::ZERO; P2];
        for i in 0..P {
            for j in 0..P {
                let mut z = self.zero_edge();
                for k in 0..P {
                    let b0 = if x0 == x { self.scaled_out(e0, i * P + k) } else { e0 };
                    let b1 = if x1 == x { self.scaled_out(e1, k * P + j) } else { e1 };
                    let term = self.apply(b0, b1, EdgeOp::Mul);
                    z = self.apply(z, term, EdgeOp::Add);
                }
                children[i * P + j] = z.v;
                weights[i * P + j] = z.w;
            }
        }

        self.reduce(x, children, weights)
    }

    /// Kronecker product, `e0` on top of `e1` in variable order.
    ///
    /// # Panics
    ///
    /// Panics if `var(e0) >= var(e1)` (with a non-scalar `e0`); the
    /// compiler always passes the top operand first, so a violation is a
    /// defect, not an input error.
    fn kro(&mut self, e0: Edge, e1: Edge) -> Edge {
        if self.is_terminal(e0.v) {
            if e0.w == WeightId::ZERO {
                return e0;
            }
            if e0.w == WeightId::ONE {
                return e1;
            }
            let w = self.apply_weight(e0.w, e1.w, WeightOp::Mul);
            return Edge::new(w, e1.v);
        }

        assert!(
            self.variable(e0.v) < self.variable(e1.v),
            "kro operands out of variable order"
        );

        let x = self.variable(e0.v);
        let mut children = [NodeId::INVALID; P2];
        let mut weights = [WeightId::ZERO; P2];
        for i in 0..P2 {
            let out = self.edge_out(e0, i);
            let z = self.apply(out, e1, EdgeOp::Kro);
            children[i] = z.v;
            weights[i] = z.w;
        }

        // edge_out dropped the incoming weight of e0; fold it back in
        // together with the normalization factor.
        let mut factor = self.normalize(&mut weights);
        factor = self.apply_weight(e0.w, factor, WeightOp::Mul);
        if factor == WeightId::ZERO {
            return self.zero_edge();
        }
        let v = self.make_node(x, children, weights);
        Edge::new(factor, v)
    }
}

// Cache statistics, exposed for diagnostics and benchmarks.
impl Qmdd {
    pub fn edge_cache_hits(&self) -> usize {
        self.edge_cache.hits()
    }

    pub fn edge_cache_misses(&self) -> usize {
        self.edge_cache.misses()
    }

    pub fn weight_cache_hits(&self) -> usize {
        self.weight_cache.hits()
    }

    pub fn weight_cache_misses(&self) -> usize {
        self.weight_cache.misses()
    }
}

impl std::fmt::Debug for Qmdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Qmdd")
            .field("num_vars", &self.num_vars)
            .field("num_nodes", &self.num_nodes())
            .field("num_weights", &self.num_weights())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A single-variable node over terminal children, normalized.
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

    fn identity(dd: &mut Qmdd, var: u32) -> Edge {
        block(dd, var, [Weight::ONE, Weight::ZERO, Weight::ZERO, Weight::ONE])
    }

    fn not(dd: &mut Qmdd, var: u32) -> Edge {
        block(dd, var, [Weight::ZERO, Weight::ONE, Weight::ONE, Weight::ZERO])
    }

    #[test]
    fn test_terminal() {
        let dd = Qmdd::new(2);
        let t = dd.terminal();
        assert!(dd.is_terminal(t));
        assert_eq!(dd.variable(t), 2);
        assert_eq!(dd.children(t), [t; P2]);
        assert_eq!(dd.weights(t), [WeightId::ONE; P2]);
    }

    #[test]
    fn test_make_node_collapse() {
        let mut dd = Qmdd::new(1);
        let t = dd.terminal();
        // All four outgoing edges agree: no node is allocated.
        let v = dd.make_node(0, [t; P2], [WeightId::ONE; P2]);
        assert_eq!(v, t);
        assert_eq!(dd.num_nodes(), 1);
    }

    #[test]
    fn test_make_node_dedup() {
        let mut dd = Qmdd::new(1);
        let a = identity(&mut dd, 0);
        let b = identity(&mut dd, 0);
        assert_eq!(a, b);
        assert_eq!(dd.num_nodes(), 2);
    }

    #[test]
    fn test_normalize() {
        let mut dd = Qmdd::new(1);
        let minus_i = dd.intern(-Weight::I);
        let i = dd.intern(Weight::I);

        // (0, -i, i, 0) -> factor -i, slots (0, 1, -1, 0)
        let mut w = [WeightId::ZERO, minus_i, i, WeightId::ZERO];
        let factor = dd.normalize(&mut w);
        assert_eq!(factor, minus_i);
        assert_eq!(w[0], WeightId::ZERO);
        assert_eq!(w[1], WeightId::ONE);
        assert_eq!(dd.weight_value(w[2]), Weight::rational(-1, 1));
        assert_eq!(w[3], WeightId::ZERO);

        // All-zero tuple: the caller must form a zero edge.
        let mut w = [WeightId::ZERO; P2];
        assert_eq!(dd.normalize(&mut w), WeightId::ZERO);
    }

    #[test]
    fn test_add_zero_identity() {
        let mut dd = Qmdd::new(1);
        let e = not(&mut dd, 0);
        let zero = dd.zero_edge();
        assert_eq!(dd.apply(e, zero, EdgeOp::Add), e);
        assert_eq!(dd.apply(zero, e, EdgeOp::Add), e);
    }

    #[test]
    fn test_add_commutes() {
        let mut dd = Qmdd::new(1);
        let a = not(&mut dd, 0);
        let b = identity(&mut dd, 0);
        let ab = dd.apply(a, b, EdgeOp::Add);
        let ba = dd.apply(b, a, EdgeOp::Add);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_mul_unit_identity() {
        let mut dd = Qmdd::new(1);
        let e = not(&mut dd, 0);
        let id = identity(&mut dd, 0);
        assert_eq!(dd.apply(id, e, EdgeOp::Mul), e);
        assert_eq!(dd.apply(e, id, EdgeOp::Mul), e);
    }

    #[test]
    fn test_mul_zero_absorbs() {
        let mut dd = Qmdd::new(1);
        let e = not(&mut dd, 0);
        let zero = dd.zero_edge();
        assert_eq!(dd.apply(e, zero, EdgeOp::Mul), zero);
        assert_eq!(dd.apply(zero, e, EdgeOp::Mul), zero);
    }

    #[test]
    fn test_mul_not_not_is_identity() {
        let mut dd = Qmdd::new(1);
        let x = not(&mut dd, 0);
        let id = identity(&mut dd, 0);
        assert_eq!(dd.apply(x, x, EdgeOp::Mul), id);
    }

    #[test]
    fn test_mul_associative() {
        let mut dd = Qmdd::new(1);
        let x = not(&mut dd, 0);
        let z = block(&mut dd, 0, [Weight::ONE, Weight::ZERO, Weight::ZERO, Weight::rational(-1, 1)]);
        let p1 = block(&mut dd, 0, [Weight::ZERO, Weight::ZERO, Weight::ZERO, Weight::ONE]);

        let xz = dd.apply(x, z, EdgeOp::Mul);
        let left = dd.apply(xz, p1, EdgeOp::Mul);
        let zp1 = dd.apply(z, p1, EdgeOp::Mul);
        let right = dd.apply(x, zp1, EdgeOp::Mul);
        assert_eq!(left, right);

        // X·Z = -Z·X, so the order genuinely matters here.
        let zx = dd.apply(z, x, EdgeOp::Mul);
        assert_ne!(xz, zx);
    }

    #[test]
    fn test_mul_projections() {
        // P0 · P1 = 0 and P0 + P1 = I.
        let mut dd = Qmdd::new(1);
        let p0 = block(&mut dd, 0, [Weight::ONE, Weight::ZERO, Weight::ZERO, Weight::ZERO]);
        let p1 = block(&mut dd, 0, [Weight::ZERO, Weight::ZERO, Weight::ZERO, Weight::ONE]);
        let id = identity(&mut dd, 0);
        assert_eq!(dd.apply(p0, p1, EdgeOp::Mul), dd.zero_edge());
        assert_eq!(dd.apply(p0, p1, EdgeOp::Add), id);
    }

    #[test]
    fn test_kro_builds_shared_child() {
        let mut dd = Qmdd::new(2);
        let id0 = identity(&mut dd, 0);
        let not1 = not(&mut dd, 1);
        let e = dd.apply(id0, not1, EdgeOp::Kro);

        assert_eq!(e.w, WeightId::ONE);
        assert_eq!(dd.variable(e.v), 0);
        let children = dd.children(e.v);
        let weights = dd.weights(e.v);
        assert_eq!(weights, [WeightId::ONE, WeightId::ZERO, WeightId::ZERO, WeightId::ONE]);
        assert_eq!(children[0], not1.v);
        assert_eq!(children[3], not1.v);
        assert_eq!(children[1], dd.terminal());
        assert_eq!(children[2], dd.terminal());
    }

    #[test]
    fn test_kro_associative() {
        let mut dd = Qmdd::new(3);
        let a = not(&mut dd, 0);
        let b = identity(&mut dd, 1);
        let c = not(&mut dd, 2);

        let ab = dd.apply(a, b, EdgeOp::Kro);
        let left = dd.apply(ab, c, EdgeOp::Kro);
        let bc = dd.apply(b, c, EdgeOp::Kro);
        let right = dd.apply(a, bc, EdgeOp::Kro);
        assert_eq!(left, right);
    }

    #[test]
    #[should_panic(expected = "kro operands out of variable order")]
    fn test_kro_precondition() {
        let mut dd = Qmdd::new(2);
        let top = identity(&mut dd, 0);
        let bottom = not(&mut dd, 1);
        dd.apply(bottom, top, EdgeOp::Kro);
    }

    #[test]
    fn test_apply_weight_shortcuts() {
        let mut dd = Qmdd::new(1);
        let i = dd.intern(Weight::I);
        assert_eq!(dd.apply_weight(WeightId::ZERO, i, WeightOp::Add), i);
        assert_eq!(dd.apply_weight(i, WeightId::ZERO, WeightOp::Mul), WeightId::ZERO);
        assert_eq!(dd.apply_weight(WeightId::ONE, i, WeightOp::Mul), i);
        assert_eq!(dd.apply_weight(i, WeightId::ONE, WeightOp::Div), i);

        // i · i = -1 goes through the interner and stays stable.
        let minus_one = dd.apply_weight(i, i, WeightOp::Mul);
        assert_eq!(dd.weight_value(minus_one), Weight::rational(-1, 1));
        assert_eq!(dd.apply_weight(i, i, WeightOp::Mul), minus_one);
    }

    #[test]
    #[should_panic(expected = "division by zero weight")]
    fn test_apply_weight_div_by_zero() {
        let mut dd = Qmdd::new(1);
        dd.apply_weight(WeightId::ONE, WeightId::ZERO, WeightOp::Div);
    }

    #[test]
    fn test_cache_is_transparent() {
        let mut dd = Qmdd::new(2);
        let a = not(&mut dd, 0);
        let b = identity(&mut dd, 1);
        let before = dd.apply(a, b, EdgeOp::Kro);
        // The same call again is a hit and returns the identical edge.
        let hits = dd.edge_cache_hits();
        let after = dd.apply(a, b, EdgeOp::Kro);
        assert_eq!(before, after);
        assert!(dd.edge_cache_hits() > hits);
    }
}
