//! Diagnostics for inspecting and validating QMDD structure.
//!
//! These helpers are primarily useful in tests and during development;
//! no engine invariant depends on them.

use std::collections::HashSet;
use std::fmt::Write;

use crate::qmdd::Qmdd;
use crate::types::{Edge, NodeId, WeightId};

impl Qmdd {
    /// All nodes reachable from the given roots (terminal included), in
    /// DFS discovery order.
    pub fn descendants(&self, roots: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = roots.into_iter().collect();

        while let Some(v) = stack.pop() {
            if !visited.insert(v) {
                continue;
            }
            order.push(v);
            if !self.is_terminal(v) {
                for child in self.children(v) {
                    stack.push(child);
                }
            }
        }

        order
    }

    /// Number of nodes reachable from `root`, terminal included.
    pub fn size(&self, root: Edge) -> usize {
        self.descendants([root.v]).len()
    }

    /// Check the canonical-form invariants over everything reachable from
    /// `root`. Returns one message per violation; an empty vector means the
    /// diagram is canonical.
    ///
    /// Checked per node: strictly increasing variables on every outgoing
    /// edge, no fully-redundant node, and a unit weight in the first
    /// non-zero slot. Checked globally: no two reachable nodes with equal
    /// tuples, and no two interned ids with equal values.
    pub fn canonicity_violations(&self, root: Edge) -> Vec<String> {
        let mut violations = Vec::new();

        let reachable = self.descendants([root.v]);
        for &v in &reachable {
            if self.is_terminal(v) {
                continue;
            }
            let var = self.variable(v);
            let children = self.children(v);
            let weights = self.weights(v);

            for (i, &child) in children.iter().enumerate() {
                if self.variable(child) <= var {
                    violations.push(format!(
                        "{}: child {} of slot {} does not increase the variable",
                        v, child, i
                    ));
                }
            }

            if children.iter().all(|&c| c == children[0])
                && weights.iter().all(|&w| w == weights[0])
            {
                violations.push(format!("{}: redundant node survived make_node", v));
            }

            if let Some(&first) = weights.iter().find(|&&w| w != WeightId::ZERO) {
                if first != WeightId::ONE {
                    violations.push(format!("{}: first non-zero weight is {}", v, first));
                }
            } else {
                violations.push(format!("{}: all-zero weight tuple", v));
            }
        }

        // Structural equality must imply identity.
        for (i, &a) in reachable.iter().enumerate() {
            for &b in &reachable[i + 1..] {
                if self.is_terminal(a) || self.is_terminal(b) {
                    continue;
                }
                if self.variable(a) == self.variable(b)
                    && self.children(a) == self.children(b)
                    && self.weights(a) == self.weights(b)
                {
                    violations.push(format!("{} and {} are structurally equal", a, b));
                }
            }
        }

        // Weight ids are equal iff their values are equal.
        for i in 0..self.num_weights() {
            for j in i + 1..self.num_weights() {
                let (wi, wj) = (WeightId::new(i as u32), WeightId::new(j as u32));
                if self.weight_value(wi) == self.weight_value(wj) {
                    violations.push(format!("{} and {} intern the same value", wi, wj));
                }
            }
        }

        violations
    }

    /// Compact one-line-per-node dump of the diagram under `root`.
    pub fn debug_string(&self, root: Edge) -> String {
        let mut result = String::new();
        writeln!(
            &mut result,
            "QMDD root {} * {} (size = {}):",
            self.weight_value(root.w),
            root.v,
            self.size(root)
        )
        .unwrap();
        for v in self.descendants([root.v]) {
            if self.is_terminal(v) {
                writeln!(&mut result, "  {} = terminal", v).unwrap();
                continue;
            }
            write!(&mut result, "  {} = x{} (", v, self.variable(v)).unwrap();
            let children = self.children(v);
            let weights = self.weights(v);
            for i in 0..children.len() {
                if i > 0 {
                    write!(&mut result, ", ").unwrap();
                }
                write!(&mut result, "{} {}", self.weight_value(weights[i]), children[i]).unwrap();
            }
            writeln!(&mut result, ")").unwrap();
        }
        result
    }
}
