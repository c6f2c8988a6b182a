//! Graphviz export of a QMDD.
//!
//! The writer walks the diagram from a root edge and emits one record per
//! reachable node. Under every parent sits an invisible row of four point
//! helpers, chained left-to-right with invisible edges: without it,
//! Graphviz reorders children freely and the quadrant structure becomes
//! unreadable. Zero-weight edges are not drawn.

use std::collections::BTreeMap;

use crate::qmdd::Qmdd;
use crate::types::{Edge, WeightId, P2};

impl Qmdd {
    /// Render the diagram under `root` as a Graphviz `digraph`.
    ///
    /// `names` maps variable ids to display names; variables past its end
    /// fall back to `x<var>`.
    pub fn to_dot(&self, root: Edge, names: &[String]) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "digraph qmdd {{")?;
        writeln!(dot, "node [shape=circle, fixedsize=true];")?;

        // The root edge carries the global scalar factor.
        writeln!(dot, "{{ rank=source")?;
        writeln!(dot, "root [shape=rect, label=\"{}\"];", self.weight_value(root.w))?;
        writeln!(dot, "}}")?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "t [shape=square, label=\"1\"];")?;
        writeln!(dot, "}}")?;

        let all_nodes = self.descendants([root.v]);

        // One rank per variable keeps each variable on its own row.
        let mut ranks = BTreeMap::<u32, Vec<_>>::new();
        for &v in &all_nodes {
            if self.is_terminal(v) {
                continue;
            }
            ranks.entry(self.variable(v)).or_default().push(v);
        }
        for (var, nodes) in &ranks {
            let label = names
                .get(*var as usize)
                .cloned()
                .unwrap_or_else(|| format!("x{}", var));
            writeln!(dot, "{{ rank=same")?;
            for &v in nodes {
                writeln!(dot, "{} [label=\"{}\"];", v, label)?;
            }
            writeln!(dot, "}}")?;
        }

        for &v in &all_nodes {
            if self.is_terminal(v) {
                continue;
            }
            let children = self.children(v);
            let weights = self.weights(v);

            // Helper row pinning the four quadrants in order.
            for i in 0..P2 {
                writeln!(dot, "{}_{} [shape=point, width=0.02, label=\"\"];", v, i)?;
            }
            writeln!(dot, "{{ rank=same")?;
            writeln!(dot, "edge [style=invis];")?;
            writeln!(dot, "{}_0 -> {}_1 -> {}_2 -> {}_3;", v, v, v, v)?;
            writeln!(dot, "}}")?;

            for i in 0..P2 {
                writeln!(dot, "{} -> {}_{} [arrowhead=none];", v, v, i)?;
                if weights[i] == WeightId::ZERO {
                    continue;
                }
                let target = if self.is_terminal(children[i]) {
                    "t".to_string()
                } else {
                    children[i].to_string()
                };
                writeln!(
                    dot,
                    "{}_{} -> {} [label=\"{}\"];",
                    v,
                    i,
                    target,
                    self.weight_value(weights[i])
                )?;
            }
        }

        if self.is_terminal(root.v) {
            writeln!(dot, "root -> t;")?;
        } else {
            writeln!(dot, "root -> {};", root.v)?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
