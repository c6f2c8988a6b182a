//! Hash-consing unique table for QMDD nodes.
//!
//! The table owns two fixed-capacity structures: an append-only node pool
//! and an open-addressed hash table of handles with linear probing. Nodes
//! are never freed or relocated within a run, so a handle stays valid for
//! the lifetime of the table.
//!
//! Slot 0 of the pool is the terminal, seeded at construction with
//! `var = N`, all children pointing to itself, and unit weights.

use crate::node::Node;
use crate::types::{NodeId, WeightId, P2};
use crate::utils::MyHash;

pub struct UniqueTable {
    pool: Vec<Node>,
    slots: Vec<NodeId>,
    bitmask: u64,
}

impl UniqueTable {
    /// Create a table of capacity `2^bits`, seeding the terminal.
    pub fn new(bits: usize, num_vars: u32) -> Self {
        assert!(bits <= 31, "Table bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut pool = Vec::with_capacity(capacity);

        let terminal = NodeId::new(0);
        pool.push(Node::new(num_vars, [terminal; P2], [WeightId::ONE; P2]));

        Self {
            pool,
            slots: vec![NodeId::INVALID; capacity],
            bitmask: (capacity - 1) as u64,
        }
    }

    pub fn terminal(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of allocated nodes, terminal included.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.pool[id.index()]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if self.pool.len() >= self.capacity() {
            panic!("Node pool is full");
        }
        let id = NodeId::new(self.pool.len() as u32);
        self.pool.push(node);
        id
    }

    /// Find-or-insert: returns the handle of the structurally equal node if
    /// one exists, otherwise allocates.
    ///
    /// The terminal lives outside the hash table; `insert` is never called
    /// with `var = N`.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let mut p = (node.hash() & self.bitmask) as usize;
        let mut probed = 0;

        while self.slots[p] != NodeId::INVALID {
            let id = self.slots[p];
            if *self.node(id) == node {
                return id;
            }
            p = (p + 1) & self.bitmask as usize;
            probed += 1;
            if probed >= self.capacity() {
                panic!("Unique table is full");
            }
        }

        let id = self.alloc(node);
        self.slots[p] = id;
        id
    }
}
