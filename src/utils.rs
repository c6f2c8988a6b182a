//! Hashing for the unique table and the computed tables.
//!
//! All tables use cheap additive hashes over handle ids, masked to a
//! power-of-two size by their owner. The distribution is mediocre but the
//! tables are collision-tolerant by construction (probing resp. eviction),
//! and the sums are trivially incremental.

use crate::types::{Edge, EdgeOp, WeightId, WeightOp};

pub trait MyHash {
    fn hash(&self) -> u64;
}

impl MyHash for (Edge, Edge, EdgeOp) {
    fn hash(&self) -> u64 {
        let (e0, e1, op) = *self;
        e0.w.id() as u64 + e0.v.id() as u64 + e1.w.id() as u64 + e1.v.id() as u64 + op as u64
    }
}

impl MyHash for (WeightId, WeightId, WeightOp) {
    fn hash(&self) -> u64 {
        let (w0, w1, op) = *self;
        w0.id() as u64 + w1.id() as u64 + op as u64
    }
}
