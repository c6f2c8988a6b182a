//! Interning table for edge weights.
//!
//! Every distinct weight value gets exactly one stable [`WeightId`], so
//! weight equality throughout the engine is id equality. Insertion is a
//! linear scan over an append-only vector; the number of distinct weights
//! a circuit produces is small in practice, so nothing fancier is needed.

use crate::types::WeightId;
use crate::weight::Weight;

pub struct WeightTable {
    values: Vec<Weight>,
}

impl WeightTable {
    /// Create the table with ids 0 and 1 seeded with the weights 0 and 1.
    pub fn new() -> Self {
        let values = vec![Weight::ZERO, Weight::ONE];
        debug_assert_eq!(values[WeightId::ZERO.index()], Weight::ZERO);
        debug_assert_eq!(values[WeightId::ONE.index()], Weight::ONE);
        Self { values }
    }

    /// Intern a weight: `insert(x) == insert(y)` iff `x == y`.
    pub fn insert(&mut self, weight: Weight) -> WeightId {
        if let Some(index) = self.values.iter().position(|&v| v == weight) {
            return WeightId::new(index as u32);
        }
        let id = WeightId::new(self.values.len() as u32);
        self.values.push(weight);
        id
    }

    pub fn value(&self, id: WeightId) -> Weight {
        self.values[id.index()]
    }

    /// Number of distinct weights seen so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_constants() {
        let table = WeightTable::new();
        assert_eq!(table.value(WeightId::ZERO), Weight::ZERO);
        assert_eq!(table.value(WeightId::ONE), Weight::ONE);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_insert_dedup() {
        let mut table = WeightTable::new();
        assert_eq!(table.insert(Weight::ZERO), WeightId::ZERO);
        assert_eq!(table.insert(Weight::ONE), WeightId::ONE);

        let i = table.insert(Weight::I);
        let half = table.insert(Weight::rational(1, 2));
        assert_ne!(i, half);
        assert_eq!(table.insert(Weight::I), i);

        // Equal values reached by different routes intern to the same id.
        let computed = table.insert(Weight::one_over_sqrt2() * Weight::one_over_sqrt2());
        assert_eq!(computed, half);
    }
}
