/// Partition of the variable indices into an active set (pinned at zero)
/// and a passive set (free to vary).
///
/// Every index belongs to exactly one of the two sets. Membership tests are
/// O(1); the passive list is kept in ascending order so that column gathers
/// and tie-breaking stay deterministic.
#[derive(Debug, Clone)]
pub(crate) struct IndexPartition {
    passive_mask: Vec<bool>,
    passive: Vec<usize>,
}

impl IndexPartition {
    /// Creates a partition over `len` indices, all of them active.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            passive_mask: vec![false; len],
            passive: Vec::with_capacity(len),
        }
    }

    /// Pins every index back to the active set.
    pub(crate) fn reset(&mut self) {
        self.passive_mask.fill(false);
        self.passive.clear();
    }

    pub(crate) fn is_passive(&self, index: usize) -> bool {
        self.passive_mask[index]
    }

    /// Passive indices in ascending order.
    pub(crate) fn passive(&self) -> &[usize] {
        &self.passive
    }

    /// Frees `index`. The index must currently be active.
    pub(crate) fn make_passive(&mut self, index: usize) {
        debug_assert!(!self.passive_mask[index]);
        self.passive_mask[index] = true;
        let at = self.passive.partition_point(|&i| i < index);
        self.passive.insert(at, index);
    }

    /// Pins `index` back at zero. The index must currently be passive.
    pub(crate) fn make_active(&mut self, index: usize) {
        debug_assert!(self.passive_mask[index]);
        self.passive_mask[index] = false;
        let at = self.passive.partition_point(|&i| i < index);
        self.passive.remove(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_all_active() {
        let partition = IndexPartition::new(4);
        assert!(partition.passive().is_empty());
        for i in 0..4 {
            assert!(!partition.is_passive(i));
        }
    }

    #[test]
    fn passive_list_stays_sorted() {
        let mut partition = IndexPartition::new(5);
        partition.make_passive(3);
        partition.make_passive(0);
        partition.make_passive(4);
        assert_eq!(partition.passive(), &[0, 3, 4]);

        partition.make_active(3);
        assert_eq!(partition.passive(), &[0, 4]);
        assert!(!partition.is_passive(3));
        assert!(partition.is_passive(4));
    }

    #[test]
    fn reset_clears_membership() {
        let mut partition = IndexPartition::new(3);
        partition.make_passive(1);
        partition.make_passive(2);
        partition.reset();
        assert!(partition.passive().is_empty());
        assert!(!partition.is_passive(1));
    }
}
