//! Bounded registry of target-like molecules found during search.
//!
//! Admission is a soft top-K: once full, a newcomer is compared against the
//! records of the currently worst-ranked product only, so the retained set can
//! drift from the exact K best.

use serde::{Deserialize, Serialize};

/// Default number of distinct products kept.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One piece of evidence for an achieved product.
pub struct AchievedRecord<R, T> {
    pub similarity: f64,
    pub reaction: R,
    pub template: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Product keyed by canonical signature, with records in discovery order.
pub struct AchievedEntry<R, T> {
    pub signature: String,
    pub records: Vec<AchievedRecord<R, T>>,
}

impl<R, T> AchievedEntry<R, T> {
    /// Best similarity among the records of this product.
    pub fn best_similarity(&self) -> f64 {
        self.records
            .iter()
            .map(|record| record.similarity)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of offering a record to the registry.
pub enum Admission {
    /// A new product entry was created.
    Inserted,
    /// The record joined an existing product entry.
    Appended,
    /// A new product replaced the worst-ranked one.
    Replaced,
    /// The product already holds this template/reaction pair.
    Duplicate,
    /// The registry is full and the record did not beat the worst product.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achieved<R, T> {
    capacity: usize,
    entries: Vec<AchievedEntry<R, T>>,
}

impl<R: PartialEq, T: PartialEq> Achieved<R, T> {
    pub fn new(capacity: usize) -> Self {
        Achieved {
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, signature: &str) -> Option<&AchievedEntry<R, T>> {
        self.entries.iter().find(|entry| entry.signature == signature)
    }

    /// Entries by best similarity, descending; ties keep insertion order.
    pub fn ranked(&self) -> Vec<&AchievedEntry<R, T>> {
        let mut ranked: Vec<&AchievedEntry<R, T>> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.best_similarity().total_cmp(&a.best_similarity()));
        ranked
    }

    /// Top-ranked entry, if any.
    pub fn best(&self) -> Option<&AchievedEntry<R, T>> {
        self.ranked().into_iter().next()
    }

    fn worst_index(&self) -> Option<usize> {
        let mut worst: Option<(usize, f64)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let best = entry.best_similarity();
            match worst {
                // later insertions rank lower among equals
                Some((_, current)) if best > current => {}
                _ => worst = Some((idx, best)),
            }
        }
        worst.map(|(idx, _)| idx)
    }

    /// Offer one record for `signature`.
    pub fn admit(&mut self, signature: &str, similarity: f64, reaction: R, template: T) -> Admission {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.signature == signature);

        if let Some(idx) = position {
            let duplicate = self.entries[idx]
                .records
                .iter()
                .any(|record| record.template == template && record.reaction == reaction);
            if duplicate {
                return Admission::Duplicate;
            }
        }

        let record = AchievedRecord {
            similarity,
            reaction,
            template,
        };

        if self.entries.len() < self.capacity {
            return self.push(position, signature, record, Admission::Inserted);
        }

        let Some(worst) = self.worst_index() else {
            return Admission::Rejected;
        };
        let beats_worst = self.entries[worst]
            .records
            .iter()
            .any(|existing| similarity > existing.similarity);
        if !beats_worst {
            return Admission::Rejected;
        }

        match position {
            Some(_) => self.push(position, signature, record, Admission::Inserted),
            None => {
                self.entries.remove(worst);
                self.push(None, signature, record, Admission::Replaced)
            }
        }
    }

    fn push(
        &mut self,
        position: Option<usize>,
        signature: &str,
        record: AchievedRecord<R, T>,
        when_new: Admission,
    ) -> Admission {
        match position {
            Some(idx) => {
                self.entries[idx].records.push(record);
                Admission::Appended
            }
            None => {
                self.entries.push(AchievedEntry {
                    signature: signature.to_string(),
                    records: vec![record],
                });
                when_new
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn records_are_grouped_per_product_in_discovery_order() {
        let mut achieved: Achieved<&str, &str> = Achieved::new(10);
        assert_eq!(achieved.admit("P", 0.4, "r1", "t1"), Admission::Inserted);
        assert_eq!(achieved.admit("P", 0.7, "r2", "t2"), Admission::Appended);
        assert_eq!(achieved.admit("Q", 0.5, "r3", "t3"), Admission::Inserted);

        let entry = achieved.get("P").expect("P present");
        let sims: Vec<f64> = entry.records.iter().map(|r| r.similarity).collect();
        assert_eq!(sims, vec![0.4, 0.7]);

        let ranked: Vec<&str> = achieved.ranked().iter().map(|e| e.signature.as_str()).collect();
        assert_eq!(ranked, vec!["P", "Q"]);
    }

    #[test]
    fn repeated_template_reaction_pair_is_not_added_twice() {
        let mut achieved: Achieved<&str, &str> = Achieved::new(10);
        achieved.admit("P", 0.4, "r1", "t1");
        assert_eq!(achieved.admit("P", 0.9, "r1", "t1"), Admission::Duplicate);
        assert_eq!(achieved.admit("P", 0.9, "r1", "t2"), Admission::Appended);
        assert_eq!(achieved.get("P").map(|e| e.records.len()), Some(2));
    }

    #[test]
    fn ties_rank_by_insertion_order() {
        let mut achieved: Achieved<u32, u32> = Achieved::new(10);
        achieved.admit("A", 0.5, 1, 1);
        achieved.admit("B", 0.5, 2, 2);
        achieved.admit("C", 0.9, 3, 3);
        let ranked: Vec<&str> = achieved.ranked().iter().map(|e| e.signature.as_str()).collect();
        assert_eq!(ranked, vec!["C", "A", "B"]);
    }

    #[test]
    fn increasing_admissions_keep_the_latest_hundred() {
        let mut achieved: Achieved<usize, usize> = Achieved::new(DEFAULT_CAPACITY);
        for i in 0..150 {
            let similarity = 0.1 + i as f64 * 0.005;
            achieved.admit(&format!("P{i}"), similarity, i, i);
        }

        assert_eq!(achieved.len(), 100);
        for i in 50..150 {
            assert!(achieved.get(&format!("P{i}")).is_some(), "P{i} should be kept");
        }
        assert!(achieved.get("P49").is_none());
        assert_eq!(achieved.best().map(|e| e.signature.as_str()), Some("P149"));
    }

    #[test]
    fn full_registry_compares_against_worst_entry_only() {
        let mut achieved: Achieved<u32, u32> = Achieved::new(2);
        achieved.admit("HIGH", 0.9, 1, 1);
        achieved.admit("LOW", 0.2, 2, 2);

        // beats LOW, evicts it
        assert_eq!(achieved.admit("MID", 0.5, 3, 3), Admission::Replaced);
        assert!(achieved.get("LOW").is_none());

        // below every record of the worst entry
        assert_eq!(achieved.admit("TINY", 0.1, 4, 4), Admission::Rejected);

        // existing product gains a record without evicting anything
        assert_eq!(achieved.admit("MID", 0.6, 5, 5), Admission::Appended);
        assert_eq!(achieved.len(), 2);
    }

    #[test]
    fn soft_eviction_can_admit_a_weaker_product_than_a_kept_record() {
        // The worst entry owns one weak record next to its best one; a newcomer
        // only has to beat the weak record, not the best similarity.
        let mut achieved: Achieved<u32, u32> = Achieved::new(2);
        achieved.admit("A", 0.9, 1, 1);
        achieved.admit("B", 0.8, 2, 2);
        achieved.admit("B", 0.1, 3, 3);

        assert_eq!(achieved.admit("C", 0.3, 4, 4), Admission::Replaced);
        assert!(achieved.get("B").is_none());
        assert_eq!(achieved.get("C").map(|e| e.best_similarity()), Some(0.3));
    }

    proptest! {
        #[test]
        fn capacity_is_never_exceeded(
            capacity in 1usize..12,
            offers in proptest::collection::vec((0u8..30, 0.0f64..1.0, 0u8..4), 1..200),
        ) {
            let mut achieved: Achieved<u8, u8> = Achieved::new(capacity);
            for (product, similarity, template) in offers {
                achieved.admit(&format!("P{product}"), similarity, template, template);
                prop_assert!(achieved.len() <= capacity);
            }
        }
    }
}
