//! Hashed feature fingerprints and the similarity measures built on them.

use std::collections::BTreeSet;

use crate::molecule::Molecule;

/// Fingerprint length in bits.
pub const FINGERPRINT_BITS: u16 = 4096;
/// Repeated fragments add one feature per occurrence up to this count.
const MAX_OCCURRENCE_BITS: u32 = 4;
/// Bits set per feature.
const BITS_PER_FEATURE: u8 = 2;

pub const TVERSKY_ALPHA: f64 = 0.8;
pub const TVERSKY_BETA: f64 = 0.2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    bits: BTreeSet<u16>,
}

impl Fingerprint {
    /// Fingerprint of a molecule.
    ///
    /// Features are fragment occurrences, unordered fragment pairs and
    /// character bigrams of fragment names, each hashed to `BITS_PER_FEATURE` bits.
    pub fn of(molecule: &Molecule) -> Self {
        let mut bits = BTreeSet::new();
        let fragments: Vec<(&str, u32)> = molecule.fragments().collect();

        for (i, (name, count)) in fragments.iter().enumerate() {
            for occurrence in 1..=(*count).min(MAX_OCCURRENCE_BITS) {
                set(&mut bits, &format!("f:{name}:{occurrence}"));
            }
            let chars: Vec<char> = name.chars().collect();
            for pair in chars.windows(2) {
                set(&mut bits, &format!("c:{}{}", pair[0], pair[1]));
            }
            for (other, _) in &fragments[i + 1..] {
                set(&mut bits, &format!("p:{name}|{other}"));
            }
        }
        Fingerprint { bits }
    }

    pub fn from_bits<I: IntoIterator<Item = u16>>(bits: I) -> Self {
        Fingerprint {
            bits: bits
                .into_iter()
                .map(|bit| bit % FINGERPRINT_BITS)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> impl Iterator<Item = u16> + '_ {
        self.bits.iter().copied()
    }

    /// Bits set in both fingerprints.
    pub fn common(&self, other: &Fingerprint) -> usize {
        self.bits.intersection(&other.bits).count()
    }

    /// Bits set here but not in `other`.
    pub fn difference(&self, other: &Fingerprint) -> Fingerprint {
        Fingerprint {
            bits: self.bits.difference(&other.bits).copied().collect(),
        }
    }

    /// Whether every bit of `query` is set here.
    pub fn covers(&self, query: &Fingerprint) -> bool {
        query.bits.is_subset(&self.bits)
    }
}

fn set(bits: &mut BTreeSet<u16>, feature: &str) {
    for salt in 0..BITS_PER_FEATURE {
        bits.insert(bit(salt, feature));
    }
}

/// FNV-1a over the salted feature, folded onto the fingerprint length.
fn bit(salt: u8, feature: &str) -> u16 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in std::iter::once(salt).chain(feature.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % u64::from(FINGERPRINT_BITS)) as u16
}

/// `|a ∩ b| / |a ∪ b|`; two empty fingerprints score 0.
pub fn tanimoto(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let common = a.common(b);
    let union = a.len() + b.len() - common;
    if union == 0 {
        return 0.0;
    }
    common as f64 / union as f64
}

/// Weighted Tversky index of `query` towards `target`.
///
/// Small queries are damped by `1 - 10^(-|q| / 20)` so that a tiny fragment
/// fully contained in the target does not score as a perfect match.
pub fn tversky(query: &Fingerprint, target: &Fingerprint) -> f64 {
    let q = query.len() as f64;
    let t = target.len() as f64;
    let common = query.common(target) as f64;
    let denominator = TVERSKY_ALPHA * (q - common) + TVERSKY_BETA * (t - common) + common;
    if denominator == 0.0 {
        return 0.0;
    }
    let damping = 1.0 - 10f64.powf(-q / 20.0);
    common / denominator * damping
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn fp(text: &str) -> Fingerprint {
        Fingerprint::of(&text.parse().expect("valid molecule"))
    }

    #[test]
    fn identical_molecules_have_unit_tanimoto() {
        assert_eq!(tanimoto(&fp("Ph-COOH"), &fp("COOH-Ph")), 1.0);
    }

    #[test]
    fn repeated_fragments_change_the_fingerprint() {
        assert_ne!(fp("Ph-OH"), fp("Ph-OH-OH"));
        assert!(fp("Ph-OH-OH").covers(&fp("Ph-OH")));
    }

    #[test]
    fn tversky_favours_queries_contained_in_the_target() {
        let target = fp("Ph-CONH-CH2-CH2-OH");
        let part = fp("Ph-CONH");
        assert!(tversky(&part, &target) > tversky(&target, &part));
    }

    #[test]
    fn tversky_is_damped_for_small_queries() {
        let target = fp("Ph-OH");
        let score = tversky(&target, &target);
        let expected = 1.0 - 10f64.powf(-(target.len() as f64) / 20.0);
        assert!((score - expected).abs() < 1e-12);
        assert!(score < 1.0);
    }

    #[test]
    fn empty_fingerprints_score_zero() {
        let empty = Fingerprint::default();
        assert_eq!(tanimoto(&empty, &empty), 0.0);
        assert_eq!(tversky(&empty, &fp("Ph")), 0.0);
    }

    proptest! {
        #[test]
        fn similarities_stay_in_unit_interval(
            a in proptest::collection::vec("[A-Z][a-z0-9]{0,3}", 1..6),
            b in proptest::collection::vec("[A-Z][a-z0-9]{0,3}", 1..6),
        ) {
            let a = Fingerprint::of(&Molecule::from_fragments(&a).unwrap());
            let b = Fingerprint::of(&Molecule::from_fragments(&b).unwrap());
            for score in [tanimoto(&a, &b), tversky(&a, &b), tversky(&b, &a)] {
                prop_assert!((0.0..=1.0).contains(&score));
            }
            prop_assert!((tanimoto(&a, &b) - tanimoto(&b, &a)).abs() < 1e-12);
            prop_assert_eq!(tanimoto(&a, &a), 1.0);
            prop_assert_eq!(tanimoto(&b, &b), 1.0);
        }
    }
}
