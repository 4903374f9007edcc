//! Wright's path-counting coefficient of inbreeding.
//!
//! ```text
//! F = sum over contributions of 0.5^(n1 + n2 + 1) * (1 + F_A)
//! ```
//!
//! where `n1`/`n2` are the sire-side and dam-side generation counts and
//! `F_A` is the common ancestor's own coefficient. `F_A` is itself the
//! coefficient of the mating that produced `A`, evaluated over the depth
//! left after reaching `A`; it is 0 for founders, for dogs with a single
//! recorded parent, and once the depth is used up.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use crate::error::{AnalysisError, Result};
use crate::types::{DogId, ParentRole};

use super::matcher::{match_common_ancestors, CommonAncestorContribution};
use super::paths::{enumerate_paths, DataIntegrityWarning};
use super::store::AncestryStore;

/// Float noise tolerated outside `[0, 1]` before a sum is treated as
/// corrupt.
const RANGE_TOLERANCE: f64 = 1e-9;

/// Sum the contributions, asking `ancestor_coefficient` for each common
/// ancestor's own coefficient given the depth remaining below it.
///
/// The result is clamped to `[0, 1]`; a sum further outside than float
/// noise is a `Computation` error.
pub fn path_coefficient<F>(
    contributions: &[CommonAncestorContribution],
    max_generations: usize,
    mut ancestor_coefficient: F,
) -> Result<f64>
where
    F: FnMut(&str, usize) -> Result<f64>,
{
    let mut total = 0.0_f64;
    for c in contributions {
        let remaining = max_generations.saturating_sub(c.depth());
        let f_a = ancestor_coefficient(&c.ancestor, remaining)?;
        total += c.path_weight() * (1.0 + f_a);
    }
    check_range(total)
}

fn check_range(value: f64) -> Result<f64> {
    if !value.is_finite() || value < -RANGE_TOLERANCE || value > 1.0 + RANGE_TOLERANCE {
        let err = AnalysisError::Computation(format!(
            "inbreeding coefficient {} is outside [0, 1]; ancestry data is inconsistent",
            value
        ));
        log::error!("{}", err);
        return Err(err);
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Cache hit/miss counters for one top-level analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Recursive coefficient calculator.
///
/// One instance serves exactly one top-level analysis: the memo is keyed by
/// `(ancestor id, remaining depth)` and is dropped with the calculator, so
/// nothing leaks between requests if the store changes.
pub struct CoefficientCalculator<'a, S: AncestryStore + ?Sized> {
    store: &'a S,
    memo: HashMap<(DogId, usize), f64>,
    in_progress: HashSet<DogId>,
    warnings: IndexSet<DataIntegrityWarning>,
    stats: CacheStats,
}

impl<'a, S: AncestryStore + ?Sized> CoefficientCalculator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            warnings: IndexSet::new(),
            stats: CacheStats::default(),
        }
    }

    /// Coefficient of the offspring of a mating whose contributions are
    /// already known.
    pub fn coefficient(
        &mut self,
        contributions: &[CommonAncestorContribution],
        max_generations: usize,
    ) -> Result<f64> {
        path_coefficient(contributions, max_generations, |ancestor, remaining| {
            self.ancestor_coefficient(ancestor, remaining)
        })
    }

    /// A dog's own coefficient, looking `remaining` generations above its
    /// parents.
    ///
    /// # Errors
    /// `Computation` if the dog turns out to be its own ancestor or is
    /// recorded with the same dog as sire and dam.
    pub fn ancestor_coefficient(&mut self, id: &str, remaining: usize) -> Result<f64> {
        if remaining == 0 {
            return Ok(0.0);
        }
        let key = (id.to_string(), remaining);
        if let Some(&f) = self.memo.get(&key) {
            self.stats.hits += 1;
            return Ok(f);
        }
        self.stats.misses += 1;

        if self.in_progress.contains(id) {
            let err = AnalysisError::Computation(format!(
                "dog '{}' is its own ancestor; ancestry cycle beyond the depth guard",
                id
            ));
            log::error!("{}", err);
            return Err(err);
        }

        let Some(record) = self.store.lookup(id) else {
            return Ok(0.0);
        };
        let Some((sire, dam)) = record.parents() else {
            return Ok(0.0);
        };
        if sire == dam {
            let err = AnalysisError::Computation(format!(
                "dog '{}' is recorded with '{}' as both sire and dam",
                id, sire
            ));
            log::error!("{}", err);
            return Err(err);
        }

        let mut resolvable = true;
        for (role, parent) in [(ParentRole::Sire, sire), (ParentRole::Dam, dam)] {
            if !self.store.contains(parent) {
                self.warnings.insert(DataIntegrityWarning::DanglingReference {
                    dog: id.to_string(),
                    role,
                    parent: parent.to_string(),
                });
                resolvable = false;
            }
        }
        if !resolvable {
            self.memo.insert(key, 0.0);
            return Ok(0.0);
        }

        self.in_progress.insert(id.to_string());
        let result = self.mating_coefficient(sire, dam, remaining);
        self.in_progress.remove(id);

        let f = result?;
        self.memo.insert(key, f);
        Ok(f)
    }

    /// Coefficient of a hypothetical offspring of `sire` x `dam`, looking
    /// `generations` generations above each parent.
    pub fn mating_coefficient(&mut self, sire: &str, dam: &str, generations: usize) -> Result<f64> {
        let sire_paths = enumerate_paths(self.store, sire, generations)?;
        let dam_paths = enumerate_paths(self.store, dam, generations)?;
        self.warnings.extend(sire_paths.warnings().iter().cloned());
        self.warnings.extend(dam_paths.warnings().iter().cloned());

        let contributions = match_common_ancestors(&sire_paths, &dam_paths);
        self.coefficient(&contributions, generations)
    }

    /// Data-integrity warnings met while resolving ancestor coefficients.
    pub fn warnings(&self) -> impl Iterator<Item = &DataIntegrityWarning> {
        self.warnings.iter()
    }

    pub fn into_warnings(self) -> Vec<DataIntegrityWarning> {
        self.warnings.into_iter().collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::pedigree::Pedigree;
    use crate::types::DogRecord;
    use std::collections::HashMap as Map;

    fn ped(triples: &[(&str, Option<&str>, Option<&str>)]) -> Pedigree {
        let mut p = Pedigree::new();
        for (id, s, d) in triples {
            p.add_dog(id, *s, *d).unwrap();
        }
        p
    }

    fn assert_approx(actual: f64, expected: f64, msg: &str) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "{}: expected {}, got {}",
            msg,
            expected,
            actual
        );
    }

    #[test]
    fn test_full_siblings() {
        let p = ped(&[
            ("F", None, None),
            ("M", None, None),
            ("S", Some("F"), Some("M")),
            ("D", Some("F"), Some("M")),
        ]);
        let mut calc = CoefficientCalculator::new(&p);
        let f = calc.mating_coefficient("S", "D", 6).unwrap();
        assert_approx(f, 0.25, "full sibs");
    }

    #[test]
    fn test_half_siblings() {
        let p = ped(&[
            ("F", None, None),
            ("M1", None, None),
            ("M2", None, None),
            ("S", Some("F"), Some("M1")),
            ("D", Some("F"), Some("M2")),
        ]);
        let mut calc = CoefficientCalculator::new(&p);
        assert_approx(calc.mating_coefficient("S", "D", 6).unwrap(), 0.125, "half sibs");
    }

    #[test]
    fn test_inbred_common_ancestor_scales_contribution() {
        // A is the product of a full-sib mating (F_A = 0.25). S and D are
        // half sibs through A: F = 0.5^3 * (1 + 0.25).
        let p = ped(&[
            ("GF", None, None),
            ("GM", None, None),
            ("X", Some("GF"), Some("GM")),
            ("Y", Some("GF"), Some("GM")),
            ("A", Some("X"), Some("Y")),
            ("M1", None, None),
            ("M2", None, None),
            ("S", Some("A"), Some("M1")),
            ("D", Some("A"), Some("M2")),
        ]);
        let mut calc = CoefficientCalculator::new(&p);
        let f = calc.mating_coefficient("S", "D", 6).unwrap();
        assert_approx(f, 0.125 * 1.25, "half sibs via inbred sire");
    }

    #[test]
    fn test_ancestor_depth_exhausted_counts_as_zero() {
        // Same pedigree, but with one generation A's own coefficient is
        // beyond the window.
        let p = ped(&[
            ("GF", None, None),
            ("GM", None, None),
            ("X", Some("GF"), Some("GM")),
            ("Y", Some("GF"), Some("GM")),
            ("A", Some("X"), Some("Y")),
            ("M1", None, None),
            ("M2", None, None),
            ("S", Some("A"), Some("M1")),
            ("D", Some("A"), Some("M2")),
        ]);
        let mut calc = CoefficientCalculator::new(&p);
        assert_approx(calc.mating_coefficient("S", "D", 1).unwrap(), 0.125, "bound 1");
        assert_eq!(calc.ancestor_coefficient("A", 0).unwrap(), 0.0);
        assert_approx(calc.ancestor_coefficient("A", 1).unwrap(), 0.25, "A itself");
    }

    #[test]
    fn test_memo_reused_across_contributions() {
        // Two half-sib routes through the same inbred ancestor.
        let p = ped(&[
            ("GF", None, None),
            ("GM", None, None),
            ("X", Some("GF"), Some("GM")),
            ("Y", Some("GF"), Some("GM")),
            ("A", Some("X"), Some("Y")),
            ("M1", None, None),
            ("M2", None, None),
            ("S", Some("A"), Some("M1")),
            ("D", Some("A"), Some("M2")),
        ]);
        let mut calc = CoefficientCalculator::new(&p);
        calc.mating_coefficient("S", "D", 6).unwrap();
        let first = calc.stats();
        calc.ancestor_coefficient("A", 5).unwrap();
        assert_eq!(calc.stats().hits, first.hits + 1);
    }

    #[test]
    fn test_founder_ancestor_is_zero() {
        let p = ped(&[("A", None, None), ("B", Some("A"), None)]);
        let mut calc = CoefficientCalculator::new(&p);
        assert_eq!(calc.ancestor_coefficient("A", 5).unwrap(), 0.0);
        assert_eq!(calc.ancestor_coefficient("B", 5).unwrap(), 0.0);
        assert_eq!(calc.ancestor_coefficient("Unknown", 5).unwrap(), 0.0);
    }

    #[test]
    fn test_dangling_parent_of_ancestor_warns() {
        let p = ped(&[("S1", None, None), ("A", Some("S1"), Some("Ghost"))]);
        let mut calc = CoefficientCalculator::new(&p);
        assert_eq!(calc.ancestor_coefficient("A", 3).unwrap(), 0.0);
        let warnings = calc.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            DataIntegrityWarning::DanglingReference { parent, .. } if parent == "Ghost"
        ));
    }

    #[test]
    fn test_same_sire_and_dam_record_is_computation_error() {
        let mut store: Map<String, DogRecord> = Map::new();
        store.insert("P".into(), DogRecord::new("P", None, None));
        store.insert("A".into(), DogRecord::new("A", Some("P"), Some("P")));
        let mut calc = CoefficientCalculator::new(&store);
        assert!(matches!(
            calc.ancestor_coefficient("A", 3),
            Err(AnalysisError::Computation(_))
        ));
    }

    #[test]
    fn test_cycle_through_ancestor_is_computation_error() {
        // A's parents are B and C, and A is also a parent of both. Corrupted:
        // resolving F_A reaches A again as a common ancestor of B and C.
        let mut store: Map<String, DogRecord> = Map::new();
        store.insert("Z1".into(), DogRecord::new("Z1", None, None));
        store.insert("Z2".into(), DogRecord::new("Z2", None, None));
        store.insert("A".into(), DogRecord::new("A", Some("B"), Some("C")));
        store.insert("B".into(), DogRecord::new("B", Some("A"), Some("Z1")));
        store.insert("C".into(), DogRecord::new("C", Some("A"), Some("Z2")));
        let mut calc = CoefficientCalculator::new(&store);
        let result = calc.ancestor_coefficient("A", 10);
        assert!(matches!(result, Err(AnalysisError::Computation(_))));
    }

    #[test]
    fn test_out_of_range_sum_is_error() {
        let p = ped(&[("A", None, None)]);
        let paths = enumerate_paths(&p, "A", 1).unwrap();
        let path = paths.paths_to("A")[0].clone();
        let contribution = CommonAncestorContribution {
            ancestor: "A".into(),
            sire_generations: 0,
            dam_generations: 0,
            sire_path: path.clone(),
            dam_path: path,
        };
        // 0.5 * (1 + 2.0) = 1.5
        let result = path_coefficient(&[contribution], 6, |_, _| Ok(2.0));
        assert!(matches!(result, Err(AnalysisError::Computation(_))));
    }
}
