//! Ancestor path enumeration.
//!
//! Every distinct route from a root dog to each of its ancestors is kept.
//! Routes that reconverge on the same ancestor are not merged, because each
//! one contributes to relatedness on its own.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::types::{DogId, DogRecord, ParentRole, MAX_GENERATIONS};

use super::store::AncestryStore;

/// An ordered route from a root dog to one of its ancestors.
///
/// `dogs[0]` is the root and the last element is the ancestor. The root on
/// its own is a zero-length path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AncestorPath {
    dogs: Vec<DogId>,
}

impl AncestorPath {
    fn from_root(root: &str) -> Self {
        Self {
            dogs: vec![root.to_string()],
        }
    }

    fn extended(&self, parent: &str) -> Self {
        let mut dogs = Vec::with_capacity(self.dogs.len() + 1);
        dogs.extend(self.dogs.iter().cloned());
        dogs.push(parent.to_string());
        Self { dogs }
    }

    /// Number of parent edges traversed.
    pub fn length(&self) -> usize {
        self.dogs.len() - 1
    }

    pub fn root(&self) -> &str {
        &self.dogs[0]
    }

    /// The ancestor this path ends at.
    pub fn ancestor(&self) -> &str {
        &self.dogs[self.dogs.len() - 1]
    }

    pub fn dogs(&self) -> &[DogId] {
        &self.dogs
    }

    /// Dogs strictly before the ancestor (root included).
    pub fn intermediates(&self) -> &[DogId] {
        &self.dogs[..self.dogs.len() - 1]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.dogs.iter().any(|d| d == id)
    }
}

impl fmt::Display for AncestorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dogs.join(" -> "))
    }
}

/// A problem in the ancestry data that was worked around rather than
/// treated as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIntegrityWarning {
    /// `dog` lists a parent the store cannot resolve. The parent is kept as
    /// a founder and its own ancestry is not explored.
    DanglingReference {
        dog: DogId,
        role: ParentRole,
        parent: DogId,
    },
    /// Following `dog`'s parents led back to `ancestor`, which is already on
    /// the current route. The branch was cut there.
    CycleDetected { dog: DogId, ancestor: DogId },
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIntegrityWarning::DanglingReference { dog, role, parent } => write!(
                f,
                "'{}' references unknown {} '{}'; treated as a founder",
                dog, role, parent
            ),
            DataIntegrityWarning::CycleDetected { dog, ancestor } => write!(
                f,
                "ancestry of '{}' loops back to '{}'; branch cut",
                dog, ancestor
            ),
        }
    }
}

/// All ancestor paths from one root within a generation bound.
#[derive(Debug, Clone)]
pub struct AncestorPaths {
    root: DogId,
    max_generations: usize,
    /// Ancestor id -> every distinct path reaching it, shortest first.
    /// Includes the root itself with a single zero-length path.
    paths: IndexMap<DogId, Vec<AncestorPath>>,
    warnings: Vec<DataIntegrityWarning>,
}

impl AncestorPaths {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn max_generations(&self) -> usize {
        self.max_generations
    }

    /// Paths reaching `ancestor`, or an empty slice.
    pub fn paths_to(&self, ancestor: &str) -> &[AncestorPath] {
        self.paths.get(ancestor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ancestor ids in discovery order (the root first).
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn contains(&self, ancestor: &str) -> bool {
        self.paths.contains_key(ancestor)
    }

    /// Number of distinct ancestors, the root excluded.
    pub fn n_ancestors(&self) -> usize {
        self.paths.len() - 1
    }

    /// Total number of paths, the root's zero-length path excluded.
    pub fn n_paths(&self) -> usize {
        self.paths.values().map(Vec::len).sum::<usize>() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AncestorPath])> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }
}

/// Check a generation bound against `[1, MAX_GENERATIONS]`.
pub fn check_generations(max_generations: usize) -> Result<()> {
    if max_generations == 0 || max_generations > MAX_GENERATIONS {
        return Err(AnalysisError::InvalidArgument(format!(
            "generations must be in [1, {}], got {}",
            MAX_GENERATIONS, max_generations
        )));
    }
    Ok(())
}

/// Enumerate every path from `root` to each ancestor within
/// `max_generations` parent edges.
///
/// Traversal is breadth-first: generation 1 holds the root's sire and dam.
/// A branch stops at the bound, at a founder, at a parent the store cannot
/// resolve (reported as [`DataIntegrityWarning::DanglingReference`]), or at
/// a parent already on the same route (reported as
/// [`DataIntegrityWarning::CycleDetected`]).
///
/// # Errors
/// Returns `InvalidArgument` if the bound is outside `[1, 10]` or the root
/// is not in the store.
pub fn enumerate_paths<S: AncestryStore + ?Sized>(
    store: &S,
    root: &str,
    max_generations: usize,
) -> Result<AncestorPaths> {
    check_generations(max_generations)?;

    let root_record = store.lookup(root).ok_or_else(|| {
        AnalysisError::InvalidArgument(format!("Dog '{}' not found in the ancestry store", root))
    })?;

    let mut records: HashMap<DogId, Option<DogRecord>> = HashMap::new();
    records.insert(root.to_string(), Some(root_record));

    let mut paths: IndexMap<DogId, Vec<AncestorPath>> = IndexMap::new();
    let mut warnings: IndexSet<DataIntegrityWarning> = IndexSet::new();

    let start = AncestorPath::from_root(root);
    paths.insert(root.to_string(), vec![start.clone()]);

    let mut frontier: VecDeque<AncestorPath> = VecDeque::new();
    frontier.push_back(start);

    while let Some(path) = frontier.pop_front() {
        if path.length() >= max_generations {
            continue;
        }

        let current = path.ancestor().to_string();
        let record = match records.get(&current) {
            Some(cached) => cached.clone(),
            None => {
                let looked_up = store.lookup(&current);
                records.insert(current.clone(), looked_up.clone());
                looked_up
            }
        };
        // Unresolved dogs were already reported when they were reached.
        let Some(record) = record else { continue };

        for (role, parent) in [(ParentRole::Sire, &record.sire), (ParentRole::Dam, &record.dam)] {
            let Some(parent) = parent else { continue };

            if path.contains(parent) {
                warnings.insert(DataIntegrityWarning::CycleDetected {
                    dog: current.clone(),
                    ancestor: parent.clone(),
                });
                continue;
            }

            let resolved = match records.get(parent) {
                Some(cached) => cached.is_some(),
                None => {
                    let looked_up = store.lookup(parent);
                    let found = looked_up.is_some();
                    records.insert(parent.clone(), looked_up);
                    found
                }
            };
            if !resolved {
                warnings.insert(DataIntegrityWarning::DanglingReference {
                    dog: current.clone(),
                    role,
                    parent: parent.clone(),
                });
            }

            let next = path.extended(parent);
            paths.entry(parent.clone()).or_default().push(next.clone());
            if resolved {
                frontier.push_back(next);
            }
        }
    }

    let warnings: Vec<DataIntegrityWarning> = warnings.into_iter().collect();
    for warning in &warnings {
        log::warn!("Pedigree of '{}': {}", root, warning);
    }
    log::debug!(
        "Enumerated {} paths to {} ancestors of '{}' within {} generations",
        paths.values().map(Vec::len).sum::<usize>() - 1,
        paths.len() - 1,
        root,
        max_generations
    );

    Ok(AncestorPaths {
        root: root.to_string(),
        max_generations,
        paths,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::pedigree::Pedigree;

    fn ped(triples: &[(&str, Option<&str>, Option<&str>)]) -> Pedigree {
        let mut p = Pedigree::new();
        for (id, s, d) in triples {
            p.add_dog(id, *s, *d).unwrap();
        }
        p
    }

    /// Three-generation pedigree where G1 is both paternal and maternal
    /// grandsire of Pup, through its offspring P1 and P2.
    fn reconverging_pedigree() -> Pedigree {
        ped(&[
            ("G1", None, None),
            ("G2", None, None),
            ("G3", None, None),
            ("P1", Some("G1"), Some("G2")),
            ("P2", Some("G1"), Some("G3")),
            ("Pup", Some("P1"), Some("P2")),
        ])
    }

    #[test]
    fn test_founder_has_only_itself() {
        let p = ped(&[("A", None, None)]);
        let paths = enumerate_paths(&p, "A", 6).unwrap();
        assert_eq!(paths.n_ancestors(), 0);
        assert_eq!(paths.n_paths(), 0);
        assert_eq!(paths.paths_to("A").len(), 1);
        assert_eq!(paths.paths_to("A")[0].length(), 0);
    }

    #[test]
    fn test_parents_at_generation_one() {
        let p = ped(&[("S", None, None), ("D", None, None), ("Pup", Some("S"), Some("D"))]);
        let paths = enumerate_paths(&p, "Pup", 1).unwrap();
        assert_eq!(paths.n_ancestors(), 2);
        assert_eq!(paths.paths_to("S")[0].length(), 1);
        assert_eq!(paths.paths_to("S")[0].dogs(), &["Pup".to_string(), "S".to_string()]);
        assert_eq!(paths.paths_to("D")[0].ancestor(), "D");
        assert_eq!(paths.paths_to("D")[0].root(), "Pup");
    }

    #[test]
    fn test_reconverging_paths_are_kept_separately() {
        let p = reconverging_pedigree();
        let paths = enumerate_paths(&p, "Pup", 6).unwrap();

        let to_g1 = paths.paths_to("G1");
        assert_eq!(to_g1.len(), 2);
        assert_eq!(to_g1[0].to_string(), "Pup -> P1 -> G1");
        assert_eq!(to_g1[1].to_string(), "Pup -> P2 -> G1");
        assert_eq!(paths.paths_to("G2").len(), 1);
        assert_eq!(paths.n_ancestors(), 5);
        assert_eq!(paths.n_paths(), 6);
        assert!(paths.warnings().is_empty());
    }

    #[test]
    fn test_generation_bound_stops_expansion() {
        let p = reconverging_pedigree();
        let paths = enumerate_paths(&p, "Pup", 1).unwrap();
        assert!(paths.contains("P1"));
        assert!(!paths.contains("G1"));
    }

    #[test]
    fn test_bound_out_of_range_rejected() {
        let p = reconverging_pedigree();
        assert!(matches!(
            enumerate_paths(&p, "Pup", 0),
            Err(AnalysisError::InvalidArgument(_))
        ));
        assert!(matches!(
            enumerate_paths(&p, "Pup", 11),
            Err(AnalysisError::InvalidArgument(_))
        ));
        assert!(enumerate_paths(&p, "Pup", 10).is_ok());
    }

    #[test]
    fn test_unknown_root_rejected() {
        let p = reconverging_pedigree();
        let err = enumerate_paths(&p, "Nobody", 3).unwrap_err();
        assert!(format!("{}", err).contains("Nobody"));
    }

    #[test]
    fn test_dangling_parent_degrades_to_founder() {
        let p = ped(&[("S", None, None), ("Pup", Some("S"), Some("Ghost"))]);
        let paths = enumerate_paths(&p, "Pup", 6).unwrap();

        assert!(paths.contains("Ghost"));
        assert_eq!(paths.paths_to("Ghost").len(), 1);
        assert_eq!(
            paths.warnings(),
            &[DataIntegrityWarning::DanglingReference {
                dog: "Pup".to_string(),
                role: ParentRole::Dam,
                parent: "Ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_cycle_is_cut_per_path() {
        // A -> B -> C -> A: corrupted data, must still terminate.
        let p = ped(&[("A", Some("B"), None), ("B", Some("C"), None), ("C", Some("A"), None)]);
        let paths = enumerate_paths(&p, "A", 10).unwrap();

        assert_eq!(paths.n_ancestors(), 2);
        assert_eq!(paths.paths_to("C")[0].length(), 2);
        assert!(matches!(
            paths.warnings()[0],
            DataIntegrityWarning::CycleDetected { .. }
        ));
    }

    #[test]
    fn test_warning_display() {
        let w = DataIntegrityWarning::DanglingReference {
            dog: "Pup".into(),
            role: ParentRole::Sire,
            parent: "X".into(),
        };
        assert_eq!(
            w.to_string(),
            "'Pup' references unknown sire 'X'; treated as a founder"
        );
    }
}
