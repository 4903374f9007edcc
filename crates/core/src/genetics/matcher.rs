use indexmap::IndexMap;
use serde::Serialize;

use crate::types::DogId;

use super::paths::{AncestorPath, AncestorPaths};

/// One pairing of a sire-side path and a dam-side path that meet at the
/// same ancestor. This is the unit the coefficient formula sums over.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonAncestorContribution {
    pub ancestor: DogId,
    pub sire_generations: usize,
    pub dam_generations: usize,
    #[serde(skip)]
    pub sire_path: AncestorPath,
    #[serde(skip)]
    pub dam_path: AncestorPath,
}

impl CommonAncestorContribution {
    /// Number of parent edges on the deeper side.
    pub fn depth(&self) -> usize {
        self.sire_generations.max(self.dam_generations)
    }

    /// `0.5^(n1 + n2 + 1)`, the share of this pairing before scaling by the
    /// ancestor's own `(1 + F_A)`.
    pub fn path_weight(&self) -> f64 {
        0.5_f64.powi((self.sire_generations + self.dam_generations + 1) as i32)
    }
}

/// Human-facing rollup of the contributions through one ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonAncestor {
    pub ancestor_id: DogId,
    /// Number of contributions through this ancestor.
    pub occurrences: usize,
    /// Smallest `max(sire generations, dam generations)` over those
    /// contributions.
    pub min_generation_distance: usize,
}

/// Pair every sire-side path with every dam-side path to each shared
/// ancestor.
///
/// A pairing is skipped when the two routes already share a dog before the
/// ancestor: the two halves of a relationship path must be independent, and
/// such a pairing is counted through the nearer shared dog instead.
/// Output order is sire-side discovery order; callers must not rely on it.
pub fn match_common_ancestors(
    sire_paths: &AncestorPaths,
    dam_paths: &AncestorPaths,
) -> Vec<CommonAncestorContribution> {
    let mut contributions = Vec::new();

    for (ancestor, from_sire) in sire_paths.iter() {
        let from_dam = dam_paths.paths_to(ancestor);
        if from_dam.is_empty() {
            continue;
        }
        for sp in from_sire {
            for dp in from_dam {
                if !routes_independent(sp, dp) {
                    continue;
                }
                contributions.push(CommonAncestorContribution {
                    ancestor: ancestor.to_string(),
                    sire_generations: sp.length(),
                    dam_generations: dp.length(),
                    sire_path: sp.clone(),
                    dam_path: dp.clone(),
                });
            }
        }
    }

    log::debug!(
        "Matched {} contributions between '{}' and '{}'",
        contributions.len(),
        sire_paths.root(),
        dam_paths.root()
    );
    contributions
}

/// The two routes share no dog other than their common end.
fn routes_independent(a: &AncestorPath, b: &AncestorPath) -> bool {
    let b_before = b.intermediates();
    !a.intermediates().iter().any(|dog| b_before.contains(dog))
}

/// Roll contributions up per ancestor, ordered by distance then id.
pub fn summarize_common_ancestors(
    contributions: &[CommonAncestorContribution],
) -> Vec<CommonAncestor> {
    let mut by_ancestor: IndexMap<&str, CommonAncestor> = IndexMap::new();
    for c in contributions {
        let entry = by_ancestor
            .entry(c.ancestor.as_str())
            .or_insert_with(|| CommonAncestor {
                ancestor_id: c.ancestor.clone(),
                occurrences: 0,
                min_generation_distance: usize::MAX,
            });
        entry.occurrences += 1;
        entry.min_generation_distance = entry.min_generation_distance.min(c.depth());
    }

    let mut rollup: Vec<CommonAncestor> = by_ancestor.into_values().collect();
    rollup.sort_by(|a, b| {
        a.min_generation_distance
            .cmp(&b.min_generation_distance)
            .then_with(|| a.ancestor_id.cmp(&b.ancestor_id))
    });
    rollup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::paths::enumerate_paths;
    use crate::genetics::pedigree::Pedigree;

    fn ped(triples: &[(&str, Option<&str>, Option<&str>)]) -> Pedigree {
        let mut p = Pedigree::new();
        for (id, s, d) in triples {
            p.add_dog(id, *s, *d).unwrap();
        }
        p
    }

    fn contributions(p: &Pedigree, sire: &str, dam: &str, g: usize) -> Vec<CommonAncestorContribution> {
        let sp = enumerate_paths(p, sire, g).unwrap();
        let dp = enumerate_paths(p, dam, g).unwrap();
        match_common_ancestors(&sp, &dp)
    }

    #[test]
    fn test_full_siblings_share_both_parents() {
        let p = ped(&[
            ("F", None, None),
            ("M", None, None),
            ("S", Some("F"), Some("M")),
            ("D", Some("F"), Some("M")),
        ]);
        let c = contributions(&p, "S", "D", 6);
        assert_eq!(c.len(), 2);
        assert!(c.iter().all(|x| x.sire_generations == 1 && x.dam_generations == 1));

        let rollup = summarize_common_ancestors(&c);
        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup[0].ancestor_id, "F");
        assert_eq!(rollup[1].ancestor_id, "M");
        assert_eq!(rollup[0].occurrences, 1);
        assert_eq!(rollup[0].min_generation_distance, 1);
    }

    #[test]
    fn test_unrelated_pair_has_no_contributions() {
        let p = ped(&[
            ("A", None, None),
            ("B", None, None),
            ("C", None, None),
            ("E", None, None),
            ("S", Some("A"), Some("B")),
            ("D", Some("C"), Some("E")),
        ]);
        assert!(contributions(&p, "S", "D", 6).is_empty());
    }

    #[test]
    fn test_cross_product_of_paths() {
        // X is reached twice from the sire side (both grandparents' sire) and
        // once from the dam side.
        let p = ped(&[
            ("X", None, None),
            ("Y1", None, None),
            ("Y2", None, None),
            ("SP1", Some("X"), Some("Y1")),
            ("SP2", Some("X"), Some("Y2")),
            ("S", Some("SP1"), Some("SP2")),
            ("D", Some("X"), None),
        ]);
        let c = contributions(&p, "S", "D", 6);
        let through_x: Vec<_> = c.iter().filter(|x| x.ancestor == "X").collect();
        assert_eq!(through_x.len(), 2);
        assert!(through_x
            .iter()
            .all(|x| x.sire_generations == 2 && x.dam_generations == 1));

        let rollup = summarize_common_ancestors(&c);
        assert_eq!(rollup.len(), 1);
        assert_eq!(rollup[0].occurrences, 2);
        assert_eq!(rollup[0].min_generation_distance, 2);
    }

    #[test]
    fn test_routes_through_nearer_ancestor_are_pruned() {
        // S and D are full siblings whose sire F has recorded parents GF, GM.
        // GF and GM are reached only through F on both sides, so those
        // pairings are already counted through F.
        let p = ped(&[
            ("GF", None, None),
            ("GM", None, None),
            ("F", Some("GF"), Some("GM")),
            ("M", None, None),
            ("S", Some("F"), Some("M")),
            ("D", Some("F"), Some("M")),
        ]);
        let c = contributions(&p, "S", "D", 6);
        assert_eq!(c.len(), 2);
        assert!(c.iter().all(|x| x.ancestor == "F" || x.ancestor == "M"));
    }

    #[test]
    fn test_parent_offspring_matches_at_distance_zero() {
        // D is a daughter of S.
        let p = ped(&[("S", None, None), ("M", None, None), ("D", Some("S"), Some("M"))]);
        let c = contributions(&p, "S", "D", 6);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].ancestor, "S");
        assert_eq!(c[0].sire_generations, 0);
        assert_eq!(c[0].dam_generations, 1);
        assert_eq!(c[0].path_weight(), 0.25);
    }

    #[test]
    fn test_path_weight() {
        let p = ped(&[("A", None, None)]);
        let sp = enumerate_paths(&p, "A", 1).unwrap();
        let c = CommonAncestorContribution {
            ancestor: "A".into(),
            sire_generations: 1,
            dam_generations: 2,
            sire_path: sp.paths_to("A")[0].clone(),
            dam_path: sp.paths_to("A")[0].clone(),
        };
        assert_eq!(c.path_weight(), 0.0625);
        assert_eq!(c.depth(), 2);
    }
}
