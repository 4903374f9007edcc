//! Integration test: bounded path counting against the whole-pedigree
//! tabular method.
//!
//! For every ordered pair of distinct dogs in a line-bred kennel, a
//! hypothetical pup is added and its coefficient is computed by the tabular
//! method. The path-counting analysis of the same mating must agree as long
//! as the generation bound covers the whole pedigree.

use approx::assert_relative_eq;

use pedigree_analysis_core::genetics::compute_inbreeding;
use pedigree_analysis_core::{Pedigree, PedigreeAnalyzer};

/// Four generations of line breeding on founder A, with a dam line that
/// enters twice through C.
fn line_bred_kennel() -> Pedigree {
    let rows: [(&str, Option<&str>, Option<&str>); 14] = [
        ("A", None, None),
        ("B", None, None),
        ("C", None, None),
        ("E", None, None),
        ("X1", Some("A"), Some("B")),
        ("X2", Some("A"), Some("B")),
        ("X3", Some("A"), Some("C")),
        ("Y", Some("C"), Some("E")),
        ("P1", Some("X1"), Some("X2")),
        ("P2", Some("X1"), Some("X3")),
        ("P3", Some("X3"), Some("Y")),
        ("Q1", Some("P1"), Some("P2")),
        ("Q2", Some("P2"), Some("P3")),
        ("R1", Some("Q1"), Some("P3")),
    ];
    let mut p = Pedigree::new();
    for (id, s, d) in rows {
        p.add_dog(id, s, d).unwrap();
    }
    p
}

fn tabular_pup_coefficient(base: &Pedigree, sire: &str, dam: &str) -> f64 {
    let mut ped = base.clone();
    ped.add_dog("__pup__", Some(sire), Some(dam)).unwrap();
    compute_inbreeding(&ped)
        .unwrap()
        .into_iter()
        .find(|(id, _)| id == "__pup__")
        .map(|(_, f)| f)
        .unwrap()
}

#[test]
fn test_path_counting_matches_tabular_method() {
    let kennel = line_bred_kennel();
    let analyzer = PedigreeAnalyzer::new(kennel.clone());
    let ids: Vec<String> = kennel.ids().map(String::from).collect();

    for sire in &ids {
        for dam in &ids {
            if sire == dam {
                continue;
            }
            let expected = tabular_pup_coefficient(&kennel, sire, dam);
            let result = analyzer.analyze(sire, dam, Some(6)).unwrap();
            assert_relative_eq!(result.raw_coefficient(), expected, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_known_values_of_recorded_dogs() {
    let report = compute_inbreeding(&line_bred_kennel()).unwrap();
    let f = |id: &str| report.iter().find(|(d, _)| d == id).map(|(_, f)| *f).unwrap();

    assert_relative_eq!(f("P1"), 0.25, epsilon = 1e-12);
    assert_relative_eq!(f("P2"), 0.125, epsilon = 1e-12);
    assert_relative_eq!(f("P3"), 0.125, epsilon = 1e-12);
    assert_relative_eq!(f("X1"), 0.0, epsilon = 1e-12);
}

#[test]
fn test_recorded_dog_matches_analysis_of_its_parents() {
    let kennel = line_bred_kennel();
    let report = compute_inbreeding(&kennel).unwrap();
    let analyzer = PedigreeAnalyzer::new(kennel);

    for (id, f) in &report {
        let rec = analyzer.store().get(id).unwrap().clone();
        if let Some((sire, dam)) = rec.parents() {
            let r = analyzer.analyze(sire, dam, Some(6)).unwrap();
            assert_relative_eq!(r.raw_coefficient(), *f, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_shallow_bound_never_exceeds_full_pedigree_value() {
    let kennel = line_bred_kennel();
    let analyzer = PedigreeAnalyzer::new(kennel.clone());
    let full = tabular_pup_coefficient(&kennel, "R1", "Q2");

    for g in 1..=6 {
        let r = analyzer.analyze("R1", "Q2", Some(g)).unwrap();
        assert!(
            r.raw_coefficient() <= full + 1e-12,
            "bound {}: {} > {}",
            g,
            r.raw_coefficient(),
            full
        );
    }
}
