use std::collections::{HashMap, VecDeque};
use std::path::Path;

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::types::{DogId, DogRecord, ParentRole};

use super::store::AncestryStore;

/// In-memory ancestry store.
///
/// Parent references are kept as raw ids rather than resolved indices, so a
/// parent that was never registered stays visible as a dangling reference
/// instead of silently becoming "unknown". Records may be added in any order.
#[derive(Debug, Clone, Default)]
pub struct Pedigree {
    /// Records in insertion order.
    records: Vec<DogRecord>,
    /// Mapping from dog id to its position in `records`.
    id_to_index: HashMap<DogId, usize>,
}

/// A parent reference that does not resolve to a registered dog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingParent {
    pub dog: DogId,
    pub role: ParentRole,
    pub parent: DogId,
}

/// Outcome of [`Pedigree::validate`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PedigreeReport {
    pub n_dogs: usize,
    pub n_founders: usize,
    pub dangling: Vec<DanglingParent>,
    /// Dogs listed as their own sire or dam.
    pub self_parents: Vec<DogId>,
    /// Dogs that are part of, or descend from, an ancestry cycle.
    pub cyclic: Vec<DogId>,
}

impl PedigreeReport {
    /// No dangling references, self-parents or cycles.
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.self_parents.is_empty() && self.cyclic.is_empty()
    }
}

impl Pedigree {
    /// Create an empty pedigree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dogs in the pedigree.
    pub fn n_dogs(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&DogRecord> {
        self.id_to_index.get(id).map(|&i| &self.records[i])
    }

    /// Dog ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[DogRecord] {
        &self.records
    }

    /// Add a dog to the pedigree.
    ///
    /// Parents do not need to be registered first; unresolved parents are
    /// reported by [`Pedigree::validate`] and treated as dangling by the
    /// analysis engine.
    ///
    /// # Errors
    /// Returns an error if the dog id is empty or already exists.
    pub fn add_dog(&mut self, id: &str, sire: Option<&str>, dam: Option<&str>) -> Result<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AnalysisError::Pedigree("Empty dog ID".to_string()));
        }
        if self.id_to_index.contains_key(id) {
            return Err(AnalysisError::Pedigree(format!("Duplicate dog ID: '{}'", id)));
        }

        let index = self.records.len();
        self.records.push(DogRecord::new(
            id,
            sire.and_then(parse_parent).as_deref(),
            dam.and_then(parse_parent).as_deref(),
        ));
        self.id_to_index.insert(id.to_string(), index);
        Ok(())
    }

    /// Build a pedigree from (dog, sire, dam) triples.
    ///
    /// Parent values of `None` indicate unknown parents.
    ///
    /// # Errors
    /// Returns an error if duplicate dog IDs are found.
    pub fn from_triples(triples: &[(String, Option<String>, Option<String>)]) -> Result<Self> {
        let mut ped = Self::new();
        for (id, sire, dam) in triples {
            ped.add_dog(id, sire.as_deref(), dam.as_deref())?;
        }
        Ok(ped)
    }

    /// Read a pedigree from a CSV file.
    ///
    /// Expected columns (header required): one of `dog`, `animal` or `id`,
    /// plus `sire` and `dam`. Unknown parents are coded as `"0"`, `""`, or
    /// `"NA"`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, columns are missing, or
    /// duplicate dog IDs are found.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let ped = Self::from_csv_reader(reader)?;
        log::debug!(
            "Loaded pedigree with {} dogs from '{}'",
            ped.n_dogs(),
            path.display()
        );
        Ok(ped)
    }

    /// Read a pedigree from any CSV reader (see [`Pedigree::from_csv`]).
    pub fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let dog_col = headers
            .iter()
            .position(|h| h == "dog" || h == "animal" || h == "id")
            .ok_or_else(|| {
                AnalysisError::Pedigree("CSV missing 'dog' (or 'animal'/'id') column".to_string())
            })?;
        let sire_col = headers
            .iter()
            .position(|h| h == "sire")
            .ok_or_else(|| AnalysisError::Pedigree("CSV missing 'sire' column".to_string()))?;
        let dam_col = headers
            .iter()
            .position(|h| h == "dam")
            .ok_or_else(|| AnalysisError::Pedigree("CSV missing 'dam' column".to_string()))?;

        let mut ped = Self::new();
        for result in reader.records() {
            let record = result?;
            let field = |col: usize, name: &str| {
                record.get(col).ok_or_else(|| {
                    AnalysisError::Pedigree(format!("Missing {} field in row", name))
                })
            };
            let dog = field(dog_col, "dog")?;
            let sire = field(sire_col, "sire")?;
            let dam = field(dam_col, "dam")?;
            ped.add_dog(dog, Some(sire), Some(dam))?;
        }
        Ok(ped)
    }

    /// Check the pedigree for consistency.
    ///
    /// Unlike construction errors, the problems found here do not stop the
    /// engine from running: dangling parents degrade to founders and cyclic
    /// branches are cut. The report lets callers surface them anyway.
    pub fn validate(&self) -> PedigreeReport {
        let mut report = PedigreeReport {
            n_dogs: self.records.len(),
            n_founders: self.records.iter().filter(|r| r.is_founder()).count(),
            ..Default::default()
        };

        for rec in &self.records {
            for (role, parent) in [(ParentRole::Sire, &rec.sire), (ParentRole::Dam, &rec.dam)] {
                let Some(parent) = parent else { continue };
                if parent == &rec.id {
                    report.self_parents.push(rec.id.clone());
                } else if !self.id_to_index.contains_key(parent) {
                    report.dangling.push(DanglingParent {
                        dog: rec.id.clone(),
                        role,
                        parent: parent.clone(),
                    });
                }
            }
        }

        let (order, _) = self.kahn_order();
        if order.len() != self.records.len() {
            let mut placed = vec![false; self.records.len()];
            for &i in &order {
                placed[i] = true;
            }
            report.cyclic = self
                .records
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed[*i])
                .map(|(_, r)| r.id.clone())
                .collect();
        }

        for dangling in &report.dangling {
            log::warn!(
                "Dog '{}' references unknown {} '{}'",
                dangling.dog,
                dangling.role,
                dangling.parent
            );
        }
        report
    }

    /// Dog ids ordered so that parents appear before their offspring.
    ///
    /// # Errors
    /// Returns an error if the pedigree contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        let (order, _) = self.kahn_order();
        if order.len() != self.records.len() {
            return Err(AnalysisError::Pedigree(
                "Pedigree contains a cycle; cannot sort".to_string(),
            ));
        }
        Ok(order.iter().map(|&i| self.records[i].id.as_str()).collect())
    }

    /// Kahn's algorithm over parent -> offspring edges. Dangling parents are
    /// ignored. Returns the processed order and the remaining in-degrees.
    fn kahn_order(&self) -> (Vec<usize>, Vec<u32>) {
        let n = self.records.len();
        let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0u32; n];

        for (i, rec) in self.records.iter().enumerate() {
            for parent in [&rec.sire, &rec.dam].into_iter().flatten() {
                if let Some(&p) = self.id_to_index.get(parent) {
                    children_of[p].push(i);
                    in_degree[i] += 1;
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order: Vec<usize> = Vec::with_capacity(n);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &child in &children_of[node] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        (order, in_degree)
    }
}

impl AncestryStore for Pedigree {
    fn lookup(&self, id: &str) -> Option<DogRecord> {
        self.get(id).cloned()
    }

    fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }
}

/// Parse a parent string, returning `None` for unknown parents.
///
/// Unknown parents are coded as `"0"`, `""`, `"NA"`, or `"na"`.
fn parse_parent(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "0" || trimmed.eq_ignore_ascii_case("na") {
        None
    } else {
        Some(trimmed.to_string())
    }
}
