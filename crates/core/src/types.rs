use serde::{Deserialize, Serialize};

/// Identifier of a dog in the ancestry store.
pub type DogId = String;

/// Generation bound used when the caller does not supply one.
pub const DEFAULT_GENERATIONS: usize = 6;

/// Hard ceiling on the generation bound. Enumeration beyond this depth is
/// rejected outright.
pub const MAX_GENERATIONS: usize = 10;

/// A dog as seen by the engine: its id and the ids of its recorded parents.
///
/// A dog with neither parent recorded is a founder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogRecord {
    pub id: DogId,
    pub sire: Option<DogId>,
    pub dam: Option<DogId>,
}

impl DogRecord {
    pub fn new(id: &str, sire: Option<&str>, dam: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            sire: sire.map(str::to_string),
            dam: dam.map(str::to_string),
        }
    }

    /// A founder has no recorded parents.
    pub fn is_founder(&self) -> bool {
        self.sire.is_none() && self.dam.is_none()
    }

    /// Both parents known, as a pair.
    pub fn parents(&self) -> Option<(&str, &str)> {
        match (&self.sire, &self.dam) {
            (Some(s), Some(d)) => Some((s.as_str(), d.as_str())),
            _ => None,
        }
    }
}

/// Which parent edge an ancestor was reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentRole {
    Sire,
    Dam,
}

impl std::fmt::Display for ParentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParentRole::Sire => write!(f, "sire"),
            ParentRole::Dam => write!(f, "dam"),
        }
    }
}
