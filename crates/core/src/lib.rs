pub mod api;
pub mod config;
pub mod error;
pub mod genetics;
pub mod types;

pub use config::{AnalysisConfig, RecommendationPolicy};
pub use error::{AnalysisError, Result};
pub use genetics::{AncestryStore, Pedigree, PedigreeAnalysisResult, PedigreeAnalyzer};
pub use types::{DogId, DogRecord, DEFAULT_GENERATIONS, MAX_GENERATIONS};
