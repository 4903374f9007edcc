// Genetics module: ancestry store, path-counting inbreeding analysis,
// whole-pedigree inbreeding and candidate ranking.

pub mod analysis;
pub mod batch;
pub mod coefficient;
pub mod matcher;
pub mod paths;
pub mod pedigree;
pub mod store;
pub mod summary;
pub mod tabular;

pub use analysis::{AnalysisStage, PedigreeAnalysisResult, PedigreeAnalyzer};
pub use batch::{rank_candidates, CandidateOutcome};
pub use coefficient::{path_coefficient, CoefficientCalculator};
pub use matcher::{
    match_common_ancestors, summarize_common_ancestors, CommonAncestor,
    CommonAncestorContribution,
};
pub use paths::{enumerate_paths, AncestorPath, AncestorPaths, DataIntegrityWarning};
pub use pedigree::{Pedigree, PedigreeReport};
pub use store::AncestryStore;
pub use summary::{summarize, DiversitySummary, RiskBand};
pub use tabular::compute_inbreeding;
