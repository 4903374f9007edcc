use rayon::prelude::*;

use crate::error::AnalysisError;
use crate::types::DogId;

use super::analysis::{PedigreeAnalysisResult, PedigreeAnalyzer};
use super::store::AncestryStore;

/// Analysis of one candidate dam against a fixed sire.
#[derive(Debug)]
pub struct CandidateOutcome {
    pub dam_id: DogId,
    pub outcome: Result<PedigreeAnalysisResult, AnalysisError>,
}

impl CandidateOutcome {
    pub fn coefficient(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|r| r.raw_coefficient())
    }
}

/// Analyse `sire` against every candidate dam and rank the pairings from
/// least to most inbred.
///
/// Candidates run in parallel; each analysis keeps its own memo cache.
/// A candidate that fails (unknown id, self-pairing, ...) does not abort the
/// batch: it is reported with its error after all successful candidates.
/// Ties are broken by dam id.
pub fn rank_candidates<S, C>(
    analyzer: &PedigreeAnalyzer<S>,
    sire: &str,
    candidates: &[C],
    generations: Option<usize>,
) -> Vec<CandidateOutcome>
where
    S: AncestryStore,
    C: AsRef<str> + Sync,
{
    let mut outcomes: Vec<CandidateOutcome> = candidates
        .par_iter()
        .map(|dam| {
            let dam = dam.as_ref();
            CandidateOutcome {
                dam_id: dam.to_string(),
                outcome: analyzer.analyze(sire, dam, generations),
            }
        })
        .collect();

    outcomes.sort_by(|a, b| match (a.coefficient(), b.coefficient()) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.dam_id.cmp(&b.dam_id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.dam_id.cmp(&b.dam_id),
    });

    let failed = outcomes.iter().filter(|o| o.outcome.is_err()).count();
    log::debug!(
        "Ranked {} candidates for sire '{}' ({} failed)",
        outcomes.len(),
        sire,
        failed
    );
    outcomes
}
