use std::fmt;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::types::DogId;

use super::coefficient::CoefficientCalculator;
use super::matcher::{
    match_common_ancestors, summarize_common_ancestors, CommonAncestor,
    CommonAncestorContribution,
};
use super::paths::{check_generations, enumerate_paths, DataIntegrityWarning};
use super::store::AncestryStore;
use super::summary::{summarize, RiskBand};

/// Stage of a single analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Idle,
    Validating,
    Enumerating,
    Matching,
    Computing,
    Done,
    Failed,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Idle => "idle",
            AnalysisStage::Validating => "validating",
            AnalysisStage::Enumerating => "enumerating",
            AnalysisStage::Matching => "matching",
            AnalysisStage::Computing => "computing",
            AnalysisStage::Done => "done",
            AnalysisStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of analysing one mating. Immutable once built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PedigreeAnalysisResult {
    sire_id: DogId,
    dam_id: DogId,
    generations: usize,
    inbreeding_coefficient: f64,
    #[serde(skip)]
    raw_coefficient: f64,
    common_ancestors: Vec<CommonAncestor>,
    genetic_diversity: f64,
    risk_band: RiskBand,
    recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<DataIntegrityWarning>,
    #[serde(skip)]
    contributions: Vec<CommonAncestorContribution>,
}

impl PedigreeAnalysisResult {
    pub fn sire_id(&self) -> &str {
        &self.sire_id
    }

    pub fn dam_id(&self) -> &str {
        &self.dam_id
    }

    /// Generation bound the analysis ran with.
    pub fn generations(&self) -> usize {
        self.generations
    }

    /// Coefficient rounded for display.
    pub fn inbreeding_coefficient(&self) -> f64 {
        self.inbreeding_coefficient
    }

    /// Coefficient before display rounding.
    pub fn raw_coefficient(&self) -> f64 {
        self.raw_coefficient
    }

    pub fn common_ancestors(&self) -> &[CommonAncestor] {
        &self.common_ancestors
    }

    pub fn genetic_diversity(&self) -> f64 {
        self.genetic_diversity
    }

    pub fn risk_band(&self) -> RiskBand {
        self.risk_band
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    /// Data problems worked around during the analysis.
    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Every sire-path/dam-path pairing the coefficient was summed over.
    pub fn contributions(&self) -> &[CommonAncestorContribution] {
        &self.contributions
    }

    /// Multi-line report for terminals and logs.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!(
            "=== Pedigree analysis: {} x {} ({} generations) ===\n\n",
            self.sire_id, self.dam_id, self.generations
        ));
        s.push_str(&format!(
            "Inbreeding coefficient: {:.4}\nGenetic diversity:      {:.4}\n\n",
            self.inbreeding_coefficient, self.genetic_diversity
        ));

        if self.common_ancestors.is_empty() {
            s.push_str("No common ancestors within the generation bound.\n");
        } else {
            s.push_str(&format!(
                "{:<24} {:>11} {:>14}\n",
                "Common ancestor", "Occurrences", "Min distance"
            ));
            for a in &self.common_ancestors {
                s.push_str(&format!(
                    "{:<24} {:>11} {:>14}\n",
                    a.ancestor_id, a.occurrences, a.min_generation_distance
                ));
            }
        }

        s.push_str("\nRecommendations:\n");
        for r in &self.recommendations {
            s.push_str(&format!("  - {}\n", r));
        }

        if !self.warnings.is_empty() {
            s.push_str("\nData integrity warnings:\n");
            for w in &self.warnings {
                s.push_str(&format!("  ! {}\n", w));
            }
        }
        s
    }
}

/// Entry point of the engine: analyses matings against a read-only store.
///
/// The analyzer holds no per-request state, so one instance can serve
/// concurrent requests; each call builds and drops its own memo cache.
#[derive(Debug, Clone)]
pub struct PedigreeAnalyzer<S: AncestryStore> {
    store: S,
    config: AnalysisConfig,
}

impl<S: AncestryStore> PedigreeAnalyzer<S> {
    /// Analyzer with the default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: AnalysisConfig::default(),
        }
    }

    /// Analyzer with a custom configuration.
    ///
    /// # Errors
    /// Returns `Config` if the configuration is inconsistent.
    pub fn with_config(store: S, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse the mating `sire` x `dam` looking `generations` generations
    /// above each parent (the configured default when `None`).
    ///
    /// All-or-nothing: no partial result is returned on failure. Data
    /// problems that can be worked around are reported on the result as
    /// warnings instead.
    ///
    /// # Errors
    /// - `InvalidArgument` if `sire == dam`, the bound is outside
    ///   `[1, max_generations]`, or either id is not in the store.
    /// - `Computation` if the coefficient leaves `[0, 1]` or an ancestry
    ///   cycle defeats the depth guard.
    pub fn analyze(
        &self,
        sire: &str,
        dam: &str,
        generations: Option<usize>,
    ) -> Result<PedigreeAnalysisResult> {
        let mut run = Run::new(sire, dam);
        match self.execute(&mut run, sire, dam, generations) {
            Ok(result) => {
                run.advance(AnalysisStage::Done);
                Ok(result)
            }
            Err(err) => Err(run.fail(err)),
        }
    }

    fn execute(
        &self,
        run: &mut Run,
        sire: &str,
        dam: &str,
        generations: Option<usize>,
    ) -> Result<PedigreeAnalysisResult> {
        run.advance(AnalysisStage::Validating);
        let generations = self.validate(sire, dam, generations)?;

        run.advance(AnalysisStage::Enumerating);
        let sire_paths = enumerate_paths(&self.store, sire, generations)?;
        let dam_paths = enumerate_paths(&self.store, dam, generations)?;

        run.advance(AnalysisStage::Matching);
        let contributions = match_common_ancestors(&sire_paths, &dam_paths);
        let common_ancestors = summarize_common_ancestors(&contributions);

        run.advance(AnalysisStage::Computing);
        let mut calculator = CoefficientCalculator::new(&self.store);
        let raw_coefficient = calculator.coefficient(&contributions, generations)?;
        log::debug!(
            "Coefficient of {} x {}: {} ({} contributions, memo {:?})",
            sire,
            dam,
            raw_coefficient,
            contributions.len(),
            calculator.stats()
        );

        let mut warnings: Vec<DataIntegrityWarning> = Vec::new();
        for w in sire_paths
            .warnings()
            .iter()
            .chain(dam_paths.warnings())
            .cloned()
            .chain(calculator.into_warnings())
        {
            if !warnings.contains(&w) {
                warnings.push(w);
            }
        }

        let summary = summarize(raw_coefficient, common_ancestors.len(), &self.config.policy);

        Ok(PedigreeAnalysisResult {
            sire_id: sire.to_string(),
            dam_id: dam.to_string(),
            generations,
            inbreeding_coefficient: self.config.round_for_display(raw_coefficient),
            raw_coefficient,
            common_ancestors,
            genetic_diversity: self.config.round_for_display(summary.genetic_diversity),
            risk_band: summary.risk_band,
            recommendations: summary.recommendations,
            warnings,
            contributions,
        })
    }

    fn validate(&self, sire: &str, dam: &str, generations: Option<usize>) -> Result<usize> {
        if sire.trim().is_empty() || dam.trim().is_empty() {
            return Err(AnalysisError::InvalidArgument(
                "sire and dam ids must not be empty".to_string(),
            ));
        }
        if sire == dam {
            return Err(AnalysisError::InvalidArgument(format!(
                "a dog cannot be paired with itself ('{}')",
                sire
            )));
        }

        let generations = generations.unwrap_or(self.config.default_generations);
        check_generations(generations)?;
        if generations > self.config.max_generations {
            return Err(AnalysisError::InvalidArgument(format!(
                "generations must be in [1, {}], got {}",
                self.config.max_generations, generations
            )));
        }

        for (role, id) in [("sire", sire), ("dam", dam)] {
            if !self.store.contains(id) {
                return Err(AnalysisError::InvalidArgument(format!(
                    "{} '{}' not found in the ancestry store",
                    role, id
                )));
            }
        }
        Ok(generations)
    }
}

/// Stage tracking for one `analyze` call.
struct Run {
    label: String,
    stage: AnalysisStage,
}

impl Run {
    fn new(sire: &str, dam: &str) -> Self {
        Self {
            label: format!("{} x {}", sire, dam),
            stage: AnalysisStage::Idle,
        }
    }

    fn advance(&mut self, next: AnalysisStage) {
        log::debug!("Analysis {}: {} -> {}", self.label, self.stage, next);
        self.stage = next;
    }

    /// Record the failure and tag the error with the stage it happened in.
    fn fail(&mut self, err: AnalysisError) -> AnalysisError {
        let stage = self.stage;
        self.advance(AnalysisStage::Failed);
        match err {
            AnalysisError::InvalidArgument(msg) => {
                log::debug!("Analysis {} rejected: {}", self.label, msg);
                AnalysisError::InvalidArgument(msg)
            }
            AnalysisError::Computation(msg) => {
                log::error!("Analysis {} failed while {}: {}", self.label, stage, msg);
                AnalysisError::Computation(format!("{} (while {})", msg, stage))
            }
            other => {
                log::error!("Analysis {} failed while {}: {}", self.label, stage, other);
                other
            }
        }
    }
}
