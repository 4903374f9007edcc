//! JSON request/response boundary for callers such as a pedigree-record
//! form or a GraphQL resolver. Field names are camelCase.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::genetics::analysis::{PedigreeAnalysisResult, PedigreeAnalyzer};
use crate::genetics::matcher::CommonAncestor;
use crate::genetics::paths::DataIntegrityWarning;
use crate::genetics::store::AncestryStore;
use crate::types::DogId;

/// Default `generation` of a persisted pedigree record. Independent of the
/// analysis depth.
pub const DEFAULT_RECORD_GENERATION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub sire_id: DogId,
    pub dam_id: DogId,
    #[serde(default)]
    pub generations: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonAncestorEntry {
    pub ancestor_id: DogId,
    pub occurrences: usize,
    pub min_generation_distance: usize,
}

impl From<&CommonAncestor> for CommonAncestorEntry {
    fn from(a: &CommonAncestor) -> Self {
        Self {
            ancestor_id: a.ancestor_id.clone(),
            occurrences: a.occurrences,
            min_generation_distance: a.min_generation_distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub inbreeding_coefficient: f64,
    pub common_ancestors: Vec<CommonAncestorEntry>,
    pub genetic_diversity: f64,
    pub recommendations: Vec<String>,
    /// Advisory notes for data problems worked around during the analysis.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<&PedigreeAnalysisResult> for AnalysisResponse {
    fn from(r: &PedigreeAnalysisResult) -> Self {
        Self {
            inbreeding_coefficient: r.inbreeding_coefficient(),
            common_ancestors: r.common_ancestors().iter().map(Into::into).collect(),
            genetic_diversity: r.genetic_diversity(),
            recommendations: r.recommendations().to_vec(),
            warnings: r.warnings().iter().map(DataIntegrityWarning::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(e: &AnalysisError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Pre-filled values for the external pedigree-record writer. The engine
/// never persists these itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedigreeRecordDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dog_id: Option<DogId>,
    pub sire_id: DogId,
    pub dam_id: DogId,
    pub generation: u32,
    pub coefficient: f64,
}

impl PedigreeRecordDraft {
    pub fn from_result(result: &PedigreeAnalysisResult, dog_id: Option<&str>) -> Self {
        Self {
            dog_id: dog_id.map(str::to_string),
            sire_id: result.sire_id().to_string(),
            dam_id: result.dam_id().to_string(),
            generation: DEFAULT_RECORD_GENERATION,
            coefficient: result.inbreeding_coefficient(),
        }
    }
}

/// Run a typed request.
pub fn handle_request<S: AncestryStore>(
    analyzer: &PedigreeAnalyzer<S>,
    request: &AnalysisRequest,
) -> Result<AnalysisResponse> {
    let result = analyzer.analyze(&request.sire_id, &request.dam_id, request.generations)?;
    Ok(AnalysisResponse::from(&result))
}

/// Run a JSON request and return a JSON document: the response on success,
/// an [`ErrorResponse`] otherwise. Never fails.
pub fn handle_request_json<S: AncestryStore>(analyzer: &PedigreeAnalyzer<S>, body: &str) -> String {
    let outcome = serde_json::from_str::<AnalysisRequest>(body)
        .map_err(AnalysisError::from)
        .and_then(|request| handle_request(analyzer, &request));

    let encoded = match &outcome {
        Ok(response) => serde_json::to_string(response),
        Err(err) => serde_json::to_string(&ErrorResponse::from(err)),
    };
    encoded.unwrap_or_else(|e| {
        log::error!("Failed to encode analysis response: {}", e);
        r#"{"kind":"json_error","message":"failed to encode response"}"#.to_string()
    })
}
