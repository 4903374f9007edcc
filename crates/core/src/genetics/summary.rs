use serde::Serialize;

use crate::config::RecommendationPolicy;

/// Qualitative risk band of a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    LowModerate,
    Moderate,
    High,
}

impl RiskBand {
    /// Place a coefficient in a band. A coefficient equal to a threshold
    /// stays in the lower band, so a half-sibling mating (exactly 0.125)
    /// reads as moderate and a full-sibling mating (0.25) as high.
    pub fn classify(coefficient: f64, policy: &RecommendationPolicy) -> Self {
        if coefficient > policy.high {
            RiskBand::High
        } else if coefficient > policy.moderate {
            RiskBand::Moderate
        } else if coefficient > policy.low_moderate {
            RiskBand::LowModerate
        } else {
            RiskBand::Low
        }
    }

    /// Guidance shown for the band.
    pub fn guidance(&self) -> &'static str {
        match self {
            RiskBand::Low => "low genetic risk, pairing acceptable",
            RiskBand::LowModerate => "low-moderate risk, monitor offspring health screening",
            RiskBand::Moderate => "moderate risk, consider outcrossing for future pairings",
            RiskBand::High => "high risk, alternative pairing strongly recommended",
        }
    }
}

/// Diversity score and guidance derived from a coefficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversitySummary {
    /// `1 - coefficient`, unrounded.
    pub genetic_diversity: f64,
    pub risk_band: RiskBand,
    pub recommendations: Vec<String>,
}

/// Derive the diversity score and recommendations.
///
/// `common_ancestor_count` is the number of distinct shared ancestors; above
/// the policy's threshold a narrow-founder-base note is appended whatever the
/// band.
pub fn summarize(
    coefficient: f64,
    common_ancestor_count: usize,
    policy: &RecommendationPolicy,
) -> DiversitySummary {
    let risk_band = RiskBand::classify(coefficient, policy);
    let mut recommendations = vec![risk_band.guidance().to_string()];

    if common_ancestor_count > policy.narrow_founder_base_threshold {
        recommendations.push(format!(
            "narrow founder base: {} distinct common ancestors, consider broadening the breeding pool",
            common_ancestor_count
        ));
    }

    DiversitySummary {
        genetic_diversity: 1.0 - coefficient,
        risk_band,
        recommendations,
    }
}
