//! Replaceable heuristics used by the domain handlers
//!
//! Every score produced here lies in `[0, 1]`. Incremental adjustments go
//! through [`adjust_unit`] so repeated updates can never escape that range.

use crate::RandomSource;
use neuromesh_macros::standard;
use neuromesh_types::{Payload, PayloadExt};

pub use neuromesh_types::clamp_unit;

/// Apply a delta to a score and clamp the result
pub fn adjust_unit(current: f64, delta: f64) -> f64 {
    clamp_unit(current + delta)
}

/// Weighted mean of `(value, weight)` pairs, clamped. Zero total weight
/// yields `0`.
pub fn weighted_average(pairs: &[(f64, f64)]) -> f64 {
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return 0.0;
    }
    clamp_unit(pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total)
}

// ============================================================================
// Quality scoring
// ============================================================================

/// Default score for a quality dimension missing from the payload
pub const DEFAULT_DIMENSION_SCORE: f64 = 0.5;

/// Dimensions scoring below this get an improvement recommendation
pub const IMPROVEMENT_THRESHOLD: f64 = 0.7;

/// Quality dimensions and their weights. Weights sum to 1.
pub const QUALITY_WEIGHTS: [(&str, f64); 5] = [
    ("accuracy", 0.25),
    ("reliability", 0.25),
    ("efficiency", 0.20),
    ("maintainability", 0.15),
    ("adaptability", 0.15),
];

/// Five quality sub-scores, each in `[0, 1]`
#[standard]
pub struct QualityScores {
    pub accuracy: f64,
    pub reliability: f64,
    pub efficiency: f64,
    pub maintainability: f64,
    pub adaptability: f64,
}

impl QualityScores {
    /// Read scores with per-dimension defaulting and clamping
    pub fn from_payload(payload: &Payload) -> Self {
        let score = |key| payload.unit_or(key, DEFAULT_DIMENSION_SCORE);
        Self {
            accuracy: score("accuracy"),
            reliability: score("reliability"),
            efficiency: score("efficiency"),
            maintainability: score("maintainability"),
            adaptability: score("adaptability"),
        }
    }

    /// `(dimension, score)` pairs in weight order
    pub fn dimensions(&self) -> [(&'static str, f64); 5] {
        [
            ("accuracy", self.accuracy),
            ("reliability", self.reliability),
            ("efficiency", self.efficiency),
            ("maintainability", self.maintainability),
            ("adaptability", self.adaptability),
        ]
    }

    /// Weighted overall quality
    pub fn overall(&self) -> f64 {
        let pairs: Vec<(f64, f64)> = self
            .dimensions()
            .iter()
            .zip(QUALITY_WEIGHTS.iter())
            .map(|((_, score), (_, weight))| (*score, *weight))
            .collect();
        weighted_average(&pairs)
    }
}

/// Suggested improvement for one weak dimension
#[standard]
pub struct Recommendation {
    pub dimension: String,
    pub score: f64,
    pub recommendation: String,
}

fn recommendation_for(dimension: &str) -> &'static str {
    match dimension {
        "accuracy" => "Expand validation datasets and tighten acceptance checks",
        "reliability" => "Add redundancy and failure-injection testing",
        "efficiency" => "Profile hot paths and reduce redundant processing",
        "maintainability" => "Reduce coupling and document module contracts",
        "adaptability" => "Introduce configuration points for changing inputs",
        _ => "Review this dimension",
    }
}

/// Recommendations for dimensions below [`IMPROVEMENT_THRESHOLD`], weakest first
pub fn improvement_recommendations(scores: &QualityScores) -> Vec<Recommendation> {
    let mut weak: Vec<(&str, f64)> = scores
        .dimensions()
        .into_iter()
        .filter(|(_, score)| *score < IMPROVEMENT_THRESHOLD)
        .collect();
    weak.sort_by(|a, b| a.1.total_cmp(&b.1));

    weak.into_iter()
        .map(|(dimension, score)| Recommendation {
            dimension: dimension.to_string(),
            score,
            recommendation: recommendation_for(dimension).to_string(),
        })
        .collect()
}

// ============================================================================
// Proficiency
// ============================================================================

/// Proficiency change applied per feedback record
pub const FEEDBACK_STEP: f64 = 0.02;

/// Proficiency after one feedback record
pub fn proficiency_after_feedback(current: f64, success: bool) -> f64 {
    adjust_unit(current, if success { FEEDBACK_STEP } else { -FEEDBACK_STEP })
}

/// Compatibility at or above which a skill integration activates
pub const INTEGRATION_THRESHOLD: f64 = 0.5;

/// Compatibility of a skill with a target service: proficiency-weighted
/// with a random component
pub fn integration_compatibility(proficiency: f64, random: &mut dyn RandomSource) -> f64 {
    clamp_unit(proficiency * 0.8 + random.unit() * 0.2)
}

// ============================================================================
// Maintenance
// ============================================================================

/// Probability that a maintenance run resolves every issue it finds
pub const RESOLUTION_RATE: f64 = 0.85;

/// Outcome of one maintenance run
#[standard]
pub struct MaintenanceOutcome {
    pub issues_found: u32,
    pub issues_resolved: u32,
    pub success: bool,
}

impl MaintenanceOutcome {
    pub fn new(issues_found: u32, issues_resolved: u32) -> Self {
        Self {
            issues_found,
            issues_resolved,
            success: issues_resolved >= issues_found,
        }
    }
}

/// Pluggable maintenance policy
pub type MaintenancePolicy = fn(&[String], &mut dyn RandomSource) -> MaintenanceOutcome;

/// Up to two issues per target; usually all are resolved
pub fn default_maintenance(targets: &[String], random: &mut dyn RandomSource) -> MaintenanceOutcome {
    let bound = u32::try_from(targets.len())
        .unwrap_or(u32::MAX / 2)
        .saturating_mul(2)
        .saturating_add(1);
    let found = random.below(bound);
    let resolved = if random.chance(RESOLUTION_RATE) {
        found
    } else {
        random.below(found + 1)
    };
    MaintenanceOutcome::new(found, resolved)
}

// ============================================================================
// Organization
// ============================================================================

/// Efficiency gain range of one optimization pass
pub const OPTIMIZATION_GAIN: (f64, f64) = (0.01, 0.05);

/// Efficiency after an optimization pass
pub fn optimized_efficiency(current: f64, random: &mut dyn RandomSource) -> f64 {
    adjust_unit(current, random.range(OPTIMIZATION_GAIN.0, OPTIMIZATION_GAIN.1))
}

/// Suggestions for an organization at a given efficiency
pub fn optimization_recommendations(efficiency: f64) -> Vec<&'static str> {
    match efficiency {
        e if e < 0.5 => vec![
            "Consolidate redundant coordination channels",
            "Rebalance workload across services",
            "Schedule full maintenance sweep",
        ],
        e if e < 0.8 => vec![
            "Tune coordination frequency",
            "Review maintenance cadence",
        ],
        _ => vec!["Maintain current structure"],
    }
}

/// Sync score after one coordination round: closes 10% of the gap to 1
pub fn coordination_sync_score(current: f64, participants: usize) -> f64 {
    if participants == 0 {
        return clamp_unit(current);
    }
    adjust_unit(current, 0.1 * (1.0 - clamp_unit(current)))
}

// ============================================================================
// Keyword matching
// ============================================================================

/// Relevance added per matched keyword
pub const KEYWORD_BONUS: f64 = 0.1;

/// Keywords (lowercased) that match a name or any tag by substring
pub fn matched_keywords(name: &str, tags: &[&str], keywords: &[String]) -> Vec<String> {
    let name = name.to_lowercase();
    keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| !k.is_empty())
        .filter(|k| name.contains(k.as_str()) || tags.iter().any(|t| t.contains(k.as_str())))
        .collect()
}

/// Base score plus a bonus per matched keyword
pub fn keyword_score(base: f64, matches: usize) -> f64 {
    clamp_unit(base + KEYWORD_BONUS * matches as f64)
}

// ============================================================================
// Sales
// ============================================================================

/// Probability gained on a successful promotion
pub const PROMOTION_GAIN: f64 = 0.15;

/// Probability lost on a failed promotion
pub const PROMOTION_LOSS: f64 = 0.1;

/// Whether a lead with `probability` is promoted this round
pub fn promotion_succeeds(probability: f64, random: &mut dyn RandomSource) -> bool {
    random.chance(clamp_unit(probability))
}
