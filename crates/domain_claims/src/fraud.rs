//! Mock fraud scoring
//!
//! A fixed set of weighted heuristics over claim fields, plus a small random
//! jitter. The score is clamped to `[0, 100]`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::RandomSource;
use crate::claim::Claim;

const REVIEW_THRESHOLD: u8 = 30;
const INVESTIGATE_THRESHOLD: u8 = 70;
const JITTER: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score < REVIEW_THRESHOLD {
            RiskLevel::Low
        } else if score < INVESTIGATE_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Display colour for the risk badge
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#34C759",
            RiskLevel::Medium => "#FF9500",
            RiskLevel::High => "#FF3B30",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudRecommendation {
    Approve,
    Review,
    Investigate,
}

impl FraudRecommendation {
    pub fn from_score(score: u8) -> Self {
        match RiskLevel::from_score(score) {
            RiskLevel::Low => FraudRecommendation::Approve,
            RiskLevel::Medium => FraudRecommendation::Review,
            RiskLevel::High => FraudRecommendation::Investigate,
        }
    }
}

/// A heuristic that contributed to the score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudIndicator {
    pub code: String,
    pub description: String,
    pub weight: u8,
}

impl FraudIndicator {
    fn new(code: &str, description: &str, weight: u8) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAnalysis {
    pub score: u8,
    pub risk_level: RiskLevel,
    pub recommendation: FraudRecommendation,
    pub indicators: Vec<FraudIndicator>,
    /// Confidence of the analysis itself, independent of the score
    pub confidence: f64,
}

/// Heuristics that fire for a claim
pub fn fraud_indicators(claim: &Claim, now: DateTime<Utc>) -> Vec<FraudIndicator> {
    let mut indicators = Vec::new();
    let estimate_total = claim
        .estimate
        .as_ref()
        .map(|e| e.total.amount())
        .unwrap_or(Decimal::ZERO);

    if estimate_total > dec!(10000) {
        indicators.push(FraudIndicator::new("high_estimate", "Estimate total exceeds $10,000", 15));
    }
    if claim.photos.len() < 4 {
        indicators.push(FraudIndicator::new("insufficient_photos", "Fewer than 4 photos submitted", 20));
    }
    if let Some(assessment) = &claim.damage_assessment {
        if assessment.confidence < 0.7 {
            indicators.push(FraudIndicator::new("low_ai_confidence", "Damage analysis confidence below 70%", 10));
        }
        if assessment.severe_count() > 3 {
            indicators.push(FraudIndicator::new("multiple_severe_damages", "More than 3 severe damages", 25));
        }
        if assessment.potential_hidden_damage.len() > 2 {
            indicators.push(FraudIndicator::new("extensive_hidden_damage", "More than 2 hidden damage indicators", 15));
        }
    }
    if claim.vehicle.age(now.date_naive()) > 10 && estimate_total > dec!(8000) {
        indicators.push(FraudIndicator::new(
            "old_vehicle_high_estimate",
            "Vehicle older than 10 years with estimate above $8,000",
            15,
        ));
    }

    indicators
}

/// Heuristic score before jitter, capped at 100
pub fn fraud_base_score(claim: &Claim, now: DateTime<Utc>) -> u8 {
    let total: u32 = fraud_indicators(claim, now).iter().map(|i| i.weight as u32).sum();
    total.min(100) as u8
}

pub fn analyze_fraud(claim: &Claim, rng: &mut dyn RandomSource, now: DateTime<Utc>) -> FraudAnalysis {
    let indicators = fraud_indicators(claim, now);
    let base: i64 = indicators.iter().map(|i| i.weight as i64).sum();
    let score = (base + rng.range_i64(-JITTER, JITTER)).clamp(0, 100) as u8;
    let confidence = (rng.range_f64(0.75, 0.95) * 100.0).round() / 100.0;

    tracing::debug!(claim_id = %claim.id, score, indicators = indicators.len(), "Fraud analysis complete");

    FraudAnalysis {
        score,
        risk_level: RiskLevel::from_score(score),
        recommendation: FraudRecommendation::from_score(score),
        indicators,
        confidence,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::user::{User, UserRole};
    use core_kernel::SeededRandom;
    use domain_estimate::{DamageArea, DamageAssessment, DetectedDamage, RepairType, Severity};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn score_is_always_in_range(seed in any::<u64>(), severe in 0usize..8, hints in 0usize..5, confidence in 0.0f64..1.0) {
            let mut claim = Claim::new(&User::new(UserRole::Customer, "Pat"), Utc::now());
            claim.damage_assessment = Some(DamageAssessment {
                detected_damages: (0..severe)
                    .map(|i| DetectedDamage {
                        area: DamageArea::ALL[i],
                        severity: Severity::Severe,
                        confidence,
                        affected_parts: vec![],
                        repair_type: RepairType::Replace,
                    })
                    .collect(),
                confidence,
                potential_hidden_damage: (0..hints).map(|i| format!("hint {}", i)).collect(),
                processing_time_ms: 2000,
            });

            let analysis = analyze_fraud(&claim, &mut SeededRandom::from_seed(seed), Utc::now());
            prop_assert!(analysis.score <= 100);
            prop_assert_eq!(analysis.recommendation, FraudRecommendation::from_score(analysis.score));
        }
    }
}
