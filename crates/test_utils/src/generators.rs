//! Property-Based Test Generators
//!
//! Proptest strategies that produce values satisfying the domain's own
//! construction rules.

use core_kernel::{Currency, Money};
use domain_claims::InsuranceInfo;
use domain_estimate::{DamageArea, DamageAssessment, PhotoAngle, PhotoMetadata, Severity};
use proptest::prelude::*;
use proptest::sample::subsequence;
use rust_decimal::Decimal;

use crate::fixtures::DamageFixtures;

/// Strategy for USD amounts in whole cents up to $100,000
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    (0i64..10_000_000i64).prop_map(|cents| Money::new(Decimal::new(cents, 2), Currency::USD))
}

pub fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Minor),
        Just(Severity::Moderate),
        Just(Severity::Severe),
    ]
}

pub fn damage_area_strategy() -> impl Strategy<Value = DamageArea> {
    proptest::sample::select(DamageArea::ALL.to_vec())
}

pub fn photo_angle_strategy() -> impl Strategy<Value = PhotoAngle> {
    proptest::sample::select(PhotoAngle::ALL.to_vec())
}

/// Assessments with 1 to 6 distinct areas
pub fn assessment_strategy() -> impl Strategy<Value = DamageAssessment> {
    subsequence(DamageArea::ALL.to_vec(), 1..=6)
        .prop_flat_map(|areas| {
            let n = areas.len();
            (Just(areas), prop::collection::vec(severity_strategy(), n), 0.5f64..1.0)
        })
        .prop_map(|(areas, severities, confidence)| DamageAssessment {
            detected_damages: areas
                .into_iter()
                .zip(severities)
                .map(|(area, severity)| DamageFixtures::damage(area, severity))
                .collect(),
            confidence: (confidence * 100.0).round() / 100.0,
            potential_hidden_damage: Vec::new(),
            processing_time_ms: 2000,
        })
}

/// Missing, blank or filled text
pub fn optional_text_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("   ".to_string())),
        "[A-Za-z][A-Za-z0-9 -]{0,20}".prop_map(Some),
    ]
}

pub fn insurance_info_strategy() -> impl Strategy<Value = InsuranceInfo> {
    (
        optional_text_strategy(),
        optional_text_strategy(),
        optional_text_strategy(),
        optional_text_strategy(),
        optional_text_strategy(),
        optional_text_strategy(),
    )
        .prop_map(|(provider, policy_number, claim_number, agent_name, agent_phone, agent_email)| {
            InsuranceInfo {
                provider,
                policy_number,
                claim_number,
                agent_name,
                agent_phone,
                agent_email,
                deductible: None,
            }
        })
}

pub fn photo_metadata_strategy() -> impl Strategy<Value = PhotoMetadata> {
    (100u32..5000, 100u32..5000, 1_000u64..20_000_000).prop_map(|(width, height, file_size_bytes)| {
        PhotoMetadata {
            width,
            height,
            file_size_bytes,
        }
    })
}
