//! Insurance information and its derived completeness status

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Insurance details entered by the body shop or customer
///
/// Blank strings are treated the same as missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub claim_number: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub agent_email: Option<String>,
    pub deductible: Option<Decimal>,
}

impl InsuranceInfo {
    pub fn new(provider: impl Into<String>, policy_number: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            policy_number: Some(policy_number.into()),
            ..Default::default()
        }
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    pub fn has_agent_contact(&self) -> bool {
        present(&self.agent_name) || present(&self.agent_phone) || present(&self.agent_email)
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Completeness of a claim's insurance information
///
/// `None < Partial < Complete` by specificity. `Flagged` is set explicitly by
/// an adjuster and is never derived from the fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceInfoStatus {
    #[default]
    None,
    Partial,
    Complete,
    Flagged,
}

impl InsuranceInfoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceInfoStatus::None => "none",
            InsuranceInfoStatus::Partial => "partial",
            InsuranceInfoStatus::Complete => "complete",
            InsuranceInfoStatus::Flagged => "flagged",
        }
    }
}

/// Derives the completeness status from the fields alone
pub fn validate_insurance_info(info: &InsuranceInfo) -> InsuranceInfoStatus {
    let provider = present(&info.provider);
    let policy = present(&info.policy_number);

    if !provider && !policy {
        InsuranceInfoStatus::None
    } else if provider && policy && info.has_agent_contact() {
        InsuranceInfoStatus::Complete
    } else {
        InsuranceInfoStatus::Partial
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn field() -> impl Strategy<Value = Option<String>> {
        prop_oneof![Just(None), Just(Some(String::new())), "[A-Za-z0-9]{1,12}".prop_map(Some)]
    }

    proptest! {
        #[test]
        fn status_depends_only_on_key_fields(
            provider in field(),
            policy in field(),
            agent in field(),
            claim_number in field(),
            deductible in proptest::option::of(0i64..5000)
        ) {
            let base = InsuranceInfo {
                provider: provider.clone(),
                policy_number: policy.clone(),
                agent_name: agent.clone(),
                ..Default::default()
            };
            let noisy = InsuranceInfo {
                claim_number,
                deductible: deductible.map(Decimal::from),
                ..base.clone()
            };

            let status = validate_insurance_info(&base);
            prop_assert_eq!(status, validate_insurance_info(&noisy));
            prop_assert_eq!(status, validate_insurance_info(&base));
            prop_assert_ne!(status, InsuranceInfoStatus::Flagged);
        }
    }
}
