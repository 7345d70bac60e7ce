//! Claims DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_claims::{Claim, InsuranceInfo, InsuranceInfoStatus, ReviewDecision};
use domain_estimate::{Estimate, EstimateFormat, EstimateOption, Photo, PhotoAngle, PreEstimate, VehicleUpdate};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub model: Option<String>,
    pub trim: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<u32>,
    #[validate(length(equal = 17))]
    pub vin: Option<String>,
}

impl From<UpdateVehicleRequest> for VehicleUpdate {
    fn from(req: UpdateVehicleRequest) -> Self {
        VehicleUpdate {
            year: req.year,
            make: req.make,
            model: req.model,
            trim: req.trim,
            color: req.color,
            mileage: req.mileage,
            vin: req.vin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PhotoUpload {
    #[validate(length(min = 1))]
    pub uri: String,
    pub angle: Option<PhotoAngle>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl From<PhotoUpload> for Photo {
    fn from(upload: PhotoUpload) -> Self {
        let photo = Photo::new(upload.uri, upload.angle);
        match (upload.width, upload.height) {
            (Some(w), Some(h)) => photo.with_dimensions(w, h),
            _ => photo,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddPhotosRequest {
    #[validate(length(min = 1), nested)]
    pub photos: Vec<PhotoUpload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateEstimateRequest {
    pub format: Option<EstimateFormat>,
}

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    pub format: Option<EstimateFormat>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[serde(flatten)]
    pub decision: ReviewDecision,
    #[validate(range(max = 100))]
    pub fraud_score: Option<u8>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InsuranceInfoRequest {
    #[validate(length(max = 128))]
    pub provider: Option<String>,
    #[validate(length(max = 64))]
    pub policy_number: Option<String>,
    #[validate(length(max = 64))]
    pub claim_number: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    #[validate(email)]
    pub agent_email: Option<String>,
    pub deductible: Option<Decimal>,
}

impl From<InsuranceInfoRequest> for InsuranceInfo {
    fn from(req: InsuranceInfoRequest) -> Self {
        InsuranceInfo {
            provider: req.provider,
            policy_number: req.policy_number,
            claim_number: req.claim_number,
            agent_name: req.agent_name,
            agent_phone: req.agent_phone,
            agent_email: req.agent_email,
            deductible: req.deductible,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FlagInsuranceRequest {
    #[validate(length(min = 1))]
    pub flags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InsuranceStatusResponse {
    pub status: InsuranceInfoStatus,
    pub locked: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub claim: Claim,
    pub pre_estimate: Option<PreEstimate>,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub estimate: Estimate,
    pub formatted: String,
    pub auto_approval_eligible: bool,
}

#[derive(Debug, Serialize)]
pub struct EstimateOptionsResponse {
    pub options: Vec<EstimateOption>,
    /// Percent saved by the basic tier against OEM
    pub savings_percent: i64,
}

#[derive(Debug, Serialize)]
pub struct AutoApprovalResponse {
    pub eligible: bool,
    pub threshold: Decimal,
}
