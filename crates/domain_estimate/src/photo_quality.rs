//! Mock photo quality check
//!
//! Resolution and file size are checked against fixed limits; blur and
//! lighting are simulated with the random source since no pixels are read.

use serde::{Deserialize, Serialize};

use core_kernel::RandomSource;

const MIN_WIDTH: u32 = 800;
const MIN_HEIGHT: u32 = 600;
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const MIN_FILE_SIZE: u64 = 50 * 1024;
const BLUR_CHANCE: f64 = 0.1;
const POOR_LIGHTING_CHANCE: f64 = 0.15;
const ACCEPTABLE_SCORE: u8 = 60;

/// What the capture layer reports about an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub width: u32,
    pub height: u32,
    pub file_size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    LowResolution,
    FileTooLarge,
    FileTooSmall,
    Blurry,
    PoorLighting,
}

impl QualityIssue {
    /// Points deducted from the starting score of 100
    pub fn penalty(&self) -> u8 {
        match self {
            QualityIssue::LowResolution => 30,
            QualityIssue::FileTooLarge => 20,
            QualityIssue::FileTooSmall => 25,
            QualityIssue::Blurry => 20,
            QualityIssue::PoorLighting => 15,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            QualityIssue::LowResolution => "Image resolution is below 800x600",
            QualityIssue::FileTooLarge => "Image file exceeds 10MB",
            QualityIssue::FileTooSmall => "Image file is under 50KB and may be heavily compressed",
            QualityIssue::Blurry => "Image appears blurry; hold the camera steady",
            QualityIssue::PoorLighting => "Lighting is poor; retake in daylight or a well-lit area",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoQualityReport {
    /// 0-100
    pub score: u8,
    pub is_acceptable: bool,
    pub issues: Vec<QualityIssue>,
}

pub fn assess_photo_quality(metadata: &PhotoMetadata, rng: &mut dyn RandomSource) -> PhotoQualityReport {
    let mut issues = Vec::new();

    if metadata.width < MIN_WIDTH || metadata.height < MIN_HEIGHT {
        issues.push(QualityIssue::LowResolution);
    }
    if metadata.file_size_bytes > MAX_FILE_SIZE {
        issues.push(QualityIssue::FileTooLarge);
    }
    if metadata.file_size_bytes < MIN_FILE_SIZE {
        issues.push(QualityIssue::FileTooSmall);
    }
    if rng.chance(BLUR_CHANCE) {
        issues.push(QualityIssue::Blurry);
    }
    if rng.chance(POOR_LIGHTING_CHANCE) {
        issues.push(QualityIssue::PoorLighting);
    }

    let score = issues
        .iter()
        .fold(100u8, |score, issue| score.saturating_sub(issue.penalty()));

    PhotoQualityReport {
        score,
        is_acceptable: score >= ACCEPTABLE_SCORE,
        issues,
    }
}
