//! Approval rules for prescription photo captures.

use serde::{Deserialize, Serialize, Serializer};

use super::analysis::{CaptureAnalysis, ZoneVisibility};
use super::messages::GuidanceCatalog;

/// Tilt at or beyond this contributes nothing to the angle quality component.
const TILT_RANGE_DEGREES: f32 = 45.0;

/// Zones that must be visible before an upload is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredZone {
    Medication,
    Dosage,
    Signature,
}

impl RequiredZone {
    pub const fn key(&self) -> &'static str {
        match self {
            RequiredZone::Medication => "medication_visible",
            RequiredZone::Dosage => "dosage_visible",
            RequiredZone::Signature => "signature_visible",
        }
    }

    pub const fn ordered() -> [RequiredZone; 3] {
        [
            RequiredZone::Medication,
            RequiredZone::Dosage,
            RequiredZone::Signature,
        ]
    }
}

/// A single reason a capture cannot be submitted. Serializes as its message
/// key so clients and the guidance catalog speak the same identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureIssue {
    TooDark,
    UnevenLighting,
    Tilted,
    Blurry,
    MissingZone(RequiredZone),
}

impl CaptureIssue {
    pub const fn key(&self) -> &'static str {
        match self {
            CaptureIssue::TooDark => "too_dark",
            CaptureIssue::UnevenLighting => "uneven",
            CaptureIssue::Tilted => "tilted",
            CaptureIssue::Blurry => "blurry",
            CaptureIssue::MissingZone(RequiredZone::Medication) => "missing_medication_visible",
            CaptureIssue::MissingZone(RequiredZone::Dosage) => "missing_dosage_visible",
            CaptureIssue::MissingZone(RequiredZone::Signature) => "missing_signature_visible",
        }
    }
}

impl Serialize for CaptureIssue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.key())
    }
}

/// Thresholds for each gate rule plus the informational quality weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureGateConfig {
    /// Lighting below this fails the gate.
    pub min_lighting_score: f32,
    /// Lighting below this reports `too_dark` instead of `uneven`.
    pub dark_lighting_score: f32,
    /// Absolute pitch or roll beyond this reports `tilted`. Yaw is not gated.
    pub max_tilt_degrees: f32,
    /// Focus below this, or an outright blur flag, reports `blurry`.
    pub min_focus_score: f32,
    pub quality: QualityWeights,
}

/// Weights for the composite quality percentage. Informational only; the
/// approval decision never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub lighting: f32,
    pub angle: f32,
    pub focus: f32,
    pub completeness: f32,
}

impl Default for CaptureGateConfig {
    fn default() -> Self {
        Self {
            min_lighting_score: 0.6,
            dark_lighting_score: 0.3,
            max_tilt_degrees: 15.0,
            min_focus_score: 0.7,
            quality: QualityWeights::default(),
        }
    }
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            lighting: 0.25,
            angle: 0.20,
            focus: 0.25,
            completeness: 0.30,
        }
    }
}

/// The gate's answer for one capture attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureVerdict {
    pub approved: bool,
    pub issues: Vec<CaptureIssue>,
    pub guidance: String,
    /// Weighted quality percentage in `[0, 100]`.
    pub quality_score: u8,
}

/// Evaluates capture analyses against fixed thresholds. Stateless; safe to
/// share and call concurrently.
#[derive(Debug, Clone, Default)]
pub struct CaptureGate {
    config: CaptureGateConfig,
    catalog: GuidanceCatalog,
}

impl CaptureGate {
    pub fn new(config: CaptureGateConfig, catalog: GuidanceCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &CaptureGateConfig {
        &self.config
    }

    pub fn evaluate(&self, analysis: &CaptureAnalysis) -> CaptureVerdict {
        let issues = self.detect_issues(analysis);
        let guidance = self.catalog.compose(&issues);

        CaptureVerdict {
            approved: issues.is_empty(),
            issues,
            guidance,
            quality_score: quality_percentage(analysis, &self.config.quality),
        }
    }

    fn detect_issues(&self, analysis: &CaptureAnalysis) -> Vec<CaptureIssue> {
        let mut issues = Vec::new();

        if analysis.lighting_score < self.config.min_lighting_score {
            if analysis.lighting_score < self.config.dark_lighting_score {
                issues.push(CaptureIssue::TooDark);
            } else {
                issues.push(CaptureIssue::UnevenLighting);
            }
        }

        if analysis.angle.pitch.abs() > self.config.max_tilt_degrees
            || analysis.angle.roll.abs() > self.config.max_tilt_degrees
        {
            issues.push(CaptureIssue::Tilted);
        }

        if analysis.blur_detected || analysis.focus_score < self.config.min_focus_score {
            issues.push(CaptureIssue::Blurry);
        }

        for zone in RequiredZone::ordered() {
            if !zone_visible(&analysis.zones, zone) {
                issues.push(CaptureIssue::MissingZone(zone));
            }
        }

        issues
    }
}

fn zone_visible(zones: &ZoneVisibility, zone: RequiredZone) -> bool {
    match zone {
        RequiredZone::Medication => zones.medication_visible,
        RequiredZone::Dosage => zones.dosage_visible,
        RequiredZone::Signature => zones.signature_visible,
    }
}

fn quality_percentage(analysis: &CaptureAnalysis, weights: &QualityWeights) -> u8 {
    let lighting = analysis.lighting_score.clamp(0.0, 1.0);

    let tilt = analysis.angle.roll.abs().max(analysis.angle.pitch.abs());
    let angle = 1.0 - tilt.min(TILT_RANGE_DEGREES) / TILT_RANGE_DEGREES;

    let focus = analysis.focus_score.clamp(0.0, 1.0);

    let completeness = analysis.zones.visible_count() as f32 / ZoneVisibility::ZONE_COUNT as f32;

    let weighted = lighting * weights.lighting
        + angle * weights.angle
        + focus * weights.focus
        + completeness * weights.completeness;

    (weighted.clamp(0.0, 1.0) * 100.0).round() as u8
}
