//! Signal payloads produced by the vision service for a single capture attempt.

use serde::{Deserialize, Serialize};

/// Device orientation at the moment of capture, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleReading {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Per-zone visibility booleans for the standard prescription layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneVisibility {
    #[serde(default)]
    pub header_visible: bool,
    #[serde(default)]
    pub patient_visible: bool,
    #[serde(default)]
    pub medication_visible: bool,
    #[serde(default)]
    pub dosage_visible: bool,
    #[serde(default)]
    pub signature_visible: bool,
    #[serde(default)]
    pub date_visible: bool,
}

impl ZoneVisibility {
    pub const ZONE_COUNT: u32 = 6;

    /// Visibility with every zone set, for callers that only care about a subset.
    pub fn all_visible() -> Self {
        Self {
            header_visible: true,
            patient_visible: true,
            medication_visible: true,
            dosage_visible: true,
            signature_visible: true,
            date_visible: true,
        }
    }

    pub fn visible_count(&self) -> u32 {
        [
            self.header_visible,
            self.patient_visible,
            self.medication_visible,
            self.dosage_visible,
            self.signature_visible,
            self.date_visible,
        ]
        .into_iter()
        .filter(|visible| *visible)
        .count() as u32
    }
}

/// One capture attempt's worth of analysis signals. Superseded by the next
/// attempt; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureAnalysis {
    /// Overall exposure quality in `[0, 1]`.
    pub lighting_score: f32,
    pub angle: AngleReading,
    /// Set when the vision service flags motion blur outright.
    #[serde(default)]
    pub blur_detected: bool,
    /// Sharpness estimate in `[0, 1]`.
    pub focus_score: f32,
    pub zones: ZoneVisibility,
}
