//! Pre-submission quality gate for prescription photo captures.
//!
//! A vision service scores each attempt for lighting, tilt, focus, and zone
//! visibility. The gate turns those signals into an approve/reject verdict,
//! an ordered issue list, and guidance text assembled from an injectable
//! message catalog.

pub mod analysis;
pub mod gate;
pub mod messages;

pub use analysis::{AngleReading, CaptureAnalysis, ZoneVisibility};
pub use gate::{
    CaptureGate, CaptureGateConfig, CaptureIssue, CaptureVerdict, QualityWeights, RequiredZone,
};
pub use messages::GuidanceCatalog;
