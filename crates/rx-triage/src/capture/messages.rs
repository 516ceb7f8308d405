//! Guidance message catalog for capture rejections.
//!
//! The catalog is injected data so operators can localize it without touching
//! the gate's decision rules. Stored sentences carry no trailing period; the
//! composer adds separators and the terminal period itself.

use std::collections::BTreeMap;

use super::gate::CaptureIssue;

#[derive(Debug, Clone, PartialEq)]
pub struct GuidanceCatalog {
    ready_message: String,
    messages: BTreeMap<String, String>,
}

impl GuidanceCatalog {
    pub fn new(ready_message: impl Into<String>, messages: BTreeMap<String, String>) -> Self {
        Self {
            ready_message: ready_message.into(),
            messages,
        }
    }

    /// Builds the guidance line for a verdict. Unmapped issues fall back to
    /// their raw identifier so a catalog gap never blocks a response.
    pub fn compose(&self, issues: &[CaptureIssue]) -> String {
        if issues.is_empty() {
            return self.ready_message.clone();
        }

        let sentences: Vec<&str> = issues
            .iter()
            .map(|issue| {
                self.messages
                    .get(issue.key())
                    .map(String::as_str)
                    .unwrap_or_else(|| issue.key())
            })
            .collect();

        format!("{}.", sentences.join(". "))
    }
}

impl Default for GuidanceCatalog {
    fn default() -> Self {
        let mut messages = BTreeMap::new();
        messages.insert(
            "too_dark".to_string(),
            "Retake the photo somewhere brighter".to_string(),
        );
        messages.insert(
            "uneven".to_string(),
            "Adjust the lighting so the whole prescription is evenly lit".to_string(),
        );
        messages.insert(
            "tilted".to_string(),
            "Hold the camera flat and square above the prescription".to_string(),
        );
        messages.insert(
            "blurry".to_string(),
            "Hold the camera steady until the text is sharp".to_string(),
        );
        messages.insert(
            "missing_medication_visible".to_string(),
            "Make sure the medication name is inside the frame".to_string(),
        );
        messages.insert(
            "missing_dosage_visible".to_string(),
            "Make sure the dosage instructions are inside the frame".to_string(),
        );
        messages.insert(
            "missing_signature_visible".to_string(),
            "Make sure the prescriber signature is inside the frame".to_string(),
        );

        Self::new("Prescription looks clear. Ready to submit.", messages)
    }
}
