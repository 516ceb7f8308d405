//! CSV backlog importer for fulfillment-system exports.
//!
//! Produces raw [`OrderSubmission`]s only; intake validation happens when the
//! submissions are handed to the service.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{
    AiVerification, AiVerificationStatus, OrderFlags, OrderStatus, OrderSubmission, PatientFlags,
};

#[derive(Debug, thiserror::Error)]
pub enum BacklogImportError {
    #[error("failed to read backlog export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid backlog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("unusable backlog row for order {order_number}: {reason}")]
    Row { order_number: String, reason: String },
}

pub struct BacklogImporter;

impl BacklogImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<OrderSubmission>, BacklogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<OrderSubmission>, BacklogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut submissions = Vec::new();

        for record in csv_reader.deserialize::<BacklogRow>() {
            let row = record?;
            submissions.push(row.into_submission()?);
        }

        Ok(submissions)
    }
}

#[derive(Debug, Deserialize)]
struct BacklogRow {
    #[serde(rename = "Order Number")]
    order_number: String,
    #[serde(rename = "Received At")]
    received_at: String,
    #[serde(rename = "Promised At", default, deserialize_with = "empty_string_as_none")]
    promised_at: Option<String>,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "AI Status", default, deserialize_with = "empty_string_as_none")]
    ai_status: Option<String>,
    #[serde(rename = "AI Confidence", default, deserialize_with = "empty_string_as_none")]
    ai_confidence: Option<String>,
    #[serde(rename = "Attention Flags", default, deserialize_with = "empty_string_as_none")]
    attention_flags: Option<String>,
    #[serde(rename = "Chronic", default)]
    chronic: String,
    #[serde(rename = "Preferred", default)]
    preferred: String,
    #[serde(rename = "Refill History", default)]
    refill_history: String,
    #[serde(rename = "Controlled", default)]
    controlled: String,
    #[serde(rename = "Interaction Warning", default)]
    interaction_warning: String,
    #[serde(rename = "Items")]
    items: String,
}

impl BacklogRow {
    fn into_submission(self) -> Result<OrderSubmission, BacklogImportError> {
        let order_number = self.order_number.trim().to_string();

        let received_at = parse_datetime(&self.received_at).ok_or_else(|| row_error(
            &order_number,
            format!("unreadable Received At '{}'", self.received_at),
        ))?;

        let promised_at = match self.promised_at.as_deref() {
            Some(raw) => Some(parse_datetime(raw).ok_or_else(|| {
                row_error(&order_number, format!("unreadable Promised At '{raw}'"))
            })?),
            None => None,
        };

        let status = parse_status(&self.status)
            .ok_or_else(|| row_error(&order_number, format!("unknown status '{}'", self.status)))?;

        let ai = match self.ai_status.as_deref() {
            Some(raw) => {
                let status = parse_ai_status(raw).ok_or_else(|| {
                    row_error(&order_number, format!("unknown AI status '{raw}'"))
                })?;
                let confidence = match self.ai_confidence.as_deref() {
                    Some(value) => value.parse::<f32>().map_err(|_| {
                        row_error(&order_number, format!("unreadable AI confidence '{value}'"))
                    })?,
                    None => 0.0,
                };
                Some(AiVerification {
                    status,
                    confidence,
                    attention_flags: parse_flags(self.attention_flags.as_deref()),
                })
            }
            None => None,
        };

        let item_count = self.items.parse::<u32>().map_err(|_| {
            row_error(&order_number, format!("unreadable item count '{}'", self.items))
        })?;

        Ok(OrderSubmission {
            order_number,
            received_at,
            promised_at,
            status,
            patient: PatientFlags {
                is_chronic: parse_bool(&self.chronic),
                is_preferred_tier: parse_bool(&self.preferred),
                has_refill_history: parse_bool(&self.refill_history),
            },
            order: OrderFlags {
                has_controlled_substance: parse_bool(&self.controlled),
                has_interaction_warning: parse_bool(&self.interaction_warning),
                item_count,
            },
            ai,
        })
    }
}

fn row_error(order_number: &str, reason: String) -> BacklogImportError {
    BacklogImportError::Row {
        order_number: if order_number.is_empty() {
            "<unnumbered>".to_string()
        } else {
            order_number.to_string()
        },
        reason,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc());
    }

    None
}

fn parse_status(value: &str) -> Option<OrderStatus> {
    OrderStatus::ordered()
        .into_iter()
        .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
}

fn parse_ai_status(value: &str) -> Option<AiVerificationStatus> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "approved" => Some(AiVerificationStatus::Approved),
        "needs_review" => Some(AiVerificationStatus::NeedsReview),
        "rejected" => Some(AiVerificationStatus::Rejected),
        _ => None,
    }
}

fn parse_flags(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}
