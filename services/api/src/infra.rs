use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use rx_triage::triage::{
    EscalationAlert, EscalationError, EscalationPublisher, OrderId, OrderRepository,
    RepositoryError, TriageRecord,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Insertion-ordered store. Arrival order is what keeps equal-score orders
/// stable on the board between refreshes.
#[derive(Default, Clone)]
pub(crate) struct InMemoryOrderRepository {
    records: Arc<Mutex<Vec<TriageRecord>>>,
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, record: TriageRecord) -> Result<TriageRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.profile.order_id == record.profile.order_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: TriageRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard
            .iter_mut()
            .find(|existing| existing.profile.order_id == record.profile.order_id)
        {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<TriageRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .find(|record| &record.profile.order_id == id)
            .cloned())
    }

    fn open_orders(&self, limit: usize) -> Result<Vec<TriageRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| !record.profile.status.is_terminal())
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEscalationPublisher {
    events: Arc<Mutex<Vec<EscalationAlert>>>,
}

impl EscalationPublisher for InMemoryEscalationPublisher {
    fn publish(&self, alert: EscalationAlert) -> Result<(), EscalationError> {
        tracing::info!(
            order = %alert.order_id.0,
            channel = %alert.channel,
            "escalation raised"
        );
        let mut guard = self.events.lock().expect("alert mutex poisoned");
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryEscalationPublisher {
    pub(crate) fn events(&self) -> Vec<EscalationAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}
