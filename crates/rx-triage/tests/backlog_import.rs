//! Backlog export import: parsing a fulfillment-system CSV dump and feeding
//! the resulting submissions through intake and onto the board.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use rx_triage::triage::{
    AiVerificationStatus, BacklogImportError, BacklogImporter, EscalationAlert, EscalationError,
    EscalationPublisher, OrderId, OrderRepository, OrderStatus, RepositoryError, TriageConfig,
    TriageRecord, TriageService, TriageServiceError,
};

#[derive(Default, Clone)]
struct MemoryRepository {
    records: Arc<Mutex<Vec<TriageRecord>>>,
}

impl OrderRepository for MemoryRepository {
    fn insert(&self, record: TriageRecord) -> Result<TriageRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
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
        let mut guard = self.records.lock().expect("lock");
        match guard
            .iter_mut()
            .find(|existing| existing.profile.order_id == record.profile.order_id)
        {
            Some(existing) => *existing = record,
            None => guard.push(record),
        }
        Ok(())
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<TriageRecord>, RepositoryError> {
        let guard = self.records.lock().expect("lock");
        Ok(guard
            .iter()
            .find(|record| &record.profile.order_id == id)
            .cloned())
    }

    fn open_orders(&self, limit: usize) -> Result<Vec<TriageRecord>, RepositoryError> {
        let guard = self.records.lock().expect("lock");
        Ok(guard
            .iter()
            .filter(|record| !record.profile.status.is_terminal())
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
struct DiscardEscalations;

impl EscalationPublisher for DiscardEscalations {
    fn publish(&self, _alert: EscalationAlert) -> Result<(), EscalationError> {
        Ok(())
    }
}

#[test]
fn importer_reads_the_full_backlog_export() {
    let data = include_bytes!("../Pharmacy_Backlog.csv");

    let submissions = BacklogImporter::from_reader(&data[..]).expect("backlog imports");
    assert_eq!(submissions.len(), 12);

    let flagged = submissions
        .iter()
        .find(|submission| submission.order_number == "RX-9002")
        .expect("RX-9002 present");
    assert_eq!(flagged.status, OrderStatus::PendingVerification);
    assert!(flagged.order.has_interaction_warning);
    let ai = flagged.ai.as_ref().expect("ai present");
    assert_eq!(ai.status, AiVerificationStatus::NeedsReview);
    assert_eq!(ai.attention_flags, vec!["smudged_signature", "partial_dosage"]);

    let unverified = submissions
        .iter()
        .find(|submission| submission.order_number == "RX-9011")
        .expect("RX-9011 present");
    assert!(unverified.ai.is_none());

    let date_only = submissions
        .iter()
        .find(|submission| submission.order_number == "RX-9006")
        .expect("RX-9006 present");
    assert_eq!(
        date_only.received_at,
        Utc.with_ymd_and_hms(2025, 11, 3, 0, 0, 0).single().unwrap()
    );
}

#[test]
fn imported_backlog_flows_through_intake_onto_the_board() {
    let data = include_bytes!("../Pharmacy_Backlog.csv");
    let submissions = BacklogImporter::from_reader(&data[..]).expect("backlog imports");

    let repository = Arc::new(MemoryRepository::default());
    let service = TriageService::new(
        repository.clone(),
        Arc::new(DiscardEscalations),
        TriageConfig::default(),
    );

    let mut accepted = 0;
    let mut rejected = 0;
    for submission in submissions {
        match service.submit(submission) {
            Ok(_) => accepted += 1,
            Err(TriageServiceError::Intake(_)) => rejected += 1,
            Err(other) => panic!("unexpected submission failure: {other}"),
        }
    }

    // RX-9011 has no AI verification and must fail intake.
    assert_eq!(accepted, 11);
    assert_eq!(rejected, 1);

    let now = Utc
        .with_ymd_and_hms(2025, 11, 4, 9, 0, 0)
        .single()
        .expect("valid");
    let board = service.board(now, 50).expect("board builds");

    // RX-9009 is completed and RX-9012 cancelled; neither belongs on the board.
    assert_eq!(board.total, 9);
    assert!(board.tiers.iter().all(|group| group
        .orders
        .iter()
        .all(|entry| entry.order_id.0 != "RX-9009" && entry.order_id.0 != "RX-9012")));

    // The heavily flagged chronic order overtakes the quiet ones.
    let critical_ids: Vec<&str> = board.tiers[0]
        .orders
        .iter()
        .map(|entry| entry.order_id.0.as_str())
        .collect();
    assert!(critical_ids.contains(&"RX-9010"), "critical={critical_ids:?}");
}

#[test]
fn unknown_status_surfaces_as_a_row_error() {
    let csv = "Order Number,Received At,Promised At,Status,AI Status,AI Confidence,Attention Flags,Chronic,Preferred,Refill History,Controlled,Interaction Warning,Items\n\
RX-9100,2025-11-04T09:00:00Z,,shipped,approved,0.9,,no,no,no,no,no,1\n";

    match BacklogImporter::from_reader(csv.as_bytes()) {
        Err(BacklogImportError::Row { order_number, reason }) => {
            assert_eq!(order_number, "RX-9100");
            assert!(reason.contains("shipped"));
        }
        other => panic!("expected row error, got {other:?}"),
    }
}

#[test]
fn malformed_csv_surfaces_as_a_csv_error() {
    let csv = "Order Number,Received At\nRX-9200,2025-11-04T09:00:00Z\n";

    match BacklogImporter::from_reader(csv.as_bytes()) {
        Err(BacklogImportError::Csv(_)) => {}
        other => panic!("expected csv error, got {other:?}"),
    }
}
