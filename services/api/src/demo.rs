use crate::infra::{InMemoryEscalationPublisher, InMemoryOrderRepository};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use rx_triage::capture::{AngleReading, CaptureAnalysis, CaptureGate, CaptureIssue, ZoneVisibility};
use rx_triage::error::AppError;
use rx_triage::triage::{
    AiVerification, AiVerificationStatus, BacklogImporter, EscalationPublisher, OrderFlags,
    OrderId, OrderRepository, OrderStatus, OrderSubmission, PatientFlags, TriageBoard,
    TriageConfig, TriageOutcome, TriageService, TriageServiceError,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Scoring instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Optional backlog CSV export to seed the queue.
    #[arg(long)]
    pub(crate) backlog_csv: Option<PathBuf>,
    /// Print each order's legal operator actions alongside the board.
    #[arg(long)]
    pub(crate) list_actions: bool,
    /// Skip the capture gate portion of the demo.
    #[arg(long)]
    pub(crate) skip_capture: bool,
}

#[derive(Args, Debug)]
pub(crate) struct QueueBoardArgs {
    /// Scoring instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Optional backlog CSV export to seed the queue.
    #[arg(long)]
    pub(crate) backlog_csv: Option<PathBuf>,
    /// Cap the number of open orders pulled onto the board.
    #[arg(long, default_value_t = 50)]
    pub(crate) limit: usize,
    /// Print each order's legal operator actions alongside the board.
    #[arg(long)]
    pub(crate) list_actions: bool,
}

pub(crate) fn run_queue_board(args: QueueBoardArgs) -> Result<(), AppError> {
    let QueueBoardArgs {
        now,
        backlog_csv,
        limit,
        list_actions,
    } = args;

    let now = now.unwrap_or_else(Utc::now);
    let (submissions, imported) = load_backlog_from_path(backlog_csv, now)?;

    if imported {
        println!("Data source: backlog CSV export");
    } else {
        println!("Data source: built-in sample backlog");
    }

    let service = TriageService::new(
        Arc::new(InMemoryOrderRepository::default()),
        Arc::new(InMemoryEscalationPublisher::default()),
        TriageConfig::default(),
    );

    submit_all(&service, submissions);

    let board = match service.board(now, limit) {
        Ok(board) => board,
        Err(err) => {
            println!("Board unavailable: {}", err);
            return Ok(());
        }
    };
    render_board(&board, list_actions);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        now,
        backlog_csv,
        list_actions,
        skip_capture,
    } = args;

    let now = now.unwrap_or_else(Utc::now);

    println!("Pharmacy triage demo");
    let (submissions, imported) = load_backlog_from_path(backlog_csv, now)?;
    if imported {
        println!("Data source: backlog CSV export");
    } else {
        println!("Data source: built-in sample backlog");
    }

    let repository = Arc::new(InMemoryOrderRepository::default());
    let escalations = Arc::new(InMemoryEscalationPublisher::default());
    let service = TriageService::new(repository, escalations.clone(), TriageConfig::default());

    let order_ids = submit_all(&service, submissions);

    println!("\nTriage pass (evaluated {})", now.format("%Y-%m-%d %H:%M UTC"));
    let mut top_outcome = None;
    for id in &order_ids {
        match service.triage(id, now) {
            Ok(outcome) => {
                println!(
                    "- {} scored {} ({})",
                    outcome.order_id.0,
                    outcome.score.value(),
                    outcome.tier.label()
                );
                let replace = top_outcome
                    .as_ref()
                    .map(|best: &TriageOutcome| outcome.score > best.score)
                    .unwrap_or(true);
                if replace {
                    top_outcome = Some(outcome);
                }
            }
            Err(err) => println!("- {} triage unavailable: {}", id.0, err),
        }
    }

    if let Some(best) = &top_outcome {
        println!(
            "\nHighest priority: {} at score {}",
            best.order_id.0,
            best.score.value()
        );
        println!("  Score components:");
        for component in &best.components {
            println!(
                "    - {:?}: {} ({})",
                component.factor, component.score, component.notes
            );
        }
        match service.get(&best.order_id) {
            Ok(record) => match serde_json::to_string_pretty(&record.status_view()) {
                Ok(json) => println!("  Status payload:\n{}", json),
                Err(err) => println!("  Status payload unavailable: {}", err),
            },
            Err(err) => println!("  Status lookup unavailable: {}", err),
        }
    }

    let board = match service.board(now, 50) {
        Ok(board) => board,
        Err(err) => {
            println!("Board unavailable: {}", err);
            return Ok(());
        }
    };
    render_board(&board, list_actions);

    let projection = clearance_projection(&board);
    println!(
        "\nClearance projection ({} pharmacists on shift)",
        projection.pharmacists_on_shift
    );
    for tier in &projection.tiers {
        println!(
            "- {}: {} orders x {} min = {} min",
            tier.tier,
            tier.orders,
            tier.handling_minutes_each,
            tier.total_minutes()
        );
    }
    println!(
        "Estimated clearance: {} bench minutes, ~{} wall-clock minutes",
        projection.total_minutes(),
        projection.wall_clock_minutes()
    );

    let events = escalations.events();
    if events.is_empty() {
        println!("\nEscalations: none raised");
    } else {
        println!("\nEscalations");
        for alert in events {
            println!("- channel={} order={}", alert.channel, alert.order_id.0);
        }
    }

    if skip_capture {
        return Ok(());
    }

    println!("\nCapture gate demo");
    let gate = CaptureGate::default();

    let first = demo_failing_capture();
    let verdict = gate.evaluate(&first);
    let issue_keys: Vec<&str> = verdict.issues.iter().map(CaptureIssue::key).collect();
    println!(
        "First attempt: rejected ({}) | quality {}%",
        issue_keys.join(", "),
        verdict.quality_score
    );
    println!("  Guidance: {}", verdict.guidance);

    let retake = demo_clean_retake();
    let verdict = gate.evaluate(&retake);
    println!(
        "Retake: {} | quality {}%",
        if verdict.approved { "approved" } else { "rejected" },
        verdict.quality_score
    );
    println!("  Guidance: {}", verdict.guidance);
    match serde_json::to_string_pretty(&verdict) {
        Ok(json) => println!("  Upload payload:\n{}", json),
        Err(err) => println!("  Upload payload unavailable: {}", err),
    }

    Ok(())
}

fn submit_all<R, P>(service: &TriageService<R, P>, submissions: Vec<OrderSubmission>) -> Vec<OrderId>
where
    R: OrderRepository + 'static,
    P: EscalationPublisher + 'static,
{
    let mut order_ids = Vec::new();
    for submission in submissions {
        let order_number = submission.order_number.clone();
        match service.submit(submission) {
            Ok(record) => order_ids.push(record.profile.order_id),
            Err(TriageServiceError::Intake(violation)) => {
                println!("  Rejected {}: {}", order_number, violation);
            }
            Err(other) => println!("  Rejected {}: {}", order_number, other),
        }
    }
    println!("Accepted {} orders into the queue", order_ids.len());
    order_ids
}

pub(crate) fn load_backlog_from_path(
    backlog_csv: Option<PathBuf>,
    now: DateTime<Utc>,
) -> Result<(Vec<OrderSubmission>, bool), AppError> {
    match backlog_csv {
        Some(path) => BacklogImporter::from_path(path)
            .map(|submissions| (submissions, true))
            .map_err(AppError::from),
        None => Ok((sample_backlog(now), false)),
    }
}

pub(crate) fn render_board(board: &TriageBoard, list_actions: bool) {
    println!(
        "\nTriage board (generated {})",
        board.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("{} open orders", board.total);

    for group in &board.tiers {
        if group.orders.is_empty() {
            println!("\n{}: no orders", group.tier);
            continue;
        }

        println!("\n{} ({} orders)", group.tier, group.orders.len());
        for entry in &group.orders {
            let breach_note = match entry.minutes_to_breach {
                Some(minutes) if minutes < 0 => format!(" | SLA breached {} min ago", -minutes),
                Some(minutes) => format!(" | {} min to SLA", minutes),
                None => String::new(),
            };
            println!(
                "- {} | score {} | {} | waited {} min{}",
                entry.order_id.0, entry.score, entry.status, entry.minutes_in_queue, breach_note
            );
            if list_actions {
                let actions: Vec<&str> = entry.actions.iter().map(|action| action.label()).collect();
                println!("  actions: {}", actions.join(", "));
            }
        }
    }
}

#[derive(Debug)]
struct TierClearance {
    tier: &'static str,
    orders: usize,
    handling_minutes_each: u32,
}

impl TierClearance {
    fn total_minutes(&self) -> u32 {
        self.orders as u32 * self.handling_minutes_each
    }
}

#[derive(Debug)]
struct ClearanceProjection {
    pharmacists_on_shift: u32,
    tiers: Vec<TierClearance>,
}

impl ClearanceProjection {
    fn total_minutes(&self) -> u32 {
        self.tiers.iter().map(TierClearance::total_minutes).sum()
    }

    fn wall_clock_minutes(&self) -> u32 {
        if self.pharmacists_on_shift == 0 {
            return self.total_minutes();
        }
        let total = self.total_minutes();
        (total + self.pharmacists_on_shift - 1) / self.pharmacists_on_shift
    }
}

fn clearance_projection(board: &TriageBoard) -> ClearanceProjection {
    let tiers = board
        .tiers
        .iter()
        .map(|group| TierClearance {
            tier: group.tier,
            orders: group.orders.len(),
            handling_minutes_each: match group.tier {
                "critical" => 12,
                "high" => 9,
                "normal" => 6,
                _ => 4,
            },
        })
        .collect();

    ClearanceProjection {
        pharmacists_on_shift: 2,
        tiers,
    }
}

/// Deterministic sample queue anchored at the provided instant: two SLA-hot
/// orders, a routine refill, a borderline AI reject, and a completed order
/// that must stay off the board.
fn sample_backlog(now: DateTime<Utc>) -> Vec<OrderSubmission> {
    vec![
        OrderSubmission {
            order_number: "RX-4001".to_string(),
            received_at: now - Duration::minutes(75),
            promised_at: Some(now + Duration::minutes(25)),
            status: OrderStatus::PendingVerification,
            patient: PatientFlags {
                is_chronic: true,
                is_preferred_tier: false,
                has_refill_history: true,
            },
            order: OrderFlags {
                has_controlled_substance: false,
                has_interaction_warning: false,
                item_count: 2,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::Approved,
                confidence: 0.93,
                attention_flags: Vec::new(),
            }),
        },
        OrderSubmission {
            order_number: "RX-4002".to_string(),
            received_at: now - Duration::minutes(40),
            promised_at: Some(now + Duration::minutes(130)),
            status: OrderStatus::PharmacistReview,
            patient: PatientFlags::default(),
            order: OrderFlags {
                has_controlled_substance: false,
                has_interaction_warning: false,
                item_count: 4,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::NeedsReview,
                confidence: 0.72,
                attention_flags: vec!["handwriting_unclear".to_string()],
            }),
        },
        OrderSubmission {
            order_number: "RX-4003".to_string(),
            received_at: now - Duration::minutes(10),
            promised_at: None,
            status: OrderStatus::Approved,
            patient: PatientFlags {
                is_chronic: false,
                is_preferred_tier: true,
                has_refill_history: false,
            },
            order: OrderFlags {
                has_controlled_substance: false,
                has_interaction_warning: false,
                item_count: 1,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::Approved,
                confidence: 0.9,
                attention_flags: Vec::new(),
            }),
        },
        OrderSubmission {
            order_number: "RX-4004".to_string(),
            received_at: now - Duration::minutes(130),
            promised_at: Some(now - Duration::minutes(15)),
            status: OrderStatus::Preparing,
            patient: PatientFlags::default(),
            order: OrderFlags {
                has_controlled_substance: true,
                has_interaction_warning: true,
                item_count: 6,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::Approved,
                confidence: 0.88,
                attention_flags: Vec::new(),
            }),
        },
        OrderSubmission {
            order_number: "RX-4005".to_string(),
            received_at: now - Duration::minutes(5),
            promised_at: Some(now + Duration::minutes(240)),
            status: OrderStatus::PendingVerification,
            patient: PatientFlags::default(),
            order: OrderFlags {
                has_controlled_substance: false,
                has_interaction_warning: false,
                item_count: 1,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::Rejected,
                confidence: 0.3,
                attention_flags: vec!["unreadable_prescriber".to_string()],
            }),
        },
        OrderSubmission {
            order_number: "RX-4006".to_string(),
            received_at: now - Duration::minutes(200),
            promised_at: None,
            status: OrderStatus::Completed,
            patient: PatientFlags::default(),
            order: OrderFlags {
                has_controlled_substance: false,
                has_interaction_warning: false,
                item_count: 3,
            },
            ai: Some(AiVerification {
                status: AiVerificationStatus::Approved,
                confidence: 0.97,
                attention_flags: Vec::new(),
            }),
        },
    ]
}

fn demo_failing_capture() -> CaptureAnalysis {
    CaptureAnalysis {
        lighting_score: 0.24,
        angle: AngleReading {
            roll: 2.0,
            pitch: 19.0,
            yaw: 5.0,
        },
        blur_detected: false,
        focus_score: 0.55,
        zones: ZoneVisibility {
            signature_visible: false,
            ..ZoneVisibility::all_visible()
        },
    }
}

fn demo_clean_retake() -> CaptureAnalysis {
    CaptureAnalysis {
        lighting_score: 0.82,
        angle: AngleReading {
            roll: 1.5,
            pitch: -2.0,
            yaw: 3.0,
        },
        blur_detected: false,
        focus_score: 0.93,
        zones: ZoneVisibility::all_visible(),
    }
}
