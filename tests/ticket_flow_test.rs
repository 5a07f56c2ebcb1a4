use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use deskserver::llm::{LlmError, LlmProvider};
use deskserver::storage::MemoryStore;
use deskserver::tickets::error::TicketError;
use deskserver::tickets::service::{generate_ticket_id, TicketService};
use deskserver::tickets::{
    CreateTicketRequest, ProblemSource, SoftwareIssue, SpecificProblem, TicketFile,
};

/// Scripted model provider that counts invocations, so tests can assert the
/// service never reaches the model for a missing ticket.
struct ScriptedProvider {
    calls: AtomicUsize,
    tokens: Vec<&'static str>,
    fail: bool,
}

impl ScriptedProvider {
    fn new(tokens: Vec<&'static str>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            tokens,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            tokens: vec!["partial "],
            fail: true,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tokens.concat())
    }

    async fn generate_stream(
        &self,
        _prompt: &str,
        tx: mpsc::Sender<String>,
    ) -> Result<(), LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for token in &self.tokens {
            if tx.send(token.to_string()).await.is_err() {
                return Ok(());
            }
        }
        if self.fail {
            return Err(LlmError::Api("model unavailable".to_string()));
        }
        Ok(())
    }
}

fn service_with(provider: Arc<ScriptedProvider>) -> TicketService {
    TicketService::new(Arc::new(MemoryStore::new()), provider)
}

fn service() -> TicketService {
    service_with(Arc::new(ScriptedProvider::new(vec!["ok"])))
}

fn pc_software_request() -> CreateTicketRequest {
    CreateTicketRequest {
        problem_source: ProblemSource::Pc,
        specific_problem: SpecificProblem::SoftwareIssue,
        software_issue: Some(SoftwareIssue::DriverIssue),
        date: None,
        description: Some("printer not detected".to_string()),
        files: None,
    }
}

#[tokio::test]
async fn test_create_then_get_round_trips_all_fields() {
    let svc = service();
    let request = CreateTicketRequest {
        problem_source: ProblemSource::Mobile,
        specific_problem: SpecificProblem::NoCharging,
        software_issue: None,
        date: Some(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
        description: Some("stops charging at 5%".to_string()),
        files: Some(vec![TicketFile {
            name: "battery.png".to_string(),
            base64: "data:image/png;base64,aGVsbG8=".to_string(),
            content_type: "image/png".to_string(),
        }]),
    };

    let created = svc.create(request).await.unwrap();
    let fetched = svc.get(&created.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.problem_source, ProblemSource::Mobile);
    assert_eq!(fetched.specific_problem, SpecificProblem::NoCharging);
    assert_eq!(fetched.software_issue, None);
    assert_eq!(fetched.date, NaiveDate::from_ymd_opt(2024, 3, 9));
    assert_eq!(fetched.description, "stops charging at 5%");
    assert_eq!(fetched.files.len(), 1);
    assert_eq!(fetched.files[0].name, "battery.png");
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn test_absent_optional_fields_are_normalized_consistently() {
    let svc = service();
    let created = svc
        .create(CreateTicketRequest {
            problem_source: ProblemSource::Network,
            specific_problem: SpecificProblem::NoVpn,
            software_issue: None,
            date: None,
            description: None,
            files: None,
        })
        .await
        .unwrap();

    let fetched = svc.get(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.description, "");
    assert!(fetched.files.is_empty());
    assert_eq!(fetched.date, None);
}

#[tokio::test]
async fn test_delete_then_get_yields_not_found() {
    let svc = service();
    let created = svc.create(pc_software_request()).await.unwrap();

    assert!(svc.delete(&created.id).await.unwrap());
    assert!(svc.get(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_nonexistent_returns_false_without_side_effect() {
    let svc = service();
    let created = svc.create(pc_software_request()).await.unwrap();

    assert!(!svc.delete("zzzzzzzz").await.unwrap());
    // The unrelated ticket is untouched.
    assert!(svc.get(&created.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_software_issue_required_for_software_issue_problem() {
    let svc = service();
    let mut request = pc_software_request();
    request.software_issue = None;

    let err = svc.create(request).await.unwrap_err();
    assert!(matches!(err, TicketError::Validation(_)));
}

#[tokio::test]
async fn test_software_issue_dropped_when_not_applicable() {
    let svc = service();
    let created = svc
        .create(CreateTicketRequest {
            problem_source: ProblemSource::Pc,
            specific_problem: SpecificProblem::NoDisplay,
            software_issue: Some(SoftwareIssue::DriverIssue),
            date: None,
            description: None,
            files: None,
        })
        .await
        .unwrap();

    let fetched = svc.get(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.software_issue, None);
}

#[tokio::test]
async fn test_problem_outside_source_category_is_rejected() {
    let svc = service();
    let err = svc
        .create(CreateTicketRequest {
            problem_source: ProblemSource::Pc,
            specific_problem: SpecificProblem::NoWifi,
            software_issue: None,
            date: None,
            description: None,
            files: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Validation(_)));
}

#[tokio::test]
async fn test_invalid_attachment_payload_is_rejected() {
    let svc = service();
    let err = svc
        .create(CreateTicketRequest {
            problem_source: ProblemSource::Pc,
            specific_problem: SpecificProblem::NoAudio,
            software_issue: None,
            date: None,
            description: None,
            files: Some(vec![TicketFile {
                name: "bad.bin".to_string(),
                base64: "!!not base64!!".to_string(),
                content_type: "application/octet-stream".to_string(),
            }]),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Validation(_)));
}

#[test]
fn test_ids_unique_across_ten_thousand_generations() {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        assert!(seen.insert(generate_ticket_id()));
    }
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let svc = service();
    let created = svc.create(pc_software_request()).await.unwrap();

    let fetched = svc.get(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.problem_source, ProblemSource::Pc);
    assert_eq!(fetched.specific_problem, SpecificProblem::SoftwareIssue);
    assert_eq!(fetched.software_issue, Some(SoftwareIssue::DriverIssue));
    assert_eq!(fetched.description, "printer not detected");
    assert_eq!(fetched.created_at, created.created_at);

    assert!(svc.delete(&created.id).await.unwrap());
    assert!(svc.get(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_generation_on_deleted_ticket_fails_before_model_call() {
    let provider = Arc::new(ScriptedProvider::new(vec!["never"]));
    let svc = service_with(provider.clone());

    let created = svc.create(pc_software_request()).await.unwrap();
    assert!(svc.delete(&created.id).await.unwrap());

    let err = svc.generate_solution(&created.id).await.unwrap_err();
    assert!(matches!(err, TicketError::NotFound(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_generation_relays_tokens_in_order() {
    let provider = Arc::new(ScriptedProvider::new(vec!["Check ", "the ", "driver."]));
    let svc = service_with(provider.clone());
    let created = svc.create(pc_software_request()).await.unwrap();

    let mut stream = svc.generate_solution(&created.id).await.unwrap();
    let mut tokens = Vec::new();
    while let Some(token) = stream.tokens.recv().await {
        tokens.push(token);
    }
    assert_eq!(tokens, vec!["Check ", "the ", "driver."]);
    assert!(stream.finish().await.is_ok());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_generation_failure_is_reported_after_stream_ends() {
    let provider = Arc::new(ScriptedProvider::failing());
    let svc = service_with(provider);
    let created = svc.create(pc_software_request()).await.unwrap();

    let mut stream = svc.generate_solution(&created.id).await.unwrap();
    while stream.tokens.recv().await.is_some() {}
    let err = stream.finish().await.unwrap_err();
    assert!(matches!(err, LlmError::Api(_)));
}
