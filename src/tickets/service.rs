use base64::Engine;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::TicketError;
use super::prompt::prompt_from_ticket;
use super::{CreateTicketRequest, SpecificProblem, Ticket};
use crate::llm::{LlmError, LlmProvider};
use crate::storage::RecordStore;

pub const TICKET_ID_LEN: usize = 8;

/// Generate a short opaque ticket id.
pub fn generate_ticket_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TICKET_ID_LEN)
        .map(char::from)
        .collect()
}

/// Orchestrates ticket persistence and solution generation. Holds no ticket
/// state of its own; the record store owns the durable representation.
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn RecordStore>,
    llm: Arc<dyn LlmProvider>,
}

impl TicketService {
    pub fn new(store: Arc<dyn RecordStore>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { store, llm }
    }

    pub async fn create(&self, req: CreateTicketRequest) -> Result<Ticket, TicketError> {
        if !req.specific_problem.valid_for(req.problem_source) {
            return Err(TicketError::Validation(format!(
                "specificProblem '{}' is not valid for problemSource '{}'",
                req.specific_problem.as_str(),
                req.problem_source.as_str()
            )));
        }

        // A software issue is stored iff the specific problem is
        // software-issue: required there, dropped everywhere else.
        let software_issue = if req.specific_problem == SpecificProblem::SoftwareIssue {
            Some(req.software_issue.ok_or_else(|| {
                TicketError::Validation(
                    "softwareIssue is required when specificProblem is software-issue".to_string(),
                )
            })?)
        } else {
            None
        };

        let files = req.files.unwrap_or_default();
        for file in &files {
            if !file_payload_is_valid(&file.base64) {
                return Err(TicketError::Validation(format!(
                    "attachment '{}' is not valid base64 data",
                    file.name
                )));
            }
        }

        let mut id = generate_ticket_id();
        while self.store.has(&id).await? {
            id = generate_ticket_id();
        }

        let ticket = Ticket {
            id,
            problem_source: req.problem_source,
            specific_problem: req.specific_problem,
            software_issue,
            date: req.date,
            files,
            description: req.description.unwrap_or_default(),
            created_at: Utc::now(),
        };

        let payload = serde_json::to_string(&ticket)
            .map_err(|e| TicketError::Corrupt(format!("serializing ticket: {e}")))?;
        self.store.set(&ticket.id, &payload).await?;

        Ok(ticket)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let Some(raw) = self.store.get(id).await? else {
            return Ok(None);
        };
        let ticket = serde_json::from_str(&raw)
            .map_err(|e| TicketError::Corrupt(format!("record {id}: {e}")))?;
        Ok(Some(ticket))
    }

    pub async fn delete(&self, id: &str) -> Result<bool, TicketError> {
        Ok(self.store.delete(id).await?)
    }

    /// Look up the ticket and start solution generation, returning the live
    /// token stream. Fails with `NotFound` before any model call when the
    /// ticket is absent.
    pub async fn generate_solution(&self, id: &str) -> Result<SolutionStream, TicketError> {
        let ticket = self
            .get(id)
            .await?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;
        let prompt = prompt_from_ticket(&ticket);

        let llm = self.llm.clone();
        let (token_tx, token_rx) = mpsc::channel::<String>(100);
        let task = tokio::spawn(async move { llm.generate_stream(&prompt, token_tx).await });

        Ok(SolutionStream {
            tokens: token_rx,
            task,
        })
    }
}

/// A running solution generation: tokens arrive on `tokens` in generation
/// order; once the channel closes, `finish` reports whether the provider
/// completed cleanly.
#[derive(Debug)]
pub struct SolutionStream {
    pub tokens: mpsc::Receiver<String>,
    task: JoinHandle<Result<(), LlmError>>,
}

impl SolutionStream {
    pub async fn finish(self) -> Result<(), LlmError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(LlmError::Api(format!("generation task failed: {e}"))),
        }
    }
}

fn file_payload_is_valid(data: &str) -> bool {
    // Accept either a bare base64 payload or a full data URI.
    let payload = data.rsplit_once(',').map(|(_, p)| p).unwrap_or(data);
    base64::engine::general_purpose::STANDARD.decode(payload).is_ok()
}
