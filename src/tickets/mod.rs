pub mod error;
pub mod prompt;
pub mod service;
pub mod ui;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::shared::state::AppState;
use error::TicketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemSource {
    Pc,
    Network,
    Mobile,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecificProblem {
    NoPower,
    NoDisplay,
    NoKeyboard,
    NoMouse,
    NoAudio,
    SoftwareIssue,
    NoInternet,
    NoWifi,
    NoEthernet,
    NoVpn,
    NoSignal,
    NoVoice,
    NoData,
    NoCharging,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoftwareIssue {
    WindowsUpdate,
    DriverIssue,
    ApplicationCrash,
    VirusMalware,
    PerformanceSlow,
    StartupIssue,
    Other,
}

impl ProblemSource {
    /// The specific problems selectable for this source. Every category
    /// carries the overlapping `other` value.
    pub fn allowed_problems(&self) -> &'static [SpecificProblem] {
        use SpecificProblem::*;
        match self {
            ProblemSource::Pc => &[
                NoPower,
                NoDisplay,
                NoKeyboard,
                NoMouse,
                NoAudio,
                SoftwareIssue,
                Other,
            ],
            ProblemSource::Network => &[NoInternet, NoWifi, NoEthernet, NoVpn, Other],
            ProblemSource::Mobile => &[NoSignal, NoVoice, NoData, NoCharging, Other],
            ProblemSource::Other => &[Other],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemSource::Pc => "pc",
            ProblemSource::Network => "network",
            ProblemSource::Mobile => "mobile",
            ProblemSource::Other => "other",
        }
    }
}

impl SpecificProblem {
    pub fn valid_for(&self, source: ProblemSource) -> bool {
        source.allowed_problems().contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecificProblem::NoPower => "no-power",
            SpecificProblem::NoDisplay => "no-display",
            SpecificProblem::NoKeyboard => "no-keyboard",
            SpecificProblem::NoMouse => "no-mouse",
            SpecificProblem::NoAudio => "no-audio",
            SpecificProblem::SoftwareIssue => "software-issue",
            SpecificProblem::NoInternet => "no-internet",
            SpecificProblem::NoWifi => "no-wifi",
            SpecificProblem::NoEthernet => "no-ethernet",
            SpecificProblem::NoVpn => "no-vpn",
            SpecificProblem::NoSignal => "no-signal",
            SpecificProblem::NoVoice => "no-voice",
            SpecificProblem::NoData => "no-data",
            SpecificProblem::NoCharging => "no-charging",
            SpecificProblem::Other => "other",
        }
    }
}

impl SoftwareIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoftwareIssue::WindowsUpdate => "windows-update",
            SoftwareIssue::DriverIssue => "driver-issue",
            SoftwareIssue::ApplicationCrash => "application-crash",
            SoftwareIssue::VirusMalware => "virus-malware",
            SoftwareIssue::PerformanceSlow => "performance-slow",
            SoftwareIssue::StartupIssue => "startup-issue",
            SoftwareIssue::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFile {
    pub name: String,
    pub base64: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub problem_source: ProblemSource,
    pub specific_problem: SpecificProblem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_issue: Option<SoftwareIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub files: Vec<TicketFile>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub problem_source: ProblemSource,
    pub specific_problem: SpecificProblem,
    pub software_issue: Option<SoftwareIssue>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub files: Option<Vec<TicketFile>>,
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), TicketError> {
    let ticket = state.tickets.create(req).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, TicketError> {
    let ticket = state
        .tickets
        .get(&id)
        .await?
        .ok_or(TicketError::NotFound(id))?;
    Ok(Json(ticket))
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, TicketError> {
    let deleted = state.tickets.delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets", post(create_ticket))
        .route("/api/tickets/:id", get(get_ticket).delete(delete_ticket))
}
