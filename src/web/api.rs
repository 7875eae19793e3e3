//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns an
//! [`HttpResponse`] with JSON content.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiny_http::{Response, StatusCode};

use crate::chart::PanelStatus;
use crate::dashboard::DashboardShell;
use crate::panels::PanelId;
use crate::series::Point;

use super::{HttpResponse, content_type_json, error_response};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// `POST /api/select` body.
#[derive(Deserialize)]
struct SelectRequest {
    panel: String,
}

/// `POST /api/question` and `POST /api/ask` body.
#[derive(Deserialize)]
struct QuestionRequest {
    question: Option<String>,
}

/// `GET /api/series/{panel}` response.
#[derive(Serialize)]
struct SeriesResponse<'a> {
    panel: PanelId,
    status: PanelStatus,
    x_field: &'a str,
    y_field: &'a str,
    points: &'a [Point],
}

/// `GET /api/health` response.
#[derive(Serialize)]
struct HealthResponse {
    panels: Vec<PanelHealth>,
    chat_phase: crate::chat::ChatPhase,
}

#[derive(Serialize)]
struct PanelHealth {
    panel: PanelId,
    status: PanelStatus,
    points: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/dashboard`: the whole screen.
pub fn get_dashboard(shell: &DashboardShell) -> Result<HttpResponse> {
    json_response(&shell.view())
}

/// `POST /api/select`: switch the visible panel.
///
/// Expects JSON body: `{ "panel": "co2" }`
pub fn post_select(shell: &mut DashboardShell, body: &str) -> Result<HttpResponse> {
    let req: SelectRequest =
        serde_json::from_str(body).context("invalid JSON in select request")?;

    let panel = match req.panel.parse::<PanelId>() {
        Ok(panel) => panel,
        Err(e) => return Ok(error_response(400, &e.to_string())),
    };

    shell.select(panel);
    json_response(&shell.view())
}

/// `POST /api/question`: mirror the question input as the user types.
pub fn post_question(shell: &mut DashboardShell, body: &str) -> Result<HttpResponse> {
    let req: QuestionRequest =
        serde_json::from_str(body).context("invalid JSON in question request")?;

    shell.set_question(req.question.unwrap_or_default());
    json_response(&serde_json::json!({ "success": true }))
}

/// `POST /api/ask`: submit the question.
///
/// Expects JSON body: `{ "question": "What is GDP?" }`. When `question` is
/// omitted the pending question is submitted as-is. The answer arrives
/// asynchronously; poll `GET /api/dashboard`.
pub fn post_ask(shell: &mut DashboardShell, body: &str) -> Result<HttpResponse> {
    let req: QuestionRequest =
        serde_json::from_str(body).context("invalid JSON in ask request")?;

    if let Some(question) = req.question {
        shell.set_question(question);
    }
    let request_id = shell.submit_question();

    json_response(&serde_json::json!({
        "request_id": request_id,
        "dashboard": shell.view(),
    }))
}

/// `GET /api/series/{panel}`: raw points behind a panel.
pub fn get_series(shell: &DashboardShell, panel: &str) -> Result<HttpResponse> {
    let Ok(id) = panel.parse::<PanelId>() else {
        return Ok(error_response(404, &format!("unknown panel '{panel}'")));
    };
    let Some(chart) = shell.chart(id) else {
        return Ok(error_response(404, &format!("unknown panel '{panel}'")));
    };

    let descriptor = chart.descriptor();
    let points = chart.series().map(|s| s.points.as_slice()).unwrap_or(&[]);

    json_response(&SeriesResponse {
        panel: id,
        status: chart.state().status(),
        x_field: descriptor.x_field,
        y_field: descriptor.y_field,
        points,
    })
}

/// `GET /api/health`: load state of every panel.
pub fn get_health(shell: &DashboardShell) -> Result<HttpResponse> {
    let panels = PanelId::ALL
        .into_iter()
        .filter_map(|id| shell.chart(id))
        .map(|chart| PanelHealth {
            panel: chart.descriptor().id,
            status: chart.state().status(),
            points: chart.series().map_or(0, |s| s.len()),
        })
        .collect();

    json_response(&HealthResponse {
        panels,
        chat_phase: shell.chat().phase(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_request_deserializes() {
        let req: SelectRequest = serde_json::from_str(r#"{"panel": "agri"}"#).unwrap();
        assert_eq!(req.panel, "agri");
    }

    #[test]
    fn question_request_allows_missing_and_empty() {
        let req: QuestionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.question, None);
        let req: QuestionRequest = serde_json::from_str(r#"{"question": ""}"#).unwrap();
        assert_eq!(req.question.as_deref(), Some(""));
    }

    #[test]
    fn series_response_serializes() {
        let points = vec![Point {
            x: serde_json::json!(1990),
            y: serde_json::json!(5.9),
        }];
        let resp = SeriesResponse {
            panel: PanelId::Gdp,
            status: PanelStatus::Ready,
            x_field: "year",
            y_field: "gdp",
            points: &points,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"panel\":\"gdp\""));
        assert!(json.contains("\"status\":\"ready\""));
        assert!(json.contains("{\"x\":1990,\"y\":5.9}"));
    }
}
