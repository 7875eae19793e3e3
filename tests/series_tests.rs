/// Integration tests for chart data fetching against a local stub backend.
///
/// Covers payload projection end-to-end over HTTP, the error taxonomy for
/// failed fetches, and how a ChartPanel degrades when its fetch fails.
mod common;

use std::sync::Arc;
use std::time::Duration;

use copilot_dash::cancel::CancelToken;
use copilot_dash::chart::{ChartPanel, PanelStatus};
use copilot_dash::client::ApiClient;
use copilot_dash::error::FetchError;
use copilot_dash::events::{EventKind, EventLog};
use copilot_dash::panels::{PanelDescriptor, PanelId};
use copilot_dash::series::{HttpSeriesFetcher, SeriesSource};
use serde_json::json;

use common::{StubServer, refused_base_url};

fn fetcher(base_url: &str) -> HttpSeriesFetcher {
    HttpSeriesFetcher::new(ApiClient::new(base_url, Some(Duration::from_secs(5))))
}

fn temp_log(name: &str) -> EventLog {
    let path = std::env::temp_dir().join(format!(
        "copilot-dash-it-{}-{}.jsonl",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    EventLog::at_path(path)
}

// ---------------------------------------------------------------------------
// Projection over HTTP
// ---------------------------------------------------------------------------

#[test]
fn series_preserves_length_order_and_values() {
    let stub = StubServer::json(
        r#"{"data": [
            {"year": 1990, "gdp": 5.9},
            {"year": 1991, "gdp": 6.1},
            {"year": 1992, "gdp": "6.5"},
            {"year": "1993", "gdp": null}
        ]}"#,
    );
    let series = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap();

    assert_eq!(series.len(), 4);
    assert_eq!(series.points[0].x, json!(1990));
    assert_eq!(series.points[0].y, json!(5.9));
    assert_eq!(series.points[2].y, json!("6.5"));
    assert_eq!(series.points[3].x, json!("1993"));
    assert_eq!(series.points[3].y, json!(null));

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/gdp-usa-100yrs");
}

#[test]
fn missing_fields_become_null() {
    let stub = StubServer::json(r#"{"data": [{"year": 2000}, {"co2": 12.5}]}"#);
    let series = fetcher(&stub.base_url())
        .fetch_series("/api/co2-world-50yrs", "year", "co2", &CancelToken::new())
        .unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.points[0].y, json!(null));
    assert_eq!(series.points[1].x, json!(null));
    assert_eq!(series.points[1].y, json!(12.5));
}

#[test]
fn absent_data_is_an_empty_series() {
    let stub = StubServer::json(r#"{"status": "ok"}"#);
    let series = fetcher(&stub.base_url())
        .fetch_series("/api/agri-land-world-50yrs", "year", "agriLand", &CancelToken::new())
        .unwrap();
    assert!(series.is_empty());
}

#[test]
fn null_data_is_an_empty_series() {
    let stub = StubServer::json(r#"{"data": null}"#);
    let series = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap();
    assert!(series.is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn invalid_json_is_a_parse_error() {
    let stub = StubServer::json("<html>oops</html>");
    let err = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap_err();
    assert_eq!(err.kind(), "parse");
}

#[test]
fn non_array_data_is_a_parse_error() {
    let stub = StubServer::json(r#"{"data": "soon"}"#);
    let err = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Parse { .. }));
}

#[test]
fn not_found_body_is_an_empty_series() {
    let stub = StubServer::start(|_| (404, r#"{"detail": "Not Found"}"#.to_string()));
    let series = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap();
    assert!(series.is_empty());
}

#[test]
fn error_status_with_data_still_projects() {
    let stub = StubServer::start(|_| (500, r#"{"data": [{"year": 1990, "gdp": 5.9}]}"#.to_string()));
    let series = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series.points[0].y, json!(5.9));
}

#[test]
fn error_status_without_json_is_a_parse_error() {
    let stub = StubServer::start(|_| (503, "Service Unavailable".to_string()));
    let err = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Parse { .. }));
}

#[test]
fn refused_connection_is_a_network_error() {
    let err = fetcher(&refused_base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &CancelToken::new())
        .unwrap_err();
    assert_eq!(err.kind(), "network");
}

#[test]
fn cancelled_token_skips_the_request() {
    let stub = StubServer::json(r#"{"data": []}"#);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = fetcher(&stub.base_url())
        .fetch_series("/api/gdp-usa-100yrs", "year", "gdp", &cancel)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(stub.requests().is_empty());
}

// ---------------------------------------------------------------------------
// ChartPanel over HTTP
// ---------------------------------------------------------------------------

#[test]
fn failed_panel_shows_title_only_and_logs() {
    let log = temp_log("title-only");
    let mut panel = ChartPanel::new(PanelDescriptor::builtin(PanelId::Co2), log.clone());
    panel.mount(Arc::new(fetcher(&refused_base_url())));
    assert!(panel.wait(Duration::from_secs(10)));

    assert_eq!(panel.state().status(), PanelStatus::Failed);
    assert!(panel.chart_svg().is_none());

    let html = panel.render_html();
    assert!(html.contains("<h3>CO₂ Emissions (World, 50 yrs)</h3>"));
    assert!(!html.contains("<svg"));
    assert_eq!(
        panel.render_text(40, 8),
        vec!["CO₂ Emissions (World, 50 yrs)".to_string()]
    );

    let entries = log.read_all();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EventKind::PanelFetch);
    assert_eq!(entries[0].target, "co2");
    assert!(!entries[0].success);

    if let Some(path) = log.path() {
        let _ = std::fs::remove_file(path);
    }
}

#[test]
fn ready_panel_renders_a_line_chart() {
    let stub = StubServer::json(
        r#"{"data": [{"year": 2000, "gdp": 10.2}, {"year": 2001, "gdp": 10.6}, {"year": 2002, "gdp": 11.0}]}"#,
    );
    let mut panel = ChartPanel::new(PanelDescriptor::builtin(PanelId::Gdp), EventLog::disabled());
    panel.mount(Arc::new(fetcher(&stub.base_url())));
    assert!(panel.wait(Duration::from_secs(10)));

    assert_eq!(panel.state().status(), PanelStatus::Ready);
    let svg = panel.chart_svg().unwrap();
    assert!(svg.contains("<polyline"));
    assert!(svg.contains("GDP (Trillions USD)"));
}
