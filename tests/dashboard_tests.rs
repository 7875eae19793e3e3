/// Integration tests for the dashboard shell and the local web server.
///
/// The backend is a stub serving the three chart endpoints and `/chat`; the
/// dashboard server runs on its own thread and is driven over HTTP.
mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use copilot_dash::cancel::CancelToken;
use copilot_dash::chat::HttpChatBackend;
use copilot_dash::client::ApiClient;
use copilot_dash::dashboard::DashboardShell;
use copilot_dash::events::EventLog;
use copilot_dash::panels::PanelId;
use copilot_dash::series::HttpSeriesFetcher;
use copilot_dash::web::DashboardServer;
use serde_json::{Value, json};

use common::{Recorded, StubServer};

fn backend_routes(req: &Recorded) -> (u16, String) {
    let body = match req.path.as_str() {
        "/api/gdp-usa-100yrs" => json!({"data": [
            {"year": 1990, "gdp": 5.9},
            {"year": 2000, "gdp": 10.2},
            {"year": 2010, "gdp": 15.0}
        ]}),
        "/api/co2-world-50yrs" => json!({"data": [
            {"year": 1990, "co2": 22000},
            {"year": 2020, "co2": 34000}
        ]}),
        "/api/agri-land-world-50yrs" => json!({"data": [
            {"year": 1990, "agriLand": 4.9e7}
        ]}),
        "/chat" => json!({"answer": "A measure of economic output."}),
        _ => return (404, json!({"detail": "not found"}).to_string()),
    };
    (200, body.to_string())
}

fn shell_for(base_url: &str, initial: PanelId) -> DashboardShell {
    let client = ApiClient::new(base_url, Some(Duration::from_secs(5)));
    DashboardShell::new(
        initial,
        Arc::new(HttpSeriesFetcher::new(client.clone())),
        Arc::new(HttpChatBackend::new(client, "/chat")),
        EventLog::disabled(),
    )
}

/// Poll until `done` holds or the deadline passes.
fn eventually(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    false
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

#[test]
fn exactly_the_selected_panel_is_visible() {
    let stub = StubServer::start(backend_routes);
    let mut shell = shell_for(&stub.base_url(), PanelId::Gdp);
    shell.mount();
    assert!(eventually(|| {
        shell.poll();
        PanelId::ALL
            .into_iter()
            .all(|id| shell.series(id).is_some())
    }));

    for id in [PanelId::Gdp, PanelId::Co2, PanelId::Agri] {
        shell.select(id);
        let view = shell.view();
        let visible: Vec<PanelId> = view.panels.iter().filter(|p| p.visible).map(|p| p.id).collect();
        assert_eq!(visible, vec![id]);
        for panel in &view.panels {
            assert_eq!(panel.chart_svg.is_some(), panel.id == id);
        }
    }
}

#[test]
fn each_panel_is_fetched_once_per_mount() {
    let stub = StubServer::start(backend_routes);
    let mut shell = shell_for(&stub.base_url(), PanelId::Co2);
    shell.mount();
    shell.mount();
    assert!(eventually(|| {
        shell.poll();
        PanelId::ALL
            .into_iter()
            .all(|id| shell.series(id).is_some())
    }));

    // Selection is pure UI state.
    shell.select(PanelId::Gdp);
    shell.select(PanelId::Agri);
    shell.poll();

    let mut paths: Vec<String> = stub.requests().into_iter().map(|r| r.path).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "/api/agri-land-world-50yrs",
            "/api/co2-world-50yrs",
            "/api/gdp-usa-100yrs"
        ]
    );
    assert_eq!(shell.series(PanelId::Gdp).map(|s| s.len()), Some(3));
}

#[test]
fn unmounted_panel_ignores_late_result() {
    let stub = StubServer::start(|req| {
        thread::sleep(Duration::from_millis(300));
        backend_routes(req)
    });
    let mut shell = shell_for(&stub.base_url(), PanelId::Gdp);
    shell.mount();
    if let Some(chart) = shell.chart_mut(PanelId::Gdp) {
        chart.unmount();
    }

    thread::sleep(Duration::from_millis(600));
    shell.poll();
    let chart = shell.chart(PanelId::Gdp).unwrap();
    assert!(!chart.is_mounted());
    assert!(chart.series().is_none());
}

// ---------------------------------------------------------------------------
// Web server
// ---------------------------------------------------------------------------

#[test]
fn server_drives_the_dashboard_over_http() {
    let stub = StubServer::start(backend_routes);
    let server = DashboardServer::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.local_addr().unwrap());

    let stop = CancelToken::new();
    let server_stop = stop.clone();
    let mut shell = shell_for(&stub.base_url(), PanelId::Gdp);
    let handle = thread::spawn(move || server.run(&mut shell, &server_stop));

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(5))
        .build();
    let get = |path: &str| -> Value {
        agent
            .get(&format!("{base}{path}"))
            .call()
            .unwrap()
            .into_json()
            .unwrap()
    };
    let post = |path: &str, body: Value| -> Value {
        agent
            .post(&format!("{base}{path}"))
            .send_json(body)
            .unwrap()
            .into_json()
            .unwrap()
    };

    // Frontend
    let html = agent.get(&format!("{base}/")).call().unwrap().into_string().unwrap();
    assert!(html.contains("<!DOCTYPE html>"));

    // All panels load once the server has mounted the shell.
    assert!(eventually(|| {
        let view = get("/api/dashboard");
        view["panels"]
            .as_array()
            .is_some_and(|panels| panels.iter().all(|p| p["status"] == "ready"))
    }));

    let view = get("/api/dashboard");
    assert_eq!(view["nav"]["brand"], "Web UI Copilot");
    assert_eq!(view["header"], "Web Copilot");
    assert_eq!(view["selected"], "gdp");

    // Select another panel.
    let view = post("/api/select", json!({"panel": "agri"}));
    assert_eq!(view["selected"], "agri");
    let visible: Vec<&Value> = view["panels"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["visible"] == true)
        .collect();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["id"], "agri");
    assert!(visible[0]["chart_svg"].as_str().unwrap().contains("<svg"));

    // Raw series.
    let series = get("/api/series/co2");
    assert_eq!(series["points"].as_array().map(Vec::len), Some(2));
    assert_eq!(series["points"][1], json!({"x": 2020, "y": 34000}));

    match agent.get(&format!("{base}/api/series/weather")).call() {
        Err(ureq::Error::Status(code, _)) => assert_eq!(code, 404),
        other => panic!("expected 404, got {other:?}"),
    }

    // Chat round trip.
    post("/api/question", json!({"question": "What is"}));
    assert_eq!(get("/api/dashboard")["chat"]["question"], "What is");

    let submitted = post("/api/ask", json!({"question": "What is GDP?"}));
    assert_eq!(submitted["request_id"], 1);
    assert!(eventually(|| get("/api/dashboard")["chat"]["phase"] == "answered"));
    let view = get("/api/dashboard");
    assert_eq!(view["chat"]["response"], "A measure of economic output.");
    assert_eq!(view["chat"]["history"][0]["question"], "What is GDP?");

    let health = get("/api/health");
    assert_eq!(health["chat_phase"], "answered");
    assert_eq!(health["panels"][0]["points"], 3);

    stop.cancel();
    handle.join().unwrap().unwrap();
}
