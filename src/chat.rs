/// Question/answer chat box.
///
/// [`ChatPanel`] holds the question being typed and the last displayed
/// response. Submitting sends `{"question": <text>}` to the chat endpoint on
/// a worker thread; the answer (or a fixed fallback message on any failure)
/// replaces the displayed response when [`ChatPanel::poll`] or
/// [`ChatPanel::wait`] picks it up.
///
/// Overlapping submits follow a supersede policy: every submit gets a new
/// request id and cancels the previous one, and only the completion whose id
/// matches the latest issued id is applied.
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::client::ApiClient;
use crate::error::{FetchError, FetchResult};
use crate::events::{EventKind, EventLog, EventLogEntry};

/// Shown in place of an answer whenever a submit fails for any reason.
pub const FALLBACK_RESPONSE: &str = "Error fetching response. Please try again.";

/// Number of completed exchanges kept for the sidebar history.
pub const HISTORY_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body for `POST /chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

/// Expected response body from `POST /chat`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: String,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Anything that can answer a question. Called from worker threads.
pub trait ChatBackend: Send + Sync {
    fn ask(&self, question: &str, cancel: &CancelToken) -> FetchResult<String>;

    /// Human-readable target for diagnostics.
    fn target(&self) -> String;
}

/// [`ChatBackend`] posting to the dashboard backend's chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: ApiClient,
    url: String,
}

impl HttpChatBackend {
    pub fn new(client: ApiClient, chat_path: &str) -> Self {
        let url = client.endpoint_url(chat_path);
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ChatBackend for HttpChatBackend {
    fn ask(&self, question: &str, cancel: &CancelToken) -> FetchResult<String> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: self.url.clone(),
            });
        }

        let payload = self.client.post_json(&self.url, &ChatRequest { question })?;

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: self.url.clone(),
            });
        }

        parse_answer(&self.url, payload)
    }

    fn target(&self) -> String {
        self.url.clone()
    }
}

/// Extract the `answer` string from a chat response payload.
fn parse_answer(url: &str, payload: Value) -> FetchResult<String> {
    serde_json::from_value::<ChatResponse>(payload)
        .map(|resp| resp.answer)
        .map_err(|e| FetchError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Panel state
// ---------------------------------------------------------------------------

/// Submit-cycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    #[default]
    Idle,
    AwaitingResponse,
    Answered,
    Errored,
}

/// A completed question/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    pub question: String,
    pub response: String,
    pub ok: bool,
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    question: String,
    target: String,
    cancel: CancelToken,
    rx: Receiver<FetchResult<String>>,
    started: Instant,
}

/// Chat box state: the question being edited and the last response.
#[derive(Debug)]
pub struct ChatPanel {
    pending_question: String,
    last_response: Option<String>,
    phase: ChatPhase,
    latest_id: u64,
    in_flight: Option<InFlight>,
    history: VecDeque<ChatExchange>,
    log: EventLog,
}

impl ChatPanel {
    pub fn new(log: EventLog) -> Self {
        Self {
            pending_question: String::new(),
            last_response: None,
            phase: ChatPhase::Idle,
            latest_id: 0,
            in_flight: None,
            history: VecDeque::new(),
            log,
        }
    }

    /// Replace the question being typed. Called on every edit.
    pub fn set_question(&mut self, text: impl Into<String>) {
        self.pending_question = text.into();
    }

    pub fn pending_question(&self) -> &str {
        &self.pending_question
    }

    /// The displayed response, if a submit cycle has completed.
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    /// Completed exchanges, newest first.
    pub fn history(&self) -> impl Iterator<Item = &ChatExchange> {
        self.history.iter()
    }

    /// Id of the most recently issued request (0 before the first submit).
    pub fn latest_request(&self) -> u64 {
        self.latest_id
    }

    /// Submit the pending question. No validation: an empty question is sent
    /// as-is. Supersedes any request still in flight. Returns the new
    /// request id.
    pub fn submit(&mut self, backend: Arc<dyn ChatBackend>) -> u64 {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel.cancel();
        }

        self.latest_id += 1;
        let id = self.latest_id;
        let question = self.pending_question.clone();
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();
        let worker_cancel = cancel.clone();
        let worker_question = question.clone();
        let worker_backend = Arc::clone(&backend);

        self.phase = ChatPhase::AwaitingResponse;

        let spawned = thread::Builder::new()
            .name(format!("chat-{id}"))
            .spawn(move || {
                let result = worker_backend.ask(&worker_question, &worker_cancel);
                if worker_cancel.is_cancelled() {
                    return;
                }
                let _ = tx.send(result);
            });

        self.in_flight = Some(InFlight {
            id,
            question,
            target: backend.target(),
            cancel,
            rx,
            started: Instant::now(),
        });

        if let Err(e) = spawned {
            self.complete(
                id,
                Err(FetchError::Network {
                    url: backend.target(),
                    message: format!("failed to spawn chat worker: {e}"),
                }),
            );
        }

        id
    }

    /// Apply the latest completion, if it has arrived. Never blocks.
    pub fn poll(&mut self) -> bool {
        let Some(in_flight) = &self.in_flight else {
            return false;
        };
        let id = in_flight.id;
        match in_flight.rx.try_recv() {
            Ok(result) => {
                self.complete(id, result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.worker_lost(id);
                true
            }
        }
    }

    /// Block up to `timeout` for the latest submit to complete. Returns
    /// whether the panel has settled.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let Some(in_flight) = &self.in_flight else {
            return self.phase != ChatPhase::AwaitingResponse;
        };
        let id = in_flight.id;
        match in_flight.rx.recv_timeout(timeout) {
            Ok(result) => {
                self.complete(id, result);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                self.worker_lost(id);
                true
            }
        }
    }

    /// Cancel any in-flight submit without changing the displayed response.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
            self.phase = match self.last_response {
                None => ChatPhase::Idle,
                Some(_) if self.history.front().is_some_and(|e| !e.ok) => ChatPhase::Errored,
                Some(_) => ChatPhase::Answered,
            };
        }
    }

    fn worker_lost(&mut self, id: u64) {
        let url = self
            .in_flight
            .as_ref()
            .map(|f| f.target.clone())
            .unwrap_or_default();
        self.complete(
            id,
            Err(FetchError::Network {
                url,
                message: "worker exited without a result".to_string(),
            }),
        );
    }

    fn complete(&mut self, id: u64, result: FetchResult<String>) {
        if id != self.latest_id {
            return;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        let latency_ms = u64::try_from(in_flight.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (response, ok) = match result {
            Ok(answer) => {
                self.log.record(
                    &EventLogEntry::new(EventKind::ChatSubmit, &in_flight.target, true)
                        .with_latency(latency_ms)
                        .with_detail(format!("request {id}")),
                );
                (answer, true)
            }
            Err(e) => {
                eprintln!("{} chat request failed: {}", "warning:".yellow().bold(), e);
                self.log.record(
                    &EventLogEntry::new(EventKind::ChatSubmit, &in_flight.target, false)
                        .with_latency(latency_ms)
                        .with_detail(e.to_string()),
                );
                (FALLBACK_RESPONSE.to_string(), false)
            }
        };

        self.phase = if ok {
            ChatPhase::Answered
        } else {
            ChatPhase::Errored
        };
        self.last_response = Some(response.clone());
        self.history.push_front(ChatExchange {
            question: in_flight.question,
            response,
            ok,
        });
        self.history.truncate(HISTORY_LIMIT);
    }
}

impl Drop for ChatPanel {
    fn drop(&mut self) {
        if let Some(in_flight) = &self.in_flight {
            in_flight.cancel.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
