//! Local stand-in for the dashboard backend, bound to an ephemeral port.

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_http::{Header, Response, Server, StatusCode};

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: String,
}

type Handler = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

/// Stub HTTP server. Each request is answered on its own thread, so a slow
/// handler never holds up the next request.
pub struct StubServer {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("bind stub server");
        let addr = server.server_addr().to_ip().expect("ip listener");
        let stop = Arc::new(AtomicBool::new(false));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let loop_stop = Arc::clone(&stop);
        let loop_requests = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            while !loop_stop.load(Ordering::SeqCst) {
                let Ok(Some(mut request)) = server.recv_timeout(Duration::from_millis(20)) else {
                    continue;
                };
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let recorded = Recorded {
                    method: request.method().to_string(),
                    path: request.url().to_string(),
                    body,
                };
                loop_requests.lock().unwrap().push(recorded.clone());

                let handler = Arc::clone(&handler);
                thread::spawn(move || {
                    let (status, body) = handler(&recorded);
                    let header =
                        Header::from_bytes("Content-Type", "application/json").unwrap();
                    let _ = request.respond(
                        Response::from_string(body)
                            .with_header(header)
                            .with_status_code(StatusCode(status)),
                    );
                });
            }
        });

        Self {
            addr,
            stop,
            requests,
            handle: Some(handle),
        }
    }

    /// Serve `body` with status 200 for every request.
    pub fn json(body: &str) -> Self {
        let body = body.to_string();
        Self::start(move |_| (200, body.clone()))
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A base URL nothing listens on: the port is bound, then released.
pub fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("ephemeral addr");
    drop(listener);
    format!("http://{addr}")
}
