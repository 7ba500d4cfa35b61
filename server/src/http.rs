//! tiny_http listener and worker pool.
//!
//! Every worker blocks on [`tiny_http::Server::recv`], routes the request
//! through [`crate::routes::handle`] and writes the JSON reply.

use std::io::Cursor;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Instant;

use tiny_http::Header;
use tiny_http::Method;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;

use crate::CatalogService;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::routes;
use crate::routes::Reply;

/// Request bodies above this size are rejected before parsing.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// A running server. Dropping it without [`ServerHandle::shutdown`] leaves
/// the workers detached.
pub struct ServerHandle {
    server: Arc<Server>,
    workers: Vec<JoinHandle<()>>,
    stopping: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ServerHandle {
    /// Address the listener actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    pub fn shutdown(mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        // Each unblock releases exactly one worker stuck in recv().
        for _ in &self.workers {
            self.server.unblock();
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("catalog worker panicked during shutdown");
            }
        }
        tracing::info!("catalog server on {} stopped", self.addr);
    }
}

/// Bind the listener and spawn `config.workers` worker threads.
pub fn start(config: &ServerConfig, service: Arc<CatalogService>) -> std::io::Result<ServerHandle> {
    let server = Server::http(config.bind).map_err(std::io::Error::other)?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| std::io::Error::other("listener is not bound to an IP address"))?;
    let server = Arc::new(server);
    let stopping = Arc::new(AtomicBool::new(false));

    let workers = (0..config.workers.max(1))
        .map(|n| {
            let server = Arc::clone(&server);
            let service = Arc::clone(&service);
            let stopping = Arc::clone(&stopping);
            std::thread::Builder::new()
                .name(format!("catalog-worker-{n}"))
                .spawn(move || worker_loop(&server, &service, &stopping))
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    tracing::info!(
        "catalog server listening on http://{addr} ({} workers, data: {})",
        workers.len(),
        service.store().path().display()
    );

    Ok(ServerHandle {
        server,
        workers,
        stopping,
        addr,
    })
}

fn worker_loop(server: &Server, service: &CatalogService, stopping: &AtomicBool) {
    loop {
        match server.recv() {
            Ok(request) => handle_request(service, request),
            Err(_) if stopping.load(Ordering::SeqCst) => break,
            Err(e) => tracing::warn!("accept error: {e}"),
        }
    }
}

fn handle_request(service: &CatalogService, mut request: Request) {
    let started = Instant::now();
    let method = request.method().clone();
    let target = request.url().to_string();

    let mut body = Vec::new();
    let reply = match request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
    {
        Ok(n) if n as u64 > MAX_BODY_BYTES => error_reply(&ApiError::BadRequest(format!(
            "request body exceeds {MAX_BODY_BYTES} bytes"
        ))),
        Ok(_) => routes::handle(service, &method, &target, &body),
        Err(e) => error_reply(&ApiError::BadRequest(format!(
            "failed to read request body: {e}"
        ))),
    };

    let status = reply.status;
    let preflight = method == Method::Options;
    if let Err(e) = request.respond(into_response(reply, preflight)) {
        tracing::warn!("failed to send response for {method} {target}: {e}");
    }
    tracing::debug!(
        "{method} {target} -> {status} in {}ms",
        started.elapsed().as_millis()
    );
}

fn error_reply(err: &ApiError) -> Reply {
    Reply {
        status: err.status(),
        body: serde_json::to_value(err.body()).ok(),
    }
}

fn into_response(reply: Reply, preflight: bool) -> Response<Cursor<Vec<u8>>> {
    let data = reply
        .body
        .as_ref()
        .and_then(|body| serde_json::to_vec(body).ok())
        .unwrap_or_default();

    let mut headers = vec![("Access-Control-Allow-Origin", "*")];
    if reply.body.is_some() {
        headers.push(("Content-Type", "application/json; charset=utf-8"));
    }
    if preflight {
        headers.push(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"));
        headers.push(("Access-Control-Allow-Headers", "Content-Type"));
    }

    headers
        .into_iter()
        .filter_map(|(name, value)| Header::from_bytes(name, value).ok())
        .fold(
            Response::from_data(data).with_status_code(reply.status),
            Response::with_header,
        )
}
