/// Athletics Hub: JSON-RPC tool server
///
/// Exposes roster, schedule, stats and news lookups (plus aggregated views)
/// for every sport on the athletics site as callable tools.
///
///   GET  /         service info
///   GET  /health   "ok"
///   POST /, /mcp   JSON-RPC: initialize, tools/list, tools/call
///
/// Run:
///   cargo run --bin athletics-server

mod rpc;

use anyhow::{Context, Result};
use athletics_scraper::{AthleticsScraper, SiteConfig, Sport};
use dotenv::dotenv;
use logger::EventLogger;
use serde_json::{json, Value};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use team_aggregator::TeamAggregator;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

const MAX_REQUEST_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct ServerState {
    aggregator: Arc<TeamAggregator>,
    logger: Arc<EventLogger>,
    base_url: String,
}

struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

fn bind_addr() -> String {
    env::var("ATHLETICS_BIND").unwrap_or_else(|_| {
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        format!("0.0.0.0:{port}")
    })
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Reads headers, then as many body bytes as Content-Length announces.
async fn read_request(stream: &mut TcpStream) -> Result<Option<HttpRequest>> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];

    let head_len = loop {
        let n = stream.read(&mut chunk).await.context("http read")?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = header_end(&buf) {
            break end;
        }
        if buf.len() > MAX_REQUEST_BYTES {
            anyhow::bail!("request headers too large");
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_len]).to_string();
    let body_len = content_length(&head);
    if body_len > MAX_REQUEST_BYTES {
        anyhow::bail!("request body too large: {} bytes", body_len);
    }

    while buf.len() < head_len + body_len {
        let n = stream.read(&mut chunk).await.context("http read body")?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();
    let body_end = buf.len().min(head_len + body_len);

    Ok(Some(HttpRequest { method, path, body: buf[head_len..body_end].to_vec() }))
}

fn service_info(state: &ServerState) -> Value {
    json!({
        "service": "Athletics Hub",
        "status": "running",
        "tools": rpc::TOOLS.iter().map(|t| t.name).collect::<Vec<_>>(),
        "available_sports": Sport::ALL.iter().map(|s| s.slug()).collect::<Vec<_>>(),
        "base_url": state.base_url,
    })
}

async fn handle_http_connection(mut stream: TcpStream, state: ServerState) -> Result<()> {
    let Some(req) = read_request(&mut stream).await? else {
        return Ok(());
    };

    let (status_line, content_type, body) = match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/health") => ("HTTP/1.1 200 OK", "text/plain; charset=utf-8", "ok".to_string()),
        ("GET", "/") => {
            let json = serde_json::to_string_pretty(&service_info(&state)).unwrap_or_else(|_| "{}".to_string());
            ("HTTP/1.1 200 OK", "application/json; charset=utf-8", json)
        }
        ("POST", "/") | ("POST", "/mcp") => match serde_json::from_slice::<Value>(&req.body) {
            Ok(call) => {
                let (resp, code) = rpc::handle_rpc(&state.aggregator, &state.logger, &call).await;
                let status = code.map(rpc::http_status).unwrap_or("HTTP/1.1 200 OK");
                (status, "application/json; charset=utf-8", resp.to_string())
            }
            Err(e) => {
                let resp = json!({
                    "jsonrpc": "2.0",
                    "id": Value::Null,
                    "error": { "code": -32700, "message": format!("Parse error: {e}") },
                });
                ("HTTP/1.1 400 Bad Request", "application/json; charset=utf-8", resp.to_string())
            }
        },
        _ => (
            "HTTP/1.1 404 Not Found",
            "text/plain; charset=utf-8",
            "not found".to_string(),
        ),
    };

    let resp = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.as_bytes().len(),
        body
    );
    stream.write_all(resp.as_bytes()).await.context("http write")?;
    Ok(())
}

async fn start_http_server(state: ServerState, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await.context("http bind")?;
    info!("athletics-server listening on http://{} (GET /, /health; POST /, /mcp)", bind);

    loop {
        let (stream, peer) = listener.accept().await.context("http accept")?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_http_connection(stream, state).await {
                debug!("http handler err {}: {}", peer, e);
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = SiteConfig::from_env();
    info!(
        "athletics site {} (backend {:?}, nav timeout {:?})",
        config.base_origin, config.backend, config.navigation_timeout
    );
    let base_url = config.base_origin.clone();

    let scraper = AthleticsScraper::new(config)?;
    let log_dir = env::var("ATHLETICS_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let state = ServerState {
        aggregator: Arc::new(TeamAggregator::new(scraper)),
        logger: Arc::new(EventLogger::new(log_dir)),
        base_url,
    };

    let bind: SocketAddr = bind_addr().parse().context("invalid ATHLETICS_BIND / PORT")?;
    start_http_server(state, bind).await
}
