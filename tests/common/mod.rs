//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use locale_edge::config::EdgeConfig;
use locale_edge::http::EdgeServer;
use locale_edge::lifecycle::Shutdown;

/// Read one HTTP/1.1 request (head and Content-Length body) as text.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&buf).into_owned(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

async fn respond(socket: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "200 OK",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start an origin that answers every request with the raw request head it received.
pub async fn start_echo_origin(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                respond(&mut socket, 200, &request).await;
            });
        }
    });
}

/// Start a programmable backend with async support.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let (status, body) = f(request).await;
                respond(&mut socket, status, &body).await;
            });
        }
    });
}

/// Baseline configuration pointing at a test origin.
pub fn test_config(origin: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.origin.address = origin.to_string();
    config.locales.supported = vec!["en".into(), "es".into(), "fr".into()];
    config.locales.default = "en".into();
    config.experiments.pages = vec!["/pricing".into(), "/product/[slug]".into()];
    config.webhook.secret = Some("s3cret".into());
    config
}

/// Start the edge service on `addr`. Keep the returned handle alive for the test.
pub async fn spawn_edge(addr: SocketAddr, config: EdgeConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = EdgeServer::new(config).unwrap();
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    shutdown
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// All `Set-Cookie` values on a response.
#[allow(dead_code)]
pub fn set_cookies(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect()
}
