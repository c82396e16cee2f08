//! Minimal HTTP/1.1 responder for exercising the real transport.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Serves one canned response to every connection until dropped.
pub struct CannedServer {
    address: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl CannedServer {
    /// Answer with `status` (e.g. `"200 OK"`) and `body`.
    pub async fn start(status: &'static str, body: impl Into<Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|err| panic!("failed to bind test server: {err}"));
        let address = listener
            .local_addr()
            .unwrap_or_else(|err| panic!("test server has no address: {err}"));
        let body = Arc::new(body.into());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _peer)) = listener.accept().await {
                tokio::spawn(respond(stream, status, Arc::clone(&body), Arc::clone(&seen)));
            }
        });
        Self {
            address,
            requests,
            task,
        }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    /// Request heads received so far, lower-cased.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for CannedServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond(
    mut stream: TcpStream,
    status: &'static str,
    body: Arc<Vec<u8>>,
    seen: Arc<Mutex<Vec<String>>>,
) {
    let head = read_head(&mut stream).await;
    seen.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(head.to_lowercase());
    let preamble = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(preamble.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}

async fn read_head(stream: &mut TcpStream) -> String {
    let mut received = Vec::new();
    let mut chunk = [0_u8; 1024];
    let mut expected = None;
    loop {
        if let Some(total) = expected {
            if received.len() >= total {
                break;
            }
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(read) => {
                received.extend_from_slice(&chunk[..read]);
                if expected.is_none() {
                    expected = head_end(&received)
                        .map(|end| end + content_length(&received[..end]));
                }
            }
        }
    }
    let end = head_end(&received).unwrap_or(received.len());
    String::from_utf8_lossy(&received[..end]).into_owned()
}

fn head_end(received: &[u8]) -> Option<usize> {
    received
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|index| index + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

/// URL of a local port with nothing listening on it.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|err| panic!("failed to bind probe listener: {err}"));
    let address = listener
        .local_addr()
        .unwrap_or_else(|err| panic!("probe listener has no address: {err}"));
    drop(listener);
    format!("http://{address}/locations.json")
}
