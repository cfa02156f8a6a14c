//! Minimal HTTP/1.1 responder for exercising the NAS client against canned
//! vendor envelopes. Test-only; accepts one request per connection and
//! records every request target so tests can assert which endpoints were hit.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Maps a request target (path + query) and body to a JSON response body.
pub type Responder = dyn Fn(&str, &str) -> String + Send + Sync;

pub struct FakeNas {
    addr: SocketAddr,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FakeNas {
    /// Bind an ephemeral port and serve `responder` until the test ends.
    pub async fn spawn<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let responder: Arc<Responder> = Arc::new(responder);
        let task_hits = hits.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let responder = responder.clone();
                let hits = task_hits.clone();
                tokio::spawn(async move {
                    if let Some((target, body)) = read_request(&mut socket).await {
                        hits.lock().unwrap().push(target.clone());
                        let json = responder(&target, &body);
                        let response = format!(
                            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            json.len(),
                            json
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                });
            }
        });

        Self { addr, hits }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every request target seen so far, in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    /// Number of recorded requests whose target contains `needle`.
    pub fn hit_count(&self, needle: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.contains(needle))
            .count()
    }
}

/// Read one HTTP request: returns (target, body as lossy UTF-8).
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<(String, String)> {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    // Headers
    let header_end = loop {
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let target = head
        .lines()
        .next()?
        .split_whitespace()
        .nth(1)?
        .to_string();

    let content_length: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some((target, String::from_utf8_lossy(&body).into_owned()))
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Canned success envelope for the capability probe.
pub fn probe_ok() -> String {
    r#"{"success":true,"data":{}}"#.to_string()
}

/// Canned login success with the given session id.
pub fn login_ok(sid: &str) -> String {
    format!(r#"{{"success":true,"data":{{"sid":"{sid}"}}}}"#)
}

/// Canned failure envelope with the given vendor code.
pub fn vendor_error(code: i64) -> String {
    format!(r#"{{"success":false,"error":{{"code":{code}}}}}"#)
}

/// Canned Photos-generation upload success with the given item id.
pub fn upload_ok_photos(id: i64) -> String {
    format!(r#"{{"success":true,"data":{{"id":{id}}}}}"#)
}

/// Canned FileStation-generation upload success.
pub fn upload_ok_filestation(file: &str) -> String {
    format!(r#"{{"success":true,"data":{{"blSkip":false,"file":"{file}"}}}}"#)
}
