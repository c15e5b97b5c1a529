//! Shared HTTP agent and bounded JSON fetch helper.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

use bcp_common::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Return a shared HTTP agent with consistent timeouts.
pub fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build()
    })
}

/// GET a JSON document, enforcing a maximum response size.
pub fn get_json(url: &str, max_bytes: usize) -> Result<serde_json::Value> {
    let response = agent()
        .get(url)
        .set("Accept", "application/json")
        .call()
        .map_err(|e| Error::Source(format!("GET {url}: {e}")))?;
    let bytes = read_response_bytes(response, max_bytes)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Source(format!("decode {url}: {e}")))
}

/// Read a response into memory, enforcing a maximum byte size.
fn read_response_bytes(response: ureq::Response, max_bytes: usize) -> Result<Vec<u8>> {
    if let Some(length) = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok())
    {
        if length > max_bytes as u64 {
            return Err(Error::ResponseTooLarge { limit: max_bytes });
        }
    }
    let reader = response.into_reader();
    let mut limited = reader.take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Source(format!("read body: {e}")))?;
    if bytes.len() > max_bytes {
        return Err(Error::ResponseTooLarge { limit: max_bytes });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn get_json_parses_a_document() {
        let body = r#"{"users":[{"id":1}]}"#;
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        ));
        let doc = get_json(&url, 1024).unwrap();
        assert_eq!(doc["users"][0]["id"], 1);
    }

    #[test]
    fn get_json_rejects_oversized_content_length() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 4096\r\n\r\nhi".to_string());
        match get_json(&url, 64) {
            Err(Error::ResponseTooLarge { limit }) => assert_eq!(limit, 64),
            other => panic!("expected ResponseTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn get_json_rejects_oversized_unannounced_body() {
        let body = "x".repeat(256);
        let url = serve_once(format!("HTTP/1.0 200 OK\r\n\r\n{body}"));
        assert!(matches!(
            get_json(&url, 64),
            Err(Error::ResponseTooLarge { .. })
        ));
    }

    #[test]
    fn get_json_reports_decode_failures() {
        let body = "not json";
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        ));
        match get_json(&url, 1024) {
            Err(Error::Source(msg)) => assert!(msg.contains("decode")),
            other => panic!("expected Source error, got {other:?}"),
        }
    }

    #[test]
    fn get_json_reports_http_errors() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n".to_string());
        assert!(matches!(get_json(&url, 1024), Err(Error::Source(_))));
    }

    #[test]
    fn get_json_reports_connection_failures() {
        // Port 9 (discard) is unroutable in practice; connection is refused.
        assert!(matches!(
            get_json("http://127.0.0.1:9/users", 1024),
            Err(Error::Source(_))
        ));
    }
}
