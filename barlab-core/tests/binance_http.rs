//! Binance provider against a local one-shot HTTP server.

use barlab_core::data::{BinanceProvider, DataError, FetchRequest, RateLimiter};
use barlab_core::{DataProvider, Timeframe};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const MINUTE: i64 = 60_000;

const TWO_KLINES: &str = r#"[[0,"2281.5","2283.9","2280.01","2283.2","512.4471",59999,"0",1,"0","0","0"],[60000,"2283.21","2284","2282.1","2282.55","301",119999,"0",1,"0","0","0"]]"#;

/// Serve one canned response, returning the base URL and a handle yielding the
/// request line that was received.
fn serve_once(status: &str, headers: &[&str], body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let mut response = format!("HTTP/1.1 {status}\r\n");
    for header in headers {
        response.push_str(header);
        response.push_str("\r\n");
    }
    response.push_str(&format!(
        "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        while !received.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        let text = String::from_utf8_lossy(&received).into_owned();
        text.lines().next().unwrap_or_default().to_string()
    });

    (base_url, handle)
}

fn provider(base_url: &str) -> BinanceProvider {
    BinanceProvider::new(RateLimiter::new(Duration::ZERO))
        .unwrap()
        .with_base_url(base_url)
}

fn request() -> FetchRequest {
    FetchRequest::new("ETH/USDT", Timeframe::OneMinute, 0, 2 * MINUTE, 1000)
}

#[test]
fn success_response_becomes_a_dataset() {
    let (base_url, server) = serve_once("200 OK", &[], TWO_KLINES);
    let ds = provider(&base_url).fetch(&request()).unwrap();

    assert_eq!(ds.len(), 2);
    assert_eq!(ds.symbol(), "ETH/USDT");
    assert_eq!(ds.bars()[0].open, 2281.5);
    assert_eq!(ds.bars()[1].timestamp, MINUTE);

    let request_line = server.join().unwrap();
    assert!(request_line.starts_with("GET /api/v3/klines?"));
    assert!(request_line.contains("symbol=ETHUSDT"));
    assert!(request_line.contains("interval=1m"));
    assert!(request_line.contains("startTime=0&endTime=119999"));
    assert!(request_line.contains("limit=1000"));
}

#[test]
fn too_many_requests_reads_retry_after() {
    let (base_url, server) = serve_once("429 Too Many Requests", &["Retry-After: 7"], "{}");
    let err = provider(&base_url).fetch(&request()).unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, DataError::RateLimited { retry_after_secs: 7 }));
}

#[test]
fn unknown_symbol_error_body() {
    let (base_url, server) = serve_once(
        "400 Bad Request",
        &[],
        r#"{"code":-1121,"msg":"Invalid symbol."}"#,
    );
    let err = provider(&base_url).fetch(&request()).unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "ETH/USDT"));
}

#[test]
fn refused_connection_is_a_network_error() {
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    // listener dropped, nothing accepts on this port now
    let err = provider(&format!("http://{addr}"))
        .fetch(&request())
        .unwrap_err();

    assert!(matches!(err, DataError::Network(_)), "got {err}");
}
