//! End-to-end tests for `RemoteSource` against a canned local HTTP server.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use bcp_common::{Category, Prediction, Timeframe};
use bcp_sources::{DataSource, PerformerScope, RemoteSource};

/// Serve exactly one HTTP response on an ephemeral port.
fn serve_once(body: &str) -> String {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

#[test]
fn ticket_chart_over_http() {
    let base = serve_once(
        r#"{"comments":[
            {"id":1,"body":"need help now"},
            {"id":2,"body":"install fails"},
            {"id":3,"body":"nothing relevant"}
        ]}"#,
    );
    let source = RemoteSource::new(&base, 1_048_576);
    let points = source.chart_data(Category::Ticket, Timeframe::Weekly);
    let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Technical", "Installation", "General"]);
    for point in &points {
        assert!((10.0..=59.0).contains(&point.value));
    }
}

#[test]
fn sales_chart_scales_by_timeframe() {
    let base = serve_once(
        r#"{"products":[
            {"id":1,"price":10.0,"stock":5},
            {"id":2,"price":2.0,"stock":3}
        ]}"#,
    );
    let source = RemoteSource::new(&base, 1_048_576);
    let points = source.chart_data(Category::Sales, Timeframe::Quarterly);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].name, "Q1");
    assert!((points[0].value - 10.0 * 5.0 * 12.0).abs() < 1e-9);
}

#[test]
fn history_over_http_is_labeled_and_reversed() {
    let base = serve_once(
        r#"{"todos":[
            {"id":1,"completed":true},
            {"id":2,"completed":false},
            {"id":3,"completed":true}
        ]}"#,
    );
    let source = RemoteSource::new(&base, 1_048_576);
    let series = source.history_series(Category::Ticket);
    assert_eq!(series.len(), 3);
    assert_eq!(series[0].label, "8 min ago");
    assert_eq!(series[2].label, "10 min ago");
    // after the reversal the last entry maps to the completed first todo
    assert!(series[2].value > 0.5);
}

#[test]
fn notifications_over_http() {
    let base = serve_once(
        r#"{"users":[
            {"id":1,"firstName":"Ada","lastName":"Byron",
             "company":{"department":"Research"}},
            {"id":2,"firstName":"Alan","lastName":"Kay",
             "company":{"department":"Systems"}}
        ]}"#,
    );
    let source = RemoteSource::new(&base, 1_048_576);
    let prediction = Prediction::from_value(0.85);
    let records = source.notifications(Category::Sales, &prediction);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Sales Growth Detected");
    assert_eq!(records[0].time, "Just now");
    assert_eq!(records[1].title, "Update from Systems");
    assert_eq!(records[1].description, "Alan Kay has closed a deal.");
}

#[test]
fn performers_over_http() {
    let users: Vec<String> = (1..=6)
        .map(|i| {
            format!(
                r#"{{"id":{i},"firstName":"U{i}","lastName":"L",
                     "company":{{"department":"D{i}"}}}}"#
            )
        })
        .collect();
    let base = serve_once(&format!(r#"{{"users":[{}]}}"#, users.join(",")));
    let source = RemoteSource::new(&base, 1_048_576);
    let rows = source.top_performers(PerformerScope::Category(Category::Enquiry));
    assert_eq!(rows.len(), 3);
    assert!(rows[0].score >= rows[1].score && rows[1].score >= rows[2].score);
    assert!(rows.iter().all(|r| r.metric.ends_with('%')));
}

#[test]
fn oversized_response_degrades_to_empty() {
    let padding = "x".repeat(4096);
    let base = serve_once(&format!(r#"{{"comments":[{{"body":"{padding}"}}]}}"#));
    let source = RemoteSource::new(&base, 64);
    assert!(source.chart_data(Category::Ticket, Timeframe::Weekly).is_empty());
}

#[test]
fn malformed_body_degrades_to_empty() {
    let base = serve_once("this is not json");
    let source = RemoteSource::new(&base, 1_048_576);
    assert!(source.history_series(Category::Sales).is_empty());
}
