use std::error::Error as _;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use energy_guessr::dataset::{HttpTableSource, TableSource};
use energy_guessr::error::DatasetError;
use energy_guessr::http_cache::BodyCache;

const TIMEOUT: Duration = Duration::from_secs(10);
const BODY: &str = "Entity,Code,Year\nFrance,FRA,2023\n";

/// Serve one response per connection, built from the request head by
/// `respond`. The handle returns the lowercased request heads.
fn serve<F>(connections: usize, respond: F) -> (String, JoinHandle<Vec<String>>)
where
    F: Fn(usize, &str) -> String + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let addr = listener.local_addr().expect("local addr");
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for n in 0..connections {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            loop {
                let mut line = String::new();
                let read = reader.read_line(&mut line).expect("read request");
                if read == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line.to_ascii_lowercase());
            }
            let response = respond(n, &head);
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).expect("write response");
            stream.flush().expect("flush");
            seen.push(head);
        }
        seen
    });
    (format!("http://{addr}/table.csv"), handle)
}

fn ok_with_etag(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nETag: \"v1\"\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn source(cache: Option<BodyCache>) -> HttpTableSource {
    HttpTableSource::with_cache(TIMEOUT, cache).expect("client builds")
}

#[test]
fn error_status_is_a_network_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (url, server) = serve(1, |_, _| {
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string()
    });

    let err = source(Some(BodyCache::new(dir.path())))
        .fetch_table(&url)
        .expect_err("503 fails");
    match &err {
        DatasetError::Network { status, url: failed } => {
            assert_eq!(*status, 503);
            assert_eq!(failed, &url);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_retryable());
    server.join().expect("server thread");

    let cached = fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0);
    assert_eq!(cached, 0);
}

#[test]
fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let err = source(None)
        .fetch_table(&format!("http://{addr}/table.csv"))
        .expect_err("nothing listens");
    assert!(matches!(err, DatasetError::Transport { .. }));
    assert!(err.source().is_some());
    assert!(err.is_retryable());
}

#[test]
fn not_modified_serves_the_stored_body() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (url, server) = serve(2, |n, head| {
        if n == 1 && head.contains("if-none-match: \"v1\"") {
            "HTTP/1.1 304 Not Modified\r\nETag: \"v1\"\r\nConnection: close\r\n\r\n".to_string()
        } else {
            ok_with_etag(BODY)
        }
    });
    let source = source(Some(BodyCache::new(dir.path())));

    let first = source.fetch_table(&url).expect("first fetch");
    assert_eq!(first, BODY);
    let files: Vec<_> = fs::read_dir(dir.path())
        .expect("cache dir written")
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();
    assert_eq!(files.len(), 2);
    let stamps: Vec<_> = files
        .iter()
        .map(|p| fs::metadata(p).and_then(|m| m.modified()).expect("mtime"))
        .collect();

    let second = source.fetch_table(&url).expect("revalidated fetch");
    assert_eq!(second, BODY);

    let heads = server.join().expect("server thread");
    assert!(!heads[0].contains("if-none-match"));
    assert!(heads[1].contains("if-none-match: \"v1\""));
    let after: Vec<_> = files
        .iter()
        .map(|p| fs::metadata(p).and_then(|m| m.modified()).expect("mtime"))
        .collect();
    assert_eq!(stamps, after);
}

#[test]
fn not_modified_without_a_stored_body_fails() {
    let (url, server) = serve(1, |_, _| {
        "HTTP/1.1 304 Not Modified\r\nConnection: close\r\n\r\n".to_string()
    });
    let err = source(None).fetch_table(&url).expect_err("nothing to serve");
    assert!(matches!(err, DatasetError::Other(_)));
    assert!(!err.is_retryable());
    server.join().expect("server thread");
}
