use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use switchyard::{Router, TransportError};

fn start(router: Router) -> (Arc<Router>, thread::JoinHandle<()>, SocketAddr) {
    let router = Arc::new(router);
    let serving = Arc::clone(&router);
    let handle = thread::spawn(move || {
        serving.run("127.0.0.1:0").unwrap();
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    let addr = loop {
        if let Some(addr) = router.local_addr() {
            break addr;
        }
        assert!(Instant::now() < deadline, "transport did not come up");
        thread::sleep(Duration::from_millis(5));
    };
    (router, handle, addr)
}

fn roundtrip(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn serves_routed_requests_over_tcp() {
    let mut r = Router::new();
    r.get("/hello/:name", |c| {
        let name = c.param("name").unwrap_or("").to_string();
        let _ = c.string(200, format_args!("hello {name}"));
    })
    .unwrap();
    r.get("/files/*rest", |c| {
        let rest = c.param("rest").unwrap_or("").to_string();
        let _ = c.string(200, format_args!("{rest}"));
    })
    .unwrap();
    let (router, handle, addr) = start(r);

    let response = roundtrip(addr, "GET /hello/world HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("hello world"), "{response}");
    assert!(response.contains("Content-Length: 11"), "{response}");

    // the transport percent-decodes before matching
    let response = roundtrip(addr, "GET /files/a%20b.txt HTTP/1.1\r\nHost: x\r\n\r\n");
    assert!(response.ends_with("/a b.txt"), "{response}");

    let response = roundtrip(addr, "GET /nope HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");

    router.shutdown();
    handle.join().unwrap();
}

#[test]
fn post_bodies_reach_handlers() {
    let mut r = Router::new();
    r.post("/echo", |c| {
        let body = c.body().unwrap_or_default();
        let _ = c.data(200, "application/octet-stream", &body);
    })
    .unwrap();
    let (router, handle, addr) = start(r);

    let response = roundtrip(
        addr,
        "POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello",
    );
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("hello"), "{response}");

    router.shutdown();
    handle.join().unwrap();
}

#[test]
fn malformed_requests_are_rejected() {
    let (router, handle, addr) = start(Router::new());

    let response = roundtrip(addr, "NONSENSE\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 400"), "{response}");

    let response = roundtrip(addr, "BREW /tea HTTP/1.1\r\nHost: x\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 501"), "{response}");

    router.shutdown();
    handle.join().unwrap();
}

#[test]
fn h2c_entry_point_reports_unsupported() {
    let router = Arc::new(Router::new());
    assert!(matches!(
        router.run_h2c("127.0.0.1:0"),
        Err(TransportError::H2cUnsupported)
    ));
}
