#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

/// One request as the fake service saw it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or(&self.target)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone, Debug)]
struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

struct Route {
    method: String,
    target: String,
    replies: VecDeque<Reply>,
    /// The only queued reply has been served and now repeats.
    repeating: bool,
}

#[derive(Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<RecordedRequest>,
}

/// Loopback HTTP server with scripted replies per route.
///
/// Replies queued on a route are used in order; the last one repeats until a
/// new reply is queued after it.
/// A route registered with a query string only matches that exact target and
/// wins over one registered with the bare path.
#[derive(Clone)]
pub struct FakeApi {
    base_url: String,
    state: Arc<Mutex<State>>,
}

impl FakeApi {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(State::default()));
        let shared = state.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let state = shared.clone();
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self { base_url, state }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route(&self, method: &str, target: &str, status: u16, body: &str) -> &Self {
        self.route_delayed(method, target, status, body, Duration::ZERO)
    }

    pub fn route_delayed(
        &self,
        method: &str,
        target: &str,
        status: u16,
        body: &str,
        delay: Duration,
    ) -> &Self {
        let reply = Reply {
            status,
            body: body.to_string(),
            delay,
        };
        let mut state = self.lock();
        let existing = state
            .routes
            .iter()
            .position(|route| route.method == method && route.target == target);
        match existing {
            Some(index) => {
                let route = &mut state.routes[index];
                if route.repeating {
                    route.replies.clear();
                    route.repeating = false;
                }
                route.replies.push_back(reply);
            }
            None => state.routes.push(Route {
                method: method.to_string(),
                target: target.to_string(),
                replies: VecDeque::from([reply]),
                repeating: false,
            }),
        }
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path() == path)
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let Some(request) = read_request(&stream) else {
        return;
    };
    let reply = {
        let mut state = state.lock().unwrap_or_else(|err| err.into_inner());
        state.requests.push(request.clone());
        next_reply(&mut state.routes, &request)
    };
    if !reply.delay.is_zero() {
        thread::sleep(reply.delay);
    }
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reason(reply.status),
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    let content_length = headers
        .get("content-length")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0usize);
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn next_reply(routes: &mut [Route], request: &RecordedRequest) -> Reply {
    let index = routes
        .iter()
        .position(|route| route.method == request.method && route.target == request.target)
        .or_else(|| {
            routes
                .iter()
                .position(|route| route.method == request.method && route.target == request.path())
        });
    let Some(index) = index else {
        return Reply {
            status: 404,
            body: r#"{"message":"No route"}"#.to_string(),
            delay: Duration::ZERO,
        };
    };
    let route = &mut routes[index];
    if route.replies.len() > 1 {
        route.replies.pop_front().unwrap()
    } else {
        route.repeating = true;
        route.replies[0].clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
