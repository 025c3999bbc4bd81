use std::fmt::Write as _;

use crate::engine::executor::Executor;
use crate::httpfile::HttpFile;
use crate::mock::MockRegistry;

/// Run a mocked, expanded duplicate of `file` once and render what went over
/// the wire for every case. If the run fails, the error message is returned
/// instead.
pub async fn trace(file: &HttpFile, executor: &Executor, mocks: &MockRegistry) -> String {
    let mut run = file.duplicate(Some(mocks), true);
    match executor.execute(&mut run, &[]).await {
        Ok(()) => render_trace(&run),
        Err(e) => e.to_string(),
    }
}

/// Request head, request body, response head and response body of every
/// executed case, HTTP/1.1 style.
pub fn render_trace(file: &HttpFile) -> String {
    let mut out = String::new();
    for exchange in file.cases().iter().filter_map(|c| c.exchange()) {
        let req = exchange.request();
        let resp = exchange.response();

        let _ = write!(out, "{} {} HTTP/1.1\r\n", req.method, req.url);
        for (name, value) in &req.headers {
            let _ = write!(out, "{name}: {value}\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&req.body);
        out.push_str("\r\n\r\n");

        let _ = write!(out, "HTTP/1.1 {}\r\n", resp.status);
        for (name, value) in &resp.headers {
            let _ = write!(out, "{name}: {value}\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&resp.body_text());
        out.push_str("\r\n");
    }
    out
}
