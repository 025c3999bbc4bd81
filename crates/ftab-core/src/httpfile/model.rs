use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use serde_json::Value;

use crate::http::{PreparedRequest, ResponseData};
use crate::mock::MockRegistry;
use crate::resolve::{functions, jsonpath, substitute, Resolver};

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// What a case actually sent and received during one run.
///
/// Bodies are parsed as JSON on first lookup and the result (including a
/// failed parse) is kept for the lifetime of the exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    request: PreparedRequest,
    response: ResponseData,
    parsed_request: OnceLock<Option<Value>>,
    parsed_response: OnceLock<Option<Value>>,
}

impl Exchange {
    pub fn new(request: PreparedRequest, response: ResponseData) -> Self {
        Self {
            request,
            response,
            parsed_request: OnceLock::new(),
            parsed_response: OnceLock::new(),
        }
    }

    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    pub fn response(&self) -> &ResponseData {
        &self.response
    }

    pub fn request_json(&self) -> Option<&Value> {
        self.parsed_request
            .get_or_init(|| parse_body(self.request.body.as_bytes(), "request"))
            .as_ref()
    }

    pub fn response_json(&self) -> Option<&Value> {
        self.parsed_response
            .get_or_init(|| parse_body(&self.response.body, "response"))
            .as_ref()
    }
}

fn parse_body(bytes: &[u8], side: &str) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(side, error = %e, "body is not valid JSON");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Case
// ---------------------------------------------------------------------------

/// One templated request of an [`HttpFile`].
///
/// `method`, `url`, header values and `body` may contain `{{...}}`
/// placeholders. Response-derived accessors return `None` until the case
/// has run in the current execution.
#[derive(Debug, Clone, Default)]
pub struct Case {
    pub name: Option<String>,
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    exchange: Option<Exchange>,
}

impl Case {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn exchange(&self) -> Option<&Exchange> {
        self.exchange.as_ref()
    }

    pub fn is_executed(&self) -> bool {
        self.exchange.is_some()
    }

    pub fn status(&self) -> Option<u16> {
        self.exchange.as_ref().map(|e| e.response.status)
    }

    pub fn response_body(&self) -> Option<&[u8]> {
        self.exchange.as_ref().map(|e| e.response.body.as_slice())
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.exchange.as_ref().map(|e| e.response.elapsed)
    }

    pub fn request_size(&self) -> Option<u64> {
        self.exchange.as_ref().map(|e| e.request.wire_size())
    }

    pub fn response_size(&self) -> Option<u64> {
        self.exchange.as_ref().map(|e| e.response.size_bytes)
    }

    pub(crate) fn record(&mut self, exchange: Exchange) {
        self.exchange = Some(exchange);
    }

    pub(crate) fn release(&mut self) {
        self.exchange = None;
    }

    /// Same template, no run data.
    fn template(&self) -> Case {
        Case {
            name: self.name.clone(),
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            exchange: None,
        }
    }
}

// ---------------------------------------------------------------------------
// HttpFile
// ---------------------------------------------------------------------------

/// A parsed request file: file-level variables and the cases in file order.
#[derive(Debug, Clone, Default)]
pub struct HttpFile {
    pub variables: HashMap<String, String>,
    cases: Vec<Case>,
    auto_release: bool,
}

impl HttpFile {
    pub fn new(variables: HashMap<String, String>, cases: Vec<Case>) -> Self {
        Self {
            variables,
            cases,
            auto_release: false,
        }
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// Mutable access to one case. The order of cases cannot change.
    pub fn case_mut(&mut self, index: usize) -> Option<&mut Case> {
        self.cases.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Whether a benchmark worker should [`release`](Self::release) this
    /// file once its iteration has been measured.
    pub fn auto_release(&self) -> bool {
        self.auto_release
    }

    pub fn set_auto_release(&mut self, auto_release: bool) {
        self.auto_release = auto_release;
    }

    /// The first case called `name`.
    pub fn find_case(&self, name: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.name.as_deref() == Some(name))
    }

    /// Independent copy ready for one isolated run.
    ///
    /// With `mocks`, every variable goes through [`MockRegistry::value`].
    /// With `expand`, method, URL and body are substituted against the copy's
    /// own variables; anything else (built-ins, chained values) is left for
    /// the executor. Duplicates never carry run data and are auto-released.
    pub fn duplicate(&self, mocks: Option<&MockRegistry>, expand: bool) -> HttpFile {
        let variables: HashMap<String, String> = self
            .variables
            .iter()
            .map(|(key, value)| {
                let value = match mocks {
                    Some(registry) => registry.value(key, value),
                    None => value.clone(),
                };
                (key.clone(), value)
            })
            .collect();

        let cases = self
            .cases
            .iter()
            .map(|case| {
                let mut copy = case.template();
                if expand {
                    copy.method = substitute(&copy.method, &variables);
                    copy.url = substitute(&copy.url, &variables);
                    copy.body = substitute(&copy.body, &variables);
                }
                copy
            })
            .collect();

        HttpFile {
            variables,
            cases,
            auto_release: true,
        }
    }

    /// Drop every case's recorded exchange. Safe to call repeatedly.
    pub fn release(&mut self) {
        for case in &mut self.cases {
            case.release();
        }
    }

    pub(crate) fn record(&mut self, index: usize, exchange: Exchange) {
        if let Some(case) = self.cases.get_mut(index) {
            case.record(exchange);
        }
    }

    /// `<case>.<request|response>.header.<name>`
    fn header_lookup(&self, key: &str) -> Option<String> {
        let (prefix, name) = key.split_once(".header.")?;
        let (case_name, side) = prefix.rsplit_once('.')?;
        let exchange = self.find_case(case_name)?.exchange()?;
        let value = match side {
            "request" => exchange.request.header(name),
            "response" => exchange.response.header(name),
            _ => None,
        }?;
        Some(value.to_string())
    }

    /// `<case>.<request|response>.body.<jsonpath>`
    fn body_lookup(&self, key: &str) -> Option<String> {
        let (prefix, path) = key.split_once(".body.")?;
        let (case_name, side) = prefix.rsplit_once('.')?;
        let exchange = self.find_case(case_name)?.exchange()?;
        let doc = match side {
            "request" => exchange.request_json(),
            "response" => exchange.response_json(),
            _ => return None,
        };
        Some(match doc {
            Some(doc) => jsonpath::evaluate(doc, path),
            None => String::new(),
        })
    }
}

impl Resolver for HttpFile {
    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.variables.get(key) {
            return Some(value.clone());
        }
        if key.starts_with('$') {
            return functions::evaluate(key);
        }
        if key.contains(".header.") {
            return self.header_lookup(key);
        }
        if key.contains(".body.") {
            return self.body_lookup(key);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
