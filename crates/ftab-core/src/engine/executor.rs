use crate::config::BenchConfig;
use crate::error::FtabError;
use crate::http::{HttpClient, PreparedRequest};
use crate::httpfile::{Case, Exchange, HttpFile};
use crate::resolve::{substitute, Resolver, ResolverChain};

/// Runs every case of a file in order against one shared client.
#[derive(Clone)]
pub struct Executor {
    client: HttpClient,
    expected_status: u16,
}

impl Executor {
    pub fn new(client: HttpClient, expected_status: u16) -> Self {
        Self {
            client,
            expected_status,
        }
    }

    pub fn from_config(config: &BenchConfig) -> Result<Self, FtabError> {
        Ok(Self::new(HttpClient::from_config(config)?, config.expected_status))
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }

    /// Execute `file` once.
    ///
    /// Placeholders are resolved through `extra` first, then through the file
    /// itself, so later cases see what earlier ones sent and received. The
    /// first transport failure or unexpected status stops the run; cases after
    /// it keep no run data. Run data from an earlier execution is dropped
    /// before the first request. Cases without a request line (an empty
    /// separator block, for example) are skipped.
    pub async fn execute(&self, file: &mut HttpFile, extra: &[&dyn Resolver]) -> Result<(), FtabError> {
        file.release();

        for index in 0..file.len() {
            if file.cases()[index].method.is_empty() {
                tracing::debug!(case = index, "case has no request line, skipped");
                continue;
            }
            let request = {
                let mut chain = ResolverChain::new(extra.to_vec());
                chain.push(&*file);
                prepare(&file.cases()[index], &chain)
            };

            let response = self.client.send(&request).await?;
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = response.status,
                elapsed_ms = response.elapsed.as_millis() as u64,
                "case executed"
            );

            let status = response.status;
            let failure = (status != self.expected_status).then(|| FtabError::UnexpectedStatus {
                method: request.method.clone(),
                url: request.url.clone(),
                status,
                expected: self.expected_status,
            });

            file.record(index, Exchange::new(request, response));

            if let Some(err) = failure {
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Substitute every templated part of `case`.
pub fn prepare(case: &Case, resolver: &dyn Resolver) -> PreparedRequest {
    PreparedRequest {
        method: substitute(&case.method, resolver),
        url: substitute(&case.url, resolver),
        headers: case
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), substitute(value, resolver)))
            .collect(),
        body: substitute(&case.body, resolver),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::httpfile::parse_str;
    use crate::resolve::MapResolver;

    fn executor() -> Executor {
        Executor::from_config(&BenchConfig::default()).expect("executor should build")
    }

    #[test]
    fn prepare_substitutes_every_part() {
        let mut case = Case::new("{{m}}", "{{base}}/items");
        case.headers.push(("X-Token".to_string(), "{{token}}".to_string()));
        case.body = r#"{"id":"{{id}}"}"#.to_string();
        let vars: MapResolver = [("m", "POST"), ("base", "http://h"), ("token", "t"), ("id", "7")]
            .into_iter()
            .collect();

        let req = prepare(&case, &vars);
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://h/items");
        assert_eq!(req.header("x-token"), Some("t"));
        assert_eq!(req.body, r#"{"id":"7"}"#);
    }

    #[tokio::test]
    async fn chains_response_values_into_later_cases() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/login").json_body(json!({"user": "alice"}));
                then.status(200)
                    .header("x-session", "s-1")
                    .json_body(json!({"token": "abc", "a": "b"}));
            })
            .await;
        let me = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/me")
                    .header("authorization", "Bearer abc")
                    .header("x-session", "s-1");
                then.status(200).body("ok");
            })
            .await;

        let text = format!(
            "@server = {}
@user = alice

# @name = case1
POST {{{{server}}}}/login
Content-Type: application/json

{{\"user\":\"{{{{user}}}}\"}}
###
GET {{{{server}}}}/me
Authorization: Bearer {{{{case1.response.body.$.token}}}}
X-Session: {{{{case1.response.header.x-session}}}}
",
            server.base_url()
        );
        let mut file = parse_str(&text);
        executor().execute(&mut file, &[]).await.expect("run should succeed");

        login.assert_async().await;
        me.assert_async().await;
        assert_eq!(file.lookup("case1.request.body.$.user").as_deref(), Some("alice"));
        assert_eq!(file.lookup("case1.response.body.$.a").as_deref(), Some("b"));
        assert!(file.cases().iter().all(|c| c.status() == Some(200)));
    }

    #[tokio::test]
    async fn extra_resolvers_take_priority() {
        let server = MockServer::start_async().await;
        let hit = server
            .mock_async(|when, then| {
                when.method(GET).path("/override");
                then.status(200);
            })
            .await;

        let mut file = parse_str("@path = original\nGET {{server}}/{{path}}\n");
        let extra: MapResolver = [("server", server.base_url()), ("path", "override".to_string())]
            .into_iter()
            .collect();
        executor()
            .execute(&mut file, &[&extra])
            .await
            .expect("run should succeed");
        hit.assert_async().await;
    }

    #[tokio::test]
    async fn unexpected_status_stops_the_run() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/first");
                then.status(200);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken");
                then.status(500);
            })
            .await;
        let never = server
            .mock_async(|when, then| {
                when.method(GET).path("/third");
                then.status(200);
            })
            .await;

        let base = server.base_url();
        let mut file = parse_str(&format!(
            "GET {base}/first\n###\nGET {base}/broken\n###\nGET {base}/third\n"
        ));
        let err = executor().execute(&mut file, &[]).await.unwrap_err();

        match err {
            FtabError::UnexpectedStatus { status, expected, url, .. } => {
                assert_eq!(status, 500);
                assert_eq!(expected, 200);
                assert!(url.ends_with("/broken"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(file.cases()[0].status(), Some(200));
        assert_eq!(file.cases()[1].status(), Some(500));
        assert!(file.cases()[2].status().is_none());
        assert!(file.cases()[2].response_body().is_none());
        assert_eq!(never.hits_async().await, 0);
    }

    #[tokio::test]
    async fn transport_failure_leaves_later_cases_unset() {
        let mut file = parse_str("GET http://127.0.0.1:1/a\n###\nGET http://127.0.0.1:1/b\n");
        let err = executor().execute(&mut file, &[]).await.unwrap_err();
        assert!(matches!(err, FtabError::Request { .. }));
        assert!(file.cases().iter().all(|c| !c.is_executed()));
    }

    #[tokio::test]
    async fn custom_expected_status_is_honoured() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/create");
                then.status(201);
            })
            .await;

        let client = HttpClient::builder().build().expect("client should build");
        let mut file = parse_str(&format!("POST {}/create\n", server.base_url()));
        Executor::new(client, 201)
            .execute(&mut file, &[])
            .await
            .expect("201 is expected");
    }

    #[tokio::test]
    async fn same_case_reference_stays_literal() {
        let server = MockServer::start_async().await;
        let hit = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/self")
                    .header("x-v", "{{me.response.body.$.x}}");
                then.status(200).json_body(json!({"x": 1}));
            })
            .await;

        let mut file = parse_str(&format!(
            "# @name = me\nGET {}/self\nX-V: {{{{me.response.body.$.x}}}}\n",
            server.base_url()
        ));
        executor().execute(&mut file, &[]).await.expect("run should succeed");
        hit.assert_async().await;
    }

    #[tokio::test]
    async fn cases_without_request_line_are_skipped() {
        let server = MockServer::start_async().await;
        let hit = server
            .mock_async(|when, then| {
                when.method(GET).path("/only");
                then.status(200);
            })
            .await;

        let mut file = parse_str(&format!("###
GET {}/only
###
", server.base_url()));
        assert_eq!(file.len(), 3);
        executor().execute(&mut file, &[]).await.expect("run should succeed");

        hit.assert_async().await;
        assert!(!file.cases()[0].is_executed());
        assert!(file.cases()[1].is_executed());
        assert!(!file.cases()[2].is_executed());
    }

    /// `{"a":"b"}` gzip-compressed.
    const GZIP_BODY: &[u8] = &[
        0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xab, 0x56, 0x4a, 0x54, 0xb2,
        0x52, 0x4a, 0x52, 0xaa, 0x05, 0x00, 0x9c, 0x5c, 0xf6, 0x6b, 0x09, 0x00, 0x00, 0x00,
    ];

    /// `{"a":"b"}` zlib-compressed, as sent with `Content-Encoding: deflate`.
    const DEFLATE_BODY: &[u8] = &[
        0x78, 0x9c, 0xab, 0x56, 0x4a, 0x54, 0xb2, 0x52, 0x4a, 0x52, 0xaa, 0x05, 0x00, 0x0c, 0x70,
        0x02, 0x7e,
    ];

    #[tokio::test]
    async fn encoded_response_bodies_are_decoded_before_lookup() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gzip");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .header("Content-Encoding", "gzip")
                    .body(GZIP_BODY);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/deflate");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .header("Content-Encoding", "deflate")
                    .body(DEFLATE_BODY);
            })
            .await;

        let base = server.base_url();
        let mut file = parse_str(&format!(
            "# @name = g\nGET {base}/gzip\n###\n# @name = d\nGET {base}/deflate\n"
        ));
        executor().execute(&mut file, &[]).await.expect("run should succeed");

        assert_eq!(file.cases()[0].response_body(), Some(&b"{\"a\":\"b\"}"[..]));
        assert_eq!(file.lookup("g.response.body.$.a").as_deref(), Some("b"));
        assert_eq!(file.lookup("d.response.body.$.a").as_deref(), Some("b"));
    }
}
