//! Line-oriented parser for `.http` request files.
//!
//! ```text
//! @server = http://localhost:8080
//!
//! # @name = login
//! POST {{server}}/login
//! Content-Type: application/json
//!
//! {"user": "{{user}}"}
//! ###
//! GET {{server}}/me
//! Authorization: Bearer {{login.response.body.$.token}}
//! ```
//!
//! Unrecognised lines are dropped; only reading the source can fail.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::FtabError;
use crate::httpfile::model::{Case, HttpFile};

struct Grammar {
    new_case: Regex,
    name: Regex,
    request_line: Regex,
    variable: Regex,
    header: Regex,
    comment: Regex,
}

fn grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("request file grammar is valid");
        Grammar {
            new_case: re(r"^\s*###\s*$"),
            name: re(r"^\s*#\s*@name\s*=\s*(\w+)\s*$"),
            request_line: re(r"^\s*(GET|POST)\s+(.+?)\s*$"),
            variable: re(r"^\s*@([[:graph:]]+?)\s*=\s*(.+?)\s*$"),
            header: re(r"^\s*([[:graph:]]+?)\s*:\s*(.+?)\s*$"),
            comment: re(r"^\s*(#|//)"),
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    File,
    Header,
    Body,
}

#[derive(Default)]
struct CaseBuilder {
    case: Case,
    has_request_line: bool,
    body_lines: Vec<String>,
}

impl CaseBuilder {
    fn finish(mut self) -> Case {
        self.case.body = self.body_lines.join("\n");
        self.case
    }
}

struct Parser {
    variables: HashMap<String, String>,
    cases: Vec<Case>,
    current: CaseBuilder,
    stage: Stage,
}

impl Parser {
    fn new() -> Self {
        Self {
            variables: HashMap::new(),
            cases: Vec::new(),
            current: CaseBuilder::default(),
            stage: Stage::File,
        }
    }

    fn feed(&mut self, line: &str) {
        let g = grammar();

        if g.new_case.is_match(line) {
            self.end_case();
            return;
        }

        if self.stage == Stage::Body {
            self.current.body_lines.push(line.to_string());
            return;
        }

        if self.stage == Stage::File {
            if let Some(caps) = g.variable.captures(line) {
                self.variables.insert(caps[1].to_string(), caps[2].to_string());
                return;
            }
        }

        if let Some(caps) = g.name.captures(line) {
            self.current.case.name = Some(caps[1].to_string());
            return;
        }

        if g.comment.is_match(line) {
            return;
        }

        if let Some(caps) = g.request_line.captures(line) {
            if !self.current.has_request_line {
                self.current.case.method = caps[1].to_string();
                self.current.case.url = caps[2].to_string();
                self.current.has_request_line = true;
            }
            return;
        }

        if let Some(caps) = g.header.captures(line) {
            self.current
                .case
                .headers
                .push((caps[1].to_string(), caps[2].to_string()));
            self.stage = Stage::Header;
            return;
        }

        if self.stage == Stage::Header && line.trim().is_empty() {
            self.stage = Stage::Body;
        }
    }

    fn end_case(&mut self) {
        let builder = std::mem::take(&mut self.current);
        self.cases.push(builder.finish());
        self.stage = Stage::File;
    }

    fn finish(mut self) -> HttpFile {
        self.end_case();
        HttpFile::new(self.variables, self.cases)
    }
}

/// Parse request-file text.
pub fn parse_str(text: &str) -> HttpFile {
    let mut parser = Parser::new();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Parse request-file text from any buffered reader.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<HttpFile, FtabError> {
    let mut parser = Parser::new();
    for line in reader.lines() {
        parser.feed(&line?);
    }
    Ok(parser.finish())
}

/// Parse the request file at `path`. Failing to read it names the file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<HttpFile, FtabError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| FtabError::Open {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_str(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::resolve::substitute;

    const TWO_CASES: &str = "@server = http://x
POST {{server}}
Content-Type: application/json

{\"a\":\"b\"}
###
# @name=hello
GET {{server}}
";

    #[test]
    fn parses_two_cases() {
        let file = parse_str(TWO_CASES);
        assert_eq!(file.len(), 2);
        assert_eq!(
            file.variables,
            HashMap::from([("server".to_string(), "http://x".to_string())])
        );

        let post = &file.cases()[0];
        assert_eq!(post.name, None);
        assert_eq!(post.method, "POST");
        assert_eq!(post.url, "{{server}}");
        assert_eq!(
            post.headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
        assert_eq!(post.body, "{\"a\":\"b\"}");

        let get = &file.cases()[1];
        assert_eq!(get.name.as_deref(), Some("hello"));
        assert_eq!(get.method, "GET");
        assert_eq!(get.url, "{{server}}");
        assert!(get.headers.is_empty());
        assert!(get.body.is_empty());
    }

    #[test]
    fn substitution_against_parsed_file() {
        let file = parse_str(TWO_CASES);
        assert_eq!(substitute("{{server}}", &file), "http://x");
        assert_eq!(substitute("{{doesnotexist}}", &file), "{{doesnotexist}}");
    }

    #[test]
    fn later_variables_overwrite() {
        let file = parse_str("@a = 1\n@a = 2\nGET http://x/{{a}}\n");
        assert_eq!(file.variables["a"], "2");
    }

    #[test]
    fn name_tag_accepts_spacing_variants() {
        for tag in ["# @name = login", "# @name=login", "  #   @name   =login  "] {
            let file = parse_str(&format!("{tag}\nGET http://x\n"));
            assert_eq!(file.cases()[0].name.as_deref(), Some("login"), "{tag}");
        }
    }

    #[test]
    fn comments_are_dropped() {
        let file = parse_str("# just a note\n// another\nGET http://x\nAccept: */*\n");
        assert_eq!(file.len(), 1);
        assert_eq!(file.cases()[0].headers.len(), 1);
    }

    #[test]
    fn only_first_request_line_counts() {
        let file = parse_str("GET http://first\nPOST http://second\n");
        assert_eq!(file.cases()[0].method, "GET");
        assert_eq!(file.cases()[0].url, "http://first");
    }

    #[test]
    fn body_keeps_blank_lines_and_directive_lookalikes() {
        let text = "POST http://x
Content-Type: text/plain

line one

# not a comment here
@not = a variable
GET not a request line

###
";
        let file = parse_str(text);
        assert_eq!(
            file.cases()[0].body,
            "line one\n\n# not a comment here\n@not = a variable\nGET not a request line\n"
        );
        assert!(!file.variables.contains_key("not"));
    }

    #[test]
    fn trailing_blank_body_lines_are_kept() {
        let file = parse_str("POST http://x\nA: 1\n\nbody\n\n\n");
        assert_eq!(file.cases()[0].body, "body\n\n");
    }

    #[test]
    fn blank_line_without_headers_does_not_start_the_body() {
        let file = parse_str("GET http://a\n\nAccept: y\n");
        assert_eq!(
            file.cases()[0].headers,
            vec![("Accept".to_string(), "y".to_string())]
        );
        assert!(file.cases()[0].body.is_empty());
    }

    #[test]
    fn headers_keep_file_order() {
        let file = parse_str("GET http://x\nB: 2\nA: 1\nB: 3\n");
        let names: Vec<&str> = file.cases()[0]
            .headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(names, ["B", "A", "B"]);
    }

    #[test]
    fn every_separator_appends_a_case() {
        let file = parse_str("GET http://a\n###\n");
        assert_eq!(file.len(), 2);
        assert_eq!(file.cases()[0].url, "http://a");
        assert!(file.cases()[1].method.is_empty());

        let file = parse_str("###\nGET http://x\n###\n\n###\n");
        assert_eq!(file.len(), 4);
        assert_eq!(file.cases()[1].url, "http://x");
    }

    #[test]
    fn empty_input_is_one_empty_case() {
        let file = parse_str("");
        assert_eq!(file.len(), 1);
        assert!(file.cases()[0].url.is_empty());
    }

    #[test]
    fn final_case_without_separator_is_kept() {
        let file = parse_str("GET http://a\n###\nGET http://b");
        assert_eq!(file.len(), 2);
        assert_eq!(file.cases()[1].url, "http://b");
    }

    #[test]
    fn separator_resets_stage() {
        let file = parse_str("POST http://a\nX: 1\n\nbody\n###\n@v = 1\nGET http://b\nY: 2\n");
        assert_eq!(file.variables["v"], "1");
        assert_eq!(file.cases()[1].headers, vec![("Y".to_string(), "2".to_string())]);
        assert!(file.cases()[1].body.is_empty());
    }

    #[test]
    fn reader_and_str_agree() {
        let from_reader = parse_reader(Cursor::new(TWO_CASES)).expect("reader parse");
        let from_str = parse_str(TWO_CASES);
        assert_eq!(from_reader.len(), from_str.len());
        assert_eq!(from_reader.variables, from_str.variables);
        assert_eq!(from_reader.cases()[0].body, from_str.cases()[0].body);
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("test.http");
        std::fs::write(&path, TWO_CASES).expect("write should succeed");
        let file = parse_file(&path).expect("file parses");
        assert_eq!(file.len(), 2);
    }

    #[test]
    fn parse_file_error_names_the_file() {
        let err = parse_file("/nonexistent/ftab/test.http").unwrap_err();
        assert!(matches!(err, FtabError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/ftab/test.http"));
    }
}
