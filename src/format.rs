// Response rendering.
// A successful (2xx) body is decoded into a `Reply` whose variant depends on
// which fields the server filled in; an `error` field always wins. Bodies
// that are not the expected JSON are printed untouched.

use std::io::{self, Write};

use crossterm::style::Stylize;
use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::api::Record;

const CHECK_MARK: &str = "✓";
const COLUMN_GAP: usize = 2;
const INDENT: &[u8] = b"  ";

/// Everything the server may put in a response body.
#[derive(Deserialize, Debug, Default)]
struct Envelope {
    #[serde(default)]
    records: Option<Vec<Record>>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    new_ip: Option<String>,
}

/// Decoded response, discriminated by which fields are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Logical failure reported inside a 2xx body.
    Failure(String),
    /// Result of `list`, possibly empty.
    Listing(Vec<Record>),
    /// Result of add/update/delete.
    Outcome(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added { domain: String, ip: String },
    Updated { domain: String, new_ip: String },
    Deleted { domain: String },
    Exists { domain: String, ip: String },
    Other(String),
}

impl Reply {
    /// Decode a response body. `None` if it is not the expected JSON shape.
    pub fn decode(body: &[u8], is_list: bool) -> Option<Self> {
        let env: Envelope = serde_json::from_slice(body).ok()?;

        if let Some(error) = env.error.filter(|e| !e.is_empty()) {
            return Some(Reply::Failure(error));
        }
        if is_list {
            return Some(Reply::Listing(env.records.unwrap_or_default()));
        }

        let domain = env.domain.unwrap_or_default();
        let outcome = match env.status.unwrap_or_default().as_str() {
            "added" => Outcome::Added {
                domain,
                ip: env.ip.unwrap_or_default(),
            },
            "updated" => Outcome::Updated {
                domain,
                new_ip: env.new_ip.unwrap_or_default(),
            },
            "deleted" => Outcome::Deleted { domain },
            "exists" => Outcome::Exists {
                domain,
                ip: env.ip.unwrap_or_default(),
            },
            other => Outcome::Other(other.to_string()),
        };
        Some(Reply::Outcome(outcome))
    }
}

/// Renders response bodies for stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    /// Print the raw body (re-indented) instead of interpreting it.
    pub verbose: bool,
    /// Colour the success mark; only meaningful for a terminal.
    pub color: bool,
}

impl Formatter {
    pub fn new(verbose: bool, color: bool) -> Self {
        Formatter { verbose, color }
    }

    pub fn render<W: Write>(&self, out: &mut W, body: &[u8], is_list: bool) -> io::Result<()> {
        if self.verbose {
            return write_pretty(out, body);
        }
        match Reply::decode(body, is_list) {
            Some(reply) => self.write_reply(out, &reply),
            None => out.write_all(body),
        }
    }

    pub fn write_reply<W: Write>(&self, out: &mut W, reply: &Reply) -> io::Result<()> {
        match reply {
            Reply::Failure(error) => writeln!(out, "Error: {}", error),
            Reply::Listing(records) if records.is_empty() => writeln!(out, "No DNS records found"),
            Reply::Listing(records) => write_table(out, records),
            Reply::Outcome(outcome) => self.write_outcome(out, outcome),
        }
    }

    fn write_outcome<W: Write>(&self, out: &mut W, outcome: &Outcome) -> io::Result<()> {
        let mark = if self.color {
            CHECK_MARK.green().to_string()
        } else {
            CHECK_MARK.to_string()
        };
        match outcome {
            Outcome::Added { domain, ip } => {
                writeln!(out, "{} Successfully added {} -> {}", mark, domain, ip)
            }
            Outcome::Updated { domain, new_ip } => {
                writeln!(out, "{} Successfully updated {} -> {}", mark, domain, new_ip)
            }
            Outcome::Deleted { domain } => writeln!(out, "{} Successfully deleted {}", mark, domain),
            Outcome::Exists { domain, ip } => {
                writeln!(out, "Record already exists: {} -> {}", domain, ip)
            }
            Outcome::Other(status) => writeln!(out, "Operation completed: {}", status),
        }
    }
}

/// Re-indent a JSON body, or pass it through if it is not JSON.
///
/// Only the whitespace between tokens changes: strings, numbers and
/// repeated keys are copied byte for byte.
fn write_pretty<W: Write>(out: &mut W, body: &[u8]) -> io::Result<()> {
    if serde_json::from_slice::<IgnoredAny>(body).is_err() {
        return out.write_all(body);
    }
    let mut pretty = reindent(body);
    pretty.push(b'\n');
    out.write_all(&pretty)
}

/// Lay out an already validated JSON document with two-space indentation.
/// Empty objects and arrays stay on one line.
fn reindent(body: &[u8]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(body.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < body.len() {
        let b = body[i];
        i += 1;

        if in_string {
            dst.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'"' => {
                in_string = true;
                dst.push(b);
            }
            b'{' | b'[' => {
                let close = if b == b'{' { b'}' } else { b']' };
                dst.push(b);
                let next = body[i..]
                    .iter()
                    .position(|c| !c.is_ascii_whitespace())
                    .map(|n| i + n);
                match next {
                    Some(n) if body[n] == close => {
                        dst.push(close);
                        i = n + 1;
                    }
                    _ => {
                        depth += 1;
                        newline(&mut dst, depth);
                    }
                }
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                newline(&mut dst, depth);
                dst.push(b);
            }
            b',' => {
                dst.push(b);
                newline(&mut dst, depth);
            }
            b':' => dst.extend_from_slice(b": "),
            _ => dst.push(b),
        }
    }
    dst
}

fn newline(dst: &mut Vec<u8>, depth: usize) {
    dst.push(b'\n');
    for _ in 0..depth {
        dst.extend_from_slice(INDENT);
    }
}

/// Two aligned columns followed by a blank line and the record count.
fn write_table<W: Write>(out: &mut W, records: &[Record]) -> io::Result<()> {
    let rows: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.domain.as_str(), r.ip.as_deref().unwrap_or_default()))
        .collect();

    let header = ("DOMAIN", "IP ADDRESS");
    let width = rows
        .iter()
        .chain(std::iter::once(&header))
        .map(|(domain, _)| domain.chars().count())
        .max()
        .unwrap_or_default()
        + COLUMN_GAP;

    for (domain, ip) in std::iter::once(header).chain(rows.iter().copied()) {
        let pad = width - domain.chars().count();
        writeln!(out, "{}{:pad$}{}", domain, "", ip, pad = pad)?;
    }
    writeln!(out)?;
    writeln!(out, "Total: {} records", records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(body: &str, is_list: bool) -> String {
        let mut out = Vec::new();
        Formatter::default().render(&mut out, body.as_bytes(), is_list).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn render_verbose(body: &str) -> String {
        let mut out = Vec::new();
        Formatter::new(true, false).render(&mut out, body.as_bytes(), true).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn added() {
        let out = render(r#"{"status":"added","domain":"a.com","ip":"1.2.3.4"}"#, false);
        assert_eq!(out, "✓ Successfully added a.com -> 1.2.3.4\n");
    }

    #[test]
    fn updated_uses_new_ip() {
        let out = render(
            r#"{"status":"updated","domain":"a.com","new_ip":"5.6.7.8"}"#,
            false,
        );
        assert_eq!(out, "✓ Successfully updated a.com -> 5.6.7.8\n");
    }

    #[test]
    fn deleted() {
        let out = render(r#"{"status":"deleted","domain":"a.com"}"#, false);
        assert_eq!(out, "✓ Successfully deleted a.com\n");
    }

    #[test]
    fn exists_and_unknown_status() {
        let out = render(r#"{"status":"exists","domain":"a.com","ip":"1.2.3.4"}"#, false);
        assert_eq!(out, "Record already exists: a.com -> 1.2.3.4\n");

        let out = render(r#"{"status":"queued"}"#, false);
        assert_eq!(out, "Operation completed: queued\n");

        let out = render("{}", false);
        assert_eq!(out, "Operation completed: \n");
    }

    #[test]
    fn error_field_wins() {
        let out = render(
            r#"{"error":"not found","status":"deleted","records":[{"domain":"a.com","ip":"1.1.1.1"}]}"#,
            true,
        );
        assert_eq!(out, "Error: not found\n");

        let out = render(r#"{"error":"","status":"deleted","domain":"a.com"}"#, false);
        assert_eq!(out, "✓ Successfully deleted a.com\n");
    }

    #[test]
    fn list_renders_aligned_table_in_server_order() {
        let out = render(
            r#"{"records":[{"domain":"b.com","ip":"2.2.2.2"},{"domain":"a.com","ip":"1.1.1.1"}]}"#,
            true,
        );
        assert_eq!(
            out,
            "DOMAIN  IP ADDRESS\n\
             b.com   2.2.2.2\n\
             a.com   1.1.1.1\n\
             \n\
             Total: 2 records\n"
        );
    }

    #[test]
    fn table_pads_to_widest_domain() {
        let out = render(
            r#"{"records":[{"domain":"a.com","ip":"1.1.1.1"},{"domain":"api.example.com","ip":"2.2.2.2"}]}"#,
            true,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "DOMAIN           IP ADDRESS");
        assert_eq!(lines[1], "a.com            1.1.1.1");
        assert_eq!(lines[2], "api.example.com  2.2.2.2");
        assert_eq!(lines[4], "Total: 2 records");
    }

    #[test]
    fn record_without_domain_still_renders_a_row() {
        let out = render(r#"{"records":[{"ip":"1.1.1.1"}]}"#, true);
        assert_eq!(out, "DOMAIN  IP ADDRESS\n        1.1.1.1\n\nTotal: 1 records\n");
    }

    #[test]
    fn empty_or_missing_records() {
        assert_eq!(render(r#"{"records":[]}"#, true), "No DNS records found\n");
        assert_eq!(render(r#"{"records":null}"#, true), "No DNS records found\n");
        assert_eq!(render("{}", true), "No DNS records found\n");
    }

    #[test]
    fn non_json_body_passes_through() {
        assert_eq!(render("plain text", false), "plain text");
        assert_eq!(render("[1,2]", true), "[1,2]");
        assert_eq!(render(r#"{"status":42}"#, false), r#"{"status":42}"#);
    }

    #[test]
    fn verbose_reindents_json_in_server_key_order() {
        let out = render_verbose(r#"{"status":"added","domain":"a.com","ip":"1.2.3.4"}"#);
        assert_eq!(
            out,
            "{\n  \"status\": \"added\",\n  \"domain\": \"a.com\",\n  \"ip\": \"1.2.3.4\"\n}\n"
        );
    }

    #[test]
    fn verbose_keeps_tokens_byte_for_byte() {
        let out = render_verbose(r#"{"n":1E2,"s":"caf\u00e9","d":1,"d":2}"#);
        assert_eq!(
            out,
            "{\n  \"n\": 1E2,\n  \"s\": \"caf\\u00e9\",\n  \"d\": 1,\n  \"d\": 2\n}\n"
        );
    }

    #[test]
    fn verbose_nests_and_keeps_empty_containers_inline() {
        let out = render_verbose(
            "{ \"records\" : [ {\"domain\":\"a.com\",\"ip\":\"1.1.1.1\"} ], \"meta\": { }, \"tags\":[ ] }",
        );
        assert_eq!(
            out,
            "{\n  \"records\": [\n    {\n      \"domain\": \"a.com\",\n      \"ip\": \"1.1.1.1\"\n    }\n  ],\n  \"meta\": {},\n  \"tags\": []\n}\n"
        );
    }

    #[test]
    fn verbose_leaves_punctuation_inside_strings_alone() {
        let out = render_verbose(r#"{"error":"bad \"x\": {a, b}"}"#);
        assert_eq!(out, "{\n  \"error\": \"bad \\\"x\\\": {a, b}\"\n}\n");
    }

    #[test]
    fn verbose_passes_non_json_through() {
        assert_eq!(render_verbose("<html>oops</html>"), "<html>oops</html>");
    }

    #[test]
    fn verbose_does_not_interpret_errors() {
        let out = render_verbose(r#"{"error":"x"}"#);
        assert!(!out.starts_with("Error:"));
        assert!(out.contains("\"error\": \"x\""));
    }

    #[test]
    fn decode_picks_variant() {
        assert_eq!(
            Reply::decode(br#"{"error":"boom"}"#, false),
            Some(Reply::Failure("boom".into()))
        );
        assert_eq!(
            Reply::decode(br#"{"status":"deleted","domain":"a.com"}"#, false),
            Some(Reply::Outcome(Outcome::Deleted {
                domain: "a.com".into()
            }))
        );
        assert_eq!(Reply::decode(b"nope", true), None);
    }

    #[test]
    fn colored_mark_still_names_the_record() {
        let mut out = Vec::new();
        Formatter::new(false, true)
            .render(&mut out, br#"{"status":"added","domain":"a.com","ip":"1.2.3.4"}"#, false)
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\u{1b}["));
        assert!(out.ends_with("Successfully added a.com -> 1.2.3.4\n"));
    }
}
