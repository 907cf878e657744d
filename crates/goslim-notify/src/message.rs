//! RFC 2822 multipart message and the JSON envelope handed to delivery.
//!
//! The message has two `text/plain` parts: the summary inline (8bit) and
//! the transcript as a quoted-printable attachment, so arbitrarily long
//! tool output never exceeds the 998-octet line limit. The envelope is a single JSON object whose
//! one string field holds the whole message; JSON string escaping turns
//! newlines and control characters into escape sequences.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::report::{ATTACHMENT_NAME, Report};

const CRLF: &str = "\r\n";

/// Header fields of the report message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: DateTime<Utc>,
}

/// A fully rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    boundary: String,
    raw: String,
}

impl Message {
    /// Render `report` under `headers`.
    #[must_use]
    pub fn compose(headers: &Headers, report: &Report) -> Self {
        let summary = to_crlf(&report.summary);
        let transcript = quoted_printable(&to_crlf(&report.transcript));
        let boundary = choose_boundary(headers.date, &[&summary, &transcript]);

        let mut raw = String::new();
        push_header(&mut raw, "From", &headers.from);
        push_header(&mut raw, "To", &headers.to);
        push_header(&mut raw, "Subject", &headers.subject);
        push_header(&mut raw, "Date", &headers.date.to_rfc2822());
        push_header(&mut raw, "MIME-Version", "1.0");
        push_header(
            &mut raw,
            "Content-Type",
            &format!("multipart/mixed; boundary=\"{boundary}\""),
        );
        raw.push_str(CRLF);

        raw.push_str(&format!("--{boundary}{CRLF}"));
        push_header(&mut raw, "Content-Type", "text/plain; charset=utf-8");
        push_header(&mut raw, "Content-Transfer-Encoding", "8bit");
        raw.push_str(CRLF);
        raw.push_str(&summary);
        raw.push_str(CRLF);

        raw.push_str(&format!("--{boundary}{CRLF}"));
        push_header(
            &mut raw,
            "Content-Type",
            &format!("text/plain; charset=utf-8; name=\"{ATTACHMENT_NAME}\""),
        );
        push_header(&mut raw, "Content-Transfer-Encoding", "quoted-printable");
        push_header(
            &mut raw,
            "Content-Disposition",
            &format!("attachment; filename=\"{ATTACHMENT_NAME}\""),
        );
        raw.push_str(CRLF);
        raw.push_str(&transcript);
        raw.push_str(CRLF);
        raw.push_str(&format!("--{boundary}--{CRLF}"));

        Self { boundary, raw }
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The delivery envelope: `{"Data": "<escaped message>"}`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which cannot happen for string data.
    pub fn to_envelope(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            #[serde(rename = "Data")]
            data: &'a str,
        }
        serde_json::to_string(&Envelope { data: &self.raw })
    }
}

/// Header values may not carry line breaks.
fn push_header(out: &mut String, name: &str, value: &str) {
    let value: String = value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value.trim());
    out.push_str(CRLF);
}

/// Normalize line endings to CRLF, with a trailing line break.
fn to_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    for line in text.lines() {
        out.push_str(line.trim_end_matches('\r'));
        out.push_str(CRLF);
    }
    out
}

/// Longest encoded line, soft-break `=` included.
const QP_LINE_LIMIT: usize = 76;

/// Quoted-printable body (RFC 2045 section 6.7) of CRLF-terminated text.
fn quoted_printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for line in text.split_terminator(CRLF) {
        let bytes = line.as_bytes();
        let mut width = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            let last = i + 1 == bytes.len();
            let literal = matches!(byte, b'!'..=b'<' | b'>'..=b'~')
                || (matches!(byte, b' ' | b'\t') && !last);
            let token_len = if literal { 1 } else { 3 };
            let room = if last { QP_LINE_LIMIT } else { QP_LINE_LIMIT - 1 };
            if width + token_len > room {
                out.push('=');
                out.push_str(CRLF);
                width = 0;
            }
            if literal {
                out.push(char::from(byte));
            } else {
                out.push_str(&format!("={byte:02X}"));
            }
            width += token_len;
        }
        out.push_str(CRLF);
    }
    out
}

/// A boundary that occurs in none of `parts`.
fn choose_boundary(date: DateTime<Utc>, parts: &[&str]) -> String {
    let base = format!("goslim-{}", date.format("%Y%m%dT%H%M%S"));
    let mut n = 0_u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !parts.iter().any(|p| p.contains(&candidate)) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn headers() -> Headers {
        Headers {
            from: "curator@example.org".to_string(),
            to: "ops@example.org".to_string(),
            subject: "GO annotation refresh report".to_string(),
            date: Utc.with_ymd_and_hms(2026, 10, 19, 3, 0, 0).unwrap(),
        }
    }

    fn report() -> Report {
        Report {
            summary: "GO annotation refresh succeeded\n".to_string(),
            transcript: "2026-10-19T03:00:00Z [started] ok: refresh run started\n".to_string(),
        }
    }

    #[test]
    fn message_has_two_plain_text_parts() {
        let message = Message::compose(&headers(), &report());
        let raw = message.as_str();
        let delimiter = format!("--{}\r\n", message.boundary());

        assert!(raw.starts_with("From: curator@example.org\r\nTo: ops@example.org\r\n"));
        assert!(raw.contains("Subject: GO annotation refresh report\r\n"));
        assert!(raw.contains("MIME-Version: 1.0\r\n"));
        assert_eq!(raw.matches(&delimiter).count(), 2);
        assert_eq!(raw.matches("Content-Type: text/plain").count(), 2);
        assert!(raw.contains("Content-Disposition: attachment; filename=\"goslim-report.txt\""));
        assert!(raw.ends_with(&format!("--{}--\r\n", message.boundary())));
        assert!(!raw.replace("\r\n", "").contains('\n'));
        assert_eq!(raw.matches("Content-Transfer-Encoding: 8bit").count(), 1);
        assert_eq!(
            raw.matches("Content-Transfer-Encoding: quoted-printable").count(),
            1
        );
    }

    /// Undo soft breaks and `=XX` escapes.
    fn decode_quoted_printable(encoded: &str) -> Vec<u8> {
        let joined = encoded.replace("=\r\n", "");
        let bytes = joined.as_bytes();
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'=' {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        out
    }

    #[test]
    fn long_stderr_lines_are_wrapped_in_the_attachment() {
        let mut report = report();
        let stderr_line = format!("    Traceback: {}", "x=1; ".repeat(400));
        report.transcript = format!(
            "2026-10-19T03:00:00Z [deriving] warn: mapper stderr for process:\n{stderr_line}\n"
        );

        let message = Message::compose(&headers(), &report);

        assert!(message.as_str().lines().all(|l| l.trim_end_matches('\r').len() <= 76));
        let body_start = message.as_str().find("filename=\"goslim-report.txt\"\r\n\r\n").unwrap();
        let body = &message.as_str()[body_start..];
        let body = &body[body.find("\r\n\r\n").unwrap() + 4..];
        let body = &body[..body.find(&format!("\r\n--{}--", message.boundary())).unwrap()];
        assert_eq!(
            String::from_utf8(decode_quoted_printable(body)).unwrap(),
            to_crlf(&report.transcript)
        );
    }

    #[test]
    fn quoted_printable_escapes_non_ascii_and_trailing_space() {
        assert_eq!(quoted_printable("caf\u{e9} ok \r\n"), "caf=C3=A9 ok=20\r\n");
        assert_eq!(quoted_printable("a=b\r\n"), "a=3Db\r\n");
        assert_eq!(quoted_printable("\r\n\r\n"), "\r\n\r\n");
    }

    #[test]
    fn soft_breaks_keep_lines_within_the_limit() {
        let line = "a".repeat(200);

        let encoded = quoted_printable(&format!("{line}\r\n"));

        let physical: Vec<&str> = encoded.split_terminator("\r\n").collect();
        assert_eq!(physical.len(), 3);
        assert!(physical.iter().all(|l| l.len() <= 76));
        assert_eq!(physical[0], format!("{}=", "a".repeat(75)));
        assert_eq!(encoded.replace("=\r\n", ""), format!("{line}\r\n"));
    }

    #[test]
    fn boundary_avoids_part_content() {
        let mut report = report();
        report.transcript = "stderr: --goslim-20261019T030000-0 oops\n".to_string();

        let message = Message::compose(&headers(), &report);

        assert_eq!(message.boundary(), "goslim-20261019T030000-1");
    }

    #[test]
    fn header_values_cannot_inject_lines() {
        let mut headers = headers();
        headers.subject = "report\r\nBcc: attacker@example.org".to_string();

        let message = Message::compose(&headers, &report());

        assert!(!message.as_str().contains("\r\nBcc:"));
    }

    #[test]
    fn envelope_is_single_field_json_without_raw_control_chars() {
        let message = Message::compose(&headers(), &report());

        let envelope = message.to_envelope().unwrap();

        assert!(!envelope.contains('\n'));
        assert!(!envelope.contains('\r'));
        assert!(envelope.contains("\\r\\n"));
        let value: serde_json::Value = serde_json::from_str(&envelope).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["Data"].as_str().unwrap(), message.as_str());
    }
}
