//! Report job submission and status polling
//!
//! A submitted job starts out `Working`. The controller polls it at most
//! `max_attempts` times, pausing between polls while it is still working, and
//! stops at the first terminal status. Running out of attempts is reported as
//! [`PollOutcome::Pending`], never as a completed payload.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::sleeper::Sleeper;
use crate::transport::ReportTransport;
use crate::types::{DataContext, ReportKey, ReportStatus};

/// Result of polling one report job
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job completed; `payload` is the decoded report text
    Completed {
        /// Job key
        report_key: ReportKey,
        /// Decoded report text
        payload: String,
        /// Number of polls performed
        attempts: u32,
    },
    /// The job reached the Failed state
    Failed {
        /// Job key
        report_key: ReportKey,
        /// Number of polls performed
        attempts: u32,
    },
    /// The poll budget ran out while the job was still working
    Pending {
        /// Job key
        report_key: ReportKey,
        /// Number of polls performed
        attempts: u32,
    },
}

impl PollOutcome {
    /// Final observed status
    pub fn status(&self) -> ReportStatus {
        match self {
            PollOutcome::Completed { .. } => ReportStatus::Completed,
            PollOutcome::Failed { .. } => ReportStatus::Failed,
            PollOutcome::Pending { .. } => ReportStatus::Working,
        }
    }

    /// Number of polls performed
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Completed { attempts, .. }
            | PollOutcome::Failed { attempts, .. }
            | PollOutcome::Pending { attempts, .. } => *attempts,
        }
    }

    /// The payload of a completed job, or the error describing why there is none
    pub fn into_payload(self) -> Result<String> {
        match self {
            PollOutcome::Completed { payload, .. } => Ok(payload),
            PollOutcome::Failed { report_key, .. } => Err(Error::ReportFailed {
                report_key: report_key.to_string(),
            }),
            PollOutcome::Pending {
                report_key,
                attempts,
            } => Err(Error::ReportNotReady {
                report_key: report_key.to_string(),
                attempts,
            }),
        }
    }
}

/// Submits report jobs and drives their poll loop
#[derive(Clone)]
pub struct ReportJobController {
    transport: Arc<dyn ReportTransport>,
    sleeper: Arc<dyn Sleeper>,
}

impl ReportJobController {
    /// Create a controller over the given transport and sleeper
    pub fn new(transport: Arc<dyn ReportTransport>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { transport, sleeper }
    }

    /// Submit a report for execution and return its job key
    pub async fn submit_report(
        &self,
        context: &DataContext,
        report_path: &str,
        delimiter: char,
    ) -> Result<ReportKey> {
        tracing::info!(phase = "submit", report_path, "executing report");

        let key = self
            .transport
            .execute_report(context, report_path, delimiter)
            .await
            .map_err(|e| match e {
                Error::Submission(_) => e,
                other => Error::Submission(other.to_string()),
            })?;

        if key.as_str().trim().is_empty() {
            return Err(Error::Submission(
                "ExecuteReport returned no report key".to_string(),
            ));
        }

        tracing::info!(phase = "submit", report_key = %key, "execute report request accepted");
        Ok(key)
    }

    /// Poll a job until it is terminal or the attempt budget is spent
    pub async fn poll(&self, report_key: &ReportKey, config: &PollConfig) -> Result<PollOutcome> {
        self.poll_with(report_key, config.max_attempts, config.pause)
            .await
    }

    /// Poll with an explicit attempt budget and pause
    pub async fn poll_with(
        &self,
        report_key: &ReportKey,
        max_attempts: u32,
        pause: Duration,
    ) -> Result<PollOutcome> {
        let max_attempts = max_attempts.max(1);
        let started = Instant::now();

        for attempt in 1..=max_attempts {
            let response = self.transport.retrieve_report(report_key).await?;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match response.status {
                ReportStatus::Completed => {
                    tracing::info!(
                        phase = "poll",
                        report_key = %report_key,
                        attempt,
                        max_attempts,
                        elapsed_ms,
                        "report completed"
                    );
                    let payload = decode_stream(response.stream.as_deref().unwrap_or_default())?;
                    return Ok(PollOutcome::Completed {
                        report_key: report_key.clone(),
                        payload,
                        attempts: attempt,
                    });
                }
                ReportStatus::Failed => {
                    tracing::warn!(
                        phase = "poll",
                        report_key = %report_key,
                        attempt,
                        max_attempts,
                        elapsed_ms,
                        "report failed"
                    );
                    return Ok(PollOutcome::Failed {
                        report_key: report_key.clone(),
                        attempts: attempt,
                    });
                }
                ReportStatus::Working => {
                    tracing::info!(
                        phase = "poll",
                        report_key = %report_key,
                        attempt,
                        max_attempts,
                        elapsed_ms,
                        "report still working"
                    );
                    if attempt < max_attempts {
                        self.sleeper.sleep(pause).await;
                    }
                }
            }
        }

        tracing::warn!(
            phase = "poll",
            report_key = %report_key,
            attempts = max_attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "poll budget exhausted while report still working"
        );
        Ok(PollOutcome::Pending {
            report_key: report_key.clone(),
            attempts: max_attempts,
        })
    }
}

/// Decode a report stream into text
///
/// The stream is UTF-8 (bytes that are not fall back to Latin-1) in which
/// backslash escapes are then resolved: `\\`, `\'`, `\"`, `\a`, `\b`, `\f`,
/// `\n`, `\r`, `\t`, `\v`, octal `\ooo`, `\xhh`, `\uhhhh`, `\Uhhhhhhhh`, and
/// an escaped line break, which is dropped. Unknown escapes are kept verbatim.
pub fn decode_stream(bytes: &[u8]) -> Result<String> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        Err(_) => std::borrow::Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    };
    unescape(&text)
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            return Err(Error::Decode("\\ at end of report stream".to_string()));
        };
        match escaped {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(code_point(code)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2, 'x')?),
            'u' => out.push(hex_escape(&mut chars, 4, 'u')?),
            'U' => out.push(hex_escape(&mut chars, 8, 'U')?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    kind: char,
) -> Result<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| Error::Decode(format!("truncated \\{kind} escape in report stream")))?;
        code = code * 16 + digit;
    }
    code_point(code)
}

fn code_point(code: u32) -> Result<char> {
    char::from_u32(code)
        .ok_or_else(|| Error::Decode(format!("invalid code point {code:#x} in report stream")))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleeper::testing::RecordingSleeper;
    use crate::transport::testing::{Call, ScriptedTransport, logged_on};
    use ReportStatus::{Completed, Failed, Working};

    const PAUSE: Duration = Duration::from_secs(60);

    fn controller(transport: &Arc<ScriptedTransport>) -> (ReportJobController, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let controller = ReportJobController::new(transport.clone(), sleeper.clone());
        (controller, sleeper)
    }

    fn retrieves(transport: &ScriptedTransport) -> usize {
        transport.count(|c| matches!(c, Call::Retrieve(_)))
    }

    #[tokio::test]
    async fn test_working_working_completed() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_status(Working)
                .with_status(Working)
                .with_completed(b"A|B\\r\\n1|2"),
        );
        let (controller, sleeper) = controller(&transport);

        let outcome = controller
            .poll_with(&ReportKey::new("k"), 3, PAUSE)
            .await
            .unwrap();

        assert_eq!(retrieves(&transport), 3);
        assert_eq!(sleeper.calls(), vec![PAUSE, PAUSE]);
        assert_eq!(outcome.status(), Completed);
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.into_payload().unwrap(), "A|B\r\n1|2");
    }

    #[tokio::test]
    async fn test_budget_exhausted_while_working_is_pending() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_status(Working)
                .with_status(Working)
                .with_status(Working),
        );
        let (controller, sleeper) = controller(&transport);

        let outcome = controller
            .poll_with(&ReportKey::new("k"), 3, PAUSE)
            .await
            .unwrap();

        assert_eq!(retrieves(&transport), 3);
        assert_eq!(sleeper.calls().len(), 2, "no pause after the last poll");
        assert_eq!(outcome.status(), Working);
        match outcome.into_payload().unwrap_err() {
            Error::ReportNotReady {
                report_key,
                attempts,
            } => {
                assert_eq!(report_key, "k");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected ReportNotReady, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_stops_without_sleeping() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_status(Failed)
                .with_status(Working),
        );
        let (controller, sleeper) = controller(&transport);

        let outcome = controller
            .poll_with(&ReportKey::new("k"), 3, PAUSE)
            .await
            .unwrap();

        assert_eq!(retrieves(&transport), 1);
        assert!(sleeper.calls().is_empty());
        assert_eq!(outcome.attempts(), 1);
        assert!(matches!(
            outcome.into_payload(),
            Err(Error::ReportFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_completed_without_stream_is_empty_payload() {
        let transport = Arc::new(ScriptedTransport::new().with_status(Completed));
        let (controller, _) = controller(&transport);

        let outcome = controller
            .poll(&ReportKey::new("k"), &PollConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome.into_payload().unwrap(), "");
    }

    #[tokio::test]
    async fn test_retrieve_error_propagates() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_status(Working)
                .with_retrieve_error(Error::Transport("HTTP 500".to_string())),
        );
        let (controller, sleeper) = controller(&transport);

        let err = controller
            .poll_with(&ReportKey::new("k"), 3, PAUSE)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(sleeper.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_passes_path_and_delimiter() {
        let transport = Arc::new(ScriptedTransport::new());
        let (controller, _) = controller(&transport);

        let key = controller
            .submit_report(&logged_on(), "/content/hc", ',')
            .await
            .unwrap();

        assert_eq!(key, ReportKey::new("key-1"));
        assert_eq!(
            transport.calls(),
            vec![Call::Execute {
                path: "/content/hc".to_string(),
                delimiter: ','
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_keys_are_unique_per_submission() {
        let transport = Arc::new(ScriptedTransport::new());
        let (controller, _) = controller(&transport);

        let first = controller.submit_report(&logged_on(), "/r", '|').await.unwrap();
        let second = controller.submit_report(&logged_on(), "/r", '|').await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_submit_errors_become_submission_errors() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_execute(Ok(ReportKey::new("")))
                .with_execute(Err(Error::Fault {
                    operation: "ExecuteReport".to_string(),
                    message: "bad context".to_string(),
                })),
        );
        let (controller, _) = controller(&transport);

        let empty = controller.submit_report(&logged_on(), "/r", '|').await;
        assert!(matches!(empty, Err(Error::Submission(_))));

        let fault = controller.submit_report(&logged_on(), "/r", '|').await;
        assert!(matches!(fault, Err(Error::Submission(ref m)) if m.contains("bad context")));
    }

    #[test]
    fn test_decode_stream_escapes() {
        let raw = r"Name|Note\r\nO\'Neil|tab\there\\x\r\nJos\xe9|ét\U0001F600\101";
        assert_eq!(
            decode_stream(raw.as_bytes()).unwrap(),
            "Name|Note\r\nO'Neil|tab\there\\x\r\nJos\u{e9}|\u{e9}t\u{1F600}A"
        );
    }

    #[test]
    fn test_decode_stream_plain_utf8_and_latin1_fallback() {
        assert_eq!(decode_stream("Zoë|Ångström".as_bytes()).unwrap(), "Zoë|Ångström");
        assert_eq!(decode_stream(&[0x5a, 0x6f, 0xeb]).unwrap(), "Zo\u{eb}");
    }

    #[test]
    fn test_decode_stream_unknown_escape_kept_and_line_continuation_dropped() {
        assert_eq!(decode_stream(b"a\\qb\\\nc").unwrap(), "a\\qbc");
    }

    #[test]
    fn test_decode_stream_rejects_bad_escapes() {
        assert!(matches!(decode_stream(b"abc\\"), Err(Error::Decode(_))));
        assert!(matches!(decode_stream(b"\\x4"), Err(Error::Decode(_))));
        assert!(matches!(decode_stream(b"\\uD800"), Err(Error::Decode(_))));
    }
}
