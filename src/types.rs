//! Core types for ukg-bi

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Namespace of the UltiPro token header element
pub const ULTIPRO_TOKEN_NS: &str =
    "http://www.ultimatesoftware.com/foundation/authentication/ultiprotoken";

/// Namespace of the client access key header element
pub const CLIENT_ACCESS_KEY_NS: &str =
    "http://www.ultimatesoftware.com/foundation/authentication/clientaccesskey";

/// Server-assigned key identifying one report execution
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportKey(String);

impl ReportKey {
    /// Wrap a key returned by the service
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a report job as reported by the streaming service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// The service is still materializing the report
    Working,
    /// The report failed on the server
    Failed,
    /// The report stream is ready
    Completed,
}

impl ReportStatus {
    /// Whether no further polling can change the outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Failed | ReportStatus::Completed)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportStatus::Working => "Working",
            ReportStatus::Failed => "Failed",
            ReportStatus::Completed => "Completed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Working" => Ok(ReportStatus::Working),
            "Failed" => Ok(ReportStatus::Failed),
            "Completed" => Ok(ReportStatus::Completed),
            other => Err(crate::error::Error::Transport(format!(
                "unrecognized report status {other:?}"
            ))),
        }
    }
}

/// A namespace-qualified SOAP header entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderEntry {
    /// XML namespace of the element
    pub namespace: &'static str,
    /// Local element name
    pub name: &'static str,
    /// Text content
    pub value: String,
}

/// Authorization header material derived from a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthHeader {
    entries: [HeaderEntry; 2],
}

impl AuthHeader {
    pub(crate) fn new(token: &str, client_access_key: &str) -> Self {
        Self {
            entries: [
                HeaderEntry {
                    namespace: ULTIPRO_TOKEN_NS,
                    name: "UltiProToken",
                    value: token.to_string(),
                },
                HeaderEntry {
                    namespace: CLIENT_ACCESS_KEY_NS,
                    name: "ClientAccessKey",
                    value: client_access_key.to_string(),
                },
            ],
        }
    }

    /// The token and client access key entries, in that order
    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }
}

/// Result of the credential handshake
///
/// Immutable once produced; every report fetch gets a fresh one.
#[derive(Clone)]
pub struct Session {
    token: String,
    client_access_key: String,
    auth_header: AuthHeader,
    authenticated_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(token: String, client_access_key: String) -> Self {
        let auth_header = AuthHeader::new(&token, &client_access_key);
        Self {
            token,
            client_access_key,
            auth_header,
            authenticated_at: Utc::now(),
        }
    }

    /// Session token issued by the login service
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Client access key the session was issued for
    pub fn client_access_key(&self) -> &str {
        &self.client_access_key
    }

    /// Header material carrying the token and client access key
    pub fn auth_header(&self) -> &AuthHeader {
        &self.auth_header
    }

    /// When the handshake completed
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("authenticated_at", &self.authenticated_at)
            .finish_non_exhaustive()
    }
}

/// BI data context returned by `LogOnWithToken`
///
/// Opaque to callers: it is only handed back to the service when submitting
/// or listing reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataContext {
    pub(crate) service_id: String,
    pub(crate) client_access_key: String,
    pub(crate) token: String,
    pub(crate) status: String,
    pub(crate) status_message: String,
    pub(crate) instance_key: String,
    pub(crate) session_id: String,
    pub(crate) user_id: String,
}

impl DataContext {
    /// Logon status reported by the service (`LoggedOn` on success)
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Status detail, usually empty on success
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Whether the service accepted the token
    pub fn is_logged_on(&self) -> bool {
        self.status == "LoggedOn"
    }
}

/// One `RetrieveReport` response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrieveResponse {
    /// Job status from the response header
    pub status: ReportStatus,
    /// Raw report stream bytes, present once the job has completed
    pub stream: Option<Vec<u8>>,
}

/// A report visible to the web service user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Display name
    pub name: String,
    /// Full report path, usable as a [`ReportRef::Path`]
    pub path: String,
}

/// A prompt parameter declared by a report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParameter {
    /// Parameter name
    pub name: String,
    /// Declared data type (e.g. "String", "DateTime")
    pub data_type: String,
    /// Whether a value must be supplied
    pub required: bool,
    /// Whether multiple values are accepted
    pub multi_valued: bool,
    /// Default value, if declared
    pub default_value: Option<String>,
}

/// How a caller identifies a report
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportRef {
    /// A name looked up in the configured report mapping
    Name(String),
    /// A full report path used as-is
    Path(String),
}

impl ReportRef {
    /// Report by configured name
    pub fn name(name: impl Into<String>) -> Self {
        ReportRef::Name(name.into())
    }

    /// Report by full path
    pub fn path(path: impl Into<String>) -> Self {
        ReportRef::Path(path.into())
    }

    /// Report paths start with `/` (e.g. `/content/folder[...]`); anything else is a name
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with('/') {
            ReportRef::Path(trimmed.to_string())
        } else {
            ReportRef::Name(trimmed.to_string())
        }
    }
}

impl From<&str> for ReportRef {
    fn from(input: &str) -> Self {
        ReportRef::parse(input)
    }
}

impl From<String> for ReportRef {
    fn from(input: String) -> Self {
        ReportRef::parse(&input)
    }
}

impl std::fmt::Display for ReportRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportRef::Name(name) => write!(f, "report {name:?}"),
            ReportRef::Path(path) => write!(f, "report at {path}"),
        }
    }
}
