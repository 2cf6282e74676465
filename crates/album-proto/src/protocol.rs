use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body the oracle returns while a partial download file exists in the
/// watched folder.
pub const IN_PROGRESS_MARKER: &str = "dip";

/// Acknowledgement the log sink returns instead of echoing a message back.
pub const LOG_ACK: &str = "X";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unrecognised oracle reading {0:?}")]
    BadReading(String),
    #[error("unknown log severity {0:?}")]
    BadSeverity(String),
}

/// What the download oracle reports for a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleReading {
    /// Number of completed files in the watched folder.
    Files(u64),
    /// A download is still being written.
    InProgress,
}

impl OracleReading {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let text = text.trim();
        if text == IN_PROGRESS_MARKER {
            return Ok(Self::InProgress);
        }
        text.parse::<u64>()
            .map(Self::Files)
            .map_err(|_| ProtocolError::BadReading(text.to_string()))
    }
}

impl fmt::Display for OracleReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleReading::Files(n) => write!(f, "{}", n),
            OracleReading::InProgress => f.write_str(IN_PROGRESS_MARKER),
        }
    }
}

/// Log severity.  Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
    ];

    /// Request path of the log sink endpoint for this severity.
    pub fn path(self) -> &'static str {
        match self {
            Severity::Debug => "/debug",
            Severity::Info => "/info",
            Severity::Warning => "/warning",
            Severity::Error => "/error",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.strip_prefix('/').unwrap_or(path);
        name.parse().ok()
    }

    /// Fixed-width label prepended to messages echoed back by the sink.
    pub fn echo_prefix(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG:   ",
            Severity::Info => "INFO:    ",
            Severity::Warning => "WARNING: ",
            Severity::Error => "ERROR:   ",
        }
    }

    pub fn as_str(self) -> &'static str {
        &self.path()[1..]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(ProtocolError::BadSeverity(s.to_string())),
        }
    }
}
