//! Bolt protocol response messages.
//!
//! Response messages are sent from the server to the client and routed, in
//! request order, to the response handler registered for each request.

use std::collections::HashMap;

use crate::driver::Value;

/// Bolt message tags for response messages.
pub mod tag {
    /// SUCCESS response tag (0x70)
    pub const SUCCESS: u8 = 0x70;
    /// RECORD response tag (0x71)
    pub const RECORD: u8 = 0x71;
    /// IGNORED response tag (0x7E)
    pub const IGNORED: u8 = 0x7E;
    /// FAILURE response tag (0x7F)
    pub const FAILURE: u8 = 0x7F;
}

/// All Bolt response messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltResponse {
    /// SUCCESS - Operation completed successfully
    Success(SuccessMessage),
    /// RECORD - Query result record
    Record(RecordMessage),
    /// FAILURE - Operation failed
    Failure(FailureMessage),
    /// IGNORED - Message was ignored (connection in FAILED state)
    Ignored,
}

impl BoltResponse {
    /// Get the message tag.
    pub fn tag(&self) -> u8 {
        match self {
            BoltResponse::Success(_) => tag::SUCCESS,
            BoltResponse::Record(_) => tag::RECORD,
            BoltResponse::Failure(_) => tag::FAILURE,
            BoltResponse::Ignored => tag::IGNORED,
        }
    }

    /// Get message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    /// Whether this message ends the exchange for the current request.
    pub fn is_summary(&self) -> bool {
        !matches!(self, BoltResponse::Record(_))
    }
}

/// SUCCESS message - Operation completed successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: HashMap<String, Value>,
}

impl SuccessMessage {
    /// Create a new SUCCESS message with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SUCCESS message with metadata.
    pub fn with_metadata(metadata: HashMap<String, Value>) -> Self {
        Self { metadata }
    }

    /// Add a metadata entry, builder style.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Get metadata entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Create a HELLO/INIT success response.
    pub fn hello_success(server: &str, connection_id: &str) -> Self {
        Self::new()
            .with("server", server)
            .with("connection_id", connection_id)
    }

    /// Create a RUN success response.
    pub fn run_success(fields: &[&str], t_first: i64) -> Self {
        let fields: Vec<Value> = fields.iter().map(|f| Value::from(*f)).collect();
        Self::new().with("fields", fields).with("t_first", t_first)
    }

    /// Create a COMMIT (or PULL_ALL) success response carrying a bookmark.
    pub fn bookmark_success(bookmark: &str) -> Self {
        Self::new().with("bookmark", bookmark)
    }

    /// Consume the message, returning its metadata.
    pub fn into_metadata(self) -> HashMap<String, Value> {
        self.metadata
    }
}

/// RECORD message - Query result record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMessage {
    /// Field values
    pub fields: Vec<Value>,
}

impl RecordMessage {
    /// Create a new RECORD message.
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }

    /// Get field count.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if record is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// FAILURE message - Operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    /// Server error code, `<Product>.<Classification>.<Category>.<Title>`
    pub code: String,
    /// Error message
    pub message: String,
}

impl FailureMessage {
    /// Create a new FAILURE message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Parse from FAILURE metadata. Missing entries fall back to a generic
    /// database error so that a malformed failure still fails the request.
    pub fn from_metadata(metadata: &HashMap<String, Value>) -> Self {
        let code = metadata
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("Neo.DatabaseError.General.UnknownError");
        let message = metadata
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Server reported a failure without a message");
        Self::new(code, message)
    }

    /// Get error classification from code (`ClientError`, `TransientError`, ...).
    pub fn classification(&self) -> &str {
        self.code.split('.').nth(1).unwrap_or("Unknown")
    }
}

impl std::fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
