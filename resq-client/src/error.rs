/// Errors produced while executing a remote query.
///
/// `Clone` so a shared in-flight fetch can hand the same outcome to every
/// caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response (connect, DNS, timeout, ...).
    Transport(String),

    /// The server answered with a non-success status.
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    Decode(String),

    /// The response decoded but is not a resource payload.
    UnexpectedPayload(String),

    /// The call was cancelled before its result was observed.
    Cancelled,
}

impl ClientError {
    /// `true` for a deliberate cancellation, as opposed to a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "Transport error: {msg}"),
            ClientError::Status { status, body } => {
                write!(f, "Server returned {status}: {body}")
            }
            ClientError::Decode(msg) => write!(f, "Invalid response body: {msg}"),
            ClientError::UnexpectedPayload(msg) => write!(f, "Unexpected payload: {msg}"),
            ClientError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
