/// A user-facing status message.
///
/// The pipeline reports its progress through these instead of printing,
/// so the CLI decides how each level is rendered. Diagnostic detail goes
/// to `tracing`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Progress and stage updates.
    Info(String),
    /// Something failed; may or may not be fatal depending on context.
    Error(String),
    /// The operation finished and produced output.
    Success(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::Success(msg.into())
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Get the message text.
    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Error(msg) | Self::Success(msg) => msg,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
            Self::Success(msg) => write!(f, "done: {msg}"),
        }
    }
}
