use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not anyhow/eyre/thiserror?

The archive only has a handful of failure categories (storage reads, archive
corruption, everything else). A small hand-written type keeps those categories
matchable, carries a context stack and a cause chain, and captures a span trace
from `tracing-error` so a failure deep in a corpus walk still shows which request
and which document were being processed.
*/

/// Error variants that can occur while serving or searching the archive.
#[derive(Debug)]
pub enum ErrorKind {
    /// A file in the snapshot could not be walked or read.
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A zip snapshot is malformed or an entry cannot be decoded.
    Archive { message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Archive { message } => write!(f, "Archive error: {}", message),
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/// Error type wrapping an [`ErrorKind`] with context, an optional cause and the
/// span trace active when the error was created.
pub struct CoolshellError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<CoolshellError>>,
    span_trace: SpanTrace,
}

impl CoolshellError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Shorthand for an [`ErrorKind::Message`] error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Shorthand for an [`ErrorKind::FileError`] error.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::FileError {
            path: path.into(),
            source,
        })
    }

    /// Shorthand for an [`ErrorKind::Archive`] error.
    pub fn archive(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Archive {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that led to this one.
    pub fn caused_by(mut self, cause: impl Into<Box<CoolshellError>>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Context strings in the order they were attached.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// The error this one was caused by, if any.
    pub fn cause(&self) -> Option<&CoolshellError> {
        self.cause.as_deref()
    }

    /// The span trace captured at construction.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let item_count = self.context.len() + usize::from(self.cause.is_some());
        for (i, ctx) in self.context.iter().enumerate() {
            let connector = if i + 1 == item_count { "└─" } else { "├─" };
            writeln!(f, "{}{} {}", indent, connector, ctx)?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "{}└─ cause: {}", indent, cause.kind)?;
            cause.fmt_tree(f, &format!("{}   ", indent))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for CoolshellError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for CoolshellError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::Archive { .. } | ErrorKind::Message { .. } => self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

impl fmt::Display for CoolshellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

/* 📖 # Why a custom Debug implementation?

`main` and the HTTP layer log errors with `{:?}`. The derived output would dump
the raw span trace struct; this renders the message, a context tree, the cause
chain and, when a subscriber with an `ErrorLayer` is installed, the span trace.
*/
impl fmt::Debug for CoolshellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        self.fmt_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/// Standard result type for archive operations.
///
/// Boxing keeps the `Err` variant one pointer wide.
pub type CoolshellResult<T> = std::result::Result<T, Box<CoolshellError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> CoolshellResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> CoolshellResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for CoolshellResult<T> {
    fn context(self, context: impl Into<String>) -> CoolshellResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> CoolshellResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Build a boxed [`CoolshellError`] from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::CoolshellError::message(format!($($arg)*)))
    };
}

/// Return early with a boxed [`CoolshellError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
