//! Failures raised by hook implementations.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Write};
use std::panic::Location;

use crate::hooks::HookName;

/// Kind name given to panics caught inside a wrapped hook.
pub const PANIC_KIND: &str = "panic";

const UNKNOWN_FILE: &str = "<unknown>";

/// An error a hook can fail with.
///
/// [`kind`](Self::kind) is the stable name matched against
/// `error_mailer.ignored_exceptions`.
pub trait HookFault: Error + 'static {
    fn kind(&self) -> Cow<'_, str>;

    /// Where the error was raised, if known.
    fn origin(&self) -> Option<&'static Location<'static>> {
        None
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        None
    }
}

/// General purpose hook error with a kind name, caller location and backtrace.
pub struct PipelineError {
    kind: Cow<'static, str>,
    message: String,
    origin: &'static Location<'static>,
    backtrace: Backtrace,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl PipelineError {
    #[track_caller]
    pub fn new(kind: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            origin: Location::caller(),
            backtrace: Backtrace::capture(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("origin", &self.origin)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

impl HookFault for PipelineError {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.kind)
    }

    fn origin(&self) -> Option<&'static Location<'static>> {
        Some(self.origin)
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        Some(&self.backtrace)
    }
}

/// Everything the report needs to know about one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEvent {
    pub kind: String,
    pub message: String,
    pub traceback: String,
    pub hook: HookName,
    pub location: String,
    pub source_file: String,
}

impl FailureEvent {
    pub fn from_fault<E: HookFault + ?Sized>(hook: HookName, location: &str, fault: &E) -> Self {
        let kind = fault.kind().into_owned();
        let message = fault.to_string();
        let origin = fault.origin();

        let mut traceback = format!("{kind}: {message}");
        if let Some(origin) = origin {
            let _ = write!(traceback, "\n  at {origin}");
        }
        write_causes(&mut traceback, fault.source());
        if let Some(backtrace) = fault.backtrace() {
            write_backtrace(&mut traceback, backtrace);
        }

        Self {
            kind,
            message,
            traceback,
            hook,
            location: location.to_string(),
            source_file: origin
                .map(|location| location.file().to_string())
                .unwrap_or_else(|| UNKNOWN_FILE.to_string()),
        }
    }

    /// Builds the event for a panic payload caught while running `hook`.
    pub fn from_panic(hook: HookName, location: &str, payload: &(dyn Any + Send)) -> Self {
        let message = panic_message(payload);
        let mut traceback = format!("{PANIC_KIND}: {message}");
        write_backtrace(&mut traceback, &Backtrace::force_capture());

        Self {
            kind: PANIC_KIND.to_string(),
            message,
            traceback,
            hook,
            location: location.to_string(),
            source_file: UNKNOWN_FILE.to_string(),
        }
    }
}

fn write_causes(out: &mut String, mut source: Option<&(dyn Error + 'static)>) {
    if source.is_none() {
        return;
    }
    out.push_str("\n\nCaused by:");
    let mut index = 0;
    while let Some(cause) = source {
        let _ = write!(out, "\n    {index}: {cause}");
        source = cause.source();
        index += 1;
    }
}

fn write_backtrace(out: &mut String, backtrace: &Backtrace) {
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = write!(out, "\n\nStack backtrace:\n{backtrace}");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "Box<dyn Any>".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct DiskFull;

    impl fmt::Display for DiskFull {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("no space left on device")
        }
    }

    impl Error for DiskFull {}

    #[test]
    fn pipeline_error_records_caller_file() {
        let error = PipelineError::new("ValueError", "disk full");
        let event = FailureEvent::from_fault(HookName::OnPipelineError, "sales::hooks", &error);

        assert_eq!(event.kind, "ValueError");
        assert_eq!(event.message, "disk full");
        assert!(event.source_file.ends_with("failure.rs"));
        assert!(event.traceback.starts_with("ValueError: disk full"));
        assert_eq!(event.location, "sales::hooks");
    }

    #[test]
    fn causes_are_listed_in_order() {
        let error = PipelineError::new("IOError", "could not save model").with_source(DiskFull);
        let event = FailureEvent::from_fault(HookName::AfterPipelineRun, "m", &error);

        assert!(event
            .traceback
            .contains("Caused by:\n    0: no space left on device"));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        let event = FailureEvent::from_panic(HookName::BeforePipelineRun, "m", payload.as_ref());
        assert_eq!(event.kind, PANIC_KIND);
        assert_eq!(event.message, "index out of bounds");
        assert_eq!(event.source_file, UNKNOWN_FILE);

        let payload: Box<dyn Any + Send> = Box::new(String::from("formatted 42"));
        let event = FailureEvent::from_panic(HookName::BeforePipelineRun, "m", payload.as_ref());
        assert_eq!(event.message, "formatted 42");
    }
}
