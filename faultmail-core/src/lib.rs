//! # faultmail-core
//!
//! Failure reporting for pipeline hooks: when a wrapped hook fails, the
//! failure is described in an HTML report and mailed to the recipients the
//! pipeline's `error_mailer` parameters name. The hook's own error is always
//! handed back unchanged.
//!
//! ### Key Submodules:
//! - `context`: the objects the framework passes to hooks
//! - `select`: type-based lookup in a hook argument list
//! - `report`: report assembly and HTML rendering
//! - `suppression`: ignored error kinds and environments
//! - `dispatch`: one message per recipient over SES SMTP
//! - `hooks`: the interceptor and the ready-made `MailerHook`

pub mod context;
pub mod dispatch;
pub mod error;
pub mod failure;
pub mod hooks;
pub mod report;
pub mod select;
pub mod suppression;

pub mod prelude {
    pub use crate::context::*;
    pub use crate::error::*;
    pub use crate::failure::*;
    pub use crate::hooks::*;
}

pub use error::{NotifyError, UsageError};
pub use failure::{FailureEvent, HookFault, PipelineError};
pub use hooks::{
    compose_report, resolve_mailer_config, ComposedMail, ErrorMailer, HookName, MailerHook,
    NotifyOutcome,
};
