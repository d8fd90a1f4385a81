//! Ignore lists: failures that are raised as usual but never mailed.

use std::fmt;

use faultmail_config::MailerConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppression {
    /// The error kind is listed in `ignored_exceptions`.
    IgnoredError(String),
    /// The active environment is listed in `ignored_envs`.
    IgnoredEnvironment(String),
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suppression::IgnoredError(kind) => write!(f, "{kind} errors are ignored"),
            Suppression::IgnoredEnvironment(env) => write!(f, "environment {env} is ignored"),
        }
    }
}

/// Checks the error kind, then the environment, and logs a warning for the
/// first list that matches.
pub fn evaluate(kind: &str, environment: Option<&str>, config: &MailerConfig) -> Option<Suppression> {
    if config.is_ignored_exception(kind) {
        tracing::warn!(kind, "Ignoring mailing for {} error.", kind);
        return Some(Suppression::IgnoredError(kind.to_string()));
    }

    match environment {
        Some(env) if config.is_ignored_env(env) => {
            tracing::warn!(environment = env, "Ignoring mailing in {} environment.", env);
            Some(Suppression::IgnoredEnvironment(env.to_string()))
        }
        _ => None,
    }
}

pub fn should_suppress(kind: &str, environment: Option<&str>, config: &MailerConfig) -> bool {
    evaluate(kind, environment, config).is_some()
}
