//! Argument selection by kind.
//!
//! Hook signatures differ per hook name, so the notification pipeline never
//! reads arguments by position. Instead it asks for "the" argument of a given
//! kind and states up front what to do when several match.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::context::{DataCatalog, HookArg, Pipeline, RunContext, RunParams};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("No argument of type {capability} found")]
    NotFound { capability: &'static str },

    #[error("Multiple arguments of type {capability} found ({count})")]
    Ambiguous {
        capability: &'static str,
        count: usize,
    },

    #[error("Invalid on_conflict value: {0}")]
    InvalidPolicy(String),
}

/// What to do when more than one argument matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail with [`SelectError::Ambiguous`].
    #[default]
    Raise,
    First,
    Last,
}

impl FromStr for ConflictPolicy {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raise" => Ok(ConflictPolicy::Raise),
            "first" => Ok(ConflictPolicy::First),
            "last" => Ok(ConflictPolicy::Last),
            other => Err(SelectError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Raise => "raise",
            ConflictPolicy::First => "first",
            ConflictPolicy::Last => "last",
        })
    }
}

/// A kind of hook argument that can be picked out of a call.
pub trait Capability {
    const NAME: &'static str;

    fn from_arg(arg: &HookArg) -> Option<&Self>;
}

impl Capability for RunContext {
    const NAME: &'static str = "RunContext";

    fn from_arg(arg: &HookArg) -> Option<&Self> {
        match arg {
            HookArg::Context(context) => Some(context),
            _ => None,
        }
    }
}

impl Capability for DataCatalog {
    const NAME: &'static str = "DataCatalog";

    fn from_arg(arg: &HookArg) -> Option<&Self> {
        match arg {
            HookArg::Catalog(catalog) => Some(catalog),
            _ => None,
        }
    }
}

impl Capability for RunParams {
    const NAME: &'static str = "dict";

    fn from_arg(arg: &HookArg) -> Option<&Self> {
        match arg {
            HookArg::Params(params) => Some(params),
            _ => None,
        }
    }
}

impl Capability for Pipeline {
    const NAME: &'static str = "Pipeline";

    fn from_arg(arg: &HookArg) -> Option<&Self> {
        match arg {
            HookArg::Pipeline(pipeline) => Some(pipeline),
            _ => None,
        }
    }
}

/// Returns the argument of kind `C`, resolving duplicates with `policy`.
pub fn select<C: Capability>(args: &[HookArg], policy: ConflictPolicy) -> Result<&C, SelectError> {
    let mut matches = args.iter().filter_map(C::from_arg);
    let first = matches.next().ok_or(SelectError::NotFound {
        capability: C::NAME,
    })?;

    let rest: Vec<&C> = matches.collect();
    match (rest.last().copied(), policy) {
        (None, _) | (Some(_), ConflictPolicy::First) => Ok(first),
        (Some(last), ConflictPolicy::Last) => Ok(last),
        (Some(_), ConflictPolicy::Raise) => Err(SelectError::Ambiguous {
            capability: C::NAME,
            count: rest.len() + 1,
        }),
    }
}

/// [`select`] with the policy given by name, as configuration spells it.
pub fn select_with<'a, C: Capability>(
    args: &'a [HookArg],
    on_conflict: &str,
) -> Result<&'a C, SelectError> {
    let policy = on_conflict.parse()?;
    select(args, policy)
}
