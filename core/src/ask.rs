//! The ask/dialog protocol (C5, spec §4.6).
//!
//! The engine never reads from an input stream directly: every prompt
//! or message is packaged as an `Ask` and dispatched synchronously to
//! the context's callback. Each kind gets its own result-setter so a
//! caller can't stuff a menu answer into a number request (spec §9:
//! "type the callback so that each ask kind has its own result-setter").

use crate::error::{PtableError, Result};

#[derive(Debug, Clone)]
pub struct NumberSpec {
    pub low: u64,
    pub default: u64,
    pub high: u64,
    /// Sectors represented by one unit of user input, when the user is
    /// allowed to answer in a non-sector unit (e.g. "+8G").
    pub unit: u64,
    pub allow_relative: bool,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct MenuSpec {
    pub items: Vec<MenuItem>,
    pub default_key: Option<String>,
}

/// One ask request, handed to the host callback. `query` is always the
/// prompt text; the payload carries kind-specific data.
#[derive(Debug, Clone)]
pub enum Ask {
    Number { query: String, spec: NumberSpec },
    String { query: String, hint: Option<String> },
    Menu { query: String, spec: MenuSpec },
    YesNo { query: String },
    Info { message: String },
    Warn { message: String },
    WarnErrno { message: String, errno: i32 },
}

/// The answer a host returns for a given `Ask`. Returning the wrong
/// variant for the kind that was asked is a host programming error;
/// callers of `AskChannel::ask` should match on the `Ask` they sent.
#[derive(Debug, Clone)]
pub enum AskResult {
    Number(u64),
    /// True when the user's answer was a relative amount ("+8G") that
    /// the caller must add to a base rather than treat as absolute.
    NumberRelative(u64),
    String(String),
    MenuKey(String),
    YesNo(bool),
    Acknowledged,
}

/// The host-supplied extension point (spec §9: "the only runtime
/// extension point of the engine"). Implementations block the calling
/// thread for however long they need (spec §5: ask dispatch is a
/// suspension point).
pub trait AskChannel: Send + Sync {
    fn ask(&self, request: Ask) -> Result<AskResult>;
}

/// Convenience for the common "fire an info/warn message, ignore the
/// reply" case.
pub fn notify(channel: &dyn AskChannel, ask: Ask) {
    let _ = channel.ask(ask);
}

pub fn ask_number(channel: &dyn AskChannel, query: impl Into<String>, spec: NumberSpec) -> Result<u64> {
    match channel.ask(Ask::Number {
        query: query.into(),
        spec,
    })? {
        AskResult::Number(n) | AskResult::NumberRelative(n) => Ok(n),
        _ => Err(PtableError::Other("ask host returned wrong result kind for Number".into())),
    }
}

pub fn ask_yesno(channel: &dyn AskChannel, query: impl Into<String>) -> Result<bool> {
    match channel.ask(Ask::YesNo { query: query.into() })? {
        AskResult::YesNo(b) => Ok(b),
        _ => Err(PtableError::Other("ask host returned wrong result kind for YesNo".into())),
    }
}
