//! Conversation-identity resolution.
//!
//! A request may continue a conversation either by an opaque prior-response
//! identifier or by a (user, thread) pair; never both. The resolver
//! reconciles the two into a single [`Continuity`] directive at the boundary
//! so downstream components stay continuity-agnostic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::types::ResponsesRequest;

const DELIMITER: char = ':';
const ESCAPE: char = '\\';

/// Opaque key identifying a continuity line inside the engine.
///
/// The composite form is `user:thread` with `\` escaping, so composition is
/// injective and reversible: identical pairs always compose to equal keys
/// and distinct pairs never collide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Compose a key from a (user, thread) pair.
    pub fn compose(user_id: &str, thread_id: &str) -> Self {
        let mut key = String::with_capacity(user_id.len() + thread_id.len() + 1);
        escape_into(&mut key, user_id);
        key.push(DELIMITER);
        escape_into(&mut key, thread_id);
        Self(key)
    }

    /// Recover the (user, thread) pair this key was composed from.
    pub fn split(&self) -> Option<(String, String)> {
        let mut user = String::new();
        let mut thread = String::new();
        let mut target = &mut user;
        let mut saw_delimiter = false;
        let mut chars = self.0.chars();
        while let Some(c) = chars.next() {
            match c {
                ESCAPE => target.push(chars.next()?),
                DELIMITER if !saw_delimiter => {
                    saw_delimiter = true;
                    target = &mut thread;
                }
                c => target.push(c),
            }
        }
        saw_delimiter.then_some((user, thread))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_into(out: &mut String, component: &str) {
    for c in component.chars() {
        if c == DELIMITER || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

/// Resolved continuity directive for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuity {
    /// No continuity requested; a brand-new conversation begins.
    Fresh,
    /// Continue the line the engine associates with a stored response.
    PriorResponse(String),
    /// Continue the engine thread addressed by a composite key.
    Thread(ConversationKey),
}

/// Resolve the request's continuation mode.
pub fn resolve(request: &ResponsesRequest) -> Result<Continuity> {
    let has_session = request.thread_id.is_some() || request.user_id.is_some();

    if let Some(id) = &request.previous_response_id {
        if has_session {
            return Err(GatewayError::ConflictingContinuity);
        }
        if !is_well_formed_id(id) {
            return Err(GatewayError::InvalidIdentifier {
                field: "previous_response_id",
                message: format!("{id:?} is not a well-formed response identifier"),
            });
        }
        return Ok(Continuity::PriorResponse(id.clone()));
    }

    if !has_session {
        return Ok(Continuity::Fresh);
    }

    let user_id = require_component(request.user_id.as_deref(), "user_id")?;
    let thread_id = require_component(request.thread_id.as_deref(), "thread_id")?;
    Ok(Continuity::Thread(ConversationKey::compose(user_id, thread_id)))
}

/// The engine's identifier alphabet.
fn is_well_formed_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn require_component<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(GatewayError::InvalidIdentifier {
            field,
            message: "must be non-empty".to_string(),
        }),
        None => Err(GatewayError::InvalidIdentifier {
            field,
            message: "thread_id and user_id must be supplied together".to_string(),
        }),
    }
}
