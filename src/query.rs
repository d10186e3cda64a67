//! Reads and deadline-based poll closure

use crate::args;
use crate::store::{INDEX_KEY, StateStore};
use crate::types::{AllVotings, Timestamp};
use crate::{Error, Result};

const OPERATION: &str = "read";

/// Validated `read` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub key: String,
}

impl ReadRequest {
    pub fn parse(args: &[String]) -> Result<Self> {
        args::exact(OPERATION, args, 1)?;
        Ok(Self {
            key: args::text(args, 0).to_string(),
        })
    }
}

/// Close every open poll whose deadline has passed at `now`
///
/// Returns the ids of the polls closed by this call, in index order.
pub fn close_expired_polls(index: &mut AllVotings, now: Timestamp) -> Vec<String> {
    let mut closed = Vec::new();
    for poll in index.votings.iter_mut() {
        if poll.is_open() && poll.is_expired(now) {
            poll.close();
            tracing::info!(
                poll_id = %poll.id,
                expired_at = poll.expires_at(),
                "⏰ Voting has expired, closing"
            );
            closed.push(poll.id.clone());
        }
    }
    closed
}

/// Run the closure sweep against the stored index
///
/// Writes only when at least one poll changed state.
pub fn close_expired(state: &mut StateStore<'_>, now: Timestamp) -> Result<Vec<String>> {
    let mut index = state.load_index()?;
    let closed = close_expired_polls(&mut index, now);
    if !closed.is_empty() {
        state.save_index(&index)?;
    }
    Ok(closed)
}

/// Return the bytes stored under the requested key
///
/// Other keys come back untouched. For the index key with `close_expired`
/// set, expired polls are closed and persisted first and the post-sweep
/// index is returned. An index that does not decode is served as stored.
pub fn read(
    state: &mut StateStore<'_>,
    request: &ReadRequest,
    now: Timestamp,
    close_expired: bool,
) -> Result<Vec<u8>> {
    let bytes = state
        .get_raw(&request.key)?
        .ok_or_else(|| Error::KeyNotFound {
            key: request.key.clone(),
        })?;

    if request.key != INDEX_KEY || !close_expired {
        return Ok(bytes);
    }

    let mut index: AllVotings = match serde_json::from_slice(&bytes) {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!(error = %e, "Index does not decode, skipping closure sweep");
            return Ok(bytes);
        }
    };

    if close_expired_polls(&mut index, now).is_empty() {
        return Ok(bytes);
    }

    let updated = serde_json::to_vec(&index)?;
    state.put_raw(INDEX_KEY, updated.clone())?;
    Ok(updated)
}
