//! Poll creation
//!
//! `create_poll` arguments: `[id, description, deadlineMinutes, option1, option2, ...]`.
//! The id and deadline must be integers, every text argument non-empty, and
//! at least two options are required. Option ids are assigned `1..=k` in
//! argument order.

use crate::args;
use crate::store::{OPTION_SNAPSHOT_KEY, POLL_SNAPSHOT_KEY, StateStore};
use crate::types::{Timestamp, Voting, VotingOption};
use crate::{Error, Result};

const OPERATION: &str = "create_poll";

/// id, description, deadline and two options
const MIN_ARGS: usize = 5;

const FIRST_OPTION: usize = 3;

/// Validated `create_poll` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePollRequest {
    /// Canonical decimal form of the numeric id argument
    pub id: String,
    pub description: String,
    pub deadline_minutes: i64,
    pub options: Vec<String>,
}

impl CreatePollRequest {
    /// Validate raw invocation arguments
    ///
    /// The id is normalized through integer parsing, so `"007"` and `"+7"`
    /// both address poll `"7"`.
    pub fn parse(args: &[String]) -> Result<Self> {
        args::at_least(OPERATION, args, MIN_ARGS)?;

        let id = args::integer(args, 0)?;
        let description = args::non_empty(args, 1)?;
        let deadline_minutes = args::integer(args, 2)?;

        let options = (FIRST_OPTION..args.len())
            .map(|index| args::non_empty(args, index).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: id.to_string(),
            description: description.to_string(),
            deadline_minutes,
            options,
        })
    }
}

/// Create a poll and append it to the index
///
/// Fails with [`Error::DuplicatePoll`] when the id is already taken; nothing
/// is written in that case. Returns the stored poll.
pub fn create_poll(
    state: &mut StateStore<'_>,
    request: &CreatePollRequest,
    now: Timestamp,
) -> Result<Voting> {
    let mut index = state.load_index()?;
    if index.contains(&request.id) {
        tracing::warn!(poll_id = %request.id, "Rejected poll creation: id already in use");
        return Err(Error::DuplicatePoll {
            id: request.id.clone(),
        });
    }

    let mut poll = Voting::open(
        request.id.as_str(),
        request.description.as_str(),
        request.deadline_minutes,
        now,
    );
    state.put_diagnostic(POLL_SNAPSHOT_KEY, &poll);

    for (option_id, description) in (1..).zip(&request.options) {
        let option = VotingOption::new(option_id, description.as_str());
        tracing::debug!(poll_id = %poll.id, option_id, description = %option.description, "Created option");
        state.put_diagnostic(OPTION_SNAPSHOT_KEY, &option);
        poll.options.push(option);
    }

    index.votings.push(poll.clone());
    state.save_index(&index)?;

    tracing::info!(
        "📋 Poll created: id={}, options={}, deadline={}min",
        poll.id,
        poll.options.len(),
        poll.voting_deadline_in_minutes
    );

    Ok(poll)
}
