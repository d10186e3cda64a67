//! Vote casting
//!
//! `cast_vote` arguments, in fixed order:
//! `[votingId, optionId, justification, memberId, memberName, memberCategory, memberOffice, memberChannel]`.
//!
//! Validation flow against the stored index:
//! 1. Poll lookup by id (missing → [`Error::PollNotFound`])
//! 2. Closed poll, or open poll past its deadline when deadlines are
//!    enforced → [`BusinessRejection::VotingClosed`]
//! 3. Member already in the voter list → [`BusinessRejection::MemberAlreadyVoted`]
//! 4. Option lookup (missing → [`Error::OptionNotFound`])
//! 5. Voter appended, vote appended to the option, counter bumped
//!
//! Business rejections are successful results: the host commits the
//! invocation and the caller inspects the payload. Only an accepted vote
//! writes the index; the vote path never closes polls itself.

use crate::args;
use crate::store::StateStore;
use crate::types::{AllVotings, Member, Timestamp, Vote};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const OPERATION: &str = "cast_vote";

const ARG_COUNT: usize = 8;

/// A vote refused for a business reason, reported as data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessRejection {
    /// The poll no longer accepts votes
    VotingClosed,
    /// The member id already appears among the poll's voters
    MemberAlreadyVoted,
}

impl BusinessRejection {
    /// Stable code carried in the rejection payload
    pub fn code(&self) -> &'static str {
        match self {
            Self::VotingClosed => "100",
            Self::MemberAlreadyVoted => "101",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::VotingClosed => "Voting is closed",
            Self::MemberAlreadyVoted => "Member already voted",
        }
    }

    /// Look up a rejection by its stable code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "100" => Some(Self::VotingClosed),
            "101" => Some(Self::MemberAlreadyVoted),
            _ => None,
        }
    }

    /// Encode as `{"error":{"code":..,"description":..}}`
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&RejectionBody::from(*self))?)
    }
}

/// Wire shape of a business rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionBody {
    pub error: RejectionDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionDetail {
    pub code: String,
    pub description: String,
}

impl From<BusinessRejection> for RejectionBody {
    fn from(rejection: BusinessRejection) -> Self {
        Self {
            error: RejectionDetail {
                code: rejection.code().to_string(),
                description: rejection.description().to_string(),
            },
        }
    }
}

impl RejectionBody {
    /// Recognize a rejection in an invocation payload
    pub fn from_payload(payload: &[u8]) -> Option<BusinessRejection> {
        let body: Self = serde_json::from_slice(payload).ok()?;
        BusinessRejection::from_code(&body.error.code)
    }
}

/// Result of a well-formed vote against an existing poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote recorded and persisted
    Accepted {
        voting_id: String,
        option_id: i64,
        member_id: String,
    },

    /// Vote refused, index unchanged
    Rejected(BusinessRejection),
}

impl VoteOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Invocation payload: nothing on success, the rejection body otherwise
    pub fn payload(&self) -> Result<Option<Vec<u8>>> {
        match self {
            Self::Accepted { .. } => Ok(None),
            Self::Rejected(rejection) => rejection.to_payload().map(Some),
        }
    }
}

/// Validated `cast_vote` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastVoteRequest {
    /// Canonical decimal form of the numeric poll id argument
    pub voting_id: String,
    pub option_id: i64,
    pub justification: String,
    pub member: Member,
}

impl CastVoteRequest {
    pub fn parse(args: &[String]) -> Result<Self> {
        args::at_least(OPERATION, args, ARG_COUNT)?;

        let voting_id = args::integer(args, 0)?;
        let option_id = args::integer(args, 1)?;
        let member_id = args::non_empty(args, 3)?;

        Ok(Self {
            voting_id: voting_id.to_string(),
            option_id,
            justification: args::text(args, 2).to_string(),
            member: Member {
                id: member_id.to_string(),
                name: args::text(args, 4).to_string(),
                category: args::text(args, 5).to_string(),
                office: args::text(args, 6).to_string(),
                channel: args::text(args, 7).to_string(),
            },
        })
    }
}

/// Apply a vote to the stored index
///
/// When `enforce_deadline` is set, a poll whose deadline passed before `now`
/// rejects the vote as closed even if its stored status is still open. The
/// stored status is left for a sweep to update.
pub fn cast_vote(
    state: &mut StateStore<'_>,
    request: &CastVoteRequest,
    now: Timestamp,
    enforce_deadline: bool,
) -> Result<VoteOutcome> {
    let mut index = state.load_index()?;
    let deadline = enforce_deadline.then_some(now);

    let outcome = apply_vote(&mut index, request, deadline)?;

    if outcome.is_accepted() {
        state.save_index(&index)?;
    }

    match &outcome {
        VoteOutcome::Accepted {
            voting_id,
            option_id,
            member_id,
        } => tracing::info!(
            "🗳️ Vote accepted: voting={}, option={}, member={}",
            voting_id,
            option_id,
            member_id
        ),
        VoteOutcome::Rejected(rejection) => tracing::warn!(
            voting_id = %request.voting_id,
            member_id = %request.member.id,
            code = rejection.code(),
            "Vote rejected: {}",
            rejection.description()
        ),
    }

    Ok(outcome)
}

/// Validate and apply a vote in memory
///
/// Only the first poll with a matching id is considered. A `deadline` of
/// `Some(now)` also treats expired polls as closed. Errors and rejections
/// leave the index untouched.
pub fn apply_vote(
    index: &mut AllVotings,
    request: &CastVoteRequest,
    deadline: Option<Timestamp>,
) -> Result<VoteOutcome> {
    let poll = index
        .find_mut(&request.voting_id)
        .ok_or_else(|| Error::PollNotFound {
            id: request.voting_id.clone(),
        })?;

    let expired = deadline.is_some_and(|now| poll.is_expired(now));
    if !poll.is_open() || expired {
        return Ok(VoteOutcome::Rejected(BusinessRejection::VotingClosed));
    }

    if poll.has_voted(&request.member.id) {
        return Ok(VoteOutcome::Rejected(BusinessRejection::MemberAlreadyVoted));
    }

    if poll.option(request.option_id).is_none() {
        return Err(Error::OptionNotFound {
            poll_id: poll.id.clone(),
            option_id: request.option_id,
        });
    }

    poll.voters.push(request.member.clone());
    if let Some(option) = poll.option_mut(request.option_id) {
        option.record(Vote {
            voter: request.member.clone(),
            justification: request.justification.clone(),
        });
    }

    Ok(VoteOutcome::Accepted {
        voting_id: poll.id.clone(),
        option_id: request.option_id,
        member_id: request.member.id.clone(),
    })
}
