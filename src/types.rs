//! # Core Types for the Ballot Ledger
//!
//! This module defines the records persisted in the key-value store. The
//! whole poll collection lives under a single index key as one
//! [`AllVotings`] value; every mutation reads it wholesale, changes one
//! [`Voting`] and writes it back.
//!
//! ## Ownership
//!
//! - [`AllVotings`] owns every [`Voting`]
//! - a [`Voting`] owns its [`VotingOption`]s and its voter list
//! - a [`VotingOption`] owns its [`Vote`]s
//! - [`Vote::voter`] is an independent copy of the [`Member`], not a
//!   reference into [`Voting::voters`]
//!
//! ## Record layout
//!
//! Field names are fixed by the stored JSON layout and must not be renamed:
//! external audit tooling inspects these records directly.
//!
//! ```rust
//! use ballot::types::{AllVotings, Voting, VotingOption};
//!
//! let mut poll = Voting::open("1", "Annual Budget", 60, 1_700_000_000_000);
//! poll.options.push(VotingOption::new(1, "Option A"));
//! poll.options.push(VotingOption::new(2, "Option B"));
//!
//! let mut index = AllVotings::default();
//! index.votings.push(poll);
//!
//! assert!(index.find("1").is_some_and(|p| p.is_open()));
//! assert!(index.find("1").is_some_and(|p| p.is_consistent()));
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Conversion factor for poll deadlines
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// Identity of a participant casting a vote
///
/// Accepted as supplied data; only `id` carries meaning (one vote per id
/// per poll). The remaining fields are display metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub channel: String,
    pub category: String,
    pub office: String,
}

/// One accepted ballot, owned by the option it was cast for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vote {
    pub voter: Member,
    pub justification: String,
}

/// One selectable choice within a poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingOption {
    /// Sequential id within the poll, starting at 1
    pub id: i64,

    pub description: String,

    /// Tally counter, kept equal to `votes.len()`
    pub number_of_votes: i64,

    /// Accepted votes in cast order
    #[serde(deserialize_with = "nullable_vec")]
    pub votes: Vec<Vote>,
}

impl VotingOption {
    /// Create an option with an empty tally
    pub fn new(id: i64, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            number_of_votes: 0,
            votes: Vec::new(),
        }
    }

    /// Append a vote and bump the counter
    pub fn record(&mut self, vote: Vote) {
        self.votes.push(vote);
        self.number_of_votes += 1;
    }

    /// Counter matches the vote list
    pub fn is_consistent(&self) -> bool {
        usize::try_from(self.number_of_votes).is_ok_and(|n| n == self.votes.len())
    }
}

/// A poll: one ballot item with options, a deadline and an open flag
///
/// # Lifecycle
///
/// Polls are created open (`status = true`) with `start_voting_timestamp`
/// set to the creation time. A poll closes once, either through the
/// deadline sweep or by an administrator; a closed poll never reopens and
/// accepts no further votes.
///
/// # Invariants
///
/// - option ids are `1..=options.len()` in creation order
/// - `voters.len()` equals the sum of all option vote lists
/// - every option's `number_of_votes` equals its vote list length
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Voting {
    pub id: String,
    pub description: String,

    /// One entry per accepted voter, in cast order
    #[serde(deserialize_with = "nullable_vec")]
    pub voters: Vec<Member>,

    #[serde(deserialize_with = "nullable_vec")]
    pub options: Vec<VotingOption>,

    /// Open = true, Closed = false
    pub status: bool,

    pub voting_deadline_in_minutes: i64,

    pub start_voting_timestamp: Timestamp,
}

impl Voting {
    /// Create an open poll with no options yet
    pub fn open(
        id: impl Into<String>,
        description: impl Into<String>,
        deadline_minutes: i64,
        started_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            voters: Vec::new(),
            options: Vec::new(),
            status: true,
            voting_deadline_in_minutes: deadline_minutes,
            start_voting_timestamp: started_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status
    }

    /// Mark the poll closed. Returns `true` if it was open before.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.status, false)
    }

    /// Instant after which the poll should no longer accept votes
    pub fn expires_at(&self) -> Timestamp {
        self.start_voting_timestamp
            .saturating_add(self.voting_deadline_in_minutes.saturating_mul(MILLIS_PER_MINUTE))
    }

    /// Deadline has strictly passed at `now`
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at()
    }

    pub fn has_voted(&self, member_id: &str) -> bool {
        self.voters.iter().any(|voter| voter.id == member_id)
    }

    pub fn option(&self, option_id: i64) -> Option<&VotingOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    pub fn option_mut(&mut self, option_id: i64) -> Option<&mut VotingOption> {
        self.options.iter_mut().find(|option| option.id == option_id)
    }

    /// Sum of the option vote lists
    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|option| option.votes.len()).sum()
    }

    /// Check the tally invariants
    pub fn is_consistent(&self) -> bool {
        self.options.iter().all(VotingOption::is_consistent)
            && self.voters.len() == self.total_votes()
    }
}

/// The poll index, persisted under a single well-known key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllVotings {
    #[serde(deserialize_with = "nullable_vec")]
    pub votings: Vec<Voting>,
}

impl AllVotings {
    /// First poll with the given id
    pub fn find(&self, id: &str) -> Option<&Voting> {
        self.votings.iter().find(|voting| voting.id == id)
    }

    /// First poll with the given id, mutably
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Voting> {
        self.votings.iter_mut().find(|voting| voting.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.votings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votings.is_empty()
    }
}

// Records written by older tooling encode empty lists as `null`.
fn nullable_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
