//! Operation dispatch and ledger initialization
//!
//! The host delivers a function name and a list of string arguments. Each
//! invocation runs in its own [`Transaction`]: buffered writes reach the
//! backing store only when the operation returns `Ok`, so argument errors,
//! missing records and store failures leave no partial state behind.
//!
//! | Operation | Aliases | Payload |
//! |---|---|---|
//! | `initialize` | `init` | none |
//! | `create_poll` | `add_voting` | none |
//! | `cast_vote` | `vote` | none, or a business rejection body |
//! | `read` | `query` | stored bytes |
//! | `close_expired` | | JSON array of closed poll ids |

use crate::args;
use crate::config::LedgerConfig;
use crate::poll::{self, CreatePollRequest};
use crate::query::{self, ReadRequest};
use crate::store::{COUNTER_KEY, INDEX_KEY, KeyValueStore, StateStore, Transaction};
use crate::types::{AllVotings, Timestamp, Voting};
use crate::voting::{self, CastVoteRequest, VoteOutcome};
use crate::{Error, Result};
use chrono::Utc;
use std::fmt;
use uuid::Uuid;

/// Logical operations routed by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    CreatePoll,
    CastVote,
    Read,
    CloseExpired,
}

impl Operation {
    /// Resolve a function name, accepting the legacy aliases
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "initialize" | "init" => Ok(Self::Initialize),
            "create_poll" | "add_voting" => Ok(Self::CreatePoll),
            "cast_vote" | "vote" => Ok(Self::CastVote),
            "read" | "query" => Ok(Self::Read),
            "close_expired" => Ok(Self::CloseExpired),
            _ => Err(Error::UnknownOperation {
                name: name.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::CreatePoll => "create_poll",
            Self::CastVote => "cast_vote",
            Self::Read => "read",
            Self::CloseExpired => "close_expired",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated `initialize` arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitRequest {
    pub count: i64,
}

impl InitRequest {
    pub fn parse(args: &[String]) -> Result<Self> {
        args::exact("initialize", args, 1)?;
        Ok(Self {
            count: args::integer(args, 0)?,
        })
    }
}

/// Create the empty poll index and the diagnostic counter
///
/// Refuses to run when the index key already holds data, so a repeated
/// call cannot truncate existing polls.
pub fn initialize(state: &mut StateStore<'_>, request: &InitRequest) -> Result<()> {
    if state.get_raw(INDEX_KEY)?.is_some() {
        tracing::warn!("Refusing to re-initialize: index already present");
        return Err(Error::AlreadyInitialized {
            key: INDEX_KEY.to_string(),
        });
    }

    state.put_raw(COUNTER_KEY, request.count.to_string().into_bytes())?;
    state.save_index(&AllVotings::default())?;

    tracing::info!("🗳️  Ledger initialized: counter={}", request.count);
    Ok(())
}

/// Poll ledger bound to a backing store
pub struct Ledger<S: KeyValueStore> {
    store: S,
    config: LedgerConfig,
}

impl<S: KeyValueStore> Ledger<S> {
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Decode the stored index without sweeping
    ///
    /// Unlike the operation path, decode failures are reported.
    pub fn index(&self) -> Result<AllVotings> {
        match self.store.get(INDEX_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(AllVotings::default()),
        }
    }

    /// Route a named invocation using the current wall-clock time
    pub fn invoke(&mut self, function: &str, args: &[String]) -> Result<Option<Vec<u8>>> {
        self.invoke_at(function, args, Utc::now().timestamp_millis())
    }

    /// Route a named invocation at an explicit time
    pub fn invoke_at(
        &mut self,
        function: &str,
        args: &[String],
        now: Timestamp,
    ) -> Result<Option<Vec<u8>>> {
        let operation = Operation::from_name(function).inspect_err(|_| {
            tracing::warn!(function, "invoke did not find func");
        })?;

        let tx_id = Uuid::new_v4();
        let span = tracing::info_span!("invoke", %tx_id, operation = operation.as_str());
        let _entered = span.enter();
        tracing::debug!(args = args.len(), "invoke is running");

        let result = self.transact(|state, config| match operation {
            Operation::Initialize => {
                let request = InitRequest::parse(args)?;
                initialize(state, &request).map(|()| None)
            }
            Operation::CreatePoll => {
                let request = CreatePollRequest::parse(args)?;
                poll::create_poll(state, &request, now).map(|_| None)
            }
            Operation::CastVote => {
                let request = CastVoteRequest::parse(args)?;
                voting::cast_vote(state, &request, now, config.reject_expired_on_vote)?.payload()
            }
            Operation::Read => {
                let request = ReadRequest::parse(args)?;
                query::read(state, &request, now, config.close_expired_on_read).map(Some)
            }
            Operation::CloseExpired => {
                args::exact(operation.as_str(), args, 0)?;
                let closed = query::close_expired(state, now)?;
                Ok(Some(serde_json::to_vec(&closed)?))
            }
        });

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Invocation failed, writes discarded");
        }
        result
    }

    /// Typed `initialize`
    pub fn initialize(&mut self, count: i64) -> Result<()> {
        self.transact(|state, _| initialize(state, &InitRequest { count }))
    }

    /// Typed `create_poll` at an explicit time
    pub fn create_poll(&mut self, request: &CreatePollRequest, now: Timestamp) -> Result<Voting> {
        self.transact(|state, _| poll::create_poll(state, request, now))
    }

    /// Typed `cast_vote` at an explicit time
    pub fn cast_vote(&mut self, request: &CastVoteRequest, now: Timestamp) -> Result<VoteOutcome> {
        self.transact(|state, config| {
            voting::cast_vote(state, request, now, config.reject_expired_on_vote)
        })
    }

    /// Typed `read` at an explicit time
    pub fn read(&mut self, key: &str, now: Timestamp) -> Result<Vec<u8>> {
        let request = ReadRequest {
            key: key.to_string(),
        };
        self.transact(|state, config| {
            query::read(state, &request, now, config.close_expired_on_read)
        })
    }

    /// Typed `close_expired` at an explicit time
    pub fn close_expired(&mut self, now: Timestamp) -> Result<Vec<String>> {
        self.transact(|state, _| query::close_expired(state, now))
    }

    fn transact<T>(
        &mut self,
        operation: impl FnOnce(&mut StateStore<'_>, &LedgerConfig) -> Result<T>,
    ) -> Result<T> {
        let mut tx = Transaction::begin(&mut self.store);
        let value = {
            let mut state =
                StateStore::new(&mut tx).with_diagnostics(self.config.record_diagnostics);
            operation(&mut state, &self.config)?
        };

        let written = tx.commit()?;
        tracing::debug!(written, "Transaction committed");
        Ok(value)
    }
}
