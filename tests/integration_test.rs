//! Integration tests for poll creation, vote casting and reads

use ballot::{
    BusinessRejection, ErrorKind, Ledger, MemoryStore, Result, VoteOutcome,
    config::LedgerConfig,
    poll::CreatePollRequest,
    store::{COUNTER_KEY, INDEX_KEY, KeyValueStore},
    types::{AllVotings, MILLIS_PER_MINUTE},
    voting::{CastVoteRequest, RejectionBody},
};

const START: i64 = 1_700_000_000_000;

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn vote_args(poll: &str, option: &str, member: &str) -> Vec<String> {
    args(&[poll, option, "justified", member, "Name", "Cat", "Office", "chat"])
}

fn ready_ledger() -> Result<Ledger<MemoryStore>> {
    let mut ledger = Ledger::new(MemoryStore::new(), LedgerConfig::for_testing());
    ledger.invoke_at("init", &args(&["0"]), START)?;
    Ok(ledger)
}

fn read_index(ledger: &mut Ledger<MemoryStore>, now: i64) -> Result<AllVotings> {
    let bytes = ledger.read(INDEX_KEY, now)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_option_ids_follow_argument_order() -> Result<()> {
    println!("📋 Testing option numbering...");

    for k in 2..=6 {
        let mut ledger = ready_ledger()?;
        let descriptions: Vec<String> = (0..k).map(|i| format!("choice {i}")).collect();
        let mut raw = args(&["10", "Numbering", "30"]);
        raw.extend(descriptions.iter().cloned());

        ledger.invoke_at("create_poll", &raw, START)?;

        let index = read_index(&mut ledger, START)?;
        let poll = index.find("10").unwrap();
        assert_eq!(poll.options.len(), k);
        for (position, option) in poll.options.iter().enumerate() {
            assert_eq!(option.id, position as i64 + 1);
            assert_eq!(option.description, descriptions[position]);
            assert_eq!(option.number_of_votes, 0);
            assert!(option.votes.is_empty());
        }
    }

    println!("✅ Options numbered 1..k in argument order");
    Ok(())
}

#[tokio::test]
async fn test_distinct_voters_keep_tallies_consistent() -> Result<()> {
    println!("🗳️ Testing tally consistency across many voters...");

    let mut ledger = ready_ledger()?;
    ledger.invoke_at("create_poll", &args(&["1", "Budget", "60", "A", "B", "C"]), START)?;

    let voters = 25;
    for i in 0..voters {
        let option = (i % 3 + 1).to_string();
        let payload =
            ledger.invoke_at("vote", &vote_args("1", &option, &format!("m{i}")), START + i)?;
        assert!(payload.is_none(), "vote {i} should be accepted");
    }

    let index = read_index(&mut ledger, START + 100)?;
    let poll = index.find("1").unwrap();
    let tally: i64 = poll.options.iter().map(|o| o.number_of_votes).sum();

    assert_eq!(poll.voters.len(), voters as usize);
    assert_eq!(tally, voters);
    assert!(poll.is_consistent());
    assert_eq!(poll.option(1).unwrap().number_of_votes, 9);
    assert_eq!(poll.option(2).unwrap().number_of_votes, 8);
    assert_eq!(poll.option(3).unwrap().number_of_votes, 8);

    // votes keep cast order
    let first_option = poll.option(1).unwrap();
    assert_eq!(first_option.votes[0].voter.id, "m0");
    assert_eq!(first_option.votes[1].voter.id, "m3");

    println!("✅ Voter count equals tally sum");
    Ok(())
}

#[tokio::test]
async fn test_repeat_vote_returns_rejection_body() -> Result<()> {
    println!("🚫 Testing double voting prevention...");

    let mut ledger = ready_ledger()?;
    ledger.invoke_at(
        "create_poll",
        &args(&["1", "Annual Budget", "60", "Option A", "Option B"]),
        START,
    )?;
    let first = args(&["1", "1", "looks good", "m1", "Alice", "Eng", "HQ", "web"]);
    ledger.invoke_at("cast_vote", &first, START)?;
    let before = ledger.store().get(INDEX_KEY)?;

    let payload = ledger
        .invoke_at("cast_vote", &first, START + 10)?
        .expect("rejection is returned as payload");

    assert_eq!(
        RejectionBody::from_payload(&payload),
        Some(BusinessRejection::MemberAlreadyVoted)
    );
    let body: serde_json::Value = serde_json::from_slice(&payload)?;
    assert_eq!(body["error"]["code"], "101");
    assert_eq!(body["error"]["description"], "Member already voted");
    assert_eq!(ledger.store().get(INDEX_KEY)?, before);

    // switching option does not help either
    let other_option = args(&["1", "2", "changed my mind", "m1", "Alice", "Eng", "HQ", "web"]);
    let again = ledger.invoke_at("cast_vote", &other_option, START + 20)?.unwrap();
    assert_eq!(
        RejectionBody::from_payload(&again),
        Some(BusinessRejection::MemberAlreadyVoted)
    );
    assert_eq!(ledger.store().get(INDEX_KEY)?, before);

    println!("✅ Second vote rejected, index unchanged");
    Ok(())
}

#[tokio::test]
async fn test_closed_poll_rejects_votes() -> Result<()> {
    println!("🔒 Testing closed poll rejection...");

    let mut ledger = ready_ledger()?;
    ledger.invoke_at("create_poll", &args(&["1", "Quick", "5", "A", "B"]), START)?;
    ledger.invoke_at("cast_vote", &vote_args("1", "1", "m1"), START)?;

    let after_deadline = START + 5 * MILLIS_PER_MINUTE + 1;
    let closed = ledger.close_expired(after_deadline)?;
    assert_eq!(closed, vec!["1".to_string()]);
    let before = ledger.store().get(INDEX_KEY)?;

    let payload = ledger
        .invoke_at("cast_vote", &vote_args("1", "2", "m2"), after_deadline)?
        .unwrap();

    assert_eq!(
        RejectionBody::from_payload(&payload),
        Some(BusinessRejection::VotingClosed)
    );
    assert_eq!(ledger.store().get(INDEX_KEY)?, before);

    println!("✅ Closed poll rejected the vote");
    Ok(())
}

#[tokio::test]
async fn test_vote_after_deadline_is_rejected() -> Result<()> {
    println!("⏰ Testing deadline enforcement at vote time...");

    let mut ledger = ready_ledger()?;
    ledger.invoke_at("create_poll", &args(&["3", "Short", "1", "A", "B"]), START)?;
    let before = ledger.store().get(INDEX_KEY)?;

    let request = CastVoteRequest::parse(&vote_args("3", "1", "late"))?;
    let outcome = ledger.cast_vote(&request, START + 2 * MILLIS_PER_MINUTE)?;

    assert_eq!(outcome, VoteOutcome::Rejected(BusinessRejection::VotingClosed));
    assert_eq!(ledger.store().get(INDEX_KEY)?, before);

    // the next read sweeps the expired poll closed
    let index = read_index(&mut ledger, START + 2 * MILLIS_PER_MINUTE)?;
    let poll = index.find("3").unwrap();
    assert!(!poll.is_open());
    assert!(poll.voters.is_empty());

    println!("✅ Expired poll rejected the vote without writes");
    Ok(())
}

#[tokio::test]
async fn test_rejected_vote_leaves_other_expired_polls_alone() -> Result<()> {
    println!("🧊 Testing rejected votes next to an expired poll...");

    let mut ledger = ready_ledger()?;
    ledger.invoke_at("create_poll", &args(&["1", "Long", "600", "A", "B"]), START)?;
    ledger.invoke_at("create_poll", &args(&["2", "Short", "1", "A", "B"]), START)?;
    ledger.invoke_at("vote", &vote_args("1", "1", "m1"), START)?;
    let before = ledger.index()?;

    let later = START + 5 * MILLIS_PER_MINUTE;
    let repeat = ledger.invoke_at("vote", &vote_args("1", "2", "m1"), later)?.unwrap();
    assert_eq!(
        RejectionBody::from_payload(&repeat),
        Some(BusinessRejection::MemberAlreadyVoted)
    );
    assert_eq!(ledger.index()?, before);

    let closed = ledger.invoke_at("vote", &vote_args("2", "1", "m2"), later)?.unwrap();
    assert_eq!(
        RejectionBody::from_payload(&closed),
        Some(BusinessRejection::VotingClosed)
    );
    assert_eq!(ledger.index()?, before);
    assert!(ledger.index()?.find("2").unwrap().is_open());

    // an accepted vote on the live poll touches only that poll
    assert!(ledger.invoke_at("vote", &vote_args("1", "1", "m3"), later)?.is_none());
    let after = ledger.index()?;
    assert!(after.find("2").unwrap().is_open());
    assert_eq!(after.find("1").unwrap().voters.len(), 2);

    println!("✅ Vote path changed nothing beyond the accepted vote");
    Ok(())
}

#[tokio::test]
async fn test_deadline_sweep_can_be_disabled() -> Result<()> {
    let config = LedgerConfig {
        close_expired_on_read: false,
        reject_expired_on_vote: false,
        ..LedgerConfig::for_testing()
    };
    let mut ledger = Ledger::new(MemoryStore::new(), config);
    ledger.initialize(0)?;
    ledger.invoke_at("create_poll", &args(&["3", "Short", "1", "A", "B"]), START)?;

    let later = START + 10 * MILLIS_PER_MINUTE;
    let payload = ledger.invoke_at("vote", &vote_args("3", "1", "m1"), later)?;
    assert!(payload.is_none());

    let index = read_index(&mut ledger, later)?;
    assert!(index.find("3").unwrap().is_open());
    Ok(())
}

#[tokio::test]
async fn test_read_paths() -> Result<()> {
    println!("🔍 Testing reads...");

    let mut ledger = ready_ledger()?;

    let missing = ledger.invoke_at("read", &args(&["never_written"]), START).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::KeyNotFound);
    assert!(missing.to_string().contains("never_written"));

    let counter = ledger.invoke_at("query", &args(&[COUNTER_KEY]), START)?;
    assert_eq!(counter, Some(b"0".to_vec()));

    let wrong_arity = ledger.invoke_at("read", &args(&["a", "b"]), START).unwrap_err();
    assert_eq!(wrong_arity.kind(), ErrorKind::InvalidArgumentCount);

    let request = CreatePollRequest::parse(&args(&["4", "Roundtrip", "60", "X", "Y"]))?;
    let created = ledger.create_poll(&request, START)?;
    let index = read_index(&mut ledger, START + 1)?;
    assert_eq!(index.find("4"), Some(&created));
    assert_eq!(index, ledger.index()?);

    println!("✅ Reads behave as expected");
    Ok(())
}

#[tokio::test]
async fn test_redesigned_guards() -> Result<()> {
    println!("🛡️ Testing id uniqueness and option existence guards...");

    let mut ledger = ready_ledger()?;
    ledger.invoke_at("create_poll", &args(&["1", "Budget", "60", "A", "B"]), START)?;

    let duplicate = ledger
        .invoke_at("create_poll", &args(&["01", "Other", "60", "C", "D"]), START)
        .unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::DuplicatePoll);

    let before = ledger.store().get(INDEX_KEY)?;
    let bad_option = ledger
        .invoke_at("cast_vote", &vote_args("1", "7", "m1"), START)
        .unwrap_err();
    assert_eq!(bad_option.kind(), ErrorKind::OptionNotFound);
    assert_eq!(ledger.store().get(INDEX_KEY)?, before);

    let missing_poll = ledger
        .invoke_at("cast_vote", &vote_args("2", "1", "m1"), START)
        .unwrap_err();
    assert_eq!(missing_poll.kind(), ErrorKind::PollNotFound);

    // m1 can still vote since the failed attempt recorded nothing
    assert!(ledger.invoke_at("cast_vote", &vote_args("1", "2", "m1"), START)?.is_none());

    println!("✅ Guards enforced");
    Ok(())
}

#[tokio::test]
async fn test_argument_errors_abort_before_writes() -> Result<()> {
    let mut ledger = ready_ledger()?;
    let before = ledger.store().clone();

    let cases = vec![
        ("create_poll", args(&["1", "Budget", "60", "A"]), ErrorKind::InvalidArgumentCount),
        ("create_poll", args(&["one", "Budget", "60", "A", "B"]), ErrorKind::InvalidArgumentType),
        ("create_poll", args(&["1", "Budget", "60", "", "B"]), ErrorKind::InvalidArgumentValue),
        ("cast_vote", args(&["1", "1", "j", "m1"]), ErrorKind::InvalidArgumentCount),
        ("cast_vote", vote_args("1", "first", "m1"), ErrorKind::InvalidArgumentType),
        ("cast_vote", vote_args("1", "1", ""), ErrorKind::InvalidArgumentValue),
        ("launch", args(&[]), ErrorKind::UnknownOperation),
    ];

    for (function, raw, expected) in cases {
        let err = ledger.invoke_at(function, &raw, START).unwrap_err();
        assert_eq!(err.kind(), expected, "{function} {raw:?}");
        assert!(err.is_argument_error() || expected == ErrorKind::UnknownOperation);
    }

    for key in [INDEX_KEY, COUNTER_KEY] {
        assert_eq!(ledger.store().get(key)?, before.get(key)?);
    }
    assert_eq!(ledger.store().len(), before.len());
    Ok(())
}
