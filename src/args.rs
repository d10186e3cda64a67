//! Invocation argument checks shared by every operation
//!
//! Arguments arrive as a flat list of strings. Positions in errors are
//! 1-based to match what callers see in their invocation payloads.

use crate::{Error, Result};

/// Require exactly `expected` arguments
pub fn exact(operation: &str, args: &[String], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::argument_count(operation, expected.to_string(), args.len()));
    }
    Ok(())
}

/// Require at least `minimum` arguments
pub fn at_least(operation: &str, args: &[String], minimum: usize) -> Result<()> {
    if args.len() < minimum {
        return Err(Error::argument_count(
            operation,
            format!("at least {minimum}"),
            args.len(),
        ));
    }
    Ok(())
}

/// Parse the argument at `index` as a signed integer
pub fn integer(args: &[String], index: usize) -> Result<i64> {
    args.get(index)
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or(Error::InvalidArgumentType { position: index + 1 })
}

/// Borrow the argument at `index`, rejecting empty strings
pub fn non_empty(args: &[String], index: usize) -> Result<&str> {
    match args.get(index) {
        Some(raw) if !raw.is_empty() => Ok(raw),
        _ => Err(Error::InvalidArgumentValue { position: index + 1 }),
    }
}

/// Borrow the argument at `index`, empty allowed
pub fn text(args: &[String], index: usize) -> &str {
    args.get(index).map(String::as_str).unwrap_or_default()
}
