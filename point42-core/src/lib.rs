//! Shared numeric types, tunable constants, and the engine error enum.
//!
//! This crate provides the foundation used by both `point42-engine` and
//! `point42-session`. It holds nothing that depends on expression trees or
//! game state, so it has zero dependencies.
//!
//! ## Core Types
//!
//! - [`Rational`] — an exact, always-reduced fraction; the value type carried
//!   by every expression tree node
//! - [`EngineError`] — the single error enum covering every failure mode in
//!   the engine, the parser, and the game session
//!
//! ## Constants
//!
//! [`MAX_LITERAL`], [`DEFAULT_TARGET`], [`MAX_SUBMISSION_LEN`],
//! [`PROBE_COUNT`], and [`PROBE_RANGE`] are the tunables named throughout the
//! spec; `point42-session::SessionConfig` exposes the per-session overridable
//! subset of these.
mod error;
mod rational;

pub use error::*;
pub use rational::*;

/// Largest integer literal a problem operand (or a parsed submission
/// literal) may take on.
pub const MAX_LITERAL: i64 = 13;

/// The puzzle's traditional target value.
pub const DEFAULT_TARGET: i64 = 42;

/// A normalized submission string at or beyond this length is rejected with
/// [`EngineError::TooLong`].
pub const MAX_SUBMISSION_LEN: usize = 30;

/// Number of random substitution tables used to fingerprint an expression
/// during equivalence classification.
pub const PROBE_COUNT: usize = 10;

/// Half-open range probe substitutions are drawn from.
pub const PROBE_RANGE: std::ops::Range<i64> = 500_000..1_000_000;

/// Default catalog difficulty window used by `generate_problem`'s
/// from-catalog mode.
pub const DEFAULT_MIN_SOLUTIONS: u32 = 1;
pub const DEFAULT_MAX_SOLUTIONS: u32 = 100;
