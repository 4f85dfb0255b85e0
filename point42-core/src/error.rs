use std::fmt;

/// Every failure mode produced by the expression engine, the parser, and the
/// game session.
///
/// All variants are precise, non-exceptional outcomes — a [`GameSession`]
/// (see `point42-session`) never uses an `Err` return for control flow
/// internally, and no variant here mutates session state; it is purely a
/// reportable result.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Operation not allowed in the session's current state.
    WrongState,
    /// The parser rejected the input (empty, unbalanced parens, unary sign,
    /// float literal, unsupported operator, or other non-arithmetic text).
    Syntax(String),
    /// Normalized submission length reached [`crate::MAX_SUBMISSION_LEN`].
    TooLong,
    /// A literal fell outside `[0, MAX_LITERAL]`.
    BadLiteral(i64),
    /// Division by zero, at construction or evaluation time.
    DivByZero,
    /// The expression evaluated to something other than the target.
    WrongValue(String),
    /// The expression's literal multiset didn't match the problem.
    WrongNumbers(Vec<i64>),
    /// The expression is equivalent to a previously accepted submission;
    /// carries that submission's raw text.
    Duplicate(String),
    /// Problem generation produced no answers (explicit problem with no
    /// solution, or an empty catalog difficulty window).
    NoSolution,
    /// The generation request named an unsupported method.
    BadMethod(String),
    /// The generation request's arguments were malformed (e.g. mismatched
    /// weight vector length, empty catalog).
    BadArguments(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongState => write!(f, "operation not allowed in the current session state"),
            Self::Syntax(info) => write!(f, "could not parse expression: {info}"),
            Self::TooLong => write!(
                f,
                "submission length reached the {}-character limit",
                crate::MAX_SUBMISSION_LEN
            ),
            Self::BadLiteral(n) => write!(
                f,
                "literal {n} is outside the allowed range [0, {}]",
                crate::MAX_LITERAL
            ),
            Self::DivByZero => write!(f, "division by zero"),
            Self::WrongValue(actual) => write!(f, "expression evaluated to {actual}, not the target"),
            Self::WrongNumbers(actual) => {
                write!(f, "submitted numbers {actual:?} don't match the problem")
            }
            Self::Duplicate(original) => {
                write!(f, "equivalent to the already-accepted answer {original:?}")
            }
            Self::NoSolution => write!(f, "no solution exists for this problem"),
            Self::BadMethod(method) => write!(f, "unsupported generation method: {method}"),
            Self::BadArguments(info) => write!(f, "malformed generation arguments: {info}"),
        }
    }
}

impl std::error::Error for EngineError {}
