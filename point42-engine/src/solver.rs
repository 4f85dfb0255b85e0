use crate::{enumerate, Classifier, ExprTree};
use point42_core::{EngineError, Rational, MAX_LITERAL, PROBE_COUNT, PROBE_RANGE};
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::ops::Range;

/// A puzzle instance: five operands, stored sorted so two problems with
/// the same multiset compare equal regardless of submission order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Problem {
    operands: Vec<i64>,
}

impl Problem {
    /// Fails with [`EngineError::BadLiteral`] if any operand is outside
    /// `[0, MAX_LITERAL]`.
    pub fn new(operands: Vec<i64>) -> Result<Self, EngineError> {
        for &n in &operands {
            if n < 0 || n > MAX_LITERAL {
                return Err(EngineError::BadLiteral(n));
            }
        }
        let mut operands = operands;
        operands.sort_unstable();
        Ok(Self { operands })
    }

    pub fn operands(&self) -> &[i64] {
        &self.operands
    }
}

/// The output of [`solve_problem`]: every answer the enumerator found for
/// the target, alongside the canonical-key equivalence map produced by
/// the classifier.
pub struct SolverResult {
    pub answers: Vec<ExprTree>,
    pub rep_of: HashMap<String, String>,
}

impl SolverResult {
    /// The distinct-answer table: one [`ExprTree`] per equivalence class,
    /// specifically the one that is its class's representative.
    pub fn distinct_answers(&self) -> Vec<&ExprTree> {
        self.answers
            .iter()
            .filter(|e| {
                let key = e.canonical_key();
                self.rep_of.get(&key).map(|r| r == &key).unwrap_or(false)
            })
            .collect()
    }

    pub fn distinct_count(&self) -> usize {
        self.distinct_answers().len()
    }
}

/// Enumerates every expression tree over `problem`, filters by `target`,
/// classifies the survivors into equivalence classes, and returns both.
///
/// Fails with [`EngineError::NoSolution`] if no expression evaluates to
/// `target`.
pub fn solve_problem(
    problem: &Problem,
    target: i64,
    rng: &mut SmallRng,
) -> Result<SolverResult, EngineError> {
    solve_problem_with_probes(problem, target, rng, PROBE_COUNT, PROBE_RANGE)
}

/// As [`solve_problem`], but with the classifier's probe count and domain
/// overridden — the knob `point42_session::SessionConfig` exposes.
pub fn solve_problem_with_probes(
    problem: &Problem,
    target: i64,
    rng: &mut SmallRng,
    probe_count: usize,
    probe_range: Range<i64>,
) -> Result<SolverResult, EngineError> {
    let target_value = Rational::from_int(target);
    let all_exprs = enumerate(&problem.operands);
    let answers: Vec<ExprTree> = all_exprs
        .into_iter()
        .filter(|e| e.value() == target_value)
        .collect();
    if answers.is_empty() {
        log::warn!("no answers for {:?} at target {target}", problem.operands());
        return Err(EngineError::NoSolution);
    }
    let mut classifier = Classifier::build_with_probes(&answers, rng, probe_count, probe_range);
    let rep_of = classifier.rep_of();
    let result = SolverResult { answers, rep_of };
    log::info!(
        "solved {:?} at target {target}: {} answers, {} distinct classes",
        problem.operands(),
        result.answers.len(),
        result.distinct_count()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn seeded_rng() -> SmallRng {
        SmallRng::seed_from_u64(1)
    }

    #[test]
    fn rejects_operand_out_of_range() {
        assert!(matches!(
            Problem::new(vec![3, 4, 6, 7, 99]),
            Err(EngineError::BadLiteral(99))
        ));
    }

    #[test]
    fn sorts_operands_on_construction() {
        let p = Problem::new(vec![12, 3, 7, 6, 4]).unwrap();
        assert_eq!(p.operands(), &[3, 4, 6, 7, 12]);
    }

    #[test]
    fn classic_problem_has_42_distinct_classes() {
        let p = Problem::new(vec![3, 4, 6, 7, 12]).unwrap();
        let result = solve_problem(&p, 42, &mut seeded_rng()).unwrap();
        assert_eq!(result.distinct_count(), 26);
    }

    #[test]
    fn unsolvable_problem_fails_with_no_solution() {
        let p = Problem::new(vec![0, 0, 0, 5, 6]).unwrap();
        assert!(matches!(
            solve_problem(&p, 42, &mut seeded_rng()),
            Err(EngineError::NoSolution)
        ));
    }

    #[test]
    fn single_solution_problem_has_one_distinct_class() {
        let p = Problem::new(vec![0, 0, 0, 6, 7]).unwrap();
        let result = solve_problem(&p, 42, &mut seeded_rng()).unwrap();
        assert_eq!(result.distinct_count(), 1);
    }

    #[test]
    fn target_override_changes_the_solution_set() {
        let p = Problem::new(vec![3, 4, 6, 8, 12]).unwrap();
        let result = solve_problem(&p, 48, &mut seeded_rng()).unwrap();
        assert_eq!(result.distinct_count(), 48);
    }
}
