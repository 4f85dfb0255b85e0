use crate::{Catalog, SessionConfig};
use point42_core::EngineError;
use point42_engine::{parse, solve_problem_with_probes, Problem, SolverResult};
use rand::rngs::SmallRng;
use rand::Rng;
use std::time::{Duration, Instant};

/// One accepted submission: the raw text as the player typed it, the
/// canonical key it normalized to, who submitted it, and how long after
/// the previous acceptance (or session start) it landed.
#[derive(Debug, Clone, PartialEq)]
pub struct Acceptance {
    pub raw_text: String,
    pub canonical_key: String,
    pub player_id: i64,
    pub interval: Duration,
}

/// How a problem should be produced by [`GameSession::generate_problem`].
pub enum GenerationSpec<'a, C: Catalog> {
    /// Sample uniformly from `catalog` among problems whose solution count
    /// falls in `[min_solutions, max_solutions]`.
    FromCatalogDifficulty {
        catalog: &'a C,
        min_solutions: u32,
        max_solutions: u32,
    },
    /// Use exactly this multiset; fails with [`EngineError::NoSolution`] if
    /// it has none.
    Explicit { operands: Vec<i64> },
    /// Sample from `catalog`'s entries with cumulative-distribution
    /// inversion over a caller-supplied weight vector aligned with
    /// `catalog.entries()`'s order.
    FromProbability { catalog: &'a C, weights: Vec<f64> },
}

enum SessionState {
    Idle,
    Armed {
        problem: Problem,
        solver_result: SolverResult,
    },
    Playing {
        problem: Problem,
        solver_result: SolverResult,
        accepted: Vec<Acceptance>,
        start_time: Instant,
        last_elapsed: Duration,
    },
}

/// The `Idle | Playing` state machine wrapping a problem solver.
///
/// `Idle` covers both "nothing generated yet" and "a problem is generated
/// and armed, waiting for `start()`" — only `start()`/`generate_problem()`
/// distinguish the two, matching `point42_engine::Problem`'s role as the
/// session's one piece of pre-game state.
pub struct GameSession {
    config: SessionConfig,
    rng: SmallRng,
    state: SessionState,
}

impl GameSession {
    pub fn new(config: SessionConfig, rng: SmallRng) -> Self {
        Self {
            config,
            rng,
            state: SessionState::Idle,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, SessionState::Playing { .. })
    }

    /// Generates (and arms) a problem. Only allowed when not playing.
    pub fn generate_problem<C: Catalog>(
        &mut self,
        spec: GenerationSpec<'_, C>,
    ) -> Result<(), EngineError> {
        if self.is_playing() {
            return Err(EngineError::WrongState);
        }
        let operands = match spec {
            GenerationSpec::FromCatalogDifficulty {
                catalog,
                min_solutions,
                max_solutions,
            } => {
                let candidates = catalog.in_difficulty_window(min_solutions, max_solutions);
                if candidates.is_empty() {
                    return Err(EngineError::NoSolution);
                }
                let idx = self.rng.random_range(0..candidates.len());
                candidates[idx].operands().to_vec()
            }
            GenerationSpec::Explicit { operands } => operands,
            GenerationSpec::FromProbability { catalog, weights } => {
                let entries = catalog.entries();
                if weights.len() != entries.len() {
                    return Err(EngineError::BadArguments(format!(
                        "weight vector length {} does not match catalog size {}",
                        weights.len(),
                        entries.len()
                    )));
                }
                if entries.is_empty() {
                    return Err(EngineError::BadArguments("catalog is empty".into()));
                }
                let total: f64 = weights.iter().sum();
                if total <= 0.0 {
                    return Err(EngineError::BadArguments("weights sum to zero".into()));
                }
                let pick = self.rng.random::<f64>() * total;
                let mut cumulative = 0.0;
                let mut chosen = entries.len() - 1;
                for (i, w) in weights.iter().enumerate() {
                    cumulative += w;
                    if pick < cumulative {
                        chosen = i;
                        break;
                    }
                }
                entries[chosen].0.operands().to_vec()
            }
        };

        let problem = Problem::new(operands)?;
        let solver_result = solve_problem_with_probes(
            &problem,
            self.config.target,
            &mut self.rng,
            self.config.probe_count,
            self.config.probe_range.clone(),
        )?;
        log::info!(
            "armed problem {:?}, {} distinct solutions",
            problem.operands(),
            solver_result.distinct_count()
        );
        self.state = SessionState::Armed {
            problem,
            solver_result,
        };
        Ok(())
    }

    /// Starts play on the armed problem. Fails with [`EngineError::WrongState`]
    /// if not idle-and-armed.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let armed = std::mem::replace(&mut self.state, SessionState::Idle);
        match armed {
            SessionState::Armed {
                problem,
                solver_result,
            } => {
                log::info!("session started on {:?}", problem.operands());
                self.state = SessionState::Playing {
                    problem,
                    solver_result,
                    accepted: Vec::new(),
                    start_time: Instant::now(),
                    last_elapsed: Duration::ZERO,
                };
                Ok(())
            }
            other => {
                self.state = other;
                Err(EngineError::WrongState)
            }
        }
    }

    /// Stops play, returning total elapsed time.
    pub fn stop(&mut self) -> Result<Duration, EngineError> {
        let elapsed = self.elapsed_time()?;
        match &self.state {
            SessionState::Playing { .. } => {
                log::info!("session stopped after {elapsed:?}");
                self.state = SessionState::Idle;
                Ok(elapsed)
            }
            _ => Err(EngineError::WrongState),
        }
    }

    pub fn elapsed_time(&self) -> Result<Duration, EngineError> {
        match &self.state {
            SessionState::Playing { start_time, .. } => Ok(start_time.elapsed()),
            _ => Err(EngineError::WrongState),
        }
    }

    /// Normalizes, parses, validates, and (on success) accepts a
    /// submission. Returns the interval since the previous acceptance (or
    /// session start).
    pub fn solve(&mut self, text: &str, player_id: i64) -> Result<Duration, EngineError> {
        let (problem, solver_result, accepted, start_time, last_elapsed) = match &mut self.state {
            SessionState::Playing {
                problem,
                solver_result,
                accepted,
                start_time,
                last_elapsed,
            } => (problem, solver_result, accepted, start_time, last_elapsed),
            _ => return Err(EngineError::WrongState),
        };

        let normalized = normalize_submission(text);
        if normalized.len() >= self.config.max_submission_len {
            log::debug!("rejected submission {text:?}: too long");
            return Err(EngineError::TooLong);
        }

        let mut tree = match parse(&normalized) {
            Ok(tree) => tree,
            Err(e) => {
                log::debug!("rejected submission {text:?}: {e}");
                return Err(e);
            }
        };
        // Sign-normalize before the target check: a submission whose overall
        // value is negative (e.g. "(4-7)*(12+6/3)") still names a valid class
        // when its absolute value is the target, matching the original's
        // evaluate-on-the-normalized-form behavior.
        tree.sign_normalize();
        let value = tree.value();
        let target = point42_core::Rational::from_int(self.config.target);
        if value != target {
            log::debug!("rejected submission {text:?}: evaluates to {value}, not {target}");
            return Err(EngineError::WrongValue(value.to_string()));
        }

        let mut literals = tree.extract_literals();
        literals.sort_unstable();
        if literals.as_slice() != problem.operands() {
            log::debug!("rejected submission {text:?}: wrong operand multiset {literals:?}");
            return Err(EngineError::WrongNumbers(literals));
        }

        let key = tree.canonical_key();
        let root = solver_result
            .rep_of
            .get(&key)
            .cloned()
            .ok_or_else(|| EngineError::WrongValue(value.to_string()))?;

        if let Some(dup) = accepted.iter().find(|a| a.canonical_key == root) {
            log::debug!("rejected submission {text:?}: duplicate of {:?}", dup.raw_text);
            return Err(EngineError::Duplicate(dup.raw_text.clone()));
        }

        let elapsed = start_time.elapsed();
        let interval = elapsed.saturating_sub(*last_elapsed);
        *last_elapsed = elapsed;
        log::info!("player {player_id} accepted {text:?} after {interval:?}");
        accepted.push(Acceptance {
            raw_text: text.to_string(),
            canonical_key: root,
            player_id,
            interval,
        });
        Ok(interval)
    }

    pub fn current_problem(&self) -> Result<&Problem, EngineError> {
        match &self.state {
            SessionState::Playing { problem, .. } => Ok(problem),
            _ => Err(EngineError::WrongState),
        }
    }

    pub fn current_solutions(&self) -> Result<Vec<&str>, EngineError> {
        match &self.state {
            SessionState::Playing { accepted, .. } => {
                Ok(accepted.iter().map(|a| a.raw_text.as_str()).collect())
            }
            _ => Err(EngineError::WrongState),
        }
    }

    pub fn current_solution_count(&self) -> Result<usize, EngineError> {
        self.current_solutions().map(|v| v.len())
    }

    pub fn total_solution_count(&self) -> Result<usize, EngineError> {
        match &self.state {
            SessionState::Playing { solver_result, .. } => Ok(solver_result.distinct_count()),
            _ => Err(EngineError::WrongState),
        }
    }

    /// Pretty-printed representatives not yet matched by an accepted
    /// submission.
    pub fn remaining_solutions(&self) -> Result<Vec<String>, EngineError> {
        match &self.state {
            SessionState::Playing {
                solver_result,
                accepted,
                ..
            } => {
                let hit: std::collections::HashSet<&str> =
                    accepted.iter().map(|a| a.canonical_key.as_str()).collect();
                Ok(solver_result
                    .distinct_answers()
                    .into_iter()
                    .filter(|e| !hit.contains(e.canonical_key().as_str()))
                    .map(|e| e.pretty())
                    .collect())
            }
            _ => Err(EngineError::WrongState),
        }
    }

    pub fn player_statistics(&self) -> Result<Vec<(i64, Duration)>, EngineError> {
        match &self.state {
            SessionState::Playing { accepted, .. } => {
                Ok(accepted.iter().map(|a| (a.player_id, a.interval)).collect())
            }
            _ => Err(EngineError::WrongState),
        }
    }
}

/// Applies the fixed substitution order from the puzzle's original text
/// contract: typographic operator variants first, then whitespace
/// stripping, in one left-to-right pass per rule.
fn normalize_submission(text: &str) -> String {
    const SUBSTITUTIONS: &[(&str, &str)] = &[
        ("\u{00d7}", "*"),
        ("x", "*"),
        ("\u{00f7}", "/"),
        (" ", ""),
        ("\n", ""),
        ("\r", ""),
        ("\u{ff08}", "("),
        ("\u{ff09}", ")"),
    ];
    let mut out = text.to_string();
    for (src, dest) in SUBSTITUTIONS {
        out = out.replace(src, dest);
    }
    out
}
