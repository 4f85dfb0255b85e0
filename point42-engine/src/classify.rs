use crate::{rewrite_neighbors, ExprTree};
use point42_core::{Rational, MAX_LITERAL, PROBE_COUNT, PROBE_RANGE};
use rand::rngs::SmallRng;
use rand::seq::index;
use std::collections::HashMap;
use std::ops::Range;

/// Union–find over canonical-key strings, closing the "same answer"
/// relation under value-fingerprint probing and rewrite-rule neighbors.
///
/// Construction does the probing and unioning up front; [`Classifier::root`]
/// only ever walks already-built parent pointers, compressing paths as it
/// goes.
pub struct Classifier {
    parent: HashMap<String, String>,
    rank: HashMap<String, u8>,
}

impl Classifier {
    /// Builds the classifier over `answers`, drawing `K = `[`PROBE_COUNT`]
    /// probing substitution tables from `rng` over [`PROBE_RANGE`].
    pub fn build(answers: &[ExprTree], rng: &mut SmallRng) -> Self {
        Self::build_with_probes(answers, rng, PROBE_COUNT, PROBE_RANGE)
    }

    /// As [`Classifier::build`], but with the probe count and domain
    /// overridden — the knob `point42_session::SessionConfig` exposes.
    pub fn build_with_probes(
        answers: &[ExprTree],
        rng: &mut SmallRng,
        probe_count: usize,
        probe_range: Range<i64>,
    ) -> Self {
        let mut classifier = Classifier {
            parent: HashMap::new(),
            rank: HashMap::new(),
        };

        let tables = generate_probe_tables(rng, probe_count, probe_range);

        // Seed parent/rank: first answer to claim a given fingerprint
        // becomes that fingerprint's rank-2 root; subsequent answers
        // sharing the fingerprint start as rank-1 secondaries pointing
        // straight at it (rule-1 / generic-substitution equivalence).
        let mut by_fingerprint: HashMap<Vec<String>, String> = HashMap::new();
        for expr in answers {
            let key = expr.canonical_key();
            let fingerprint = fingerprint_of(expr, &tables);
            if let Some(primary) = by_fingerprint.get(&fingerprint) {
                classifier.parent.insert(key.clone(), primary.clone());
                classifier.rank.insert(key, 1);
            } else {
                classifier.parent.insert(key.clone(), key.clone());
                classifier.rank.insert(key.clone(), 2);
                by_fingerprint.insert(fingerprint, key);
            }
        }

        // Union over rewrite-rule neighbors. A neighbor key that never
        // appeared in `answers` simply never got a parent entry above; we
        // skip unioning with it (it's side-evidence only, per the
        // equivalence design).
        for expr in answers {
            let uid1 = expr.canonical_key();
            for neighbor in rewrite_neighbors(expr) {
                let uid2 = neighbor.canonical_key();
                if classifier.parent.contains_key(&uid2) {
                    classifier.union(&uid1, &uid2);
                }
            }
        }

        classifier
    }

    fn root(&mut self, uid: &str) -> String {
        let parent = self.parent.get(uid).cloned().unwrap_or_else(|| uid.to_string());
        if parent == uid {
            return parent;
        }
        let root = self.root(&parent);
        self.parent.insert(uid.to_string(), root.clone());
        root
    }

    fn union(&mut self, uid1: &str, uid2: &str) {
        let root1 = self.root(uid1);
        let root2 = self.root(uid2);
        if root1 == root2 {
            return;
        }
        let rank1 = *self.rank.get(&root1).unwrap_or(&0);
        let rank2 = *self.rank.get(&root2).unwrap_or(&0);
        if rank1 <= rank2 {
            self.parent.insert(root1.clone(), root2.clone());
            if rank1 == rank2 {
                *self.rank.entry(root2).or_insert(0) += 1;
            }
        } else {
            self.parent.insert(root2, root1);
        }
    }

    /// Resolves every registered key to its class representative, with
    /// path compression applied along the way.
    pub fn rep_of(&mut self) -> HashMap<String, String> {
        let keys: Vec<String> = self.parent.keys().cloned().collect();
        keys.into_iter().map(|k| {
            let root = self.root(&k);
            (k, root)
        }).collect()
    }
}

/// A substitution table mapping every literal in `[0, MAX_LITERAL]` to a
/// probe value, with the fixed points `0 -> 0` and `1 -> 1` preserved so
/// rule-based rewrites of neutral elements agree with the probe.
fn generate_probe_tables(
    rng: &mut SmallRng,
    probe_count: usize,
    probe_range: Range<i64>,
) -> Vec<HashMap<i64, Rational>> {
    let span = (probe_range.end - probe_range.start) as usize;
    (0..probe_count)
        .map(|_| {
            let sample = index::sample(rng, span, (MAX_LITERAL + 1) as usize);
            let mut table: HashMap<i64, Rational> = (2..=MAX_LITERAL)
                .enumerate()
                .map(|(i, literal)| {
                    let draw = probe_range.start + sample.index(i) as i64;
                    (literal, Rational::from_int(draw))
                })
                .collect();
            table.insert(0, Rational::from_int(0));
            table.insert(1, Rational::from_int(1));
            table
        })
        .collect()
}

/// A substitution table can drive a real, nonzero divisor to zero (e.g.
/// `12/(1-(6-1)/7)` when a probe draw happens to satisfy `r7 == r6-1`).
/// Mirrors the original's `x / 0 -> inf` sentinel rather than propagating
/// the error: two subtrees that both divide by zero under the same table
/// are still fingerprint-equal at that probe, same as two that both
/// evaluate to the same finite value.
const DIV_BY_ZERO_SENTINEL: &str = "inf";

fn fingerprint_of(expr: &ExprTree, tables: &[HashMap<i64, Rational>]) -> Vec<String> {
    tables
        .iter()
        .map(|table| match expr.evaluate(table) {
            Ok(value) => value.key(),
            Err(_) => DIV_BY_ZERO_SENTINEL.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use rand::SeedableRng;

    fn seeded_rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn identical_trees_land_in_the_same_class() {
        let a = parse("6*7+(12-3*4)").unwrap();
        let b = parse("6*7+(12-3*4)").unwrap();
        let answers = vec![a, b];
        let mut classifier = Classifier::build(&answers, &mut seeded_rng());
        let rep = classifier.rep_of();
        let keys: Vec<_> = answers.iter().map(|e| e.canonical_key()).collect();
        assert_eq!(rep[&keys[0]], rep[&keys[1]]);
    }

    #[test]
    fn algebraically_equivalent_trees_are_unified_by_fingerprint() {
        // 12/(3*4)*6*7 and 6*7+(12-3*4) both equal 42, but are not
        // algebraically equivalent to one another, so they must differ.
        // 12/(3*4)*6*7 and 6*7*(12/(3*4)) *are* algebraically identical
        // (pure commuted multiplication) and must land in the same class.
        let a = parse("12/(3*4)*6*7").unwrap();
        let b = parse("6*7*(12/(3*4))").unwrap();
        let answers = vec![a, b];
        let mut classifier = Classifier::build(&answers, &mut seeded_rng());
        let rep = classifier.rep_of();
        let keys: Vec<_> = answers.iter().map(|e| e.canonical_key()).collect();
        assert_eq!(rep[&keys[0]], rep[&keys[1]]);
    }

    #[test]
    fn probe_induced_division_by_zero_yields_sentinel_not_panic() {
        // 12/(1-(6-1)/7): never divides by zero on the literal values, but
        // a probe table can drive the denominator to zero (here: table[6]
        // - table[1] == table[7], i.e. 6 -> 6, 7 -> 5).
        let tree = parse("12/(1-(6-1)/7)").unwrap();
        let mut table: HashMap<i64, Rational> = HashMap::new();
        table.insert(0, Rational::from_int(0));
        table.insert(1, Rational::from_int(1));
        table.insert(6, Rational::from_int(6));
        table.insert(7, Rational::from_int(5));
        table.insert(12, Rational::from_int(100));
        let fingerprint = fingerprint_of(&tree, &[table]);
        assert_eq!(fingerprint, vec![DIV_BY_ZERO_SENTINEL.to_string()]);
    }

    #[test]
    fn rep_of_is_idempotent() {
        let a = parse("6*7+(12-3*4)").unwrap();
        let b = parse("(12-3*4)+6*7").unwrap();
        let answers = vec![a, b];
        let mut classifier = Classifier::build(&answers, &mut seeded_rng());
        let rep = classifier.rep_of();
        for (_, root) in rep.iter() {
            assert_eq!(&rep[root], root);
        }
    }
}
