use crate::{ExprTree, OpKind};
use std::collections::HashMap;

const OPS: [OpKind; 4] = [OpKind::Add, OpKind::Sub, OpKind::Mul, OpKind::Div];

/// Produces every structurally distinct [`ExprTree`] over the operand
/// multiset `nums`, by recursive bipartitioning of index positions.
///
/// Construction is pruned (not the enumeration itself, which always walks
/// every bipartition and operator): a candidate is dropped if it divides
/// by zero, if its value is negative, or if its canonical key duplicates
/// one already produced for that index set. Filtering by target value is
/// left to the caller ([`crate::solve_problem`]).
pub fn enumerate(nums: &[i64]) -> Vec<ExprTree> {
    log::debug!("enumerating expressions over {:?}", nums);
    let n = nums.len();
    if n == 0 {
        return Vec::new();
    }
    let full_mask = (1usize << n) - 1;
    let mut memo: HashMap<usize, Vec<ExprTree>> = HashMap::new();
    enumerate_mask(nums, full_mask, &mut memo);
    let trees = memo.remove(&full_mask).unwrap_or_default();
    log::debug!("enumeration over {:?} produced {} trees", nums, trees.len());
    trees
}

fn enumerate_mask(
    nums: &[i64],
    mask: usize,
    memo: &mut HashMap<usize, Vec<ExprTree>>,
) -> Vec<ExprTree> {
    if let Some(cached) = memo.get(&mask) {
        return cached.clone();
    }
    let trees = if mask.count_ones() == 1 {
        let idx = mask.trailing_zeros() as usize;
        vec![ExprTree::new_num(nums[idx]).expect("operand literal is within range")]
    } else {
        let mut by_key: HashMap<String, ExprTree> = HashMap::new();
        for sub in proper_submasks(mask) {
            let complement = mask & !sub;
            let lefts = enumerate_mask(nums, sub, memo);
            let rights = enumerate_mask(nums, complement, memo);
            for lhs in &lefts {
                for rhs in &rights {
                    for &op in &OPS {
                        if let Ok(tree) = ExprTree::new_op(op, lhs.clone(), rhs.clone()) {
                            if tree.value().is_negative() {
                                continue;
                            }
                            by_key.entry(tree.canonical_key()).or_insert(tree);
                        }
                    }
                }
            }
        }
        by_key.into_values().collect()
    };
    memo.insert(mask, trees.clone());
    trees
}

/// Every non-empty, non-full submask of `mask` (i.e. every way to choose a
/// non-trivial subset of the set bits in `mask`).
fn proper_submasks(mask: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut sub = mask;
    while sub > 0 {
        sub = (sub - 1) & mask;
        if sub != 0 {
            out.push(sub);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_operand_yields_one_tree() {
        let trees = enumerate(&[7]);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].pretty(), "7");
    }

    #[test]
    fn two_operands_yield_no_duplicate_keys() {
        let trees = enumerate(&[3, 4]);
        let mut keys: Vec<_> = trees.iter().map(|t| t.canonical_key()).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn never_produces_a_negative_valued_tree() {
        let trees = enumerate(&[1, 2, 3, 4]);
        assert!(trees.iter().all(|t| !t.value().is_negative()));
    }

    #[test]
    fn five_operands_contains_a_known_target_solution() {
        let trees = enumerate(&[3, 4, 6, 7, 12]);
        assert!(trees
            .iter()
            .any(|t| t.value() == point42_core::Rational::from_int(42)));
    }
}
