use crate::{ExprTree, OpKind};
use point42_core::Rational;

/// Returns a lazily-evaluated stream of the immediate rewrite neighbors of
/// `tree` under the 8 equivalence-preserving rules. Each item is a fresh
/// tree differing from `tree` by exactly one local rewrite; nothing is
/// materialized eagerly — rules that don't apply (e.g. there's no `y/y`
/// submultiply anywhere) simply never execute their body.
///
/// Rewrites are directional: a neighbor of `tree` does not imply `tree` is
/// a neighbor of it. [`crate::Classifier`] takes the union-find closure
/// over this relation to get full equivalence classes.
pub fn rewrite_neighbors(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    Box::new(
        recurse_neighbors(tree)
            .chain(neutral_element_swaps(tree))
            .chain(distribute_over_neutral(tree))
            .chain(division_cross_subtract(tree))
            .chain(multiply_by_one_as_sum(tree))
            .chain(flip_equal_division(tree))
            .chain(subexpression_swap(tree))
            .chain(two_times_two(tree)),
    )
}

/// Rule 1: recurse into either child, keeping the other fixed.
fn recurse_neighbors(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    match tree {
        ExprTree::Num { .. } => Box::new(std::iter::empty()),
        ExprTree::Op { kind, left, right, .. } => {
            let kind = *kind;
            let right_for_left = (**right).clone();
            let left_fixed = (**left).clone();
            let left_variants = rewrite_neighbors(left).map(move |l| {
                ExprTree::new_op(kind, l, right_for_left.clone())
                    .expect("rewrite preserves the invariants of its source tree")
            });
            let right_variants = rewrite_neighbors(right).map(move |r| {
                ExprTree::new_op(kind, left_fixed.clone(), r)
                    .expect("rewrite preserves the invariants of its source tree")
            });
            Box::new(left_variants.chain(right_variants))
        }
    }
}

/// Rule 2: `x - 0 -> x + 0`, `x / 1 -> x * 1`, `0 / x -> 0 * x`.
fn neutral_element_swaps(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    let ExprTree::Op { kind, left, right, .. } = tree else {
        return Box::new(std::iter::empty());
    };
    let out = match kind {
        OpKind::Sub if right.value().is_zero() => {
            Some(ExprTree::new_op(OpKind::Add, (**left).clone(), (**right).clone()).unwrap())
        }
        OpKind::Div if right.value() == Rational::from_int(1) => {
            Some(ExprTree::new_op(OpKind::Mul, (**left).clone(), (**right).clone()).unwrap())
        }
        OpKind::Div if left.value().is_zero() => {
            Some(ExprTree::new_op(OpKind::Mul, (**left).clone(), (**right).clone()).unwrap())
        }
        _ => None,
    };
    Box::new(out.into_iter())
}

/// Rule 3: `(x ? y) + 0 -> (x+0) ? y` and `-> x ? (y+0)`; same shape with
/// `* 1` replacing `+ 0` when the outer op is `*`.
fn distribute_over_neutral(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    let ExprTree::Op { kind: outer_kind, left, right, .. } = tree else {
        return Box::new(std::iter::empty());
    };
    let (neutral_op, neutral) = match outer_kind {
        OpKind::Add if right.value().is_zero() => (OpKind::Add, (**right).clone()),
        OpKind::Mul if right.value() == Rational::from_int(1) => (OpKind::Mul, (**right).clone()),
        _ => return Box::new(std::iter::empty()),
    };
    let ExprTree::Op { kind: inner_kind, left: x, right: y, .. } = left.as_ref() else {
        return Box::new(std::iter::empty());
    };
    let inner_kind = *inner_kind;
    let x = (**x).clone();
    let y = (**y).clone();
    let variant_a = ExprTree::new_op(
        inner_kind,
        ExprTree::new_op(neutral_op, x.clone(), neutral.clone()).unwrap(),
        y.clone(),
    )
    .ok();
    let variant_b = ExprTree::new_op(
        inner_kind,
        x,
        ExprTree::new_op(neutral_op, y, neutral).unwrap(),
    )
    .ok();
    Box::new(variant_a.into_iter().chain(variant_b))
}

/// Rule 4: when the outer op is `/`, the left child is `y + z`, and
/// `right.value == left.value` with neither `y` nor `z` zero:
/// `(y+z)/x -> (x-y)/z` and `(x-z)/y`.
fn division_cross_subtract(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    let ExprTree::Op { kind: OpKind::Div, left, right, .. } = tree else {
        return Box::new(std::iter::empty());
    };
    let ExprTree::Op { kind: OpKind::Add, left: y, right: z, .. } = left.as_ref() else {
        return Box::new(std::iter::empty());
    };
    if right.value() != left.value() || y.value().is_zero() || z.value().is_zero() {
        return Box::new(std::iter::empty());
    }
    let x = (**right).clone();
    let variant_a = ExprTree::new_op(OpKind::Sub, x.clone(), (**y).clone())
        .and_then(|num| ExprTree::new_op(OpKind::Div, num, (**z).clone()));
    let variant_b = ExprTree::new_op(OpKind::Sub, x, (**z).clone())
        .and_then(|num| ExprTree::new_op(OpKind::Div, num, (**y).clone()));
    let results: Vec<_> = [variant_a, variant_b].into_iter().filter_map(|r| r.ok()).collect();
    Box::new(results.into_iter())
}

/// Rule 5: `x * (y / y) -> x + (y - y)`.
fn multiply_by_one_as_sum(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    let ExprTree::Op { kind: OpKind::Mul, left, right, .. } = tree else {
        return Box::new(std::iter::empty());
    };
    let out = match right.as_ref() {
        ExprTree::Op { kind: OpKind::Div, left: y1, right: y2, .. } if y1.value() == y2.value() => {
            let diff = ExprTree::new_op(OpKind::Sub, (**y1).clone(), (**y2).clone()).ok();
            diff.and_then(|d| ExprTree::new_op(OpKind::Add, (**left).clone(), d).ok())
        }
        _ => None,
    };
    Box::new(out.into_iter())
}

/// Rule 6: `x1 / x2 -> x2 / x1` when `x1.value == x2.value`.
fn flip_equal_division(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    let ExprTree::Op { kind: OpKind::Div, left, right, .. } = tree else {
        return Box::new(std::iter::empty());
    };
    if left.value() != right.value() {
        return Box::new(std::iter::empty());
    }
    let flipped = ExprTree::new_op(OpKind::Div, (**right).clone(), (**left).clone()).ok();
    Box::new(flipped.into_iter())
}

/// Rule 7: if a node `nl` in the left subtree and a node `nr` in the right
/// subtree carry the same cached value, swap their entire subtrees.
fn subexpression_swap(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    let ExprTree::Op { kind, left, right, .. } = tree else {
        return Box::new(std::iter::empty());
    };
    let kind = *kind;
    let mut left_nodes = Vec::new();
    collect_nodes(left, &mut left_nodes);
    let mut right_nodes = Vec::new();
    collect_nodes(right, &mut right_nodes);

    let left = (**left).clone();
    let right = (**right).clone();
    let mut out = Vec::new();
    for lpath in &left_nodes {
        let lval = resolve_path(&left, lpath).value();
        for rpath in &right_nodes {
            if resolve_path(&right, rpath).value() == lval {
                let mut new_left = left.clone();
                let mut new_right = right.clone();
                let swapped_from_right = resolve_path(&right, rpath).clone();
                let swapped_from_left = resolve_path(&left, lpath).clone();
                replace_at_path(&mut new_left, lpath, swapped_from_right);
                replace_at_path(&mut new_right, rpath, swapped_from_left);
                if let Ok(rebuilt) = ExprTree::new_op(kind, new_left, new_right) {
                    out.push(rebuilt);
                }
            }
        }
    }
    Box::new(out.into_iter())
}

/// Rule 8: `2 * 2 -> 2 + 2`, `4 / 2 -> 4 - 2`.
fn two_times_two(tree: &ExprTree) -> Box<dyn Iterator<Item = ExprTree> + '_> {
    let out = match tree {
        ExprTree::Op { kind: OpKind::Mul, left, right, .. }
            if left.value() == Rational::from_int(2) && right.value() == Rational::from_int(2) =>
        {
            ExprTree::new_op(OpKind::Add, (**left).clone(), (**right).clone()).ok()
        }
        ExprTree::Op { kind: OpKind::Div, left, right, .. }
            if left.value() == Rational::from_int(4) && right.value() == Rational::from_int(2) =>
        {
            ExprTree::new_op(OpKind::Sub, (**left).clone(), (**right).clone()).ok()
        }
        _ => None,
    };
    Box::new(out.into_iter())
}

/// A path to a node: a sequence of left/right descents from the root of
/// the subtree it was collected from.
type Path = Vec<bool>; // false = left, true = right

fn collect_nodes(tree: &ExprTree, out: &mut Vec<Path>) {
    collect_nodes_from(tree, &mut Vec::new(), out);
}

fn collect_nodes_from(tree: &ExprTree, prefix: &mut Path, out: &mut Vec<Path>) {
    out.push(prefix.clone());
    if let ExprTree::Op { left, right, .. } = tree {
        prefix.push(false);
        collect_nodes_from(left, prefix, out);
        prefix.pop();
        prefix.push(true);
        collect_nodes_from(right, prefix, out);
        prefix.pop();
    }
}

fn resolve_path<'a>(tree: &'a ExprTree, path: &Path) -> &'a ExprTree {
    let mut node = tree;
    for &step in path {
        node = match node {
            ExprTree::Op { left, right, .. } => {
                if step {
                    right
                } else {
                    left
                }
            }
            ExprTree::Num { .. } => unreachable!("path exceeds tree depth"),
        };
    }
    node
}

fn replace_at_path(tree: &mut ExprTree, path: &Path, replacement: ExprTree) {
    if path.is_empty() {
        *tree = replacement;
        return;
    }
    let (first, rest) = path.split_first().unwrap();
    if let ExprTree::Op { left, right, kind, cached } = tree {
        let target = if *first { right.as_mut() } else { left.as_mut() };
        replace_at_path(target, &rest.to_vec(), replacement);
        *cached = kind.apply(left.value(), right.value()).unwrap_or(*cached);
    }
}
