use point42_core::{EngineError, Rational, MAX_LITERAL};
use std::collections::HashMap;

/// The four allowed arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl OpKind {
    pub fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }

    pub(crate) fn apply(&self, l: Rational, r: Rational) -> Result<Rational, EngineError> {
        match self {
            Self::Add => l.checked_add(&r),
            Self::Sub => l.checked_sub(&r),
            Self::Mul => l.checked_mul(&r),
            Self::Div => l.checked_div(&r),
        }
    }
}

/// A binary expression tree over rational-valued literals.
///
/// Trees are trees, never DAGs: an [`OpKind`] node exclusively owns its
/// children. Rewrites (see [`crate::rewrite_neighbors`]) always produce
/// fresh subtrees rather than sharing structure — the one exception is
/// [`ExprTree::sign_normalize`], which mutates in place.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprTree {
    Num { value: i64, cached: Rational },
    Op {
        kind: OpKind,
        left: Box<ExprTree>,
        right: Box<ExprTree>,
        cached: Rational,
    },
}

impl ExprTree {
    /// Fails with [`EngineError::BadLiteral`] if `n` is outside `[0, MAX_LITERAL]`.
    pub fn new_num(n: i64) -> Result<Self, EngineError> {
        if n < 0 || n > MAX_LITERAL {
            return Err(EngineError::BadLiteral(n));
        }
        Ok(Self::Num {
            value: n,
            cached: Rational::from_int(n),
        })
    }

    /// Fails with [`EngineError::DivByZero`] if `kind` is [`OpKind::Div`] and
    /// `right` evaluates to zero.
    pub fn new_op(kind: OpKind, left: ExprTree, right: ExprTree) -> Result<Self, EngineError> {
        let cached = kind.apply(left.value(), right.value())?;
        Ok(Self::Op {
            kind,
            left: Box::new(left),
            right: Box::new(right),
            cached,
        })
    }

    /// The node's cached value, computed from the literals themselves.
    pub fn value(&self) -> Rational {
        match self {
            Self::Num { cached, .. } => *cached,
            Self::Op { cached, .. } => *cached,
        }
    }

    /// Re-evaluates the tree under a literal substitution, recomputing
    /// bottom-up. With no substitution entry for a literal, the literal's
    /// own integer value is used.
    pub fn evaluate(&self, subst: &HashMap<i64, Rational>) -> Result<Rational, EngineError> {
        match self {
            Self::Num { value, .. } => Ok(subst
                .get(value)
                .copied()
                .unwrap_or_else(|| Rational::from_int(*value))),
            Self::Op { kind, left, right, .. } => {
                let l = left.evaluate(subst)?;
                let r = right.evaluate(subst)?;
                kind.apply(l, r)
            }
        }
    }

    /// The multiset of literal integers encountered in an in-order
    /// traversal.
    pub fn extract_literals(&self) -> Vec<i64> {
        let mut out = Vec::new();
        self.extract_into(&mut out);
        out
    }

    fn extract_into(&self, out: &mut Vec<i64>) {
        match self {
            Self::Num { value, .. } => out.push(*value),
            Self::Op { left, right, .. } => {
                left.extract_into(out);
                right.extract_into(out);
            }
        }
    }

    /// Postfix-derived canonical key: `[value]` for a literal, or
    /// `op_symbol · key(left) · key(right)` for an operator node. Two trees
    /// with identical keys are structurally identical.
    pub fn canonical_key(&self) -> String {
        match self {
            Self::Num { cached, .. } => format!("[{}]", cached.key()),
            Self::Op { kind, left, right, .. } => {
                format!("{}{}{}", kind.symbol(), left.canonical_key(), right.canonical_key())
            }
        }
    }

    /// Minimally parenthesized infix rendering.
    pub fn pretty(&self) -> String {
        match self {
            Self::Num { value, .. } => value.to_string(),
            Self::Op { kind, left, right, .. } => {
                let l = Self::render_child(left, *kind, Side::Left);
                let r = Self::render_child(right, *kind, Side::Right);
                format!("{l}{}{r}", kind.symbol())
            }
        }
    }

    fn render_child(child: &ExprTree, parent: OpKind, side: Side) -> String {
        let text = child.pretty();
        if Self::needs_parens(child, parent, side) {
            format!("({text})")
        } else {
            text
        }
    }

    fn needs_parens(child: &ExprTree, parent: OpKind, side: Side) -> bool {
        let child_kind = match child {
            Self::Num { .. } => return false,
            Self::Op { kind, .. } => *kind,
        };
        let child_is_additive = matches!(child_kind, OpKind::Add | OpKind::Sub);
        let child_is_multiplicative = matches!(child_kind, OpKind::Mul | OpKind::Div);
        match (parent, side) {
            (OpKind::Mul | OpKind::Div, _) => child_is_additive,
            (OpKind::Sub, Side::Right) => child_is_additive,
            (OpKind::Div, Side::Right) => child_is_multiplicative,
            _ => false,
        }
    }

    /// Mutates the tree so every node's cached value becomes non-negative,
    /// while the overall absolute value is preserved. Only `+`/`-` nodes
    /// ever change operator or swap children; `*`/`/` nodes simply get
    /// their cached value refreshed once their children are normalized,
    /// since the absolute value of a product or quotient doesn't depend on
    /// the sign of its operands.
    pub fn sign_normalize(&mut self) {
        match self {
            Self::Num { .. } => {}
            Self::Op { kind, left, right, cached } if matches!(kind, OpKind::Add | OpKind::Sub) => {
                let lv = left.value();
                let rv = right.value();
                left.sign_normalize();
                right.sign_normalize();
                let (new_kind, swap) = resolve_additive_signs(*kind, lv, rv);
                if swap {
                    std::mem::swap(left, right);
                }
                *kind = new_kind;
                *cached = kind
                    .apply(left.value(), right.value())
                    .expect("additive normalization cannot divide by zero");
            }
            Self::Op { left, right, kind, cached } => {
                left.sign_normalize();
                right.sign_normalize();
                *cached = kind
                    .apply(left.value(), right.value())
                    .expect("multiplicative normalization preserves finiteness");
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Picks the operator and child order that expresses `|lv op rv|` using
/// only non-negative operands. See `ExprTree::sign_normalize` for the
/// derivation.
fn resolve_additive_signs(kind: OpKind, lv: Rational, rv: Rational) -> (OpKind, bool) {
    let opv = match kind {
        OpKind::Add => lv.checked_add(&rv),
        OpKind::Sub => lv.checked_sub(&rv),
        _ => unreachable!(),
    }
    .expect("additive combination cannot divide by zero");
    let neg = opv.is_negative();
    let l_neg = lv.is_negative();
    let r_neg = rv.is_negative();
    match kind {
        OpKind::Add => match (l_neg, r_neg) {
            (false, false) => (OpKind::Add, false),
            (true, true) => (OpKind::Add, false),
            (true, false) => {
                if neg {
                    (OpKind::Sub, false)
                } else {
                    (OpKind::Sub, true)
                }
            }
            (false, true) => {
                if neg {
                    (OpKind::Sub, true)
                } else {
                    (OpKind::Sub, false)
                }
            }
        },
        OpKind::Sub => match (l_neg, r_neg) {
            (false, false) => {
                if neg {
                    (OpKind::Sub, true)
                } else {
                    (OpKind::Sub, false)
                }
            }
            (false, true) => (OpKind::Add, false),
            (true, false) => (OpKind::Add, false),
            (true, true) => {
                if neg {
                    (OpKind::Sub, false)
                } else {
                    (OpKind::Sub, true)
                }
            }
        },
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> ExprTree {
        ExprTree::new_num(n).unwrap()
    }

    fn op(kind: OpKind, l: ExprTree, r: ExprTree) -> ExprTree {
        ExprTree::new_op(kind, l, r).unwrap()
    }

    #[test]
    fn rejects_literal_out_of_range() {
        assert!(matches!(ExprTree::new_num(14), Err(EngineError::BadLiteral(14))));
        assert!(matches!(ExprTree::new_num(-1), Err(EngineError::BadLiteral(-1))));
    }

    #[test]
    fn division_by_zero_is_rejected_at_construction() {
        let z = num(0);
        let one = num(1);
        assert!(matches!(
            ExprTree::new_op(OpKind::Div, one, z),
            Err(EngineError::DivByZero)
        ));
    }

    #[test]
    fn division_is_exact_not_floor() {
        let tree = op(OpKind::Div, num(3), num(2));
        assert_eq!(tree.value().key(), "3/2");
    }

    #[test]
    fn extract_literals_is_in_order_multiset() {
        let tree = op(OpKind::Add, op(OpKind::Mul, num(6), num(7)), num(12));
        assert_eq!(tree.extract_literals(), vec![6, 7, 12]);
    }

    #[test]
    fn canonical_key_depends_only_on_structure() {
        let a = op(OpKind::Add, num(1), num(2));
        let b = op(OpKind::Add, num(1), num(2));
        assert_eq!(a.canonical_key(), b.canonical_key());
        let c = op(OpKind::Add, num(2), num(1));
        assert_ne!(a.canonical_key(), c.canonical_key());
    }

    #[test]
    fn pretty_parenthesizes_additive_child_of_multiplicative() {
        let tree = op(OpKind::Mul, op(OpKind::Add, num(6), num(7)), num(2));
        assert_eq!(tree.pretty(), "(6+7)*2");
    }

    #[test]
    fn pretty_parenthesizes_right_child_of_sub_when_additive() {
        let tree = op(OpKind::Sub, num(10), op(OpKind::Sub, num(3), num(1)));
        assert_eq!(tree.pretty(), "10-(3-1)");
    }

    #[test]
    fn pretty_parenthesizes_right_child_of_div_when_multiplicative() {
        let tree = op(OpKind::Div, num(12), op(OpKind::Mul, num(3), num(4)));
        assert_eq!(tree.pretty(), "12/(3*4)");
    }

    #[test]
    fn pretty_no_parens_needed_for_left_additive_chain() {
        let tree = op(OpKind::Add, op(OpKind::Sub, num(4), num(3)), num(5));
        assert_eq!(tree.pretty(), "4-3+5");
    }

    #[test]
    fn sign_normalize_flips_simple_subtraction() {
        let mut tree = op(OpKind::Sub, num(1), num(2));
        tree.sign_normalize();
        assert_eq!(tree.pretty(), "2-1");
        assert!(!tree.value().is_negative());
    }

    #[test]
    fn sign_normalize_matches_spec_example() {
        // (1-2)*(3-4-5) normalizes to (2-1)*(4-3+5)
        let lhs = op(OpKind::Sub, num(1), num(2));
        let rhs = op(OpKind::Sub, op(OpKind::Sub, num(3), num(4)), num(5));
        let mut tree = op(OpKind::Mul, lhs, rhs);
        tree.sign_normalize();
        assert_eq!(tree.pretty(), "(2-1)*(4-3+5)");
    }

    #[test]
    fn sign_normalize_preserves_absolute_value() {
        let mut tree = op(OpKind::Sub, num(1), op(OpKind::Sub, num(3), num(1)));
        let before = tree.value().abs();
        tree.sign_normalize();
        assert_eq!(tree.value(), before);
        assert!(!tree.value().is_negative());
    }
}
