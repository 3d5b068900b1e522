#![forbid(unsafe_code)]

use std::cmp::Ordering;

use loom_ir::{BinOp, Expr, ExprKind, compare_exprs};

use super::{Rewrite, fire, pure};
use crate::simplifier::Simplifier;

/// Literals go right; otherwise operands follow the structural order.
fn should_swap(a: &Expr, b: &Expr) -> bool {
    match (a.is_const(), b.is_const()) {
        (true, false) => true,
        (false, true) => false,
        _ => compare_exprs(a, b) == Ordering::Greater,
    }
}

/// Swapping operands reorders their evaluation, which only matters when
/// both have effects.
pub(super) fn reorderable(a: &Expr, b: &Expr) -> bool {
    pure(a) || pure(b)
}

pub(super) fn rewrite(_: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ExprKind::Binary { op, a, b } = e.kind() else {
        return None;
    };
    if !reorderable(a, b) {
        return None;
    }
    match op {
        BinOp::Gt => fire("gt_to_lt", Expr::lt(b.clone(), a.clone())),
        BinOp::Ge => fire("ge_to_le", Expr::le(b.clone(), a.clone())),
        _ if op.is_commutative() && should_swap(a, b) => fire("commute", Expr::binary(*op, b.clone(), a.clone())),
        _ => None,
    }
}
