#![forbid(unsafe_code)]

use loom_ir::{BinOp, Expr, ExprKind, UnaryOp};

use super::canonical::reorderable;
use super::compare::truth;
use super::{Rewrite, fire, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    match e.kind() {
        ExprKind::Unary { op: UnaryOp::Not, value } => not(s, value),
        ExprKind::Binary { op: op @ (BinOp::And | BinOp::Or), a, b } => and_or(e, *op, a, b),
        _ => None,
    }
}

fn not(s: &mut Simplifier, v: &Expr) -> Option<Rewrite> {
    if let Some(x) = v.as_not() {
        return fire("not_not", x.clone());
    }
    if let ExprKind::Broadcast { value, lanes } = v.kind() {
        let inner = s.rewrite(Expr::not(value.clone()));
        return fire("not_broadcast", Expr::broadcast(inner, *lanes));
    }
    let ExprKind::Binary { op, a, b } = v.kind() else {
        return None;
    };
    let ordered = !a.ty().is_float();
    let (a, b) = (a.clone(), b.clone());
    match op {
        BinOp::Lt if ordered && reorderable(&a, &b) => fire("not_lt", Expr::le(b, a)),
        BinOp::Le if ordered && reorderable(&a, &b) => fire("not_le", Expr::lt(b, a)),
        BinOp::Eq => fire("not_eq", Expr::ne(a, b)),
        BinOp::Ne => fire("not_ne", Expr::eq(a, b)),
        BinOp::And => {
            let (na, nb) = (s.rewrite(Expr::not(a)), s.rewrite(Expr::not(b)));
            fire("de_morgan", Expr::or(na, nb))
        }
        BinOp::Or => {
            let (na, nb) = (s.rewrite(Expr::not(a)), s.rewrite(Expr::not(b)));
            fire("de_morgan", Expr::and(na, nb))
        }
        _ => None,
    }
}

fn and_or(e: &Expr, op: BinOp, a: &Expr, b: &Expr) -> Option<Rewrite> {
    let ty = e.ty();
    // The absorbing literal: false for &&, true for ||.
    let absorbing = op == BinOp::Or;
    for (lit, other) in [(a, b), (b, a)] {
        match lit.as_bool() {
            Some(v) if v == absorbing && pure(other) => return fire("bool_absorb", truth(ty, absorbing)),
            Some(v) if v != absorbing => return fire("bool_identity", other.clone()),
            _ => {}
        }
    }
    if a == b && pure(a) {
        return fire("bool_self", a.clone());
    }
    let complementary = a.as_not().is_some_and(|x| x == b) || b.as_not().is_some_and(|x| x == a);
    if complementary && pure(a) && pure(b) {
        return fire("bool_complement", truth(ty, absorbing));
    }
    None
}
