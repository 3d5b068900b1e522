#![forbid(unsafe_code)]

//! Ring identities for `+`, `-`, `*` and negation. Everything here holds
//! modulo `2^bits` as well, so wrapping types get these rules too.

use loom_ir::{BinOp, Expr, ExprKind, Type, UnaryOp};

use super::{Rewrite, fire, int_lit, lit, merge_consts, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ty = e.ty();
    match e.kind() {
        ExprKind::Binary { op: BinOp::Add, a, b } => add(s, ty, a, b),
        ExprKind::Binary { op: BinOp::Sub, a, b } => sub(s, ty, a, b),
        ExprKind::Binary { op: BinOp::Mul, a, b } => mul(s, ty, a, b),
        ExprKind::Unary { op: UnaryOp::Neg, value } => neg(s, ty, value),
        _ => None,
    }
}

/// `(x op c)` with a literal `c`.
fn with_const(e: &Expr, op: BinOp) -> Option<(&Expr, &Expr)> {
    e.as_binary(op).filter(|(_, c)| c.is_const())
}

fn add(s: &mut Simplifier, ty: Type, a: &Expr, b: &Expr) -> Option<Rewrite> {
    if b.is_zero() && !ty.is_float() {
        return fire("add_zero", a.clone());
    }
    if !ty.is_integer() {
        return None;
    }
    if a == b && pure(a) {
        return fire("add_self", Expr::mul(a.clone(), lit(ty, 2)));
    }
    if let Some((x, c1)) = with_const(a, BinOp::Add) {
        if b.is_const() {
            let c = merge_consts(s, BinOp::Add, c1, b)?;
            return fire("add_consts", Expr::add(x.clone(), c));
        }
        let inner = s.rewrite(Expr::add(x.clone(), b.clone()));
        return fire("hoist_const", Expr::add(inner, c1.clone()));
    }
    if let Some((x, c)) = with_const(b, BinOp::Add) {
        let inner = s.rewrite(Expr::add(a.clone(), x.clone()));
        return fire("hoist_const", Expr::add(inner, c.clone()));
    }
    if let Some((x, y)) = a.as_binary(BinOp::Sub) {
        if y == b && pure(b) {
            return fire("sub_add_cancel", x.clone());
        }
    }
    if let Some((x, y)) = b.as_binary(BinOp::Sub) {
        if y == a && pure(a) {
            return fire("sub_add_cancel", x.clone());
        }
    }
    if let (Some(l), Some(r)) = (a.as_binary(BinOp::Mul), b.as_binary(BinOp::Mul)) {
        if let Some((common, p, q)) = common_factor(l, r) {
            let k = merge_consts(s, BinOp::Add, p, q)?;
            return fire("factor_common", Expr::mul(common.clone(), k));
        }
    }
    lanewise(s, BinOp::Add, a, b)
}

/// For `l0*l1` and `r0*r1` sharing a side-effect-free factor, returns the
/// factor and the two cofactors.
fn common_factor<'e>(l: (&'e Expr, &'e Expr), r: (&'e Expr, &'e Expr)) -> Option<(&'e Expr, &'e Expr, &'e Expr)> {
    let (l0, l1) = l;
    let (r0, r1) = r;
    let found = if l0 == r0 {
        (l0, l1, r1)
    } else if l1 == r1 {
        (l1, l0, r0)
    } else if l0 == r1 {
        (l0, l1, r0)
    } else if l1 == r0 {
        (l1, l0, r1)
    } else {
        return None;
    };
    pure(found.0).then_some(found)
}

fn sub(s: &mut Simplifier, ty: Type, a: &Expr, b: &Expr) -> Option<Rewrite> {
    if b.is_zero() {
        return fire("sub_zero", a.clone());
    }
    if !ty.is_integer() {
        return None;
    }
    if a == b && pure(a) {
        return fire("sub_self", lit(ty, 0));
    }
    if let Some((x, y)) = a.as_binary(BinOp::Add) {
        if y == b && pure(b) {
            return fire("add_sub_cancel", x.clone());
        }
        if x == b && pure(b) {
            return fire("add_sub_cancel", y.clone());
        }
    }
    if ty.is_int() {
        if let Some(c) = int_lit(b) {
            if Some(c) != ty.min_value() {
                return fire("sub_const", Expr::add(a.clone(), lit(ty, -c)));
            }
        }
    }
    if a.is_const() {
        if let Some((x, c2)) = with_const(b, BinOp::Add) {
            let c = merge_consts(s, BinOp::Sub, a, c2)?;
            return fire("sub_from_const", Expr::sub(c, x.clone()));
        }
    }
    lanewise(s, BinOp::Sub, a, b)
}

fn mul(s: &mut Simplifier, ty: Type, a: &Expr, b: &Expr) -> Option<Rewrite> {
    if b.is_one() {
        return fire("mul_one", a.clone());
    }
    if !ty.is_integer() {
        return None;
    }
    if b.is_zero() && pure(a) {
        return fire("mul_zero", b.clone());
    }
    if b.is_const() {
        if let Some((x, c1)) = with_const(a, BinOp::Mul) {
            let c = merge_consts(s, BinOp::Mul, c1, b)?;
            return fire("mul_consts", Expr::mul(x.clone(), c));
        }
        if let Some((x, c1)) = with_const(a, BinOp::Add) {
            let offset = merge_consts(s, BinOp::Mul, c1, b)?;
            let scaled = s.rewrite(Expr::mul(x.clone(), b.clone()));
            return fire("distribute_const", Expr::add(scaled, offset));
        }
    }
    lanewise(s, BinOp::Mul, a, b)
}

fn neg(s: &mut Simplifier, ty: Type, v: &Expr) -> Option<Rewrite> {
    if let Some(x) = v.as_neg() {
        return fire("neg_neg", x.clone());
    }
    if let ExprKind::Broadcast { value, lanes } = v.kind() {
        let inner = s.rewrite(Expr::neg(value.clone()));
        return fire("neg_broadcast", Expr::broadcast(inner, *lanes));
    }
    if !ty.is_integer() {
        return None;
    }
    if let Some((x, y)) = v.as_binary(BinOp::Sub) {
        if pure(x) || pure(y) {
            return fire("neg_sub", Expr::sub(y.clone(), x.clone()));
        }
    }
    if let Some((x, c)) = with_const(v, BinOp::Add) {
        let nc = merge_consts(s, BinOp::Sub, &lit(ty, 0), c)?;
        return fire("neg_add_const", Expr::sub(nc, x.clone()));
    }
    None
}

/// Arithmetic on broadcasts and ramps, lane by lane.
fn lanewise(s: &mut Simplifier, op: BinOp, a: &Expr, b: &Expr) -> Option<Rewrite> {
    use ExprKind::{Broadcast, Ramp};

    match (a.kind(), b.kind()) {
        (Broadcast { value: x, lanes }, Broadcast { value: y, lanes: l2 }) if lanes == l2 => {
            let inner = s.rewrite(Expr::binary(op, x.clone(), y.clone()));
            fire("broadcast_arith", Expr::broadcast(inner, *lanes))
        }
        (Ramp { base, stride, lanes }, Broadcast { value: y, lanes: l2 })
            if lanes == l2 && matches!(op, BinOp::Add | BinOp::Sub) =>
        {
            let base = s.rewrite(Expr::binary(op, base.clone(), y.clone()));
            fire("ramp_arith", Expr::ramp(base, stride.clone(), *lanes))
        }
        (Broadcast { value: x, lanes: l2 }, Ramp { base, stride, lanes }) if lanes == l2 && op == BinOp::Add => {
            let base = s.rewrite(Expr::add(x.clone(), base.clone()));
            fire("ramp_arith", Expr::ramp(base, stride.clone(), *lanes))
        }
        (Ramp { base, stride, lanes }, Broadcast { value: y, lanes: l2 })
            if lanes == l2 && op == BinOp::Mul && pure(y) =>
        {
            let stride = merge_consts(s, BinOp::Mul, stride, y)?;
            let base = s.rewrite(Expr::mul(base.clone(), y.clone()));
            fire("ramp_arith", Expr::ramp(base, stride, *lanes))
        }
        (Ramp { base: b1, stride: s1, lanes }, Ramp { base: b2, stride: s2, lanes: l2 })
            if lanes == l2 && matches!(op, BinOp::Add | BinOp::Sub) =>
        {
            let stride = merge_consts(s, op, s1, s2)?;
            let base = s.rewrite(Expr::binary(op, b1.clone(), b2.clone()));
            fire("ramp_arith", Expr::ramp(base, stride, *lanes))
        }
        _ => None,
    }
}
