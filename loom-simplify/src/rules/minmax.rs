#![forbid(unsafe_code)]

use loom_ir::{BinOp, Expr, ExprKind};

use super::{Rewrite, exact_int, fire, int_lit, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ExprKind::Binary { op: op @ (BinOp::Min | BinOp::Max), a, b } = e.kind() else {
        return None;
    };
    let op = *op;
    let ty = e.ty();
    if a == b && pure(b) {
        return fire("minmax_self", a.clone());
    }
    if let (ExprKind::Broadcast { value: x, lanes }, ExprKind::Broadcast { value: y, lanes: l2 }) = (a.kind(), b.kind())
    {
        if lanes == l2 {
            let inner = s.rewrite(Expr::binary(op, x.clone(), y.clone()));
            return fire("broadcast_minmax", Expr::broadcast(inner, *lanes));
        }
    }
    if !ty.is_integer() {
        return None;
    }
    let other = if op == BinOp::Min { BinOp::Max } else { BinOp::Min };

    if b.is_const() {
        // min(min(x, c1), c2) -> min(x, min(c1, c2))
        if let Some((x, c1)) = a.as_binary(op).filter(|(_, c1)| c1.is_const()) {
            let c = s.rewrite(Expr::binary(op, c1.clone(), b.clone()));
            return fire("minmax_consts", Expr::binary(op, x.clone(), c));
        }
        // max(min(x, c1), c2) -> c2 when c1 <= c2 (and the dual for min)
        if let Some((x, c1)) = a.as_binary(other) {
            if let (Some(c1), Some(c2)) = (int_lit(c1), int_lit(b)) {
                let dominated = if op == BinOp::Max { c1 <= c2 } else { c1 >= c2 };
                if dominated && pure(x) {
                    return fire("clamp_collapse", b.clone());
                }
            }
        }
    }

    if exact_int(ty) {
        // min(x + c1, x + c2) -> x + min(c1, c2)
        if let (Some((x1, c1)), Some((x2, c2))) = (a.as_binary(BinOp::Add), b.as_binary(BinOp::Add)) {
            if x1 == x2 && c1.is_const() && c2.is_const() && pure(x2) {
                let c = s.rewrite(Expr::binary(op, c1.clone(), c2.clone()));
                return fire("minmax_offsets", Expr::add(x1.clone(), c));
            }
        }
    }
    None
}
