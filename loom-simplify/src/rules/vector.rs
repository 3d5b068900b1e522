#![forbid(unsafe_code)]

use loom_ir::{Expr, ExprKind, Type};

use super::{Rewrite, fire};
use crate::simplifier::Simplifier;

/// Ramps, broadcasts and casts.
pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    match e.kind() {
        ExprKind::Ramp { base, lanes: 1, .. } => fire("single_lane", base.clone()),
        ExprKind::Broadcast { value, lanes: 1 } => fire("single_lane", value.clone()),
        ExprKind::Ramp { base, stride, lanes } if stride.is_zero() => {
            fire("ramp_zero_stride", Expr::broadcast(base.clone(), *lanes))
        }
        ExprKind::Cast { ty, value } => cast(s, *ty, value),
        _ => None,
    }
}

fn cast(s: &mut Simplifier, to: Type, v: &Expr) -> Option<Rewrite> {
    let from = v.ty();
    if from == to {
        return fire("cast_noop", v.clone());
    }
    match v.kind() {
        ExprKind::Broadcast { value, lanes } => {
            let inner = s.rewrite(Expr::cast(to.element_of(), value.clone()));
            fire("cast_broadcast", Expr::broadcast(inner, *lanes))
        }
        // A widening cast keeps every value, so a cast of it only sees the
        // original.
        ExprKind::Cast { value: x, .. } if is_widening(x.ty(), from) => fire("cast_cast", Expr::cast(to, x.clone())),
        _ => None,
    }
}

fn is_widening(from: Type, to: Type) -> bool {
    from.is_integer() && from.code == to.code && to.bits >= from.bits
}
