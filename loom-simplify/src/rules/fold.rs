#![forbid(unsafe_code)]

use loom_ir::{Expr, ExprKind, fold_binary, fold_cast, fold_unary};

use super::{Rewrite, fire};
use crate::simplifier::Simplifier;

/// Evaluates nodes whose operands are all literals.
pub(super) fn rewrite(_: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ty = e.ty();
    match e.kind() {
        ExprKind::Unary { op, value } => {
            let c = value.as_const_lanes()?;
            fire("fold", Expr::from_const(ty, fold_unary(*op, ty, c)?))
        }
        ExprKind::Binary { op, a, b } => {
            if a.ty().lanes != b.ty().lanes {
                return None;
            }
            let (ca, cb) = (a.as_const_lanes()?, b.as_const_lanes()?);
            fire("fold", Expr::from_const(ty, fold_binary(*op, a.ty(), ca, cb)?))
        }
        ExprKind::Cast { ty: to, value } => {
            let c = value.as_const_lanes()?;
            fire("fold", Expr::from_const(*to, fold_cast(*to, c)))
        }
        ExprKind::Select { cond, then_value, else_value } => match cond.as_bool()? {
            true => fire("select_known", then_value.clone()),
            false => fire("select_known", else_value.clone()),
        },
        _ => None,
    }
}
