#![forbid(unsafe_code)]

use loom_ir::{BinOp, Expr, ExprKind, Type};

use super::{Rewrite, exact_int, fire, lit, merge_consts, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ExprKind::Binary { op, a, b } = e.kind() else {
        return None;
    };
    if !op.is_comparison() {
        return None;
    }
    let (op, ty, ot) = (*op, e.ty(), a.ty());

    if !ot.is_float() && a == b && pure(a) {
        let holds = matches!(op, BinOp::Eq | BinOp::Le | BinOp::Ge);
        return fire("compare_self", truth(ty, holds));
    }
    if let (ExprKind::Broadcast { value: x, lanes }, ExprKind::Broadcast { value: y, lanes: l2 }) = (a.kind(), b.kind())
    {
        if lanes == l2 {
            let inner = s.rewrite(Expr::binary(op, x.clone(), y.clone()));
            return fire("broadcast_compare", Expr::broadcast(inner, *lanes));
        }
    }
    if !ot.is_integer() {
        return None;
    }

    if matches!(op, BinOp::Eq | BinOp::Ne) {
        // (x + c1) == c2 -> x == c2 - c1
        if let Some((x, c1)) = a.as_binary(BinOp::Add).filter(|(_, c1)| c1.is_const()) {
            if b.is_const() {
                let c = merge_consts(s, BinOp::Sub, b, c1)?;
                return fire("eq_move_const", Expr::binary(op, x.clone(), c));
            }
        }
        // x - y == 0 -> x == y
        if let Some((x, y)) = a.as_binary(BinOp::Sub) {
            if b.is_zero() {
                return fire("eq_diff_zero", Expr::binary(op, x.clone(), y.clone()));
            }
        }
        return None;
    }

    if !exact_int(ot) {
        return None;
    }
    let add_const = |e: &Expr| -> Option<(Expr, Expr)> {
        e.as_binary(BinOp::Add)
            .filter(|(_, c)| c.is_const())
            .map(|(x, c)| (x.clone(), c.clone()))
    };
    match (add_const(a), add_const(b)) {
        // x + c1 < x + c2 -> c1 < c2
        (Some((x1, c1)), Some((x2, c2))) if x1 == x2 && pure(&x1) => fire("lt_cancel", Expr::binary(op, c1, c2)),
        // x + c1 < c2 -> x < c2 - c1
        (Some((x, c1)), None) if b.is_const() => {
            let c = merge_consts(s, BinOp::Sub, b, &c1)?;
            fire("lt_move_const", Expr::binary(op, x, c))
        }
        // c1 < x + c2 -> c1 - c2 < x
        (None, Some((x, c2))) if a.is_const() => {
            let c = merge_consts(s, BinOp::Sub, a, &c2)?;
            fire("lt_move_const", Expr::binary(op, c, x))
        }
        // x < x + c -> 0 < c
        (None, Some((x, c))) if &x == a && pure(a) => fire("lt_cancel", Expr::binary(op, lit(ot, 0), c)),
        // x + c < x -> c < 0
        (Some((x, c)), None) if &x == b && pure(b) => fire("lt_cancel", Expr::binary(op, c, lit(ot, 0))),
        _ => None,
    }
}

/// Boolean literal of type `ty` (broadcast for vectors).
pub(super) fn truth(ty: Type, holds: bool) -> Expr {
    lit(ty, i64::from(holds))
}

#[cfg(test)]
mod tests {
    use loom_ir::{Expr, Type};

    use crate::simplify;

    #[test]
    fn reflexive_comparisons() {
        let x = Expr::var("x");
        assert!(simplify(&Expr::eq(x.clone(), x.clone())).is_true());
        assert!(simplify(&Expr::le(x.clone(), x.clone())).is_true());
        assert!(simplify(&Expr::lt(x.clone(), x.clone())).is_false());
        assert!(simplify(&Expr::ne(x.clone(), x.clone())).is_false());
        let f = Expr::var_of("f", Type::float(32));
        assert_eq!(simplify(&Expr::eq(f.clone(), f.clone())), Expr::eq(f.clone(), f));
    }

    #[test]
    fn greater_than_flips_to_less_than() {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        assert_eq!(simplify(&Expr::gt(x.clone(), y.clone())), Expr::lt(y.clone(), x.clone()));
        assert_eq!(simplify(&Expr::ge(x.clone(), y.clone())), Expr::le(y, x));
    }

    #[test]
    fn constants_move_across() {
        let x = Expr::var("x");
        let e = Expr::eq(Expr::add(x.clone(), Expr::int(3)), Expr::int(10));
        assert_eq!(simplify(&e), Expr::eq(x.clone(), Expr::int(7)));
        let e = Expr::lt(Expr::add(x.clone(), Expr::int(3)), Expr::int(10));
        assert_eq!(simplify(&e), Expr::lt(x.clone(), Expr::int(7)));
        let e = Expr::lt(Expr::add(x.clone(), Expr::int(1)), Expr::add(x.clone(), Expr::int(2)));
        assert!(simplify(&e).is_true());
        let e = Expr::eq(Expr::sub(x.clone(), Expr::var("y")), Expr::int(0));
        assert_eq!(simplify(&e), Expr::eq(x, Expr::var("y")));
    }

    #[test]
    fn wrapping_order_comparisons_stay_put() {
        let u8t = Type::uint(8);
        let x = Expr::var_of("x", u8t);
        let e = Expr::lt(Expr::add(x.clone(), Expr::make_const(u8t, 3)), Expr::make_const(u8t, 10));
        assert_eq!(simplify(&e), e);
    }

    #[test]
    fn constants_near_the_type_limits() {
        let (max, min) = (i64::from(i32::MAX), i64::from(i32::MIN));
        let x = Expr::var("x");
        // x - 5 never reaches MAX, and MIN + 2 is below every x + 3.
        assert!(simplify(&Expr::lt(Expr::sub(x.clone(), Expr::int(5)), Expr::int(max))).is_true());
        let e = Expr::lt(Expr::int(min + 2), Expr::add(x.clone(), Expr::int(3)));
        assert!(simplify(&e).is_true());
        assert!(!crate::can_prove(&Expr::not(e)));
        assert!(simplify(&Expr::eq(Expr::add(x.clone(), Expr::int(1)), Expr::int(min))).is_false());

        let e = Expr::lt(Expr::add(x.clone(), Expr::int(3)), Expr::int(min + 5));
        assert_eq!(simplify(&e), Expr::lt(x, Expr::int(min + 2)));
    }
}

