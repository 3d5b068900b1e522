#![forbid(unsafe_code)]

//! Folding driven by the bounds of the operands.

use loom_ir::{BinOp, Expr, ExprKind, Interval};

use super::compare::truth;
use super::{Rewrite, fire, fits, int_lit, lit, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    if e.is_const() {
        return None;
    }
    let ty = e.ty();
    if ty.is_integer() && pure(e) {
        if let Some(v) = s.bounds_of(e).as_single_point() {
            return fire("single_value", lit(ty, v));
        }
    }
    let ExprKind::Binary { op, a, b } = e.kind() else {
        return None;
    };
    if !a.ty().is_integer() {
        return None;
    }
    let (ba, bb) = (s.bounds_of(a), s.bounds_of(b));
    match op {
        op if op.is_comparison() => {
            let holds = decide(*op, &ba, &bb)?;
            (pure(a) && pure(b)).then(|| Rewrite { rule: "compare_ranges", expr: truth(ty, holds) })
        }
        BinOp::Min | BinOp::Max => {
            let keep_a = if *op == BinOp::Min { ba.all_le(&bb) } else { bb.all_le(&ba) };
            let keep_b = if *op == BinOp::Min { bb.all_le(&ba) } else { ba.all_le(&bb) };
            if keep_a && pure(b) {
                fire("minmax_ranges", a.clone())
            } else if keep_b && pure(a) {
                fire("minmax_ranges", b.clone())
            } else {
                None
            }
        }
        BinOp::Mod => {
            // Every value of `a` lies in the same block [k*c, (k+1)*c).
            let c = int_lit(b).filter(|c| *c > 0)?;
            let (lo, hi) = (ba.min?, ba.max?);
            let k = lo.div_euclid(c);
            if k != hi.div_euclid(c) {
                return None;
            }
            if k == 0 {
                return fire("mod_in_range", a.clone());
            }
            let offset = lit(ty, k.checked_mul(c).filter(|v| fits(ty, *v))?);
            let shifted = s.rewrite(Expr::sub(a.clone(), offset));
            fire("mod_in_range", shifted)
        }
        _ => None,
    }
}

/// Outcome of `a op b` for every `a` in `ba` and `b` in `bb`, if fixed.
fn decide(op: BinOp, ba: &Interval, bb: &Interval) -> Option<bool> {
    match op {
        BinOp::Lt if ba.all_lt(bb) => Some(true),
        BinOp::Lt if bb.all_le(ba) => Some(false),
        BinOp::Le if ba.all_le(bb) => Some(true),
        BinOp::Le if bb.all_lt(ba) => Some(false),
        BinOp::Gt => decide(BinOp::Lt, bb, ba),
        BinOp::Ge => decide(BinOp::Le, bb, ba),
        BinOp::Eq | BinOp::Ne => {
            let equal = match (ba.as_single_point(), bb.as_single_point()) {
                (Some(x), Some(y)) if x == y => Some(true),
                _ if ba.disjoint(bb) => Some(false),
                _ => None,
            }?;
            Some(equal == (op == BinOp::Eq))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use loom_ir::{Expr, Interval, Scope, Type};

    use crate::simplify_expr;

    fn with(e: &Expr, facts: &[(&str, Interval)]) -> Expr {
        let bounds: Scope<Interval> = facts.iter().map(|(n, i)| (n.to_string(), *i)).collect();
        simplify_expr(e, true, &bounds, &Scope::new())
    }

    #[test]
    fn comparisons_against_known_ranges() {
        let x = Expr::var("x");
        let facts = [("x", Interval::bounded(0, 5)), ("y", Interval::bounded(10, 20))];
        assert!(with(&Expr::lt(x.clone(), Expr::int(10)), &facts).is_true());
        assert!(with(&Expr::lt(x.clone(), Expr::int(0)), &facts).is_false());
        assert!(with(&Expr::eq(x.clone(), Expr::var("y")), &facts).is_false());
        assert!(with(&Expr::ne(x.clone(), Expr::var("y")), &facts).is_true());
        let open = Expr::lt(x.clone(), Expr::int(3));
        assert_eq!(with(&open, &facts), open);
    }

    #[test]
    fn dominated_min_and_max() {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let facts = [("x", Interval::bounded(0, 5)), ("y", Interval::bounded(10, 20))];
        assert_eq!(with(&Expr::min(x.clone(), y.clone()), &facts), x);
        assert_eq!(with(&Expr::max(x, y.clone()), &facts), y);
    }

    #[test]
    fn modulo_within_one_block() {
        let x = Expr::var("x");
        let e = Expr::rem(x.clone(), Expr::int(4));
        assert_eq!(with(&e, &[("x", Interval::bounded(0, 3))]), x);
        assert_eq!(with(&e, &[("x", Interval::bounded(8, 11))]), Expr::add(x.clone(), Expr::int(-8)));
        assert_eq!(with(&e, &[("x", Interval::bounded(2, 5))]), e);
    }

    #[test]
    fn single_values_become_literals() {
        let e = Expr::add(Expr::var("x"), Expr::int(1));
        assert_eq!(with(&e, &[("x", Interval::single_point(7))]), Expr::int(8));
    }

    #[test]
    fn effects_block_range_folding() {
        let f = Expr::call("f", vec![], Type::i32());
        let e = Expr::lt(Expr::min(f, Expr::int(3)), Expr::int(10));
        assert_eq!(with(&e, &[]), e);
    }
}
