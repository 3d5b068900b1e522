#![forbid(unsafe_code)]

use loom_ir::{Expr, ExprKind};

use super::{Rewrite, fire, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ExprKind::Select { cond, then_value, else_value } = e.kind() else {
        return None;
    };
    if then_value == else_value && pure(cond) {
        return fire("select_same", then_value.clone());
    }
    if let Some(c) = cond.as_not() {
        return fire("select_not", Expr::select(c.clone(), else_value.clone(), then_value.clone()));
    }
    if cond.ty().is_scalar() {
        match (then_value.as_bool(), else_value.as_bool()) {
            (Some(true), Some(false)) => return fire("select_cond", cond.clone()),
            (Some(false), Some(true)) => {
                let negated = s.rewrite(Expr::not(cond.clone()));
                return fire("select_not_cond", negated);
            }
            _ => {}
        }
    }
    // select(c, select(c, a, b), d) -> select(c, a, d)
    if let ExprKind::Select { cond: c2, then_value: a, .. } = then_value.kind() {
        if c2 == cond && pure(cond) {
            return fire("select_nested", Expr::select(cond.clone(), a.clone(), else_value.clone()));
        }
    }
    if let ExprKind::Select { cond: c2, else_value: b, .. } = else_value.kind() {
        if c2 == cond && pure(cond) {
            return fire("select_nested", Expr::select(cond.clone(), then_value.clone(), b.clone()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use loom_ir::{Expr, Type};

    use crate::simplify;

    fn p() -> Expr {
        Expr::var_of("p", Type::bool())
    }

    #[test]
    fn known_and_redundant_conditions() {
        let x = Expr::var("x");
        assert_eq!(simplify(&Expr::select(Expr::bool(true), x.clone(), Expr::int(0))), x);
        assert_eq!(simplify(&Expr::select(p(), x.clone(), x.clone())), x);
    }

    #[test]
    fn boolean_selects_become_the_condition() {
        assert_eq!(simplify(&Expr::select(p(), Expr::bool(true), Expr::bool(false))), p());
        assert_eq!(simplify(&Expr::select(p(), Expr::bool(false), Expr::bool(true))), Expr::not(p()));
    }

    #[test]
    fn negated_condition_swaps_branches() {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let e = Expr::select(Expr::not(p()), x.clone(), y.clone());
        assert_eq!(simplify(&e), Expr::select(p(), y, x));
    }

    #[test]
    fn nested_selects_on_the_same_condition() {
        let (x, y, z) = (Expr::var("x"), Expr::var("y"), Expr::var("z"));
        let e = Expr::select(p(), Expr::select(p(), x.clone(), y), z.clone());
        assert_eq!(simplify(&e), Expr::select(p(), x, z));
    }
}
