#![forbid(unsafe_code)]

use loom_ir::{BinOp, Expr, ExprKind};

use super::{Rewrite, exact_int, fire, fits, int_lit, lit, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ExprKind::Binary { op: op @ (BinOp::Div | BinOp::Mod), a, b } = e.kind() else {
        return None;
    };
    let ty = e.ty();
    if *op == BinOp::Div && b.is_one() {
        return fire("div_one", a.clone());
    }
    if !ty.is_integer() {
        return None;
    }
    if let (ExprKind::Broadcast { value: x, lanes }, ExprKind::Broadcast { value: y, lanes: l2 }) = (a.kind(), b.kind())
    {
        if lanes == l2 {
            let inner = s.rewrite(Expr::binary(*op, x.clone(), y.clone()));
            return fire("broadcast_divmod", Expr::broadcast(inner, *lanes));
        }
    }
    let c = int_lit(b).filter(|c| *c > 0)?;
    match op {
        BinOp::Mod => {
            if c == 1 && pure(a) {
                return fire("mod_one", lit(ty, 0));
            }
            if let Some((_, c2)) = a.as_binary(BinOp::Mod) {
                if int_lit(c2) == Some(c) {
                    return fire("mod_mod", a.clone());
                }
            }
            None
        }
        _ => {
            if !exact_int(ty) {
                return None;
            }
            let (x, c1) = a.as_binary(BinOp::Div)?;
            let c1 = int_lit(c1).filter(|c1| *c1 > 0)?;
            let k = c1.checked_mul(c).filter(|k| fits(ty, *k))?;
            fire("div_div", Expr::div(x.clone(), lit(ty, k)))
        }
    }
}

#[cfg(test)]
mod tests {
    use loom_ir::{Expr, Type};

    use crate::simplify;

    #[test]
    fn trivial_divisors() {
        let x = Expr::var("x");
        assert_eq!(simplify(&Expr::div(x.clone(), Expr::int(1))), x);
        assert_eq!(simplify(&Expr::rem(x.clone(), Expr::int(1))), Expr::int(0));
        let f = Expr::f32(2.5);
        assert_eq!(simplify(&Expr::div(Expr::var_of("y", Type::float(32)), Expr::f32(1.0))), Expr::var_of("y", Type::float(32)));
        assert_eq!(simplify(&Expr::div(f, Expr::f32(2.0))), Expr::f32(1.25));
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let e = Expr::div(Expr::var("x"), Expr::int(0));
        assert_eq!(simplify(&e), e);
        let e = Expr::rem(Expr::int(7), Expr::int(0));
        assert_eq!(simplify(&e), e);
    }

    #[test]
    fn nested_division_and_modulo() {
        let x = Expr::var("x");
        let e = Expr::div(Expr::div(x.clone(), Expr::int(2)), Expr::int(3));
        assert_eq!(simplify(&e), Expr::div(x.clone(), Expr::int(6)));
        let m = Expr::rem(x.clone(), Expr::int(5));
        assert_eq!(simplify(&Expr::rem(m.clone(), Expr::int(5))), m);
    }

    #[test]
    fn nested_divisors_must_fit_the_type() {
        let x = Expr::var("x");
        let e = Expr::div(Expr::div(x.clone(), Expr::int(65536)), Expr::int(65536));
        assert_eq!(simplify(&e), e);
        let e = Expr::div(Expr::div(x.clone(), Expr::int(65536)), Expr::int(32767));
        assert_eq!(simplify(&e), Expr::div(x, Expr::int(65536 * 32767)));
    }
}

