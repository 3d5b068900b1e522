#![forbid(unsafe_code)]

use loom_ir::{BinOp, Expr, ExprKind, Interval, Scope, Type, UnaryOp};

/// Provable range of the integer values `e` can take, given the caller's
/// facts. Vectors get the hull of all their lanes. Anything that is not an
/// integer gets `Interval::everything()`.
pub fn bounds_of_expr(e: &Expr, facts: &Scope<Interval>) -> Interval {
    let mut lets = Vec::new();
    bounds(e, facts, &mut lets)
}

/// Range of every value of `ty` that survives in the IR.
fn type_range(ty: Type) -> Interval {
    if ty.is_integer() || ty.is_bool() {
        Interval::of_type(ty.element_of())
    } else {
        Interval::everything()
    }
}

fn within(inner: &Interval, outer: &Interval) -> bool {
    let lo_ok = match (outer.min, inner.min) {
        (None, _) => true,
        (Some(o), Some(i)) => i >= o,
        (Some(_), None) => false,
    };
    let hi_ok = match (outer.max, inner.max) {
        (None, _) => true,
        (Some(o), Some(i)) => i <= o,
        (Some(_), None) => false,
    };
    lo_ok && hi_ok
}

/// Wrapping types fall back to their full range once the exact result
/// might have left it.
fn fit(ty: Type, exact: Interval) -> Interval {
    if !ty.is_integer() {
        return Interval::everything();
    }
    let range = type_range(ty);
    if ty.can_overflow() && !within(&exact, &range) { range } else { exact }
}

fn lookup<'a>(name: &str, facts: &'a Scope<Interval>, lets: &'a [(String, Interval)]) -> Option<&'a Interval> {
    lets.iter().rev().find(|(n, _)| n == name).map(|(_, i)| i).or_else(|| facts.get(name))
}

fn bounds(e: &Expr, facts: &Scope<Interval>, lets: &mut Vec<(String, Interval)>) -> Interval {
    let ty = e.ty();
    if ty.is_float() {
        return Interval::everything();
    }
    match e.kind() {
        ExprKind::IntImm { value, .. } => Interval::single_point(*value),
        ExprKind::UIntImm { value, .. } => match i64::try_from(*value) {
            Ok(v) => Interval::single_point(v),
            Err(_) => type_range(ty),
        },
        ExprKind::BoolImm(b) => Interval::single_point(i64::from(*b)),
        ExprKind::FloatImm { .. } => Interval::everything(),
        ExprKind::Var { name, .. } => {
            let range = type_range(ty);
            match lookup(name, facts, lets) {
                Some(fact) => {
                    let i = fact.intersect(&range);
                    match (i.min, i.max) {
                        (Some(lo), Some(hi)) if lo > hi => range,
                        _ => i,
                    }
                }
                None => range,
            }
        }
        ExprKind::Cast { ty: to, value } => {
            let from = value.ty();
            let target = type_range(*to);
            if !to.is_integer() {
                return Interval::everything();
            }
            if from.is_integer() || from.is_bool() {
                let inner = bounds(value, facts, lets);
                if within(&inner, &target) {
                    return inner;
                }
            }
            target
        }
        ExprKind::Unary { op: UnaryOp::Neg, value } => fit(ty, bounds(value, facts, lets).neg()),
        ExprKind::Unary { op: UnaryOp::Not, .. } => type_range(ty),
        ExprKind::Binary { op, a, b } => {
            if op.is_predicate() {
                return type_range(ty);
            }
            let ba = bounds(a, facts, lets);
            let bb = bounds(b, facts, lets);
            let exact = match op {
                BinOp::Add => ba.add(&bb),
                BinOp::Sub => ba.sub(&bb),
                BinOp::Mul => ba.mul(&bb),
                BinOp::Min => ba.min_with(&bb),
                BinOp::Max => ba.max_with(&bb),
                BinOp::Div => match bb.as_single_point() {
                    Some(c) if c != 0 => ba.div_by_const(c),
                    _ => type_range(ty),
                },
                BinOp::Mod => match bb.as_single_point() {
                    Some(c) if c != 0 => ba.mod_by_const(c),
                    _ => remainder_range(&bb),
                },
                _ => type_range(ty),
            };
            fit(ty, exact)
        }
        ExprKind::Select { then_value, else_value, .. } => {
            let t = bounds(then_value, facts, lets);
            let f = bounds(else_value, facts, lets);
            t.union(&f)
        }
        ExprKind::Broadcast { value, .. } => bounds(value, facts, lets),
        ExprKind::Ramp { base, stride, lanes } => {
            let b = bounds(base, facts, lets);
            let s = bounds(stride, facts, lets);
            let last = b.add(&s.mul(&Interval::single_point(i64::from(*lanes) - 1)));
            fit(ty, b.union(&last))
        }
        ExprKind::Call { .. } => type_range(ty),
        ExprKind::Let { name, value, body } => {
            let v = bounds(value, facts, lets);
            lets.push((name.clone(), v));
            let out = bounds(body, facts, lets);
            lets.pop();
            out
        }
    }
}

// Euclidean remainder by an unknown divisor in `divisor`.
fn remainder_range(divisor: &Interval) -> Interval {
    let (Some(lo), Some(hi)) = (divisor.min, divisor.max) else {
        return Interval::at_least(0);
    };
    match lo.checked_abs().zip(hi.checked_abs()) {
        Some((a, b)) if a.max(b) > 0 => Interval::bounded(0, a.max(b) - 1),
        _ => Interval::at_least(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(pairs: &[(&str, Interval)]) -> Scope<Interval> {
        pairs.iter().map(|(n, i)| (n.to_string(), *i)).collect()
    }

    #[test]
    fn literals_and_variables() {
        let f = facts(&[("x", Interval::bounded(0, 10))]);
        assert_eq!(bounds_of_expr(&Expr::int(4), &f), Interval::single_point(4));
        assert_eq!(bounds_of_expr(&Expr::var("x"), &f), Interval::bounded(0, 10));
        assert_eq!(bounds_of_expr(&Expr::var("y"), &f), Interval::of_type(Type::i32()));
    }

    #[test]
    fn arithmetic_is_exact_for_wide_signed() {
        let f = facts(&[("x", Interval::bounded(0, 10)), ("y", Interval::bounded(-3, 3))]);
        let e = Expr::add(Expr::mul(Expr::var("x"), Expr::int(2)), Expr::var("y"));
        assert_eq!(bounds_of_expr(&e, &f), Interval::bounded(-3, 23));
        let m = Expr::min(Expr::var("x"), Expr::int(4));
        assert_eq!(bounds_of_expr(&m, &f), Interval::bounded(0, 4));
        let d = Expr::div(Expr::var("x"), Expr::int(4));
        assert_eq!(bounds_of_expr(&d, &f), Interval::bounded(0, 2));
        let r = Expr::rem(Expr::var("y"), Expr::int(4));
        assert_eq!(bounds_of_expr(&r, &f), Interval::bounded(0, 3));
    }

    #[test]
    fn wrapping_types_fall_back_to_their_range() {
        let u8t = Type::uint(8);
        let f = facts(&[("x", Interval::bounded(0, 200))]);
        let x = Expr::var_of("x", u8t);
        let e = Expr::add(x.clone(), Expr::make_const(u8t, 100));
        assert_eq!(bounds_of_expr(&e, &f), Interval::bounded(0, 255));
        let ok = Expr::add(x, Expr::make_const(u8t, 50));
        assert_eq!(bounds_of_expr(&ok, &f), Interval::bounded(50, 250));
    }

    #[test]
    fn lets_and_vectors() {
        let f = Scope::new();
        let e = Expr::let_in("t", Expr::int(3), Expr::add(Expr::var("t"), Expr::int(1)));
        assert_eq!(bounds_of_expr(&e, &f), Interval::single_point(4));
        let r = Expr::ramp(Expr::int(0), Expr::int(2), 4);
        assert_eq!(bounds_of_expr(&r, &f), Interval::bounded(0, 6));
        let s = Expr::select(Expr::var_of("c", Type::bool()), Expr::int(1), Expr::int(9));
        assert_eq!(bounds_of_expr(&s, &f), Interval::bounded(1, 9));
    }
}
