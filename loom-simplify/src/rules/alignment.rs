#![forbid(unsafe_code)]

//! Folding driven by congruence facts: `x ≡ r (mod m)`.

use loom_ir::{BinOp, Expr, ExprKind};

use super::compare::truth;
use super::{Rewrite, exact_int, fire, int_lit, lit, pure};
use crate::simplifier::Simplifier;

pub(super) fn rewrite(s: &mut Simplifier, e: &Expr) -> Option<Rewrite> {
    let ExprKind::Binary { op, a, b } = e.kind() else {
        return None;
    };
    if !a.ty().is_integer() {
        return None;
    }
    match op {
        BinOp::Mod => modulo(s, e, a, b),
        BinOp::Div => divide(s, e, a, b),
        BinOp::Eq | BinOp::Ne => {
            let c = int_lit(b)?;
            let fact = s.alignment_of(a);
            let excluded = match fact.as_exact() {
                Some(v) => v != c,
                None => !fact.is_unknown() && c.rem_euclid(fact.modulus) != fact.remainder,
            };
            (excluded && pure(a)).then(|| Rewrite {
                rule: "congruence_excludes",
                expr: truth(e.ty(), *op == BinOp::Ne),
            })
        }
        _ => None,
    }
}

fn modulo(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Option<Rewrite> {
    let ty = e.ty();
    if let (ExprKind::Ramp { base, stride, lanes }, Some(c)) = (a.kind(), int_lit(b)) {
        if c > 0 && ty.preserves_congruence(c) && s.alignment_of(stride).divisible_by(c) {
            let inner = s.rewrite(Expr::rem(base.clone(), lit(ty.element_of(), c)));
            return fire("ramp_mod", Expr::broadcast(inner, *lanes));
        }
    }
    let c = int_lit(b).filter(|c| *c > 0)?;
    if pure(a) {
        if let Some(r) = s.alignment_of(a).remainder_mod(c) {
            return fire("mod_known", lit(ty, r));
        }
    }
    if !ty.preserves_congruence(c) {
        return None;
    }
    // (p + q) % c -> q % c when c divides p
    let (p, q) = a.as_binary(BinOp::Add)?;
    for (dropped, kept) in [(p, q), (q, p)] {
        if pure(dropped) && s.alignment_of(dropped).divisible_by(c) {
            let reduced = s.rewrite(Expr::rem(kept.clone(), b.clone()));
            return fire("mod_drop_multiple", reduced);
        }
    }
    None
}

fn divide(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Option<Rewrite> {
    let ty = e.ty();
    if !exact_int(ty) {
        return None;
    }
    let c = int_lit(b).filter(|c| *c > 0)?;
    // (x * c1) / c -> x * (c1 / c) when c divides c1
    if let Some((x, c1)) = a.as_binary(BinOp::Mul) {
        if let Some(c1) = int_lit(c1).filter(|c1| c1 % c == 0) {
            return fire("div_exact_mul", Expr::mul(x.clone(), lit(ty, c1 / c)));
        }
    }
    // (p + q) / c -> p / c + q / c when c divides p
    let (p, q) = a.as_binary(BinOp::Add)?;
    let split = s.alignment_of(p).divisible_by(c) || s.alignment_of(q).divisible_by(c);
    if !split {
        return None;
    }
    let pc = s.rewrite(Expr::div(p.clone(), b.clone()));
    let qc = s.rewrite(Expr::div(q.clone(), b.clone()));
    let sum = s.rewrite(Expr::add(pc, qc));
    fire("div_split", sum)
}
