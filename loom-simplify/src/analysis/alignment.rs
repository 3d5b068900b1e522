#![forbid(unsafe_code)]

use loom_ir::{BinOp, Const, Expr, ExprKind, ModulusRemainder, Scope, Type, UnaryOp};

/// Congruence fact for the integer values of `e`. For vectors the fact holds
/// in every lane.
pub fn modulus_remainder(e: &Expr, facts: &Scope<ModulusRemainder>) -> ModulusRemainder {
    let mut lets = Vec::new();
    alignment(e, facts, &mut lets)
}

/// Restricts a fact to what holds after wrap-around in `ty`.
fn fit(ty: Type, fact: ModulusRemainder) -> ModulusRemainder {
    if !ty.is_integer() {
        return ModulusRemainder::unknown();
    }
    if !ty.can_overflow() {
        return fact;
    }
    match fact.as_exact() {
        Some(v) => match Const::Int(v).normalize(ty.element_of()) {
            Const::Int(w) => ModulusRemainder::exact(w),
            Const::UInt(w) => i64::try_from(w).map_or_else(|_| ModulusRemainder::unknown(), ModulusRemainder::exact),
            _ => ModulusRemainder::unknown(),
        },
        None => fact.wrap_to(ty.bits),
    }
}

fn alignment(e: &Expr, facts: &Scope<ModulusRemainder>, lets: &mut Vec<(String, ModulusRemainder)>) -> ModulusRemainder {
    let ty = e.ty();
    if !ty.is_integer() {
        return ModulusRemainder::unknown();
    }
    let fact = match e.kind() {
        ExprKind::IntImm { value, .. } => ModulusRemainder::exact(*value),
        ExprKind::UIntImm { value, .. } => {
            i64::try_from(*value).map_or_else(|_| ModulusRemainder::unknown(), ModulusRemainder::exact)
        }
        ExprKind::Var { name, .. } => lets
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
            .or_else(|| facts.get(name).copied())
            .unwrap_or_default(),
        ExprKind::Cast { value, .. } if value.ty().is_integer() => {
            let inner = alignment(value, facts, lets);
            let from = value.ty();
            if from.can_overflow() { inner.wrap_to(from.bits) } else { inner }
        }
        ExprKind::Unary { op: UnaryOp::Neg, value } => alignment(value, facts, lets).neg(),
        ExprKind::Binary { op, a, b } => {
            let fa = alignment(a, facts, lets);
            let fb = alignment(b, facts, lets);
            match op {
                BinOp::Add => fa.add(&fb),
                BinOp::Sub => fa.sub(&fb),
                BinOp::Mul => fa.mul(&fb),
                BinOp::Mod => match fb.as_exact() {
                    Some(c) if c > 0 => fa.mod_by(c),
                    _ => ModulusRemainder::unknown(),
                },
                BinOp::Min | BinOp::Max => fa.unify(&fb),
                _ => ModulusRemainder::unknown(),
            }
        }
        ExprKind::Select { then_value, else_value, .. } => {
            alignment(then_value, facts, lets).unify(&alignment(else_value, facts, lets))
        }
        ExprKind::Broadcast { value, .. } => alignment(value, facts, lets),
        ExprKind::Ramp { base, stride, .. } => {
            // base + i * stride for an unknown lane index i
            let step = alignment(stride, facts, lets).mul(&ModulusRemainder::unknown());
            alignment(base, facts, lets).add(&step)
        }
        ExprKind::Let { name, value, body } => {
            let v = alignment(value, facts, lets);
            lets.push((name.clone(), v));
            let out = alignment(body, facts, lets);
            lets.pop();
            out
        }
        _ => ModulusRemainder::unknown(),
    };
    fit(ty, fact)
}
