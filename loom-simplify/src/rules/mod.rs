#![forbid(unsafe_code)]

//! Local rewrite rules.
//!
//! Each rule looks only at the root of the node it is given (its children
//! are already simplified) and either declines or returns a replacement.
//! The list order is the priority order: constant folding, then
//! canonicalization and algebraic identities, then range-aware folding,
//! then alignment-aware folding.

use loom_ir::visit::has_side_effects;
use loom_ir::{BinOp, Expr, Type};

use crate::simplifier::Simplifier;

mod alignment;
mod arith;
mod canonical;
mod compare;
mod divmod;
mod fold;
mod logic;
mod minmax;
mod range;
mod select;
mod vector;

/// A rule firing.
pub(crate) struct Rewrite {
    pub rule: &'static str,
    pub expr: Expr,
}

pub(crate) type RuleFn = fn(&mut Simplifier, &Expr) -> Option<Rewrite>;

pub(crate) const RULES: &[RuleFn] = &[
    fold::rewrite,
    canonical::rewrite,
    arith::rewrite,
    divmod::rewrite,
    minmax::rewrite,
    compare::rewrite,
    logic::rewrite,
    select::rewrite,
    vector::rewrite,
    range::rewrite,
    alignment::rewrite,
];

pub(crate) fn fire(rule: &'static str, expr: Expr) -> Option<Rewrite> {
    Some(Rewrite { rule, expr })
}

/// Dropping `e` loses nothing observable.
pub(crate) fn pure(e: &Expr) -> bool {
    !has_side_effects(e)
}

/// Integer literal (or broadcast of one) in an integer-typed expression.
pub(crate) fn int_lit(e: &Expr) -> Option<i64> {
    if e.ty().is_integer() { e.as_int() } else { None }
}

pub(crate) fn lit(ty: Type, v: i64) -> Expr {
    Expr::make_const(ty, v)
}

/// Integer arithmetic without wrap-around, where order comparisons can be
/// moved across additions.
pub(crate) fn exact_int(ty: Type) -> bool {
    ty.is_int() && !ty.can_overflow()
}

/// `v` is a value of the integer type `ty`.
pub(crate) fn fits(ty: Type, v: i64) -> bool {
    matches!((ty.min_value(), ty.max_value()), (Some(lo), Some(hi)) if lo <= v && v <= hi)
}

/// The literal `a op b`, for rules that merge two constants into one.
///
/// On the no-overflow types the merged constant must itself be a value of
/// the type: the unmerged expression may stay in range while the merged
/// constant does not (`(x - 5) < 2147483647`). `None` then tells the rule
/// to decline. Everything else folds as usual.
pub(crate) fn merge_consts(s: &mut Simplifier, op: BinOp, a: &Expr, b: &Expr) -> Option<Expr> {
    let ty = a.ty();
    if exact_int(ty) {
        if let (Some(x), Some(y)) = (int_lit(a), int_lit(b)) {
            let merged = match op {
                BinOp::Add => x.checked_add(y),
                BinOp::Sub => x.checked_sub(y),
                BinOp::Mul => x.checked_mul(y),
                _ => return Some(s.rewrite(Expr::binary(op, a.clone(), b.clone()))),
            };
            return merged.filter(|v| fits(ty, *v)).map(|v| lit(ty, v));
        }
    }
    Some(s.rewrite(Expr::binary(op, a.clone(), b.clone())))
}
