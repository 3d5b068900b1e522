#![forbid(unsafe_code)]

//! Algebraic simplifier and compile-time prover for the loom IR.
//!
//! [`simplify_expr`] and [`simplify_stmt`] rewrite a tree bottom-up with an
//! ordered set of local rules (constant folding, algebraic identities, then
//! folding driven by range and alignment facts). [`can_prove`] asks whether
//! a condition simplifies to `true`.

pub mod analysis;
mod error;
mod exprs;
mod lets;
mod options;
mod prove;
mod rules;
mod simplifier;
mod stmt;

use loom_ir::{Expr, Interval, ModulusRemainder, Scope, Stmt, check_well_scoped_expr, check_well_scoped_stmt};

pub use analysis::{bounds_of_expr, modulus_remainder};
pub use error::{SelfTestError, SelfTestFailure};
pub use exprs::simplify_exprs;
pub use options::SimplifyOptions;
pub use prove::{can_prove, can_prove_with};
pub use self_test::{SelfTestReport, simplify_test};
pub use simplifier::Simplifier;

/// Simplifies `e` under the caller's facts. The stores are read, never
/// modified.
///
/// # Panics
///
/// In debug builds, when a name is bound twice in `e` or used outside its
/// binder.
pub fn simplify_expr(
    e: &Expr,
    remove_dead_lets: bool,
    bounds: &Scope<Interval>,
    align: &Scope<ModulusRemainder>,
) -> Expr {
    let options = SimplifyOptions::default().with_remove_dead_lets(remove_dead_lets);
    simplify_expr_with_options(e, &options, bounds, align)
}

pub fn simplify_expr_with_options(
    e: &Expr,
    options: &SimplifyOptions,
    bounds: &Scope<Interval>,
    align: &Scope<ModulusRemainder>,
) -> Expr {
    if cfg!(debug_assertions) && options.check_preconditions {
        if let Err(violation) = check_well_scoped_expr(e) {
            panic!("simplify called on ill-scoped input: {violation}");
        }
    }
    Simplifier::new(options.clone(), bounds, align).mutate_expr(e)
}

/// Statement form of [`simplify_expr`]. One pair of fact stores lives for
/// the whole traversal.
///
/// # Panics
///
/// In debug builds, when a name is bound twice in `s` or used outside its
/// binder.
pub fn simplify_stmt(
    s: &Stmt,
    remove_dead_lets: bool,
    bounds: &Scope<Interval>,
    align: &Scope<ModulusRemainder>,
) -> Stmt {
    let options = SimplifyOptions::default().with_remove_dead_lets(remove_dead_lets);
    simplify_stmt_with_options(s, &options, bounds, align)
}

pub fn simplify_stmt_with_options(
    s: &Stmt,
    options: &SimplifyOptions,
    bounds: &Scope<Interval>,
    align: &Scope<ModulusRemainder>,
) -> Stmt {
    if cfg!(debug_assertions) && options.check_preconditions {
        if let Err(violation) = check_well_scoped_stmt(s) {
            panic!("simplify called on ill-scoped input: {violation}");
        }
    }
    Simplifier::new(options.clone(), bounds, align).mutate_stmt(s)
}

/// [`simplify_expr`] with dead-let removal and no caller facts.
pub fn simplify(e: &Expr) -> Expr {
    simplify_expr(e, true, &Scope::new(), &Scope::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "ill-scoped")]
    fn duplicate_binders_are_rejected() {
        let inner = Expr::let_in("x", Expr::int(1), Expr::var("x"));
        let e = Expr::let_in("x", Expr::int(2), inner);
        simplify(&e);
    }

    #[test]
    fn checks_can_be_disabled() {
        let inner = Expr::let_in("x", Expr::int(1), Expr::var("x"));
        let e = Expr::let_in("x", Expr::int(2), inner);
        let options = SimplifyOptions { check_preconditions: false, ..SimplifyOptions::default() };
        let out = simplify_expr_with_options(&e, &options, &Scope::new(), &Scope::new());
        assert_eq!(out, Expr::int(1));
    }
}
