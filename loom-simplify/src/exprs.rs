#![forbid(unsafe_code)]

use loom_ir::visit::map_stmt_children;
use loom_ir::{Expr, Scope, Stmt};

use crate::options::SimplifyOptions;
use crate::simplifier::Simplifier;

/// Simplifies each expression of `s` on its own, with empty fact stores.
///
/// Statement structure is kept exactly: no branch is collapsed, no
/// statement-level binding is substituted or removed, and nothing learned
/// in one statement is visible in another.
pub fn simplify_exprs(s: &Stmt) -> Stmt {
    map_stmt_children(s, simplify_local, simplify_exprs)
}

fn simplify_local(e: &Expr) -> Expr {
    Simplifier::new(SimplifyOptions::default(), &Scope::new(), &Scope::new()).mutate_expr(e)
}
