#![forbid(unsafe_code)]
#![allow(unused_assignments)]

//! Binder hygiene checks: no name is bound twice, and bound names are only
//! referenced inside their binder. Names never bound anywhere are free
//! parameters of the tree and are always allowed.

use std::collections::HashSet;

use miette::Diagnostic;
use thiserror::Error;

use crate::ir::{Expr, ExprKind, Stmt, StmtKind};
use crate::visit::{expr_binders, for_each_expr_child};

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ScopeViolation {
    #[error("scope error: `{name}` is bound more than once")]
    #[diagnostic(code(loom::scope), help("rename one of the bindings"))]
    DuplicateBinder { name: String },

    #[error("scope error: `{name}` is referenced outside the binding that defines it")]
    #[diagnostic(code(loom::scope))]
    DanglingReference { name: String },
}

pub fn check_well_scoped_expr(e: &Expr) -> Result<(), ScopeViolation> {
    let bound = unique_binders(expr_binders(e))?;
    let mut live = Vec::new();
    check_refs_expr(e, &bound, &mut live)
}

pub fn check_well_scoped_stmt(s: &Stmt) -> Result<(), ScopeViolation> {
    let bound = unique_binders(crate::visit::binders(s))?;
    let mut live = Vec::new();
    check_refs_stmt(s, &bound, &mut live)
}

fn unique_binders(names: Vec<String>) -> Result<HashSet<String>, ScopeViolation> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(ScopeViolation::DuplicateBinder { name });
        }
    }
    Ok(seen)
}

fn check_var(name: &str, bound: &HashSet<String>, live: &[String]) -> Result<(), ScopeViolation> {
    if bound.contains(name) && !live.iter().any(|n| n == name) {
        return Err(ScopeViolation::DanglingReference { name: name.to_string() });
    }
    Ok(())
}

fn check_refs_expr(e: &Expr, bound: &HashSet<String>, live: &mut Vec<String>) -> Result<(), ScopeViolation> {
    match e.kind() {
        ExprKind::Var { name, .. } => check_var(name, bound, live),
        ExprKind::Let { name, value, body } => {
            check_refs_expr(value, bound, live)?;
            live.push(name.clone());
            let r = check_refs_expr(body, bound, live);
            live.pop();
            r
        }
        _ => {
            let mut result = Ok(());
            for_each_expr_child(e, |c| {
                if result.is_ok() {
                    result = check_refs_expr(c, bound, live);
                }
            });
            result
        }
    }
}

fn check_refs_stmt(s: &Stmt, bound: &HashSet<String>, live: &mut Vec<String>) -> Result<(), ScopeViolation> {
    match s.kind() {
        StmtKind::LetStmt { name, value, body } => {
            check_refs_expr(value, bound, live)?;
            live.push(name.clone());
            let r = check_refs_stmt(body, bound, live);
            live.pop();
            r
        }
        StmtKind::For { name, min, extent, body, .. } => {
            check_refs_expr(min, bound, live)?;
            check_refs_expr(extent, bound, live)?;
            live.push(name.clone());
            let r = check_refs_stmt(body, bound, live);
            live.pop();
            r
        }
        StmtKind::Block(stmts) => stmts.iter().try_for_each(|c| check_refs_stmt(c, bound, live)),
        StmtKind::IfThenElse { cond, then_case, else_case } => {
            check_refs_expr(cond, bound, live)?;
            check_refs_stmt(then_case, bound, live)?;
            match else_case {
                Some(e) => check_refs_stmt(e, bound, live),
                None => Ok(()),
            }
        }
        StmtKind::Assert { cond: a, message: b } | StmtKind::Store { index: a, value: b, .. } => {
            check_refs_expr(a, bound, live)?;
            check_refs_expr(b, bound, live)
        }
        StmtKind::Evaluate(e) => check_refs_expr(e, bound, live),
    }
}
