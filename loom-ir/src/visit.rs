#![forbid(unsafe_code)]

//! Tree utilities: child rebuilding with sharing, use counting,
//! substitution and effect queries.

use crate::ir::{Effect, Expr, ExprKind, Stmt, StmtKind};

/// Rebuilds `e` with every direct child replaced by `f(child)`. When no child
/// changes (by pointer identity) the original node is returned, so untouched
/// subtrees stay shared.
pub fn map_expr_children(e: &Expr, mut f: impl FnMut(&Expr) -> Expr) -> Expr {
    let mut changed = false;
    let mut go = |c: &Expr| {
        let n = f(c);
        changed |= !n.same_as(c);
        n
    };
    let rebuilt = match e.kind() {
        ExprKind::IntImm { .. }
        | ExprKind::UIntImm { .. }
        | ExprKind::FloatImm { .. }
        | ExprKind::BoolImm(_)
        | ExprKind::Var { .. } => return e.clone(),
        ExprKind::Cast { ty, value } => ExprKind::Cast { ty: *ty, value: go(value) },
        ExprKind::Unary { op, value } => ExprKind::Unary { op: *op, value: go(value) },
        ExprKind::Binary { op, a, b } => {
            let a = go(a);
            let b = go(b);
            ExprKind::Binary { op: *op, a, b }
        }
        ExprKind::Select { cond, then_value, else_value } => {
            let cond = go(cond);
            let then_value = go(then_value);
            let else_value = go(else_value);
            ExprKind::Select { cond, then_value, else_value }
        }
        ExprKind::Broadcast { value, lanes } => ExprKind::Broadcast { value: go(value), lanes: *lanes },
        ExprKind::Ramp { base, stride, lanes } => {
            let base = go(base);
            let stride = go(stride);
            ExprKind::Ramp { base, stride, lanes: *lanes }
        }
        ExprKind::Call { name, args, ty, effect } => ExprKind::Call {
            name: name.clone(),
            args: args.iter().map(&mut go).collect(),
            ty: *ty,
            effect: *effect,
        },
        ExprKind::Let { name, value, body } => {
            let value = go(value);
            let body = go(body);
            ExprKind::Let { name: name.clone(), value, body }
        }
    };
    if changed { Expr::new(rebuilt) } else { e.clone() }
}

/// Calls `f` on every direct child expression of `e`.
pub fn for_each_expr_child(e: &Expr, mut f: impl FnMut(&Expr)) {
    match e.kind() {
        ExprKind::IntImm { .. }
        | ExprKind::UIntImm { .. }
        | ExprKind::FloatImm { .. }
        | ExprKind::BoolImm(_)
        | ExprKind::Var { .. } => {}
        ExprKind::Cast { value, .. } | ExprKind::Unary { value, .. } | ExprKind::Broadcast { value, .. } => f(value),
        ExprKind::Binary { a, b, .. } => {
            f(a);
            f(b);
        }
        ExprKind::Select { cond, then_value, else_value } => {
            f(cond);
            f(then_value);
            f(else_value);
        }
        ExprKind::Ramp { base, stride, .. } => {
            f(base);
            f(stride);
        }
        ExprKind::Call { args, .. } => args.iter().for_each(f),
        ExprKind::Let { value, body, .. } => {
            f(value);
            f(body);
        }
    }
}

/// Number of references to `name` in `e`, respecting shadowing.
pub fn count_uses(name: &str, e: &Expr) -> usize {
    match e.kind() {
        ExprKind::Var { name: n, .. } => usize::from(n == name),
        ExprKind::Let { name: n, value, body } if n == name => count_uses(name, value),
        _ => {
            let mut total = 0;
            for_each_expr_child(e, |c| total += count_uses(name, c));
            total
        }
    }
}

pub fn expr_uses_var(name: &str, e: &Expr) -> bool {
    match e.kind() {
        ExprKind::Var { name: n, .. } => n == name,
        ExprKind::Let { name: n, value, .. } if n == name => expr_uses_var(name, value),
        _ => {
            let mut found = false;
            for_each_expr_child(e, |c| found = found || expr_uses_var(name, c));
            found
        }
    }
}

pub fn stmt_uses_var(name: &str, s: &Stmt) -> bool {
    let mut found = false;
    for_each_stmt_expr(s, &mut |e| found = found || expr_uses_var(name, e), name);
    found
}

// Visits every expression of `s` that can see the outer binding of `name`.
fn for_each_stmt_expr(s: &Stmt, f: &mut dyn FnMut(&Expr), name: &str) {
    match s.kind() {
        StmtKind::LetStmt { name: n, value, body } => {
            f(value);
            if n != name {
                for_each_stmt_expr(body, f, name);
            }
        }
        StmtKind::Block(stmts) => {
            for s in stmts {
                for_each_stmt_expr(s, f, name);
            }
        }
        StmtKind::IfThenElse { cond, then_case, else_case } => {
            f(cond);
            for_each_stmt_expr(then_case, f, name);
            if let Some(e) = else_case {
                for_each_stmt_expr(e, f, name);
            }
        }
        StmtKind::For { name: n, min, extent, body, .. } => {
            f(min);
            f(extent);
            if n != name {
                for_each_stmt_expr(body, f, name);
            }
        }
        StmtKind::Assert { cond, message } => {
            f(cond);
            f(message);
        }
        StmtKind::Store { index, value, .. } => {
            f(index);
            f(value);
        }
        StmtKind::Evaluate(e) => f(e),
    }
}

/// True if evaluating `e` may have an effect beyond producing its value,
/// i.e. it contains a call without a purity fact.
pub fn has_side_effects(e: &Expr) -> bool {
    match e.kind() {
        ExprKind::Call { effect: Effect::Unknown, .. } => true,
        _ => {
            let mut found = false;
            for_each_expr_child(e, |c| found = found || has_side_effects(c));
            found
        }
    }
}

/// Replaces free references to `name` in `e` by `replacement`.
pub fn substitute(name: &str, replacement: &Expr, e: &Expr) -> Expr {
    match e.kind() {
        ExprKind::Var { name: n, .. } if n == name => replacement.clone(),
        ExprKind::Let { name: n, value, body } if n == name => {
            let value2 = substitute(name, replacement, value);
            if value2.same_as(value) {
                e.clone()
            } else {
                Expr::let_in(n.clone(), value2, body.clone())
            }
        }
        _ => map_expr_children(e, |c| substitute(name, replacement, c)),
    }
}

/// Rebuilds `s` with `fe` applied to each direct expression and `fs` to each
/// direct sub-statement; unchanged nodes stay shared.
pub fn map_stmt_children(
    s: &Stmt,
    mut fe: impl FnMut(&Expr) -> Expr,
    mut fs: impl FnMut(&Stmt) -> Stmt,
) -> Stmt {
    let mut changed = false;
    macro_rules! go_e {
        ($e:expr) => {{
            let n = fe($e);
            changed |= !n.same_as($e);
            n
        }};
    }
    macro_rules! go_s {
        ($s:expr) => {{
            let n = fs($s);
            changed |= !n.same_as($s);
            n
        }};
    }
    let rebuilt = match s.kind() {
        StmtKind::LetStmt { name, value, body } => {
            let value = go_e!(value);
            let body = go_s!(body);
            StmtKind::LetStmt { name: name.clone(), value, body }
        }
        StmtKind::Block(stmts) => StmtKind::Block(stmts.iter().map(|c| go_s!(c)).collect()),
        StmtKind::IfThenElse { cond, then_case, else_case } => {
            let cond = go_e!(cond);
            let then_case = go_s!(then_case);
            let else_case = else_case.as_ref().map(|e| go_s!(e));
            StmtKind::IfThenElse { cond, then_case, else_case }
        }
        StmtKind::For { name, min, extent, kind, body } => {
            let min = go_e!(min);
            let extent = go_e!(extent);
            let body = go_s!(body);
            StmtKind::For { name: name.clone(), min, extent, kind: *kind, body }
        }
        StmtKind::Assert { cond, message } => {
            let cond = go_e!(cond);
            let message = go_e!(message);
            StmtKind::Assert { cond, message }
        }
        StmtKind::Store { buffer, index, value } => {
            let index = go_e!(index);
            let value = go_e!(value);
            StmtKind::Store { buffer: buffer.clone(), index, value }
        }
        StmtKind::Evaluate(e) => StmtKind::Evaluate(go_e!(e)),
    };
    if changed { Stmt::new(rebuilt) } else { s.clone() }
}

pub fn substitute_stmt(name: &str, replacement: &Expr, s: &Stmt) -> Stmt {
    match s.kind() {
        StmtKind::LetStmt { name: n, value, body } if n == name => {
            let value2 = substitute(name, replacement, value);
            if value2.same_as(value) {
                s.clone()
            } else {
                Stmt::let_stmt(n.clone(), value2, body.clone())
            }
        }
        StmtKind::For { name: n, min, extent, kind, body } if n == name => {
            let min2 = substitute(name, replacement, min);
            let extent2 = substitute(name, replacement, extent);
            if min2.same_as(min) && extent2.same_as(extent) {
                s.clone()
            } else {
                Stmt::for_loop(n.clone(), min2, extent2, *kind, body.clone())
            }
        }
        _ => map_stmt_children(
            s,
            |e| substitute(name, replacement, e),
            |c| substitute_stmt(name, replacement, c),
        ),
    }
}

/// Every name bound in `s` (let statements, loops and expression lets), in
/// visiting order, duplicates included.
pub fn binders(s: &Stmt) -> Vec<String> {
    let mut out = Vec::new();
    collect_stmt_binders(s, &mut out);
    out
}

fn collect_stmt_binders(s: &Stmt, out: &mut Vec<String>) {
    match s.kind() {
        StmtKind::LetStmt { name, value, body } => {
            out.push(name.clone());
            collect_expr_binders(value, out);
            collect_stmt_binders(body, out);
        }
        StmtKind::Block(stmts) => stmts.iter().for_each(|c| collect_stmt_binders(c, out)),
        StmtKind::IfThenElse { cond, then_case, else_case } => {
            collect_expr_binders(cond, out);
            collect_stmt_binders(then_case, out);
            if let Some(e) = else_case {
                collect_stmt_binders(e, out);
            }
        }
        StmtKind::For { name, min, extent, body, .. } => {
            out.push(name.clone());
            collect_expr_binders(min, out);
            collect_expr_binders(extent, out);
            collect_stmt_binders(body, out);
        }
        StmtKind::Assert { cond: a, message: b } | StmtKind::Store { index: a, value: b, .. } => {
            collect_expr_binders(a, out);
            collect_expr_binders(b, out);
        }
        StmtKind::Evaluate(e) => collect_expr_binders(e, out),
    }
}

pub fn expr_binders(e: &Expr) -> Vec<String> {
    let mut out = Vec::new();
    collect_expr_binders(e, &mut out);
    out
}

fn collect_expr_binders(e: &Expr, out: &mut Vec<String>) {
    if let ExprKind::Let { name, .. } = e.kind() {
        out.push(name.clone());
    }
    for_each_expr_child(e, |c| collect_expr_binders(c, out));
}
