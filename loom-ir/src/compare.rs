#![forbid(unsafe_code)]

//! Structural ordering of IR trees.
//!
//! Two trees compare equal exactly when they have the same shape, names,
//! types and literal bits. The order is total and deterministic, so the
//! simplifier uses it to canonicalize the operands of commutative operators.

use std::cmp::Ordering;

use crate::ir::{Expr, ExprKind, Stmt, StmtKind};

fn expr_rank(k: &ExprKind) -> u8 {
    match k {
        ExprKind::IntImm { .. } => 0,
        ExprKind::UIntImm { .. } => 1,
        ExprKind::FloatImm { .. } => 2,
        ExprKind::BoolImm(_) => 3,
        ExprKind::Var { .. } => 4,
        ExprKind::Cast { .. } => 5,
        ExprKind::Unary { .. } => 6,
        ExprKind::Binary { .. } => 7,
        ExprKind::Select { .. } => 8,
        ExprKind::Broadcast { .. } => 9,
        ExprKind::Ramp { .. } => 10,
        ExprKind::Call { .. } => 11,
        ExprKind::Let { .. } => 12,
    }
}

pub fn compare_exprs(a: &Expr, b: &Expr) -> Ordering {
    if a.same_as(b) {
        return Ordering::Equal;
    }

    use ExprKind::*;
    match (a.kind(), b.kind()) {
        (IntImm { ty: t1, value: v1 }, IntImm { ty: t2, value: v2 }) => t1.cmp(t2).then(v1.cmp(v2)),
        (UIntImm { ty: t1, value: v1 }, UIntImm { ty: t2, value: v2 }) => t1.cmp(t2).then(v1.cmp(v2)),
        (FloatImm { ty: t1, value: v1 }, FloatImm { ty: t2, value: v2 }) => {
            t1.cmp(t2).then(v1.total_cmp(v2))
        }
        (BoolImm(x), BoolImm(y)) => x.cmp(y),
        (Var { name: n1, ty: t1 }, Var { name: n2, ty: t2 }) => n1.cmp(n2).then(t1.cmp(t2)),
        (Cast { ty: t1, value: v1 }, Cast { ty: t2, value: v2 }) => {
            t1.cmp(t2).then_with(|| compare_exprs(v1, v2))
        }
        (Unary { op: o1, value: v1 }, Unary { op: o2, value: v2 }) => {
            o1.cmp(o2).then_with(|| compare_exprs(v1, v2))
        }
        (Binary { op: o1, a: a1, b: b1 }, Binary { op: o2, a: a2, b: b2 }) => o1
            .cmp(o2)
            .then_with(|| compare_exprs(a1, a2))
            .then_with(|| compare_exprs(b1, b2)),
        (
            Select { cond: c1, then_value: t1, else_value: e1 },
            Select { cond: c2, then_value: t2, else_value: e2 },
        ) => compare_exprs(c1, c2)
            .then_with(|| compare_exprs(t1, t2))
            .then_with(|| compare_exprs(e1, e2)),
        (Broadcast { value: v1, lanes: l1 }, Broadcast { value: v2, lanes: l2 }) => {
            l1.cmp(l2).then_with(|| compare_exprs(v1, v2))
        }
        (Ramp { base: b1, stride: s1, lanes: l1 }, Ramp { base: b2, stride: s2, lanes: l2 }) => l1
            .cmp(l2)
            .then_with(|| compare_exprs(b1, b2))
            .then_with(|| compare_exprs(s1, s2)),
        (
            Call { name: n1, args: a1, ty: t1, effect: f1 },
            Call { name: n2, args: a2, ty: t2, effect: f2 },
        ) => n1
            .cmp(n2)
            .then(t1.cmp(t2))
            .then(f1.cmp(f2))
            .then_with(|| compare_lists(a1, a2)),
        (Let { name: n1, value: v1, body: b1 }, Let { name: n2, value: v2, body: b2 }) => n1
            .cmp(n2)
            .then_with(|| compare_exprs(v1, v2))
            .then_with(|| compare_exprs(b1, b2)),
        (x, y) => expr_rank(x).cmp(&expr_rank(y)),
    }
}

fn compare_lists(a: &[Expr], b: &[Expr]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        a.iter()
            .zip(b)
            .map(|(x, y)| compare_exprs(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    })
}

fn stmt_rank(k: &StmtKind) -> u8 {
    match k {
        StmtKind::LetStmt { .. } => 0,
        StmtKind::Block(_) => 1,
        StmtKind::IfThenElse { .. } => 2,
        StmtKind::For { .. } => 3,
        StmtKind::Assert { .. } => 4,
        StmtKind::Store { .. } => 5,
        StmtKind::Evaluate(_) => 6,
    }
}

pub fn compare_stmts(a: &Stmt, b: &Stmt) -> Ordering {
    if a.same_as(b) {
        return Ordering::Equal;
    }

    use StmtKind::*;
    match (a.kind(), b.kind()) {
        (LetStmt { name: n1, value: v1, body: b1 }, LetStmt { name: n2, value: v2, body: b2 }) => n1
            .cmp(n2)
            .then_with(|| compare_exprs(v1, v2))
            .then_with(|| compare_stmts(b1, b2)),
        (Block(s1), Block(s2)) => s1.len().cmp(&s2.len()).then_with(|| {
            s1.iter()
                .zip(s2)
                .map(|(x, y)| compare_stmts(x, y))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        (
            IfThenElse { cond: c1, then_case: t1, else_case: e1 },
            IfThenElse { cond: c2, then_case: t2, else_case: e2 },
        ) => compare_exprs(c1, c2)
            .then_with(|| compare_stmts(t1, t2))
            .then_with(|| match (e1, e2) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => compare_stmts(x, y),
            }),
        (
            For { name: n1, min: m1, extent: x1, kind: k1, body: b1 },
            For { name: n2, min: m2, extent: x2, kind: k2, body: b2 },
        ) => n1
            .cmp(n2)
            .then(k1.cmp(k2))
            .then_with(|| compare_exprs(m1, m2))
            .then_with(|| compare_exprs(x1, x2))
            .then_with(|| compare_stmts(b1, b2)),
        (Assert { cond: c1, message: m1 }, Assert { cond: c2, message: m2 }) => {
            compare_exprs(c1, c2).then_with(|| compare_exprs(m1, m2))
        }
        (
            Store { buffer: n1, index: i1, value: v1 },
            Store { buffer: n2, index: i2, value: v2 },
        ) => n1
            .cmp(n2)
            .then_with(|| compare_exprs(i1, i2))
            .then_with(|| compare_exprs(v1, v2)),
        (Evaluate(e1), Evaluate(e2)) => compare_exprs(e1, e2),
        (x, y) => stmt_rank(x).cmp(&stmt_rank(y)),
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        compare_exprs(self, other) == Ordering::Equal
    }
}

impl Eq for Expr {}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_exprs(self, other)
    }
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        compare_stmts(self, other) == Ordering::Equal
    }
}

impl Eq for Stmt {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structurally_equal_trees_compare_equal() {
        let a = Expr::add(Expr::var("x"), Expr::int(1));
        let b = Expr::add(Expr::var("x"), Expr::int(1));
        assert!(!a.same_as(&b));
        assert_eq!(a, b);
        assert_ne!(a, Expr::add(Expr::var("x"), Expr::int(2)));
    }

    #[test]
    fn literals_order_before_variables() {
        assert!(Expr::int(100) < Expr::var("a"));
        assert!(Expr::var("a") < Expr::var("b"));
        assert!(Expr::var("z") < Expr::add(Expr::var("a"), Expr::var("b")));
    }

    #[test]
    fn nan_literals_are_equal_to_themselves() {
        let nan = Expr::f64(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(nan, Expr::f64(f64::NAN));
    }

    #[test]
    fn statements_compare_structurally() {
        let s1 = Stmt::store("buf", Expr::int(0), Expr::var("x"));
        let s2 = Stmt::store("buf", Expr::int(0), Expr::var("x"));
        assert_eq!(Stmt::block(vec![s1.clone()]), Stmt::block(vec![s2]));
        assert_ne!(Stmt::block(vec![s1]), Stmt::no_op());
    }
}
