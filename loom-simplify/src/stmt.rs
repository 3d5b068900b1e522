#![forbid(unsafe_code)]

use loom_ir::{Expr, Interval, Stmt, StmtKind};
use tracing::{debug, trace};

use crate::lets;
use crate::rules::{int_lit, pure};
use crate::simplifier::Simplifier;

impl Simplifier {
    /// Simplifies every expression of `st` and applies the statement-level
    /// rewrites. The fact stores are threaded through the whole tree.
    pub fn mutate_stmt(&mut self, st: &Stmt) -> Stmt {
        trace!(stmt = %st, "visit");
        match st.kind() {
            StmtKind::LetStmt { name, value, body } => lets::simplify_let_stmt(self, st, name, value, body),
            StmtKind::Block(stmts) => self.block(st, stmts),
            StmtKind::IfThenElse { cond, then_case, else_case } => {
                self.if_then_else(st, cond, then_case, else_case.as_ref())
            }
            StmtKind::For { name, min, extent, kind, body } => {
                let min2 = self.mutate_expr(min);
                let extent2 = self.mutate_expr(extent);
                match int_lit(&extent2) {
                    Some(n) if n <= 0 && pure(&min2) => {
                        debug!(loop_var = %name, "empty loop removed");
                        return Stmt::no_op();
                    }
                    Some(1) => {
                        debug!(loop_var = %name, "single-iteration loop unwrapped");
                        return self.mutate_stmt(&Stmt::let_stmt(name.clone(), min2, body.clone()));
                    }
                    _ => {}
                }
                let range = self.loop_range(&min2, &extent2);
                let body2 = self.bind_range(name, range).mutate_stmt(body);
                if body2.is_no_op() && pure(&min2) && pure(&extent2) {
                    return Stmt::no_op();
                }
                if min2.same_as(min) && extent2.same_as(extent) && body2.same_as(body) {
                    return st.clone();
                }
                Stmt::for_loop(name.clone(), min2, extent2, *kind, body2)
            }
            StmtKind::Assert { cond, message } => {
                let cond2 = self.mutate_expr(cond);
                if cond2.is_true() {
                    return Stmt::no_op();
                }
                let message2 = self.mutate_expr(message);
                if cond2.same_as(cond) && message2.same_as(message) {
                    return st.clone();
                }
                Stmt::assert(cond2, message2)
            }
            StmtKind::Store { buffer, index, value } => {
                let index2 = self.mutate_expr(index);
                let value2 = self.mutate_expr(value);
                if index2.same_as(index) && value2.same_as(value) {
                    return st.clone();
                }
                Stmt::store(buffer.clone(), index2, value2)
            }
            StmtKind::Evaluate(e) => {
                let e2 = self.mutate_expr(e);
                if pure(&e2) {
                    return Stmt::no_op();
                }
                if e2.same_as(e) { st.clone() } else { Stmt::evaluate(e2) }
            }
        }
    }

    fn block(&mut self, st: &Stmt, stmts: &[Stmt]) -> Stmt {
        let mut out = Vec::with_capacity(stmts.len());
        let mut changed = false;
        for c in stmts {
            let n = self.mutate_stmt(c);
            changed |= !n.same_as(c);
            match n.kind() {
                StmtKind::Block(inner) => {
                    changed = true;
                    out.extend(inner.iter().cloned());
                }
                _ => out.push(n),
            }
        }
        if let [only] = out.as_slice() {
            return only.clone();
        }
        if changed { Stmt::block(out) } else { st.clone() }
    }

    fn if_then_else(&mut self, st: &Stmt, cond: &Expr, then_case: &Stmt, else_case: Option<&Stmt>) -> Stmt {
        let cond2 = self.mutate_expr(cond);
        if cond2.is_true() {
            return self.mutate_stmt(then_case);
        }
        if cond2.is_false() {
            return else_case.map_or_else(Stmt::no_op, |e| self.mutate_stmt(e));
        }
        // if (!c) a else b -> if (c) b else a
        let swapped = match (cond2.as_not(), else_case) {
            (Some(inner), Some(e)) => Some((inner.clone(), e)),
            _ => None,
        };
        let (cond2, then_case, else_case) = match swapped {
            Some((inner, e)) => (inner, e, Some(then_case)),
            None => (cond2, then_case, else_case),
        };
        let then2 = self.mutate_stmt(then_case);
        let else2 = else_case.map(|e| self.mutate_stmt(e)).filter(|e| !e.is_no_op());
        if then2.is_no_op() && else2.is_none() && pure(&cond2) {
            return Stmt::no_op();
        }
        let unchanged = cond2.same_as(cond)
            && then2.same_as(then_case)
            && match (&else2, else_case) {
                (Some(a), Some(b)) => a.same_as(b),
                (None, None) => true,
                _ => false,
            };
        if unchanged { st.clone() } else { Stmt::if_then_else(cond2, then2, else2) }
    }

    /// `[min, min + extent - 1]` over the bounds of both.
    fn loop_range(&self, min: &Expr, extent: &Expr) -> Interval {
        let (bm, be) = (self.bounds_of(min), self.bounds_of(extent));
        let hi = bm
            .max
            .zip(be.max)
            .and_then(|(m, e)| m.checked_add(e)?.checked_sub(1));
        match (bm.min, hi) {
            (Some(lo), Some(hi)) if hi < lo => Interval::everything(),
            (min, max) => Interval { min, max },
        }
    }
}

#[cfg(test)]
mod tests {
    use loom_ir::{Expr, ForKind, Scope, Stmt, Type};

    use crate::simplify_stmt;

    fn run(s: &Stmt) -> Stmt {
        simplify_stmt(s, true, &Scope::new(), &Scope::new())
    }

    fn store(i: i64) -> Stmt {
        Stmt::store("buf", Expr::int(i), Expr::var("v"))
    }

    #[test]
    fn blocks_flatten() {
        let s = Stmt::block(vec![Stmt::no_op(), store(0), Stmt::block(vec![store(1), Stmt::no_op()])]);
        assert_eq!(run(&s), Stmt::block(vec![store(0), store(1)]));
        assert_eq!(run(&Stmt::block(vec![Stmt::no_op(), store(2)])), store(2));
        let plain = Stmt::block(vec![store(0), store(1)]);
        assert!(run(&plain).same_as(&plain));
    }

    #[test]
    fn conditionals() {
        let p = Expr::var_of("p", Type::bool());
        let s = Stmt::if_then_else(Expr::lt(Expr::int(1), Expr::int(2)), store(0), Some(store(1)));
        assert_eq!(run(&s), store(0));
        let s = Stmt::if_then_else(Expr::bool(false), store(0), None);
        assert!(run(&s).is_no_op());
        let s = Stmt::if_then_else(Expr::not(p.clone()), store(0), Some(store(1)));
        assert_eq!(run(&s), Stmt::if_then_else(p.clone(), store(1), Some(store(0))));
        let s = Stmt::if_then_else(p.clone(), Stmt::no_op(), Some(Stmt::no_op()));
        assert!(run(&s).is_no_op());
        let s = Stmt::if_then_else(p.clone(), store(0), Some(Stmt::no_op()));
        assert_eq!(run(&s), Stmt::if_then_else(p, store(0), None));
    }

    #[test]
    fn loops() {
        let i = Expr::var("i");
        let body = Stmt::store("buf", i.clone(), i.clone());
        let s = Stmt::for_loop("i", Expr::int(0), Expr::int(0), ForKind::Serial, body.clone());
        assert!(run(&s).is_no_op());
        let s = Stmt::for_loop("i", Expr::int(3), Expr::int(1), ForKind::Serial, body);
        assert_eq!(run(&s), Stmt::store("buf", Expr::int(3), Expr::int(3)));
    }

    #[test]
    fn loop_variables_are_bounded_in_the_body() {
        let i = Expr::var("i");
        let guarded = Stmt::if_then_else(Expr::lt(i.clone(), Expr::int(10)), Stmt::store("buf", i.clone(), Expr::int(1)), None);
        let s = Stmt::for_loop("i", Expr::int(0), Expr::int(10), ForKind::Parallel, guarded);
        let expected = Stmt::for_loop("i", Expr::int(0), Expr::int(10), ForKind::Parallel, Stmt::store("buf", i, Expr::int(1)));
        assert_eq!(run(&s), expected);
    }

    #[test]
    fn asserts_and_evaluates() {
        let s = Stmt::assert(Expr::lt(Expr::int(1), Expr::int(2)), Expr::int(0));
        assert!(run(&s).is_no_op());
        assert!(run(&Stmt::evaluate(Expr::add(Expr::var("x"), Expr::int(1)))).is_no_op());
        let call = Stmt::evaluate(Expr::call("f", vec![], Type::i32()));
        assert_eq!(run(&call), call);
    }
}
