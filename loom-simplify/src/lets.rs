#![forbid(unsafe_code)]

//! Let-elimination for expression and statement binders.
//!
//! The value is simplified first. While the body is simplified, a trivial
//! value is substituted at every reference and any other value contributes
//! the facts derived from it. With `remove_dead_lets` on, a binder whose
//! body no longer mentions it is dropped unless its value has effects.

use loom_ir::visit::{expr_uses_var, has_side_effects, stmt_uses_var};
use loom_ir::{Expr, Stmt};
use tracing::debug;

use crate::simplifier::Simplifier;

pub(crate) fn simplify_let(s: &mut Simplifier, e: &Expr, name: &str, value: &Expr, body: &Expr) -> Expr {
    let new_value = s.mutate_expr(value);
    let new_body = s.bind(name, &new_value).mutate_expr(body);
    if droppable(s, name, &new_value, expr_uses_var(name, &new_body)) {
        return new_body;
    }
    if new_value.same_as(value) && new_body.same_as(body) {
        return e.clone();
    }
    Expr::let_in(name, new_value, new_body)
}

pub(crate) fn simplify_let_stmt(s: &mut Simplifier, st: &Stmt, name: &str, value: &Expr, body: &Stmt) -> Stmt {
    let new_value = s.mutate_expr(value);
    let new_body = s.bind(name, &new_value).mutate_stmt(body);
    if droppable(s, name, &new_value, stmt_uses_var(name, &new_body)) {
        return new_body;
    }
    if new_value.same_as(value) && new_body.same_as(body) {
        return st.clone();
    }
    Stmt::let_stmt(name, new_value, new_body)
}

fn droppable(s: &Simplifier, name: &str, value: &Expr, used: bool) -> bool {
    if used || !s.options().remove_dead_lets {
        return false;
    }
    if has_side_effects(value) {
        debug!(name, "dead binding kept for its effects");
        return false;
    }
    debug!(name, "dead binding removed");
    true
}

#[cfg(test)]
mod tests {
    use loom_ir::{Expr, Interval, Scope, Stmt, Type};

    use crate::{simplify, simplify_expr, simplify_stmt};

    #[test]
    fn dead_bindings_follow_the_flag() {
        let e = Expr::let_in("x", Expr::int(5), Expr::int(3));
        assert_eq!(simplify(&e), Expr::int(3));
        let kept = simplify_expr(&e, false, &Scope::new(), &Scope::new());
        assert_eq!(kept, e);
    }

    #[test]
    fn trivial_values_are_substituted() {
        let y = Expr::var("y");
        let e = Expr::let_in("x", Expr::int(5), Expr::add(Expr::var("x"), Expr::int(1)));
        assert_eq!(simplify(&e), Expr::int(6));
        let e = Expr::let_in("x", y.clone(), Expr::sub(Expr::var("x"), y.clone()));
        assert_eq!(simplify(&e), Expr::int(0));
        // Chains propagate.
        let e = Expr::let_in("a", Expr::int(2), Expr::let_in("b", Expr::var("a"), Expr::mul(Expr::var("b"), Expr::int(3))));
        assert_eq!(simplify(&e), Expr::int(6));
    }

    #[test]
    fn flag_off_substitutes_but_keeps_the_binder() {
        let e = Expr::let_in("x", Expr::int(5), Expr::add(Expr::var("x"), Expr::int(1)));
        let out = simplify_expr(&e, false, &Scope::new(), &Scope::new());
        assert_eq!(out, Expr::let_in("x", Expr::int(5), Expr::int(6)));
    }

    #[test]
    fn derived_facts_reach_the_body() {
        let bounds: Scope<Interval> = [("y".to_string(), Interval::bounded(0, 10))].into_iter().collect();
        let value = Expr::add(Expr::var("y"), Expr::int(1));
        let body = Expr::lt(Expr::var("t"), Expr::int(20));
        let out = simplify_expr(&Expr::let_in("t", value, body), true, &bounds, &Scope::new());
        assert!(out.is_true());

        let value = Expr::mul(Expr::var("y"), Expr::int(4));
        let body = Expr::rem(Expr::var("t"), Expr::int(2));
        assert_eq!(simplify(&Expr::let_in("t", value, body)), Expr::int(0));
    }

    #[test]
    fn effects_keep_dead_bindings() {
        let f = Expr::call("f", vec![], Type::i32());
        let e = Expr::let_in("x", f, Expr::int(3));
        assert_eq!(simplify(&e), e);
    }

    #[test]
    fn statement_binders() {
        let body = Stmt::store("buf", Expr::var("i"), Expr::add(Expr::var("x"), Expr::int(1)));
        let s = Stmt::let_stmt("x", Expr::int(4), body);
        let out = simplify_stmt(&s, true, &Scope::new(), &Scope::new());
        assert_eq!(out, Stmt::store("buf", Expr::var("i"), Expr::int(5)));
    }
}
