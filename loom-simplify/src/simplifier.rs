#![forbid(unsafe_code)]

use std::ops::{Deref, DerefMut};

use loom_ir::visit::map_expr_children;
use loom_ir::{Expr, ExprKind, Interval, ModulusRemainder, Scope, ScopeHandle};
use tracing::{debug, trace, warn};

use crate::analysis::{bounds_of_expr, modulus_remainder};
use crate::lets;
use crate::options::SimplifyOptions;
use crate::rules::RULES;

/// State of one simplification traversal.
///
/// The fact stores are private copies of the caller's: facts for `let` and
/// loop variables are pushed while their bodies are visited and popped
/// afterwards, so the caller's stores are never touched.
pub struct Simplifier {
    options: SimplifyOptions,
    pub(crate) bounds: Scope<Interval>,
    pub(crate) align: Scope<ModulusRemainder>,
    /// Trivial `let` values, replaced at every reference.
    pub(crate) subst: Scope<Expr>,
    depth: usize,
}

impl Simplifier {
    pub fn new(options: SimplifyOptions, bounds: &Scope<Interval>, align: &Scope<ModulusRemainder>) -> Self {
        Self {
            options,
            bounds: bounds.clone(),
            align: align.clone(),
            subst: Scope::new(),
            depth: 0,
        }
    }

    pub fn options(&self) -> &SimplifyOptions {
        &self.options
    }

    pub fn bounds_of(&self, e: &Expr) -> Interval {
        bounds_of_expr(e, &self.bounds)
    }

    pub fn alignment_of(&self, e: &Expr) -> ModulusRemainder {
        modulus_remainder(e, &self.align)
    }

    /// Simplifies `e` bottom-up. Subtrees that do not change are returned
    /// as the same shared node.
    pub fn mutate_expr(&mut self, e: &Expr) -> Expr {
        trace!(expr = %e, "visit");
        let rebuilt = match e.kind() {
            ExprKind::Var { name, .. } => match self.subst.get(name) {
                Some(replacement) => return replacement.clone(),
                None => e.clone(),
            },
            ExprKind::Let { name, value, body } => return lets::simplify_let(self, e, name, value, body),
            _ => map_expr_children(e, |c| self.mutate_expr(c)),
        };
        self.rewrite(rebuilt)
    }

    /// Applies the rule list at the root of `e` (whose children are
    /// already simplified) until no rule fires or the budget runs out.
    pub(crate) fn rewrite(&mut self, e: Expr) -> Expr {
        if self.depth >= self.options.max_rewrite_depth {
            warn!(depth = self.depth, expr = %e, "rewrite nesting limit reached");
            return e;
        }
        self.depth += 1;
        let mut cur = e;
        let mut fired = 0;
        'search: loop {
            for rule in RULES {
                if let Some(rw) = rule(self, &cur) {
                    debug!(rule = rw.rule, before = %cur, after = %rw.expr, "rewrite");
                    cur = rw.expr;
                    fired += 1;
                    if fired >= self.options.max_rewrites {
                        warn!(budget = self.options.max_rewrites, expr = %cur, "rewrite budget exhausted");
                        break 'search;
                    }
                    continue 'search;
                }
            }
            break;
        }
        self.depth -= 1;
        cur
    }

    /// Scopes facts about `name = value` over whatever is simplified through
    /// the returned guard: trivial values are substituted, other values
    /// contribute their derived range and alignment.
    pub(crate) fn bind(&mut self, name: &str, value: &Expr) -> FactGuard<'_> {
        let mut guard = FactGuard { simplifier: self, pushed: Vec::new() };
        if is_trivial(value) {
            let h = guard.simplifier.subst.push(name, value.clone());
            guard.pushed.push(Pushed::Subst(h));
            return guard;
        }
        let range = guard.simplifier.bounds_of(value);
        if !range.is_everything() {
            let h = guard.simplifier.bounds.push(name, range);
            guard.pushed.push(Pushed::Bounds(h));
        }
        let fact = guard.simplifier.alignment_of(value);
        if !fact.is_unknown() {
            let h = guard.simplifier.align.push(name, fact);
            guard.pushed.push(Pushed::Align(h));
        }
        guard
    }

    pub(crate) fn bind_range(&mut self, name: &str, range: Interval) -> FactGuard<'_> {
        let mut guard = FactGuard { simplifier: self, pushed: Vec::new() };
        if !range.is_everything() {
            let h = guard.simplifier.bounds.push(name, range);
            guard.pushed.push(Pushed::Bounds(h));
        }
        guard
    }
}

/// Literals and bare variables are cheaper to repeat than to bind.
pub(crate) fn is_trivial(e: &Expr) -> bool {
    e.is_const() || e.as_var().is_some()
}

enum Pushed {
    Bounds(ScopeHandle),
    Align(ScopeHandle),
    Subst(ScopeHandle),
}

/// Pops the facts pushed by `Simplifier::bind` when dropped.
pub(crate) struct FactGuard<'a> {
    simplifier: &'a mut Simplifier,
    pushed: Vec<Pushed>,
}

impl Deref for FactGuard<'_> {
    type Target = Simplifier;

    fn deref(&self) -> &Simplifier {
        self.simplifier
    }
}

impl DerefMut for FactGuard<'_> {
    fn deref_mut(&mut self) -> &mut Simplifier {
        self.simplifier
    }
}

impl Drop for FactGuard<'_> {
    fn drop(&mut self) {
        while let Some(p) = self.pushed.pop() {
            match p {
                Pushed::Bounds(h) => {
                    self.simplifier.bounds.pop_handle(h);
                }
                Pushed::Align(h) => {
                    self.simplifier.align.pop_handle(h);
                }
                Pushed::Subst(h) => {
                    self.simplifier.subst.pop_handle(h);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Simplifier {
        Simplifier::new(SimplifyOptions::default(), &Scope::new(), &Scope::new())
    }

    #[test]
    fn guards_pop_what_they_push() {
        let mut s = fresh();
        {
            let g = s.bind("t", &Expr::mul(Expr::var("x"), Expr::int(4)));
            assert!(g.align.contains("t"));
            assert!(g.bounds.contains("t"));
        }
        assert!(s.align.is_empty());
        assert!(s.bounds.is_empty());
        {
            let g = s.bind("u", &Expr::int(3));
            assert_eq!(g.subst.get("u"), Some(&Expr::int(3)));
        }
        assert!(s.subst.is_empty());
    }

    #[test]
    fn untouched_trees_stay_shared() {
        let e = Expr::add(Expr::var("x"), Expr::var_of("y", loom_ir::Type::i32()));
        let out = fresh().mutate_expr(&e);
        assert!(out.same_as(&e));
    }

    #[test]
    fn caller_facts_are_copied() {
        let mut facts = Scope::new();
        facts.push("x", Interval::bounded(0, 3));
        let mut s = Simplifier::new(SimplifyOptions::default(), &facts, &Scope::new());
        {
            let _g = s.bind_range("i", Interval::bounded(0, 9));
        }
        assert_eq!(facts.depth(), 1);
        assert_eq!(s.bounds.depth(), 1);
    }
}
