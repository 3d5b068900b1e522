#![forbid(unsafe_code)]

use loom_ir::{Expr, Interval, ModulusRemainder, Scope};
use tracing::debug;

use crate::simplify_expr;

/// True when `e` simplifies to the literal `true` with no caller facts.
/// `false` means "not proved", never "proved false".
pub fn can_prove(e: &Expr) -> bool {
    can_prove_with(e, &Scope::new(), &Scope::new())
}

pub fn can_prove_with(e: &Expr, bounds: &Scope<Interval>, align: &Scope<ModulusRemainder>) -> bool {
    let residue = simplify_expr(e, true, bounds, align);
    let proved = residue.is_true();
    debug!(goal = %e, %residue, proved, "prove");
    proved
}
