#![forbid(unsafe_code)]

use std::fmt;

use crate::ir::{BinOp, Expr, ExprKind, ForKind, Stmt, StmtKind, UnaryOp};
use crate::ty::Type;

const INDENT: &str = "  ";

pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    fmt_expr(&mut out, expr);
    out
}

pub fn format_stmt(stmt: &Stmt) -> String {
    let mut out = String::new();
    fmt_stmt(&mut out, 0, stmt);
    out
}

fn fmt_expr(out: &mut String, expr: &Expr) {
    match expr.kind() {
        ExprKind::IntImm { ty, value } => {
            if *ty != Type::i32() {
                type_prefix(out, *ty);
            }
            out.push_str(&value.to_string());
        }
        ExprKind::UIntImm { ty, value } => {
            type_prefix(out, *ty);
            out.push_str(&value.to_string());
        }
        ExprKind::FloatImm { ty, value } => {
            out.push_str(&format!("{value:?}"));
            if ty.bits <= 32 {
                out.push('f');
            }
        }
        ExprKind::BoolImm(b) => out.push_str(if *b { "true" } else { "false" }),
        ExprKind::Var { name, .. } => out.push_str(name),
        ExprKind::Cast { ty, value } => {
            out.push_str(&ty.to_string());
            out.push('(');
            fmt_expr(out, value);
            out.push(')');
        }
        ExprKind::Unary { op, value } => {
            out.push(match op {
                UnaryOp::Neg => '-',
                UnaryOp::Not => '!',
            });
            fmt_expr(out, value);
        }
        ExprKind::Binary { op: op @ (BinOp::Min | BinOp::Max), a, b } => {
            out.push_str(op.symbol());
            out.push('(');
            fmt_expr(out, a);
            out.push_str(", ");
            fmt_expr(out, b);
            out.push(')');
        }
        ExprKind::Binary { op, a, b } => {
            out.push('(');
            fmt_expr(out, a);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            fmt_expr(out, b);
            out.push(')');
        }
        ExprKind::Select { cond, then_value, else_value } => {
            out.push_str("select(");
            fmt_expr(out, cond);
            out.push_str(", ");
            fmt_expr(out, then_value);
            out.push_str(", ");
            fmt_expr(out, else_value);
            out.push(')');
        }
        ExprKind::Broadcast { value, lanes } => {
            out.push_str(&format!("x{lanes}("));
            fmt_expr(out, value);
            out.push(')');
        }
        ExprKind::Ramp { base, stride, lanes } => {
            out.push_str("ramp(");
            fmt_expr(out, base);
            out.push_str(", ");
            fmt_expr(out, stride);
            out.push_str(&format!(", {lanes})"));
        }
        ExprKind::Call { name, args, .. } => {
            out.push_str(name);
            out.push('(');
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                fmt_expr(out, a);
            }
            out.push(')');
        }
        ExprKind::Let { name, value, body } => {
            out.push_str("(let ");
            out.push_str(name);
            out.push_str(" = ");
            fmt_expr(out, value);
            out.push_str(" in ");
            fmt_expr(out, body);
            out.push(')');
        }
    }
}

fn type_prefix(out: &mut String, ty: Type) {
    out.push('(');
    out.push_str(&ty.to_string());
    out.push(')');
}

fn indent_line(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}

fn fmt_stmt(out: &mut String, indent: usize, stmt: &Stmt) {
    match stmt.kind() {
        StmtKind::LetStmt { name, value, body } => {
            indent_line(out, indent);
            out.push_str(&format!("let {name} = {}\n", format_expr(value)));
            fmt_stmt(out, indent, body);
        }
        StmtKind::Block(stmts) => {
            if stmts.is_empty() {
                indent_line(out, indent);
                out.push_str("no_op\n");
            }
            for s in stmts {
                fmt_stmt(out, indent, s);
            }
        }
        StmtKind::IfThenElse { cond, then_case, else_case } => {
            indent_line(out, indent);
            out.push_str(&format!("if ({}) {{\n", format_expr(cond)));
            fmt_stmt(out, indent + 1, then_case);
            if let Some(e) = else_case {
                indent_line(out, indent);
                out.push_str("} else {\n");
                fmt_stmt(out, indent + 1, e);
            }
            indent_line(out, indent);
            out.push_str("}\n");
        }
        StmtKind::For { name, min, extent, kind, body } => {
            indent_line(out, indent);
            let kw = match kind {
                ForKind::Serial => "for",
                ForKind::Parallel => "parallel",
                ForKind::Vectorized => "vectorized",
                ForKind::Unrolled => "unrolled",
            };
            out.push_str(&format!("{kw} ({name}, {}, {}) {{\n", format_expr(min), format_expr(extent)));
            fmt_stmt(out, indent + 1, body);
            indent_line(out, indent);
            out.push_str("}\n");
        }
        StmtKind::Assert { cond, message } => {
            indent_line(out, indent);
            out.push_str(&format!("assert({}, {})\n", format_expr(cond), format_expr(message)));
        }
        StmtKind::Store { buffer, index, value } => {
            indent_line(out, indent);
            out.push_str(&format!("{buffer}[{}] = {}\n", format_expr(index), format_expr(value)));
        }
        StmtKind::Evaluate(e) => {
            indent_line(out, indent);
            out.push_str(&format!("evaluate({})\n", format_expr(e)));
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_expr(self))
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", format_expr(self))
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_stmt(self))
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}", format_stmt(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_infix_with_parens() {
        let e = Expr::add(Expr::var("x"), Expr::mul(Expr::int(3), Expr::int(4)));
        assert_eq!(e.to_string(), "(x + (3 * 4))");
        assert_eq!(Expr::min(Expr::var("a"), Expr::int(0)).to_string(), "min(a, 0)");
        assert_eq!(Expr::make_const(Type::uint(8), 7).to_string(), "(uint8)7");
        assert_eq!(Expr::not(Expr::lt(Expr::var("a"), Expr::var("b"))).to_string(), "!(a < b)");
    }

    #[test]
    fn prints_statements_indented() {
        let s = Stmt::let_stmt(
            "x",
            Expr::int(1),
            Stmt::if_then_else(
                Expr::lt(Expr::var("x"), Expr::int(2)),
                Stmt::store("out", Expr::int(0), Expr::var("x")),
                None,
            ),
        );
        assert_eq!(s.to_string(), "let x = 1\nif ((x < 2)) {\n  out[0] = x\n}\n");
    }
}
