#![forbid(unsafe_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fold::Const;
use crate::ty::{Type, TypeCode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    And,
    Or,
}

impl BinOp {
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Mul | BinOp::Min | BinOp::Max | BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    /// Produces a boolean result.
    pub fn is_predicate(self) -> bool {
        self.is_comparison() || self.is_logical()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Min => "min",
            BinOp::Max => "max",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Whether evaluating a call may be observable beyond its result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// No purity fact is known: the call must be kept even if its value is dead.
    #[default]
    Unknown,
    Pure,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ExprKind {
    IntImm { ty: Type, value: i64 },
    UIntImm { ty: Type, value: u64 },
    FloatImm { ty: Type, value: f64 },
    BoolImm(bool),

    Var { name: String, ty: Type },

    Cast { ty: Type, value: Expr },

    Unary { op: UnaryOp, value: Expr },

    Binary { op: BinOp, a: Expr, b: Expr },

    /// Evaluates only the branch selected by `cond`.
    Select {
        cond: Expr,
        then_value: Expr,
        else_value: Expr,
    },

    /// A vector with `value` in every lane.
    Broadcast { value: Expr, lanes: u16 },

    /// The vector `[base, base + stride, ..., base + (lanes - 1) * stride]`.
    Ramp { base: Expr, stride: Expr, lanes: u16 },

    /// Opaque function application.
    Call {
        name: String,
        args: Vec<Expr>,
        ty: Type,
        #[serde(default)]
        effect: Effect,
    },

    Let { name: String, value: Expr, body: Expr },
}

/// Immutable, structurally shared expression node.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expr(Arc<ExprKind>);

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0
    }

    /// Pointer identity; cheaper than structural equality.
    pub fn same_as(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn ty(&self) -> Type {
        match self.kind() {
            ExprKind::IntImm { ty, .. } | ExprKind::UIntImm { ty, .. } | ExprKind::FloatImm { ty, .. } => *ty,
            ExprKind::BoolImm(_) => Type::bool(),
            ExprKind::Var { ty, .. } | ExprKind::Cast { ty, .. } | ExprKind::Call { ty, .. } => *ty,
            ExprKind::Unary { op: UnaryOp::Neg, value } => value.ty(),
            ExprKind::Unary { op: UnaryOp::Not, value } => Type::bool().with_lanes(value.ty().lanes),
            ExprKind::Binary { op, a, .. } => {
                if op.is_predicate() {
                    Type::bool().with_lanes(a.ty().lanes)
                } else {
                    a.ty()
                }
            }
            ExprKind::Select { then_value, .. } => then_value.ty(),
            ExprKind::Broadcast { value, lanes } => value.ty().with_lanes(*lanes),
            ExprKind::Ramp { base, lanes, .. } => base.ty().with_lanes(*lanes),
            ExprKind::Let { body, .. } => body.ty(),
        }
    }

    // ---- leaves ----

    /// 32-bit signed literal.
    pub fn int(value: i64) -> Self {
        Self::make_const(Type::i32(), value)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::BoolImm(value))
    }

    pub fn f32(value: f32) -> Self {
        Self::new(ExprKind::FloatImm { ty: Type::float(32), value: value as f64 })
    }

    pub fn f64(value: f64) -> Self {
        Self::new(ExprKind::FloatImm { ty: Type::float(64), value })
    }

    /// 32-bit signed variable.
    pub fn var(name: impl Into<String>) -> Self {
        Self::var_of(name, Type::i32())
    }

    pub fn var_of(name: impl Into<String>, ty: Type) -> Self {
        Self::new(ExprKind::Var { name: name.into(), ty })
    }

    /// A literal of type `ty` holding `value`, wrapped to the type's width.
    /// Vector types produce a broadcast of the scalar literal.
    pub fn make_const(ty: Type, value: i64) -> Self {
        let scalar = match ty.code {
            TypeCode::Int => Const::Int(value),
            TypeCode::UInt => Const::UInt(value as u64),
            TypeCode::Float => Const::Float(value as f64),
            TypeCode::Bool => Const::Bool(value != 0),
        };
        Self::from_const(ty, scalar)
    }

    pub fn make_zero(ty: Type) -> Self {
        Self::make_const(ty, 0)
    }

    pub fn make_one(ty: Type) -> Self {
        Self::make_const(ty, 1)
    }

    /// Wraps a folded constant back into a literal node of type `ty`.
    pub fn from_const(ty: Type, c: Const) -> Self {
        let elem = ty.element_of();
        let c = c.normalize(elem);
        let scalar = match c {
            Const::Int(value) => Self::new(ExprKind::IntImm { ty: elem, value }),
            Const::UInt(value) => Self::new(ExprKind::UIntImm { ty: elem, value }),
            Const::Float(value) => Self::new(ExprKind::FloatImm { ty: elem, value }),
            Const::Bool(value) => Self::bool(value),
        };
        if ty.is_vector() {
            Self::broadcast(scalar, ty.lanes)
        } else {
            scalar
        }
    }

    // ---- composite builders (no simplification) ----

    pub fn cast(ty: Type, value: Expr) -> Self {
        Self::new(ExprKind::Cast { ty, value })
    }

    pub fn unary(op: UnaryOp, value: Expr) -> Self {
        Self::new(ExprKind::Unary { op, value })
    }

    pub fn neg(value: Expr) -> Self {
        Self::unary(UnaryOp::Neg, value)
    }

    pub fn not(value: Expr) -> Self {
        Self::unary(UnaryOp::Not, value)
    }

    pub fn binary(op: BinOp, a: Expr, b: Expr) -> Self {
        Self::new(ExprKind::Binary { op, a, b })
    }

    pub fn add(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Add, a, b)
    }

    pub fn sub(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Sub, a, b)
    }

    pub fn mul(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Mul, a, b)
    }

    pub fn div(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Div, a, b)
    }

    pub fn rem(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Mod, a, b)
    }

    pub fn min(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Min, a, b)
    }

    pub fn max(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Max, a, b)
    }

    /// `min(max(value, lo), hi)`
    pub fn clamp(value: Expr, lo: Expr, hi: Expr) -> Self {
        Self::min(Self::max(value, lo), hi)
    }

    pub fn eq(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Eq, a, b)
    }

    pub fn ne(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Ne, a, b)
    }

    pub fn lt(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Lt, a, b)
    }

    pub fn le(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Le, a, b)
    }

    pub fn gt(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Gt, a, b)
    }

    pub fn ge(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Ge, a, b)
    }

    pub fn and(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::And, a, b)
    }

    pub fn or(a: Expr, b: Expr) -> Self {
        Self::binary(BinOp::Or, a, b)
    }

    pub fn select(cond: Expr, then_value: Expr, else_value: Expr) -> Self {
        Self::new(ExprKind::Select { cond, then_value, else_value })
    }

    pub fn broadcast(value: Expr, lanes: u16) -> Self {
        Self::new(ExprKind::Broadcast { value, lanes })
    }

    pub fn ramp(base: Expr, stride: Expr, lanes: u16) -> Self {
        Self::new(ExprKind::Ramp { base, stride, lanes })
    }

    /// Call with no known purity fact.
    pub fn call(name: impl Into<String>, args: Vec<Expr>, ty: Type) -> Self {
        Self::new(ExprKind::Call { name: name.into(), args, ty, effect: Effect::Unknown })
    }

    pub fn pure_call(name: impl Into<String>, args: Vec<Expr>, ty: Type) -> Self {
        Self::new(ExprKind::Call { name: name.into(), args, ty, effect: Effect::Pure })
    }

    pub fn let_in(name: impl Into<String>, value: Expr, body: Expr) -> Self {
        Self::new(ExprKind::Let { name: name.into(), value, body })
    }

    // ---- queries ----

    /// Scalar literal value.
    pub fn as_const(&self) -> Option<Const> {
        match self.kind() {
            ExprKind::IntImm { value, .. } => Some(Const::Int(*value)),
            ExprKind::UIntImm { value, .. } => Some(Const::UInt(*value)),
            ExprKind::FloatImm { value, .. } => Some(Const::Float(*value)),
            ExprKind::BoolImm(b) => Some(Const::Bool(*b)),
            _ => None,
        }
    }

    /// Literal value of a scalar literal or a broadcast of one.
    pub fn as_const_lanes(&self) -> Option<Const> {
        match self.kind() {
            ExprKind::Broadcast { value, .. } => value.as_const(),
            _ => self.as_const(),
        }
    }

    /// Integer literal (scalar or broadcast) that fits in an `i64`.
    pub fn as_int(&self) -> Option<i64> {
        match self.as_const_lanes()? {
            Const::Int(v) => Some(v),
            Const::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_const_lanes()? {
            Const::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        self.as_const_lanes().is_some()
    }

    pub fn is_zero(&self) -> bool {
        self.as_const_lanes().is_some_and(|c| c.is_zero())
    }

    pub fn is_one(&self) -> bool {
        self.as_const_lanes().is_some_and(|c| c.is_one())
    }

    /// Exactly the scalar literal `true`.
    pub fn is_true(&self) -> bool {
        matches!(self.kind(), ExprKind::BoolImm(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self.kind(), ExprKind::BoolImm(false))
    }

    pub fn as_var(&self) -> Option<&str> {
        match self.kind() {
            ExprKind::Var { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_binary(&self, want: BinOp) -> Option<(&Expr, &Expr)> {
        match self.kind() {
            ExprKind::Binary { op, a, b } if *op == want => Some((a, b)),
            _ => None,
        }
    }

    pub fn as_not(&self) -> Option<&Expr> {
        match self.kind() {
            ExprKind::Unary { op: UnaryOp::Not, value } => Some(value),
            _ => None,
        }
    }

    pub fn as_neg(&self) -> Option<&Expr> {
        match self.kind() {
            ExprKind::Unary { op: UnaryOp::Neg, value } => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForKind {
    #[default]
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StmtKind {
    LetStmt { name: String, value: Expr, body: Stmt },

    /// Sequential composition. The empty block is the canonical no-op.
    Block(Vec<Stmt>),

    IfThenElse {
        cond: Expr,
        then_case: Stmt,
        else_case: Option<Stmt>,
    },

    /// Runs `body` with `name` bound to `min, min + 1, ..., min + extent - 1`.
    For {
        name: String,
        min: Expr,
        extent: Expr,
        #[serde(default)]
        kind: ForKind,
        body: Stmt,
    },

    Assert { cond: Expr, message: Expr },

    Store { buffer: String, index: Expr, value: Expr },

    /// Evaluates an expression for its effects.
    Evaluate(Expr),
}

/// Immutable, structurally shared statement node.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stmt(Arc<StmtKind>);

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &StmtKind {
        &self.0
    }

    pub fn same_as(&self, other: &Stmt) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn no_op() -> Self {
        Self::new(StmtKind::Block(Vec::new()))
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self.kind(), StmtKind::Block(stmts) if stmts.is_empty())
    }

    pub fn let_stmt(name: impl Into<String>, value: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::LetStmt { name: name.into(), value, body })
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(stmts))
    }

    pub fn if_then_else(cond: Expr, then_case: Stmt, else_case: Option<Stmt>) -> Self {
        Self::new(StmtKind::IfThenElse { cond, then_case, else_case })
    }

    pub fn for_loop(name: impl Into<String>, min: Expr, extent: Expr, kind: ForKind, body: Stmt) -> Self {
        Self::new(StmtKind::For { name: name.into(), min, extent, kind, body })
    }

    pub fn assert(cond: Expr, message: Expr) -> Self {
        Self::new(StmtKind::Assert { cond, message })
    }

    pub fn store(buffer: impl Into<String>, index: Expr, value: Expr) -> Self {
        Self::new(StmtKind::Store { buffer: buffer.into(), index, value })
    }

    pub fn evaluate(value: Expr) -> Self {
        Self::new(StmtKind::Evaluate(value))
    }
}
