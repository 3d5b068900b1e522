#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::collections::{BTreeMap, HashMap};

use miette::Diagnostic;
use thiserror::Error;

use crate::fold::{Const, fold_binary, fold_cast, fold_unary};
use crate::ir::{BinOp, Expr, ExprKind, Stmt, StmtKind, UnaryOp};
use crate::scope::Scope;
use crate::ty::Type;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Vector(Vec<Value>),
}

impl Value {
    fn as_const(&self) -> Option<Const> {
        match *self {
            Value::Int(v) => Some(Const::Int(v)),
            Value::UInt(v) => Some(Const::UInt(v)),
            Value::Float(v) => Some(Const::Float(v)),
            Value::Bool(b) => Some(Const::Bool(b)),
            Value::Vector(_) => None,
        }
    }

    fn from_const(c: Const) -> Self {
        match c {
            Const::Int(v) => Value::Int(v),
            Const::UInt(v) => Value::UInt(v),
            Const::Float(v) => Value::Float(v),
            Const::Bool(b) => Value::Bool(b),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Vector(lanes) => {
                write!(f, "<")?;
                for (i, v) in lanes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Values of the free variables of a tree.
pub type Env = HashMap<String, Value>;

/// Implementation of a callable function for the oracle. `None` means the
/// arguments are outside the function's domain.
pub type OracleFn = fn(&[Value]) -> Option<Value>;

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum OracleError {
    #[error("oracle: unbound variable `{name}`")]
    #[diagnostic(code(loom::oracle))]
    UnboundVariable { name: String },

    #[error("oracle: division by zero")]
    #[diagnostic(code(loom::oracle))]
    DivisionByZero,

    #[error("oracle: {message}")]
    #[diagnostic(code(loom::oracle))]
    TypeMismatch { message: String },

    #[error("oracle: call to unmodeled function `{name}`")]
    #[diagnostic(code(loom::oracle), help("register it in OracleConfig::functions"))]
    UnknownCall { name: String },

    #[error("oracle: assertion failed: {message}")]
    #[diagnostic(code(loom::oracle))]
    AssertionFailed { message: String },

    #[error("oracle: exceeded max_steps={max_steps} (possible runaway loop)")]
    #[diagnostic(code(loom::oracle))]
    StepLimit { max_steps: usize },

    #[error("oracle: {op:?} of {a} and {b} overflows {ty}")]
    #[diagnostic(code(loom::oracle), help("only reported when OracleConfig::overflow is not `Wrap`"))]
    Overflow { op: BinOp, ty: Type, a: i64, b: i64 },
}

fn mismatch(message: impl Into<String>) -> OracleError {
    OracleError::TypeMismatch { message: message.into() }
}

/// Arithmetic on the integer types that are assumed never to overflow
/// (32- and 64-bit signed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    /// Wrap to the declared width, as constant folding does.
    #[default]
    Wrap,
    /// A result outside the type's range is an error.
    Trap,
    /// Compute over the integers; values may leave the type's range.
    Exact,
}

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub max_steps: usize,
    pub functions: BTreeMap<String, OracleFn>,
    pub overflow: Overflow,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            functions: BTreeMap::new(),
            overflow: Overflow::Wrap,
        }
    }
}

impl OracleConfig {
    pub fn with_function(mut self, name: impl Into<String>, f: OracleFn) -> Self {
        self.functions.insert(name.into(), f);
        self
    }

    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    pub buffer: String,
    pub index: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallEvent {
    pub name: String,
    pub args: Vec<Value>,
}

/// Observable behavior of running a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleTrace {
    pub stores: Vec<StoreEvent>,
    pub calls: Vec<CallEvent>,
}

/// Reference semantics for expressions, for differential testing of
/// rewrites. Integer arithmetic wraps to the declared width exactly as
/// constant folding does.
pub fn eval_expr(expr: &Expr, env: &Env, cfg: &OracleConfig) -> Result<Value, OracleError> {
    let mut m = Machine::new(env, cfg);
    m.eval(expr)
}

pub fn run_stmt(stmt: &Stmt, env: &Env, cfg: &OracleConfig) -> Result<OracleTrace, OracleError> {
    let mut m = Machine::new(env, cfg);
    m.run(stmt)?;
    Ok(m.trace)
}

struct Machine<'a> {
    vars: Scope<Value>,
    cfg: &'a OracleConfig,
    trace: OracleTrace,
    steps: usize,
}

impl<'a> Machine<'a> {
    fn new(env: &Env, cfg: &'a OracleConfig) -> Self {
        Self {
            vars: env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            cfg,
            trace: OracleTrace::default(),
            steps: 0,
        }
    }

    fn step(&mut self) -> Result<(), OracleError> {
        self.steps += 1;
        if self.steps > self.cfg.max_steps {
            return Err(OracleError::StepLimit { max_steps: self.cfg.max_steps });
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, OracleError> {
        match expr.kind() {
            ExprKind::IntImm { value, .. } => Ok(Value::Int(*value)),
            ExprKind::UIntImm { value, .. } => Ok(Value::UInt(*value)),
            ExprKind::FloatImm { value, .. } => Ok(Value::Float(*value)),
            ExprKind::BoolImm(b) => Ok(Value::Bool(*b)),
            ExprKind::Var { name, .. } => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| OracleError::UnboundVariable { name: name.clone() }),
            ExprKind::Cast { ty, value } => {
                let v = self.eval(value)?;
                lanewise1(&v, |c| Ok(fold_cast(*ty, c)))
            }
            ExprKind::Unary { op, value } => {
                let ty = value.ty();
                let v = self.eval(value)?;
                let mode = self.cfg.overflow;
                lanewise1(&v, |c| match (op, c) {
                    (UnaryOp::Neg, Const::Int(x)) if mode != Overflow::Wrap && exact_type(ty) => {
                        eval_binary(BinOp::Sub, ty, Const::Int(0), Const::Int(x), mode)
                    }
                    _ => fold_unary(*op, ty, c).ok_or_else(|| mismatch(format!("unsupported unary {op:?} on {ty}"))),
                })
            }
            ExprKind::Binary { op, a, b } => {
                let ty = a.ty();
                let va = self.eval(a)?;
                let vb = self.eval(b)?;
                let mode = self.cfg.overflow;
                lanewise2(&va, &vb, |x, y| eval_binary(*op, ty, x, y, mode))
            }
            ExprKind::Select { cond, then_value, else_value } => match self.eval(cond)? {
                Value::Bool(true) => self.eval(then_value),
                Value::Bool(false) => self.eval(else_value),
                Value::Vector(mask) => {
                    let t = self.eval(then_value)?;
                    let f = self.eval(else_value)?;
                    let (Value::Vector(t), Value::Vector(f)) = (t, f) else {
                        return Err(mismatch("vector select needs vector operands"));
                    };
                    mask.iter()
                        .zip(t.into_iter().zip(f))
                        .map(|(m, (t, f))| match m {
                            Value::Bool(true) => Ok(t),
                            Value::Bool(false) => Ok(f),
                            _ => Err(mismatch("select mask lane is not a bool")),
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Vector)
                }
                other => Err(mismatch(format!("select condition evaluated to {other}"))),
            },
            ExprKind::Broadcast { value, lanes } => {
                let v = self.eval(value)?;
                Ok(Value::Vector(vec![v; usize::from(*lanes)]))
            }
            ExprKind::Ramp { base, stride, lanes } => {
                let ty = base.ty();
                let b = self.eval(base)?.as_const().ok_or_else(|| mismatch("ramp base must be scalar"))?;
                let s = self.eval(stride)?.as_const().ok_or_else(|| mismatch("ramp stride must be scalar"))?;
                let mut out = Vec::with_capacity(usize::from(*lanes));
                let mut cur = b;
                for _ in 0..*lanes {
                    out.push(Value::from_const(cur));
                    cur = fold_binary(BinOp::Add, ty, cur, s).ok_or_else(|| mismatch("ramp of non-numeric type"))?;
                }
                Ok(Value::Vector(out))
            }
            ExprKind::Call { name, args, .. } => {
                let args = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>, _>>()?;
                let f = self
                    .cfg
                    .functions
                    .get(name)
                    .ok_or_else(|| OracleError::UnknownCall { name: name.clone() })?;
                let out = f(&args).ok_or_else(|| mismatch(format!("`{name}` rejected its arguments")))?;
                self.trace.calls.push(CallEvent { name: name.clone(), args });
                Ok(out)
            }
            ExprKind::Let { name, value, body } => {
                let v = self.eval(value)?;
                self.vars.push(name.clone(), v);
                let out = self.eval(body);
                self.vars.pop();
                out
            }
        }
    }

    fn run(&mut self, stmt: &Stmt) -> Result<(), OracleError> {
        self.step()?;
        match stmt.kind() {
            StmtKind::LetStmt { name, value, body } => {
                let v = self.eval(value)?;
                self.vars.push(name.clone(), v);
                let out = self.run(body);
                self.vars.pop();
                out
            }
            StmtKind::Block(stmts) => stmts.iter().try_for_each(|s| self.run(s)),
            StmtKind::IfThenElse { cond, then_case, else_case } => match self.eval(cond)? {
                Value::Bool(true) => self.run(then_case),
                Value::Bool(false) => match else_case {
                    Some(e) => self.run(e),
                    None => Ok(()),
                },
                other => Err(mismatch(format!("if condition evaluated to {other}"))),
            },
            StmtKind::For { name, min, extent, body, .. } => {
                let lo = self.eval(min)?.as_i64().ok_or_else(|| mismatch("loop min must be an integer"))?;
                let n = self.eval(extent)?.as_i64().ok_or_else(|| mismatch("loop extent must be an integer"))?;
                for i in 0..n.max(0) {
                    self.vars.push(name.clone(), Value::Int(lo.wrapping_add(i)));
                    let out = self.run(body);
                    self.vars.pop();
                    out?;
                }
                Ok(())
            }
            StmtKind::Assert { cond, message } => match self.eval(cond)? {
                Value::Bool(true) => Ok(()),
                Value::Bool(false) => {
                    let message = match self.eval(message) {
                        Ok(v) => v.to_string(),
                        Err(_) => message.to_string(),
                    };
                    Err(OracleError::AssertionFailed { message })
                }
                other => Err(mismatch(format!("assert condition evaluated to {other}"))),
            },
            StmtKind::Store { buffer, index, value } => {
                let index = self.eval(index)?;
                let value = self.eval(value)?;
                self.trace.stores.push(StoreEvent { buffer: buffer.clone(), index, value });
                Ok(())
            }
            StmtKind::Evaluate(e) => self.eval(e).map(|_| ()),
        }
    }
}

fn exact_type(ty: Type) -> bool {
    ty.is_int() && !ty.can_overflow()
}

fn eval_binary(op: BinOp, ty: Type, a: Const, b: Const, mode: Overflow) -> Result<Const, OracleError> {
    if matches!(op, BinOp::Div | BinOp::Mod) && b.is_zero() {
        return Err(OracleError::DivisionByZero);
    }
    if let (Const::Int(x), Const::Int(y)) = (a, b) {
        if mode != Overflow::Wrap && exact_type(ty) {
            let exact = match op {
                BinOp::Add => x.checked_add(y),
                BinOp::Sub => x.checked_sub(y),
                BinOp::Mul => x.checked_mul(y),
                BinOp::Div => x.checked_div_euclid(y),
                BinOp::Mod => x.checked_rem_euclid(y),
                BinOp::Min => Some(x.min(y)),
                BinOp::Max => Some(x.max(y)),
                _ => return fold_binary(op, ty, a, b).ok_or_else(|| mismatch(format!("unsupported binary {op:?}"))),
            };
            let in_range = |v: &i64| mode == Overflow::Exact || (ty.min_value() <= Some(*v) && Some(*v) <= ty.max_value());
            return exact
                .filter(in_range)
                .map(Const::Int)
                .ok_or(OracleError::Overflow { op, ty: ty.element_of(), a: x, b: y });
        }
    }
    fold_binary(op, ty, a, b).ok_or_else(|| mismatch(format!("unsupported binary {op:?} on {a:?} and {b:?}")))
}

fn lanewise1(v: &Value, f: impl Fn(Const) -> Result<Const, OracleError>) -> Result<Value, OracleError> {
    let scalar = |v: &Value| {
        let c = v.as_const().ok_or_else(|| mismatch("nested vectors"))?;
        f(c).map(Value::from_const)
    };
    match v {
        Value::Vector(lanes) => lanes.iter().map(scalar).collect::<Result<_, _>>().map(Value::Vector),
        _ => scalar(v),
    }
}

fn lanewise2(
    a: &Value,
    b: &Value,
    f: impl Fn(Const, Const) -> Result<Const, OracleError> + Copy,
) -> Result<Value, OracleError> {
    match (a, b) {
        (Value::Vector(xs), Value::Vector(ys)) if xs.len() == ys.len() => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| lanewise2(x, y, f))
            .collect::<Result<_, _>>()
            .map(Value::Vector),
        (Value::Vector(_), _) | (_, Value::Vector(_)) => Err(mismatch("lane count mismatch")),
        _ => {
            let (Some(x), Some(y)) = (a.as_const(), b.as_const()) else {
                return Err(mismatch("expected scalars"));
            };
            f(x, y).map(Value::from_const)
        }
    }
}
