#![forbid(unsafe_code)]

//! Literal arithmetic shared by constant folding and the oracle.
//!
//! Every result is normalized to the declared element type: integers wrap
//! (or sign-extend) to their width and `float32` results are rounded through
//! `f32`. Division and modulo by zero never fold.

use crate::ir::{BinOp, UnaryOp};
use crate::ty::{Type, TypeCode};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Const {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Const {
    /// Coerces the value into the representation of `ty` (an element type).
    pub fn normalize(self, ty: Type) -> Const {
        match ty.code {
            TypeCode::Int => Const::Int(wrap_int(self.bits_as_i64(), ty.bits)),
            TypeCode::UInt => Const::UInt(wrap_uint(self.bits_as_i64() as u64, ty.bits)),
            TypeCode::Float => {
                let v = match self {
                    Const::Int(v) => v as f64,
                    Const::UInt(v) => v as f64,
                    Const::Float(v) => v,
                    Const::Bool(b) => b as u8 as f64,
                };
                Const::Float(round_float(v, ty.bits))
            }
            TypeCode::Bool => Const::Bool(!self.is_zero()),
        }
    }

    fn bits_as_i64(self) -> i64 {
        match self {
            Const::Int(v) => v,
            Const::UInt(v) => v as i64,
            Const::Float(v) => v as i64,
            Const::Bool(b) => b as i64,
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Const::Int(v) => v == 0,
            Const::UInt(v) => v == 0,
            Const::Float(v) => v == 0.0,
            Const::Bool(b) => !b,
        }
    }

    pub fn is_one(&self) -> bool {
        match *self {
            Const::Int(v) => v == 1,
            Const::UInt(v) => v == 1,
            Const::Float(v) => v == 1.0,
            Const::Bool(b) => b,
        }
    }
}

fn wrap_int(v: i64, bits: u8) -> i64 {
    if bits >= 64 {
        v
    } else {
        let shift = 64 - u32::from(bits);
        (v << shift) >> shift
    }
}

fn wrap_uint(v: u64, bits: u8) -> u64 {
    if bits >= 64 { v } else { v & ((1u64 << bits) - 1) }
}

fn round_float(v: f64, bits: u8) -> f64 {
    if bits <= 32 { v as f32 as f64 } else { v }
}

pub fn fold_unary(op: UnaryOp, ty: Type, v: Const) -> Option<Const> {
    let out = match (op, v) {
        (UnaryOp::Neg, Const::Int(a)) => Const::Int(a.wrapping_neg()),
        (UnaryOp::Neg, Const::UInt(a)) => Const::UInt(a.wrapping_neg()),
        (UnaryOp::Neg, Const::Float(a)) => Const::Float(-a),
        (UnaryOp::Not, Const::Bool(b)) => Const::Bool(!b),
        _ => return None,
    };
    Some(out.normalize(ty.element_of()))
}

/// Folds `a op b` where both operands have element type `operand_ty`.
pub fn fold_binary(op: BinOp, operand_ty: Type, a: Const, b: Const) -> Option<Const> {
    use BinOp::*;

    let ty = operand_ty.element_of();
    let out = match (a, b) {
        (Const::Int(a), Const::Int(b)) => match op {
            Add => Const::Int(a.wrapping_add(b)),
            Sub => Const::Int(a.wrapping_sub(b)),
            Mul => Const::Int(a.wrapping_mul(b)),
            Div if b == 0 => return None,
            Div => Const::Int(a.wrapping_div_euclid(b)),
            Mod if b == 0 => return None,
            Mod => Const::Int(a.wrapping_rem_euclid(b)),
            Min => Const::Int(a.min(b)),
            Max => Const::Int(a.max(b)),
            _ => return compare(op, a.cmp(&b)),
        },
        (Const::UInt(a), Const::UInt(b)) => match op {
            Add => Const::UInt(a.wrapping_add(b)),
            Sub => Const::UInt(a.wrapping_sub(b)),
            Mul => Const::UInt(a.wrapping_mul(b)),
            Div if b == 0 => return None,
            Div => Const::UInt(a / b),
            Mod if b == 0 => return None,
            Mod => Const::UInt(a % b),
            Min => Const::UInt(a.min(b)),
            Max => Const::UInt(a.max(b)),
            _ => return compare(op, a.cmp(&b)),
        },
        (Const::Float(a), Const::Float(b)) => match op {
            Add => Const::Float(a + b),
            Sub => Const::Float(a - b),
            Mul => Const::Float(a * b),
            Div if b == 0.0 => return None,
            Div => Const::Float(a / b),
            Mod if b == 0.0 => return None,
            Mod => Const::Float(a - b * (a / b).floor()),
            Min => Const::Float(if a < b { a } else { b }),
            Max => Const::Float(if a > b { a } else { b }),
            Eq => Const::Bool(a == b),
            Ne => Const::Bool(a != b),
            Lt => Const::Bool(a < b),
            Le => Const::Bool(a <= b),
            Gt => Const::Bool(a > b),
            Ge => Const::Bool(a >= b),
            And | Or => return None,
        },
        (Const::Bool(a), Const::Bool(b)) => match op {
            And => Const::Bool(a && b),
            Or => Const::Bool(a || b),
            Eq => Const::Bool(a == b),
            Ne => Const::Bool(a != b),
            _ => return None,
        },
        _ => return None,
    };

    Some(match out {
        Const::Bool(_) => out,
        _ => out.normalize(ty),
    })
}

fn compare(op: BinOp, ord: std::cmp::Ordering) -> Option<Const> {
    use std::cmp::Ordering::*;

    let b = match op {
        BinOp::Eq => ord == Equal,
        BinOp::Ne => ord != Equal,
        BinOp::Lt => ord == Less,
        BinOp::Le => ord != Greater,
        BinOp::Gt => ord == Greater,
        BinOp::Ge => ord != Less,
        _ => return None,
    };
    Some(Const::Bool(b))
}

/// Converts a literal to element type `to`. Float to integer conversion
/// saturates to `i64`/`u64` before wrapping to the target width.
pub fn fold_cast(to: Type, v: Const) -> Const {
    let to = to.element_of();
    match (to.code, v) {
        (TypeCode::UInt, Const::Float(f)) => Const::UInt(f as u64).normalize(to),
        _ => v.normalize(to),
    }
}
