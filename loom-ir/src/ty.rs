#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeCode {
    Int,
    UInt,
    Float,
    Bool,
}

/// Element type plus vector width of an IR value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Type {
    pub code: TypeCode,
    pub bits: u8,
    pub lanes: u16,
}

impl Type {
    pub const fn int(bits: u8) -> Self {
        Self { code: TypeCode::Int, bits, lanes: 1 }
    }

    pub const fn uint(bits: u8) -> Self {
        Self { code: TypeCode::UInt, bits, lanes: 1 }
    }

    pub const fn float(bits: u8) -> Self {
        Self { code: TypeCode::Float, bits, lanes: 1 }
    }

    pub const fn bool() -> Self {
        Self { code: TypeCode::Bool, bits: 1, lanes: 1 }
    }

    pub const fn i32() -> Self {
        Self::int(32)
    }

    pub fn with_lanes(self, lanes: u16) -> Self {
        Self { lanes, ..self }
    }

    pub fn element_of(self) -> Self {
        self.with_lanes(1)
    }

    pub fn is_int(&self) -> bool {
        self.code == TypeCode::Int
    }

    pub fn is_uint(&self) -> bool {
        self.code == TypeCode::UInt
    }

    /// Signed or unsigned integer.
    pub fn is_integer(&self) -> bool {
        matches!(self.code, TypeCode::Int | TypeCode::UInt)
    }

    pub fn is_float(&self) -> bool {
        self.code == TypeCode::Float
    }

    pub fn is_bool(&self) -> bool {
        self.code == TypeCode::Bool
    }

    pub fn is_scalar(&self) -> bool {
        self.lanes == 1
    }

    pub fn is_vector(&self) -> bool {
        self.lanes > 1
    }

    /// Signed 32/64-bit arithmetic is assumed never to overflow; every other
    /// integer type wraps modulo `2^bits`.
    pub fn can_overflow(&self) -> bool {
        match self.code {
            TypeCode::Int => self.bits < 32,
            TypeCode::UInt => true,
            TypeCode::Float | TypeCode::Bool => false,
        }
    }

    /// Smallest value of an integer type, if it fits in an `i64`.
    pub fn min_value(&self) -> Option<i64> {
        match self.code {
            TypeCode::Int if self.bits >= 64 => Some(i64::MIN),
            TypeCode::Int => Some(-(1i64 << (self.bits - 1))),
            TypeCode::UInt => Some(0),
            TypeCode::Bool => Some(0),
            TypeCode::Float => None,
        }
    }

    /// Largest value of an integer type, if it fits in an `i64`.
    pub fn max_value(&self) -> Option<i64> {
        match self.code {
            TypeCode::Int if self.bits >= 64 => Some(i64::MAX),
            TypeCode::Int => Some((1i64 << (self.bits - 1)) - 1),
            TypeCode::UInt if self.bits >= 64 => None,
            TypeCode::UInt => Some(((1u64 << self.bits) - 1) as i64),
            TypeCode::Bool => Some(1),
            TypeCode::Float => None,
        }
    }

    /// True when congruences modulo `m` survive wrap-around in this type.
    pub fn preserves_congruence(&self, m: i64) -> bool {
        if m <= 0 {
            return false;
        }
        if !self.can_overflow() {
            return true;
        }
        // Wrapping subtracts multiples of 2^bits, so `m` must divide 2^bits.
        m.count_ones() == 1 && (m.trailing_zeros() as u8) <= self.bits
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            TypeCode::Int => write!(f, "int{}", self.bits)?,
            TypeCode::UInt => write!(f, "uint{}", self.bits)?,
            TypeCode::Float => write!(f, "float{}", self.bits)?,
            TypeCode::Bool => write!(f, "bool")?,
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ranges() {
        assert_eq!(Type::int(8).min_value(), Some(-128));
        assert_eq!(Type::int(8).max_value(), Some(127));
        assert_eq!(Type::uint(16).max_value(), Some(65535));
        assert_eq!(Type::uint(64).max_value(), None);
        assert_eq!(Type::int(64).min_value(), Some(i64::MIN));
    }

    #[test]
    fn overflow_model() {
        assert!(!Type::int(32).can_overflow());
        assert!(Type::int(16).can_overflow());
        assert!(Type::uint(32).can_overflow());
        assert!(Type::uint(8).preserves_congruence(4));
        assert!(!Type::uint(8).preserves_congruence(6));
        assert!(!Type::uint(8).preserves_congruence(512));
        assert!(Type::int(32).preserves_congruence(6));
    }

    #[test]
    fn display_includes_lanes() {
        assert_eq!(Type::int(32).to_string(), "int32");
        assert_eq!(Type::float(32).with_lanes(8).to_string(), "float32x8");
    }
}
