#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ty::Type;

/// Provable `[min, max]` range of an integer value; `None` is unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
}

fn narrow(v: i128) -> Option<i64> {
    i64::try_from(v).ok()
}

impl Interval {
    pub fn everything() -> Self {
        Self { min: None, max: None }
    }

    pub fn single_point(v: i64) -> Self {
        Self { min: Some(v), max: Some(v) }
    }

    pub fn bounded(min: i64, max: i64) -> Self {
        debug_assert!(min <= max, "empty interval [{min}, {max}]");
        Self { min: Some(min), max: Some(max) }
    }

    pub fn at_least(min: i64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn at_most(max: i64) -> Self {
        Self { min: None, max: Some(max) }
    }

    /// Every value representable in the integer type `ty`.
    pub fn of_type(ty: Type) -> Self {
        if ty.is_integer() || ty.is_bool() {
            Self { min: ty.min_value(), max: ty.max_value() }
        } else {
            Self::everything()
        }
    }

    pub fn is_everything(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    pub fn is_single_point(&self) -> bool {
        self.is_bounded() && self.min == self.max
    }

    pub fn as_single_point(&self) -> Option<i64> {
        if self.is_single_point() { self.min } else { None }
    }

    pub fn contains(&self, v: i64) -> bool {
        self.min.is_none_or(|lo| lo <= v) && self.max.is_none_or(|hi| v <= hi)
    }

    /// Smallest interval containing both.
    pub fn union(&self, other: &Interval) -> Interval {
        Interval {
            min: self.min.zip(other.min).map(|(a, b)| a.min(b)),
            max: self.max.zip(other.max).map(|(a, b)| a.max(b)),
        }
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        let min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Interval { min, max }
    }

    pub fn add(&self, other: &Interval) -> Interval {
        Interval {
            min: self.min.zip(other.min).and_then(|(a, b)| a.checked_add(b)),
            max: self.max.zip(other.max).and_then(|(a, b)| a.checked_add(b)),
        }
    }

    pub fn neg(&self) -> Interval {
        Interval {
            min: self.max.and_then(i64::checked_neg),
            max: self.min.and_then(i64::checked_neg),
        }
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        Interval {
            min: self.min.zip(other.max).and_then(|(a, b)| a.checked_sub(b)),
            max: self.max.zip(other.min).and_then(|(a, b)| a.checked_sub(b)),
        }
    }

    pub fn mul(&self, other: &Interval) -> Interval {
        if self.as_single_point() == Some(0) || other.as_single_point() == Some(0) {
            return Interval::single_point(0);
        }
        let (Some(a0), Some(a1), Some(b0), Some(b1)) = (self.min, self.max, other.min, other.max) else {
            return self.mul_unbounded(other);
        };
        let corners = [
            a0 as i128 * b0 as i128,
            a0 as i128 * b1 as i128,
            a1 as i128 * b0 as i128,
            a1 as i128 * b1 as i128,
        ];
        let lo = corners.iter().copied().min().unwrap_or(0);
        let hi = corners.iter().copied().max().unwrap_or(0);
        Interval { min: narrow(lo), max: narrow(hi) }
    }

    // One side unbounded: only multiplication by a known-sign point survives.
    fn mul_unbounded(&self, other: &Interval) -> Interval {
        let (point, range) = match (self.as_single_point(), other.as_single_point()) {
            (Some(c), _) => (c, other),
            (_, Some(c)) => (c, self),
            _ => return Interval::everything(),
        };
        let scale = |v: Option<i64>| v.and_then(|v| v.checked_mul(point));
        if point > 0 {
            Interval { min: scale(range.min), max: scale(range.max) }
        } else {
            Interval { min: scale(range.max), max: scale(range.min) }
        }
    }

    /// Euclidean division by a non-zero constant.
    pub fn div_by_const(&self, c: i64) -> Interval {
        if c == 0 {
            return Interval::everything();
        }
        let Some(abs) = c.checked_abs() else {
            return Interval::everything();
        };
        let up = Interval {
            min: self.min.map(|v| v.div_euclid(abs)),
            max: self.max.map(|v| v.div_euclid(abs)),
        };
        if c > 0 { up } else { up.neg() }
    }

    /// Euclidean remainder by a non-zero constant: always in `[0, |c| - 1]`.
    pub fn mod_by_const(&self, c: i64) -> Interval {
        let Some(abs) = c.checked_abs().filter(|a| *a > 0) else {
            return Interval::everything();
        };
        let full = Interval::bounded(0, abs - 1);
        if self.min.is_some_and(|lo| lo >= 0) && self.max.is_some_and(|hi| hi < abs) {
            *self
        } else {
            full
        }
    }

    pub fn min_with(&self, other: &Interval) -> Interval {
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Interval {
            min: self.min.zip(other.min).map(|(a, b)| a.min(b)),
            max,
        }
    }

    pub fn max_with(&self, other: &Interval) -> Interval {
        let min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        Interval {
            min,
            max: self.max.zip(other.max).map(|(a, b)| a.max(b)),
        }
    }

    /// Every value provably below every value of `other`.
    pub fn all_lt(&self, other: &Interval) -> bool {
        matches!((self.max, other.min), (Some(a), Some(b)) if a < b)
    }

    pub fn all_le(&self, other: &Interval) -> bool {
        matches!((self.max, other.min), (Some(a), Some(b)) if a <= b)
    }

    /// The two ranges share no value.
    pub fn disjoint(&self, other: &Interval) -> bool {
        self.all_lt(other) || other.all_lt(self)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.min {
            Some(v) => write!(f, "[{v}, ")?,
            None => write!(f, "(-inf, ")?,
        }
        match self.max {
            Some(v) => write!(f, "{v}]"),
            None => write!(f, "+inf)"),
        }
    }
}
