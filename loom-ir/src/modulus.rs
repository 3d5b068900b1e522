#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value `v` with `v ≡ remainder (mod modulus)`.
///
/// `modulus == 1` carries no information; `modulus == 0` pins the value to
/// exactly `remainder`. The remainder is kept in `[0, modulus)` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModulusRemainder {
    pub modulus: i64,
    pub remainder: i64,
}

impl Default for ModulusRemainder {
    fn default() -> Self {
        Self::unknown()
    }
}

pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    i64::try_from(a).unwrap_or(1)
}

impl ModulusRemainder {
    pub fn new(modulus: i64, remainder: i64) -> Self {
        let modulus = modulus.checked_abs().unwrap_or(1);
        if modulus == 0 {
            Self { modulus, remainder }
        } else {
            Self { modulus, remainder: remainder.rem_euclid(modulus) }
        }
    }

    pub fn unknown() -> Self {
        Self { modulus: 1, remainder: 0 }
    }

    pub fn exact(value: i64) -> Self {
        Self { modulus: 0, remainder: value }
    }

    pub fn is_unknown(&self) -> bool {
        self.modulus == 1
    }

    pub fn as_exact(&self) -> Option<i64> {
        (self.modulus == 0).then_some(self.remainder)
    }

    /// Value modulo `m`, if this fact determines it.
    pub fn remainder_mod(&self, m: i64) -> Option<i64> {
        if m <= 0 {
            return None;
        }
        if self.modulus == 0 || self.modulus % m == 0 {
            Some(self.remainder.rem_euclid(m))
        } else {
            None
        }
    }

    /// Every value with this fact is a multiple of `m`.
    pub fn divisible_by(&self, m: i64) -> bool {
        self.remainder_mod(m) == Some(0)
    }

    /// Weakest fact implied by both.
    pub fn unify(&self, other: &Self) -> Self {
        let diff = self.remainder.checked_sub(other.remainder);
        let Some(diff) = diff else {
            return Self::unknown();
        };
        let m = gcd(gcd(self.modulus, other.modulus), diff);
        if m == 0 {
            // Both exact and equal.
            return *self;
        }
        Self::new(m, self.remainder)
    }

    pub fn add(&self, other: &Self) -> Self {
        let Some(r) = self.remainder.checked_add(other.remainder) else {
            return Self::unknown();
        };
        let m = gcd(self.modulus, other.modulus);
        if m == 0 { Self::exact(r) } else { Self::new(m, r) }
    }

    pub fn neg(&self) -> Self {
        match self.remainder.checked_neg() {
            Some(r) if self.modulus == 0 => Self::exact(r),
            Some(r) => Self::new(self.modulus, r),
            None => Self::unknown(),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// `(m1 k1 + r1)(m2 k2 + r2) = m1 m2 k1 k2 + m1 r2 k1 + m2 r1 k2 + r1 r2`
    pub fn mul(&self, other: &Self) -> Self {
        let (m1, r1, m2, r2) = (self.modulus, self.remainder, other.modulus, other.remainder);
        let parts = (m1.checked_mul(m2), m1.checked_mul(r2), m2.checked_mul(r1), r1.checked_mul(r2));
        let (Some(mm), Some(mr), Some(rm), Some(r)) = parts else {
            return Self::unknown();
        };
        let m = gcd(gcd(mm, mr), rm);
        if m == 0 { Self::exact(r) } else { Self::new(m, r) }
    }

    /// Fact for the Euclidean remainder of this value by a positive `c`.
    pub fn mod_by(&self, c: i64) -> Self {
        if c <= 0 {
            return Self::unknown();
        }
        if self.modulus == 0 {
            return Self::exact(self.remainder.rem_euclid(c));
        }
        let m = gcd(self.modulus, c);
        Self::new(m, self.remainder)
    }

    /// Keeps only what survives wrap-around modulo `2^bits`: the
    /// power-of-two part of the modulus. Exact values are left alone, the
    /// caller having already wrapped them.
    pub fn wrap_to(&self, bits: u8) -> Self {
        if self.modulus <= 1 {
            return *self;
        }
        let tz = self.modulus.trailing_zeros().min(u32::from(bits)).min(62);
        Self::new(1i64 << tz, self.remainder)
    }
}

impl fmt::Display for ModulusRemainder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modulus == 0 {
            write!(f, "= {}", self.remainder)
        } else {
            write!(f, "≡ {} (mod {})", self.remainder, self.modulus)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_remainder() {
        assert_eq!(ModulusRemainder::new(4, -1), ModulusRemainder { modulus: 4, remainder: 3 });
        assert_eq!(ModulusRemainder::new(-4, 6), ModulusRemainder { modulus: 4, remainder: 2 });
        assert!(ModulusRemainder::new(1, 17).is_unknown());
    }

    #[test]
    fn arithmetic() {
        let x = ModulusRemainder::new(4, 2);
        let y = ModulusRemainder::new(6, 1);
        assert_eq!(x.add(&y), ModulusRemainder::new(2, 1));
        assert_eq!(x.add(&ModulusRemainder::exact(3)), ModulusRemainder::new(4, 1));
        assert_eq!(x.mul(&ModulusRemainder::exact(3)), ModulusRemainder::new(12, 6));
        assert_eq!(x.sub(&x), ModulusRemainder::new(4, 0));
        assert_eq!(ModulusRemainder::exact(5).mul(&ModulusRemainder::exact(7)), ModulusRemainder::exact(35));
    }

    #[test]
    fn remainder_queries() {
        let x = ModulusRemainder::new(4, 2);
        assert_eq!(x.remainder_mod(2), Some(0));
        assert_eq!(x.remainder_mod(4), Some(2));
        assert_eq!(x.remainder_mod(8), None);
        assert_eq!(ModulusRemainder::exact(-3).remainder_mod(4), Some(1));
        assert!(x.divisible_by(2));
        assert!(!x.divisible_by(4));
    }

    #[test]
    fn unify_and_mod() {
        let a = ModulusRemainder::exact(3);
        let b = ModulusRemainder::exact(7);
        assert_eq!(a.unify(&b), ModulusRemainder::new(4, 3));
        assert_eq!(a.unify(&a), a);
        assert_eq!(ModulusRemainder::new(12, 5).mod_by(8), ModulusRemainder::new(4, 1));
    }

    #[test]
    fn wrap_keeps_power_of_two_part() {
        assert_eq!(ModulusRemainder::new(24, 12).wrap_to(8), ModulusRemainder::new(8, 4));
        assert_eq!(ModulusRemainder::new(3, 1).wrap_to(32), ModulusRemainder::unknown());
        assert_eq!(ModulusRemainder::exact(9).wrap_to(8), ModulusRemainder::exact(9));
    }
}
