//! Exact complex arithmetic over ℚ[√2].
//!
//! Edge weights are complex numbers whose real and imaginary parts each
//! have the form `a + b·√2` with `a`, `b` exact rationals. Every amplitude
//! produced by the supported gate set (Toffoli, Fredkin, Pauli-Y/Z, √NOT,
//! Hadamard, T) is an integer combination of `1`, `i`, `1/√2` and `i/√2`,
//! so the domain is closed under the engine's four operations.
//!
//! Exactness is what keeps the diagram canonical: with floating point, two
//! weights that should collapse into one interned value drift apart and
//! blow up the diagram.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_rational::Rational64;
use num_traits::{One, Zero};

const R0: Rational64 = Rational64::new_raw(0, 1);
const R1: Rational64 = Rational64::new_raw(1, 1);

/// A real number of the form `a + b·√2` with exact rational coefficients.
///
/// `Rational64` keeps both coefficients reduced (lowest terms, positive
/// denominator) after every operation, so equality is structural.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Sqrt2 {
    a: Rational64,
    b: Rational64,
}

impl Sqrt2 {
    pub const ZERO: Self = Sqrt2 { a: R0, b: R0 };
    pub const ONE: Self = Sqrt2 { a: R1, b: R0 };

    pub fn new(a: Rational64, b: Rational64) -> Self {
        Sqrt2 { a, b }
    }

    /// The rational `n/d`.
    ///
    /// # Panics
    ///
    /// Panics if `d == 0`.
    pub fn rational(n: i64, d: i64) -> Self {
        Sqrt2 {
            a: Rational64::new(n, d),
            b: R0,
        }
    }

    /// The number `(n/d)·√2`.
    pub fn sqrt2(n: i64, d: i64) -> Self {
        Sqrt2 {
            a: R0,
            b: Rational64::new(n, d),
        }
    }

    /// Rational part (coefficient of 1).
    pub fn rational_part(self) -> Rational64 {
        self.a
    }

    /// Radical part (coefficient of √2).
    pub fn radical_part(self) -> Rational64 {
        self.b
    }
}

impl Zero for Sqrt2 {
    fn zero() -> Self {
        Self::ZERO
    }

    fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }
}

impl One for Sqrt2 {
    fn one() -> Self {
        Self::ONE
    }
}

impl Neg for Sqrt2 {
    type Output = Self;

    fn neg(self) -> Self {
        Sqrt2 {
            a: -self.a,
            b: -self.b,
        }
    }
}

impl Add for Sqrt2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Sqrt2 {
            a: self.a + rhs.a,
            b: self.b + rhs.b,
        }
    }
}

impl Sub for Sqrt2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Sqrt2 {
            a: self.a - rhs.a,
            b: self.b - rhs.b,
        }
    }
}

impl Mul for Sqrt2 {
    type Output = Self;

    /// `(a + b√2)(c + d√2) = (ac + 2bd) + (ad + bc)√2`
    fn mul(self, rhs: Self) -> Self {
        Sqrt2 {
            a: self.a * rhs.a + self.b * rhs.b * 2,
            b: self.a * rhs.b + self.b * rhs.a,
        }
    }
}

impl Div for Sqrt2 {
    type Output = Self;

    /// `(a + b√2)/(c + d√2) = ((ac − 2bd) + (bc − ad)√2) / (c² − 2d²)`
    ///
    /// The denominator `c² − 2d²` vanishes only for `c = d = 0` (√2 is
    /// irrational), so dividing by any non-zero value is exact.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is zero.
    fn div(self, rhs: Self) -> Self {
        assert!(!rhs.is_zero(), "division by zero in Q[sqrt 2]");
        let den = rhs.a * rhs.a - rhs.b * rhs.b * 2;
        Sqrt2 {
            a: (self.a * rhs.a - self.b * rhs.b * 2) / den,
            b: (self.b * rhs.a - self.a * rhs.b) / den,
        }
    }
}

impl fmt::Display for Sqrt2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.b.is_zero() {
            write!(f, "{}", self.a)
        } else if self.a.is_zero() {
            write!(f, "({})√2", self.b)
        } else {
            write!(f, "{}+({})√2", self.a, self.b)
        }
    }
}

/// An edge weight: a complex number with both parts in ℚ[√2].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Weight {
    pub re: Sqrt2,
    pub im: Sqrt2,
}

impl Weight {
    pub const ZERO: Self = Weight {
        re: Sqrt2::ZERO,
        im: Sqrt2::ZERO,
    };
    pub const ONE: Self = Weight {
        re: Sqrt2::ONE,
        im: Sqrt2::ZERO,
    };
    pub const I: Self = Weight {
        re: Sqrt2::ZERO,
        im: Sqrt2::ONE,
    };

    pub fn new(re: Sqrt2, im: Sqrt2) -> Self {
        Weight { re, im }
    }

    /// The real rational `n/d`.
    pub fn rational(n: i64, d: i64) -> Self {
        Weight {
            re: Sqrt2::rational(n, d),
            im: Sqrt2::ZERO,
        }
    }

    /// The imaginary rational `(n/d)·i`.
    pub fn imaginary(n: i64, d: i64) -> Self {
        Weight {
            re: Sqrt2::ZERO,
            im: Sqrt2::rational(n, d),
        }
    }

    /// `1/√2`, i.e. `(1/2)·√2`.
    pub fn one_over_sqrt2() -> Self {
        Weight {
            re: Sqrt2::sqrt2(1, 2),
            im: Sqrt2::ZERO,
        }
    }

    /// `i/√2`.
    pub fn i_over_sqrt2() -> Self {
        Weight {
            re: Sqrt2::ZERO,
            im: Sqrt2::sqrt2(1, 2),
        }
    }

    /// Complex conjugate.
    pub fn conj(self) -> Self {
        Weight {
            re: self.re,
            im: -self.im,
        }
    }
}

impl Zero for Weight {
    fn zero() -> Self {
        Self::ZERO
    }

    fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }
}

impl One for Weight {
    fn one() -> Self {
        Self::ONE
    }
}

impl Neg for Weight {
    type Output = Self;

    fn neg(self) -> Self {
        Weight {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl Add for Weight {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Weight {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl Sub for Weight {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Weight {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl Mul for Weight {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Weight {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl Div for Weight {
    type Output = Self;

    /// `(a + bi)/(c + di) = ((ac + bd) + (bc − ad)i) / (c² + d²)`
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is zero.
    fn div(self, rhs: Self) -> Self {
        assert!(!rhs.is_zero(), "division by zero weight");
        let den = rhs.re * rhs.re + rhs.im * rhs.im;
        Weight {
            re: (self.re * rhs.re + self.im * rhs.im) / den,
            im: (self.im * rhs.re - self.re * rhs.im) / den,
        }
    }
}

impl fmt::Display for Weight {
    /// Deterministic rendering: equal weights always produce equal strings.
    ///
    /// Examples: `0`, `1/2`, `i`, `-i`, `1/2+(1/2)i`, `(1)√2`, `1+(1)√2i`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_zero() {
            return write!(f, "{}", self.re);
        }
        if !self.re.is_zero() {
            write!(f, "{}", self.re)?;
            if self.im == Sqrt2::ONE {
                return write!(f, "+i");
            }
            if self.im == -Sqrt2::ONE {
                return write!(f, "-i");
            }
            write!(f, "+")?;
        } else {
            if self.im == Sqrt2::ONE {
                return write!(f, "i");
            }
            if self.im == -Sqrt2::ONE {
                return write!(f, "-i");
            }
        }
        if self.im.radical_part().is_zero() {
            write!(f, "({})i", self.im.rational_part())
        } else {
            write!(f, "{}i", self.im)
        }
    }
}
