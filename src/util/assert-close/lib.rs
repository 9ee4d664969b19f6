/* ************************************************************************ **
** This file is part of hgauss, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of hgauss is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! `assert_close!`, for comparing floats (and vectors of them) in tests.
//!
//! ```
//! # #[macro_use] extern crate hgauss_assert_close;
//! # fn main() {
//! assert_close!(0.1 + 0.2, 0.3);
//! assert_close!(abs=1e-12, vec![1.0, 2.0], vec![1.0, 2.0 + 1e-13]);
//! assert_close!(rel=1e-3, abs=0.0, 1000.0, 1000.5, "with a {}", "message");
//! # }
//! ```

#[macro_use]
extern crate failure;

use ::std::fmt;

/// Relative tolerance used when none is given.
pub const DEFAULT_REL_TOL: f64 = 1e-9;

/// Panic unless two values are elementwise close.
///
/// Tolerances are given as leading `abs=EXPR,` and/or `rel=EXPR,`; a pair of values is close
/// if their difference is within either one.  By default `abs` is zero and `rel` is
/// [`DEFAULT_REL_TOL`].  Anything after the two values is a format string and arguments.
#[macro_export]
macro_rules! assert_close {
    ($($t:tt)*) => {
        $crate::__assert_close_impl!{@opts [$($t)*] [0.0] [$crate::DEFAULT_REL_TOL]}
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __assert_close_impl {
    (@opts [abs=$tol:expr, $($rest:tt)*] [$abs:expr] [$rel:expr]) => {
        $crate::__assert_close_impl!{@opts [$($rest)*] [$tol] [$rel]}
    };
    (@opts [rel=$tol:expr, $($rest:tt)*] [$abs:expr] [$rel:expr]) => {
        $crate::__assert_close_impl!{@opts [$($rest)*] [$abs] [$tol]}
    };
    (@opts [$a:expr, $b:expr $(,)*] [$abs:expr] [$rel:expr]) => {
        $crate::__assert_close_impl!{@go [$a, $b] [$abs] [$rel] ["values are not close"]}
    };
    (@opts [$a:expr, $b:expr, $($fmt:tt)+] [$abs:expr] [$rel:expr]) => {
        $crate::__assert_close_impl!{@go [$a, $b] [$abs] [$rel] [$($fmt)+]}
    };
    (@go [$a:expr, $b:expr] [$abs:expr] [$rel:expr] [$($fmt:tt)+]) => {{
        let tol = $crate::Tolerances { abs: $abs, rel: $rel };
        match (&$a, &$b) {
            (a, b) => {
                if let Err(e) = $crate::CheckClose::check_close(a, b, tol) {
                    panic!(
                        "{}\n left: {:?}\nright: {:?}\n{}",
                        format!($($fmt)+), a, b, e,
                    );
                }
            },
        }
    }};
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Tolerances {
    /// # Panics
    ///
    /// Panics on a negative or NaN tolerance.
    pub fn is_close(self, a: f64, b: f64) -> bool {
        let Tolerances { abs, rel } = self;
        assert!(abs >= 0.0 && rel >= 0.0, "bad tolerances: {:?}", self);

        // equal infinities
        if a == b { return true; }
        if a.is_infinite() || b.is_infinite() { return false; }

        // (false for NaN)
        (a - b).abs() <= abs.max(rel * a.abs().max(b.abs()))
    }
}

/// Why two values were judged not to be close.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum NotClose {
    #[fail(display = "lengths differ: {} vs {}", _0, _1)]
    Length(usize, usize),
    #[fail(display = "{}", _0)]
    Element(Mismatch),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Position within a sequence, if the values came from one.
    pub index: Option<usize>,
    pub values: (f64, f64),
    pub tol: Tolerances,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (a, b) = self.values;
        if let Some(index) = self.index {
            write!(f, "at index {}: ", index)?;
        }
        write!(f, "{:?} vs {:?} (difference {:e}, abs={:e}, rel={:e})",
            a, b, (a - b).abs(), self.tol.abs, self.tol.rel)
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    /// Test that all values of `self` and `other` are close, reporting the first that isn't.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), NotClose>;
}

impl CheckClose for f64 {
    fn check_close(&self, other: &f64, tol: Tolerances) -> Result<(), NotClose> {
        match tol.is_close(*self, *other) {
            true => Ok(()),
            false => Err(NotClose::Element(Mismatch { index: None, values: (*self, *other), tol })),
        }
    }
}

impl CheckClose for [f64] {
    fn check_close(&self, other: &[f64], tol: Tolerances) -> Result<(), NotClose> {
        if self.len() != other.len() {
            return Err(NotClose::Length(self.len(), other.len()));
        }
        for (index, (&a, &b)) in self.iter().zip(other).enumerate() {
            if !tol.is_close(a, b) {
                return Err(NotClose::Element(Mismatch { index: Some(index), values: (a, b), tol }));
            }
        }
        Ok(())
    }
}

impl CheckClose for Vec<f64> {
    fn check_close(&self, other: &Vec<f64>, tol: Tolerances) -> Result<(), NotClose>
    { self[..].check_close(&other[..], tol) }
}

impl CheckClose<[f64]> for Vec<f64> {
    fn check_close(&self, other: &[f64], tol: Tolerances) -> Result<(), NotClose>
    { self[..].check_close(other, tol) }
}

impl<'a, 'b, A, B> CheckClose<&'b B> for &'a A
where
    A: ?Sized + CheckClose<B>,
    B: ?Sized,
{
    fn check_close(&self, other: &&'b B, tol: Tolerances) -> Result<(), NotClose>
    { (**self).check_close(*other, tol) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Tolerances = Tolerances { abs: 1e-10, rel: 0.0 };

    #[test]
    fn scalars() {
        assert!(TOL.is_close(1.0, 1.0 + 1e-11));
        assert!(!TOL.is_close(1.0, 1.0 + 1e-9));
        assert!(TOL.is_close(::std::f64::INFINITY, ::std::f64::INFINITY));
        assert!(!TOL.is_close(::std::f64::INFINITY, -::std::f64::INFINITY));
        assert!(!TOL.is_close(::std::f64::NAN, ::std::f64::NAN));

        let rel = Tolerances { abs: 0.0, rel: 1e-3 };
        assert!(rel.is_close(1000.0, 1000.5));
        assert!(!rel.is_close(1.0, 1.5));
    }

    #[test]
    fn sequences() {
        assert_eq!(vec![1.0, 2.0].check_close(&vec![1.0, 2.0], TOL), Ok(()));
        assert_eq!(
            vec![1.0, 2.0].check_close(&vec![1.0], TOL),
            Err(NotClose::Length(2, 1)),
        );
        match vec![1.0, 2.0, 3.0].check_close(&vec![1.0, 2.5, 4.0], TOL) {
            Err(NotClose::Element(Mismatch { index, values, .. })) => {
                assert_eq!(index, Some(1));
                assert_eq!(values, (2.0, 2.5));
            },
            r => panic!("unexpected: {:?}", r),
        }
    }

    #[test]
    fn macro_forms() {
        assert_close!(1.0, 1.0);
        assert_close!(abs=1e-3, 1.0, 1.0005);
        assert_close!(rel=1e-3, 1000.0, 1000.5,);
        assert_close!(abs=0.1, rel=0.0, vec![1.0, 2.0], vec![1.05, 1.95], "case {}", 3);
        let x = vec![0.5];
        assert_close!(abs=0.0, &x, &x);
    }

    #[test]
    #[should_panic(expected = "values are not close")]
    fn macro_panics() {
        assert_close!(abs=1e-12, 1.0, 1.1);
    }
}
