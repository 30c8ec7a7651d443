//! Typed extraction of table cells.
//!
//! Result tables hold loosely typed [`Scalar`] cells; `FromScalar` lets callers
//! pull them out as concrete Rust types.

use crate::types::Scalar;

/// Trait for converting a [`Scalar`] cell to a concrete type.
pub trait FromScalar: Sized {
    /// Returns `None` when the cell holds an incompatible kind.
    fn from_scalar(scalar: &Scalar) -> Option<Self>;
}

impl FromScalar for String {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Text(s) => Some(s.clone()),
            Scalar::Nil => None,
            other => Some(other.to_string()),
        }
    }
}

impl FromScalar for i64 {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int(x) => Some(*x),
            Scalar::Float(x) if x.fract() == 0.0 && x.is_finite() => Some(*x as i64),
            _ => None,
        }
    }
}

impl FromScalar for i32 {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        i64::from_scalar(scalar).and_then(|x| i32::try_from(x).ok())
    }
}

impl FromScalar for f64 {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int(x) => Some(*x as f64),
            Scalar::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl FromScalar for bool {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl<T: FromScalar> FromScalar for Option<T> {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Nil => Some(None),
            other => T::from_scalar(other).map(Some),
        }
    }
}

/// Extension trait for [`Scalar`] with convenient accessors.
pub trait ScalarExt {
    fn get_as<T: FromScalar>(&self) -> Option<T>;

    fn as_str(&self) -> Option<&str>;

    fn as_i64(&self) -> Option<i64>;

    fn as_f64(&self) -> Option<f64>;
}

impl ScalarExt for Scalar {
    fn get_as<T: FromScalar>(&self) -> Option<T> {
        T::from_scalar(self)
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        i64::from_scalar(self)
    }

    fn as_f64(&self) -> Option<f64> {
        f64::from_scalar(self)
    }
}
