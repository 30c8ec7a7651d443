pub mod convert;
pub mod error;
pub mod scalar;

pub use convert::{FromScalar, ScalarExt};
pub use error::ProtoError;
pub use scalar::Scalar;
