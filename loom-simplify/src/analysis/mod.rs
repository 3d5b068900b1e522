#![forbid(unsafe_code)]

//! Facts derived from the shape of an expression plus the caller's facts
//! about its free variables.

pub mod alignment;
pub mod bounds;

pub use alignment::modulus_remainder;
pub use bounds::bounds_of_expr;
