#![forbid(unsafe_code)]

pub mod ir;
pub mod ty;

pub mod compare;
pub mod fmt;
pub mod fold;
pub mod interval;
pub mod modulus;
pub mod oracle;
pub mod scope;
pub mod validate;
pub mod visit;

pub use compare::*;
pub use fmt::*;
pub use fold::*;
pub use interval::*;
pub use ir::*;
pub use modulus::*;
pub use scope::*;
pub use ty::*;
pub use validate::*;
