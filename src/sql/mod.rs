//! SQL text rewriting.
//!
//! sqlx binds positional arguments in each backend's native syntax and has no
//! facility for driver-agnostic `?` placeholders or `:name` parameters. This
//! module supplies both as pure text transforms:
//! - [`rebind`]: `?` to the dialect's bind syntax
//! - [`compile_named`]: `:name` placeholders to positional ones plus the
//!   ordered list of names to bind

mod named;
mod rebind;
mod scanner;

pub use named::{CompiledNamed, bind_named, compile_named};
pub use rebind::rebind;
