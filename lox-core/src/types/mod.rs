// lox-core/src/types/mod.rs

pub mod callable;
pub mod config;
pub mod value;

pub use callable::{Callable, LoxFunction};
pub use config::InterpreterConfig;
pub use value::Value;
