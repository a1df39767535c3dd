pub mod expression;
mod pattern;
pub mod trace;
pub mod value;

pub use expression::*;
pub use pattern::compile_pattern;
pub use trace::*;
pub use value::*;
