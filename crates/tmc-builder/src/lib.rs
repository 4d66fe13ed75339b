pub mod builder;
pub mod lowering;

pub use builder::*;
pub use lowering::*;
