pub mod cache;
pub mod command;
pub mod expand;
pub mod policy;

pub use cache::*;
pub use command::*;
pub use expand::*;
pub use policy::*;
