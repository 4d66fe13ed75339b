pub mod error;
pub mod key;
pub mod naming;
pub mod run;
pub mod step;

pub use error::*;
pub use key::*;
pub use naming::*;
pub use run::*;
pub use step::*;
