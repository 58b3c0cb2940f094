pub mod error;
pub mod location;
pub mod types;

pub use error::BindError;
pub use location::Location;
pub use types::*;
