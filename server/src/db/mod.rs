//! Database module for PostgreSQL persistence.

mod favorites;
mod pool;
mod properties;
mod users;

pub use favorites::*;
pub use pool::*;
pub use properties::*;
pub use users::*;
