//! Request handlers for properties and favorites.

mod favorites;
mod me;
mod properties;

pub use favorites::*;
pub use me::*;
pub use properties::*;
