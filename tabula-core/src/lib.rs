//! Tabula Core - Entity Types and View Model
//!
//! Data structures shared by every other crate: strongly-typed identifiers,
//! entities, the error hierarchy, and the view configuration model with its
//! pure evaluation rules. No I/O lives here.

mod entities;
mod enums;
mod error;
mod identity;
mod query;
mod view;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
pub use query::*;
pub use view::*;
