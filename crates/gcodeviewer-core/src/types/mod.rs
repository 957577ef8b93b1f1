//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Rc<RefCell<T>>` and hook callbacks.

pub mod aliases;

pub use aliases::*;
