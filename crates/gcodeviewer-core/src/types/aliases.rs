//! Type aliases for commonly used complex types.
//!
//! The renderer is single-threaded and event driven, so every shared handle
//! here is `Rc<RefCell<T>>` and no callback is required to be `Send`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gcodeviewer_core::types::*;
//!
//! let hits: Shared<u32> = shared(0);
//! let counter = hits.clone();
//! let hook: Hook<f64> = Box::new(move |_| *counter.borrow_mut() += 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// SINGLE-THREADED SHARED TYPES (Rc<RefCell<T>>)
// =============================================================================

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
///
/// Typically used by the owner of a renderer to observe values reported
/// through hooks (e.g. a checkbox model bound to an option).
pub type Shared<T> = Rc<RefCell<T>>;

/// A shared vector for single-threaded collection management.
pub type SharedVec<T> = Rc<RefCell<Vec<T>>>;

// =============================================================================
// HOOK TYPES
// =============================================================================

/// A notification hook receiving a single value.
///
/// Invoked synchronously from the renderer; never dispatched asynchronously.
pub type Hook<T> = Box<dyn FnMut(T)>;

/// A cancellable hook. Returning `false` vetoes the operation in progress.
pub type VetoHook<T> = Box<dyn FnMut(T) -> bool>;

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Create a new `Shared<T>` from a value.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Create a new empty `SharedVec<T>`.
#[inline]
pub fn shared_vec<T>() -> SharedVec<T> {
    Rc::new(RefCell::new(Vec::new()))
}
