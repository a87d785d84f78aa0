//! WASM bindings for the Poincaré section core.
//!
//! Results are handed to JavaScript by value (serialized objects or typed
//! arrays), so no explicit release call is needed on this boundary.

mod section;

pub use section::{compute_poincare_section, WasmPoincareSection};
