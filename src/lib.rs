//! # Named Constants
//!
//! Closed namespaces of typed constants that render as their declared name
//! while behaving as their underlying value everywhere else.
//!
//! ## Design
//!
//! ```text
//! declaration ──► NamespaceBuilder ──finish()──► Namespace
//!   RED = "r"        (name, value)                 members   name  → NamedValue
//!   GREEN = "g"      collected in order            reverse   value → NamedValue
//!                                                  ordered   (kind, value) sort
//! ```
//!
//! - [`NamedValue<T>`] compares, hashes and computes exactly like `T`; only
//!   `Debug` (qualified name) and optionally `Display` (declared name) change.
//! - [`wrapper_for`] hands out one cached [`WrapperKind`] per payload type.
//! - Each value holds a write-once `Weak` link to its [`Namespace`], bound
//!   after the namespace is frozen, so there is no ownership cycle.
//!
//! ## Declaring namespaces
//!
//! ```ignore
//! use named_constants::constants;
//!
//! constants! {
//!     pub mod Colors {
//!         RED = "r";
//!         GREEN = "g";
//!
//!         fn is_warm(c: &str) -> bool { c == *RED.value() }
//!     }
//! }
//!
//! assert_eq!(*Colors::RED, "r");
//! assert_eq!(format!("{:?}", *Colors::RED), "Colors.RED");
//! assert!(Colors::NAMESPACE.lookup("r").is_ok());
//! ```

pub mod error;
pub mod kind;
pub mod named;
pub mod namespace;
pub mod value;

pub use named_constants_macro::constants;

pub use error::{ConstantsError, MutationKind};
pub use kind::{wrapper_for, wrapper_kinds, WrapperKind};
pub use named::{Constant, NamedValue, Render};
pub use namespace::{Iter, Namespace, NamespaceBuilder};
pub use value::{RawValue, Underlying};
