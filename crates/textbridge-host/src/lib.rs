//! # textbridge-host - Dynamic Host Runtime Values
//!
//! This crate models the values of a dynamically-typed host runtime, the side
//! of a bridge that calls into a template engine. It is deliberately small:
//! values, callables and thrown errors, with the failure modes a real dynamic
//! runtime exhibits.
//!
//! ## Core Types
//!
//! - [`HostValue`]: undefined, null, booleans, doubles, bigints, strings,
//!   symbols, arrays, objects, functions and opaque native wrappers
//! - [`HostObject`] / [`HostArray`]: containers whose slots may be accessors
//!   that throw when read
//! - [`HostFunction`]: a synchronous variadic callable
//! - [`HostError`]: a thrown error with reference identity
//!
//! ## Example
//!
//! ```rust
//! use textbridge_host::{HostError, HostObject, HostValue};
//!
//! let user = HostObject::new()
//!     .with("name", "Ada")
//!     .with_getter("secret", || Err(HostError::new("access denied")));
//!
//! assert_eq!(user.get("name").unwrap(), HostValue::from("Ada"));
//! assert_eq!(user.get("secret").unwrap_err().message(), "access denied");
//! ```

mod error;
mod function;
mod object;
mod value;

pub use error::{ErrorClass, HostError};
pub use function::HostFunction;
pub use object::{Getter, HostArray, HostObject, Property};
pub use value::{External, HostValue, Symbol, MAX_SAFE_INTEGER};
