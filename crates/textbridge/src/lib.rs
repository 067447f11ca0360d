//! # textbridge - Host Values and Callbacks for minijinja Templates
//!
//! `textbridge` connects a dynamically-typed host runtime (modeled by
//! [`textbridge_host`]) to the minijinja template engine. Host data crosses
//! into templates, host functions are callable from templates, and errors
//! come back to the host with their identity intact.
//!
//! ## Core Concepts
//!
//! - [`Template`]: a handle to a named template in a shared namespace
//! - [`MarshaledValue`]: the tagged intermediate form every value passes
//!   through on its way across the boundary
//! - [`FunctionBinding`]: an entry of a namespace's function table, either a
//!   host callable or an engine-native function
//! - [`Library`]: bundled engine-native functions
//! - [`Error`]: one error type for every operation, with host errors, engine
//!   errors and caught panics kept apart
//!
//! ## Quick Start
//!
//! ```rust
//! use textbridge::Template;
//! use textbridge_host::{HostFunction, HostObject, HostValue};
//!
//! let template = Template::new("report");
//! template
//!     .func("shout", HostFunction::new(|args| {
//!         let text = args.first().and_then(HostValue::as_str).unwrap_or_default();
//!         Ok(HostValue::from(text.to_uppercase()))
//!     }))
//!     .unwrap()
//!     .parse("{{ shout(title) }}: {{ total }} items")
//!     .unwrap();
//!
//! let data = HostObject::new().with("title", "done").with("total", 3);
//! assert_eq!(template.execute(&data.into()).unwrap(), "DONE: 3 items");
//! ```
//!
//! ## Numbers
//!
//! Host numbers are doubles. Integral values within ±(2^53 − 1) enter the
//! engine as integers; everything else enters as a float. Host bigints keep
//! their full width in both directions, so `(1 << 128) + 2` renders as
//! `340282366920938463463374607431768211458`.
//!
//! ## Errors
//!
//! | Variant | Raised for |
//! |---------|-----------|
//! | [`Error::Argument`] | wrong host type for a text argument |
//! | [`Error::Conversion`] | values with no mapping, bad function maps |
//! | [`Error::Engine`] | syntax errors, unknown templates or functions, strict lookups |
//! | [`Error::Host`] | errors thrown by host functions or getters |
//! | [`Error::Panic`] | engine faults, shown as `caught panic: <message>` |
//! | [`Error::Load`] | template files that cannot be read or matched |
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.

pub mod binding;
pub mod codec;
mod config;
mod engine;
mod error;
pub mod escape;
mod functions;
mod guard;
mod library;
pub mod loader;
pub mod marshal;
mod template;

pub use config::{ConfigError, Delimiters, MissingKey, TemplateConfig};
pub use engine::WideInt;
pub use error::{ConversionError, EngineError, Error, LoadError, Result};
pub use functions::{invoke, FunctionBinding};
pub use library::Library;
pub use marshal::{MapKey, MarshaledValue};
pub use template::Template;
