//! Template handles.
//!
//! A [`Template`] is a named reference into a shared namespace. Handles
//! obtained through [`Template::derive_named`], [`Template::lookup`] or
//! [`Template::templates`] point into the same namespace as the handle they
//! came from, so content parsed through one is visible to all of them.
//! [`Template::deep_clone`] is the only way to get an independent namespace.
//!
//! # Rendering
//!
//! The data passed to [`Template::execute`] is marshaled into the engine and
//! bound to the variable `dot`. When the data is an object, its entries are
//! also visible as top-level names:
//!
//! ```rust
//! use textbridge::Template;
//! use textbridge_host::{HostObject, HostValue};
//!
//! let template = Template::new("greeting");
//! template.parse("Hello, {{ name }} ({{ dot.name }})!").unwrap();
//!
//! let data = HostObject::new().with("name", "Ada");
//! assert_eq!(template.execute(&data.into()).unwrap(), "Hello, Ada (Ada)!");
//! ```
//!
//! # Functions
//!
//! Host functions are registered as a map and called from templates like
//! any engine function. Errors they throw come back unchanged:
//!
//! ```rust
//! use textbridge::Template;
//! use textbridge_host::{HostError, HostFunction, HostObject, HostValue};
//!
//! let fail = HostError::new("custom error");
//! let thrown = fail.clone();
//! let funcs = HostObject::new()
//!     .with("twice", HostFunction::new(|args| {
//!         let n = args[0].as_f64().unwrap_or(0.0);
//!         Ok(HostValue::from(n * 2.0))
//!     }))
//!     .with("fail", HostFunction::new(move |_| Err(thrown.clone())));
//!
//! let template = Template::new("calc");
//! template.funcs(&funcs.into()).unwrap();
//! template.parse("{{ twice(21) }}").unwrap();
//! assert_eq!(template.execute(&HostValue::Undefined).unwrap(), "42");
//!
//! template.parse("{{ fail() }}").unwrap();
//! let err = template.execute(&HostValue::Undefined).unwrap_err();
//! assert!(err.host_error().unwrap().ptr_eq(&fail));
//! ```
//!
//! # Concurrency
//!
//! Rendering holds no lock while the engine runs. A host function may render
//! any template, including one from the namespace being rendered.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use textbridge_host::{HostFunction, HostValue};
use tracing::debug;

use crate::config::{Delimiters, TemplateConfig};
use crate::engine::{self, value, TemplateSet};
use crate::error::{LoadError, Result};
use crate::functions::{self, FunctionBinding};
use crate::guard::guard;
use crate::library::Library;
use crate::loader;
use crate::marshal;

/// A handle to a named template in a shared namespace.
///
/// `Clone` copies the handle, not the namespace; use
/// [`deep_clone`](Template::deep_clone) for an independent copy.
#[derive(Clone)]
pub struct Template {
    name: String,
    set: Arc<Mutex<TemplateSet>>,
}

impl Template {
    /// Creates a handle named `name` in a fresh namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, TemplateConfig::default())
    }

    /// Creates a handle in a fresh namespace seeded with `config`.
    pub fn with_config(name: impl Into<String>, config: TemplateConfig) -> Self {
        let name = name.into();
        let mut set = TemplateSet::new(config);
        let delimiters = set.default_delimiters().clone();
        set.ensure_node(&name, delimiters);
        Template {
            name,
            set: Arc::new(Mutex::new(set)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, TemplateSet> {
        self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, name: &str) -> Template {
        Template {
            name: name.to_string(),
            set: Arc::clone(&self.set),
        }
    }

    /// Returns true if both handles share a namespace.
    pub fn same_namespace(&self, other: &Template) -> bool {
        Arc::ptr_eq(&self.set, &other.set)
    }

    /// Parses `text` as this template's content.
    ///
    /// `{% block %}` and `{% include %}` resolve against the namespace. On a
    /// syntax error the namespace is left as it was.
    pub fn parse(&self, text: &str) -> Result<&Self> {
        guard("parse", || self.lock().parse(&self.name, text))?;
        Ok(self)
    }

    /// Copies the namespace, function table included. Later changes to
    /// either copy are not seen by the other.
    pub fn deep_clone(&self) -> Template {
        let copy = self.lock().clone();
        debug!(template = %self.name, "namespace cloned");
        Template {
            name: self.name.clone(),
            set: Arc::new(Mutex::new(copy)),
        }
    }

    /// Returns the handle for `name` in this namespace, creating an empty
    /// node with this handle's delimiters if there is none.
    pub fn derive_named(&self, name: &str) -> Template {
        let mut set = self.lock();
        let delimiters = set.delimiters(&self.name);
        set.ensure_node(name, delimiters);
        drop(set);
        self.handle(name)
    }

    /// Returns the template named `name` if it has content.
    pub fn lookup(&self, name: &str) -> Option<Template> {
        self.lock().is_defined(name).then(|| self.handle(name))
    }

    /// All templates with content in this namespace, sorted by name.
    pub fn templates(&self) -> Vec<Template> {
        let names = self.lock().defined_names();
        names.iter().map(|name| self.handle(name)).collect()
    }

    /// The list of defined templates as an error-message suffix, for
    /// example `; defined templates are: "a", "b"`. Empty when there are none.
    pub fn defined_templates(&self) -> String {
        let names = self.lock().defined_names();
        if names.is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = names.iter().map(|name| format!("{:?}", name)).collect();
        format!("; defined templates are: {}", quoted.join(", "))
    }

    /// Sets the variable delimiters for content parsed into this template
    /// from now on. An empty side restores its default.
    pub fn delims(&self, left: &str, right: &str) -> &Self {
        self.lock().set_delimiters(&self.name, Delimiters::new(left, right));
        self
    }

    /// Applies option strings to the namespace, such as `missingkey=error`.
    ///
    /// Unknown options fail with `caught panic: unrecognized option: ...`
    /// and leave the configuration untouched.
    pub fn option<S: AsRef<str>>(&self, options: &[S]) -> Result<&Self> {
        guard("option", || self.lock().set_options(options))?;
        Ok(self)
    }

    /// Registers every function in a host object.
    ///
    /// Entries replace earlier ones of the same name, host or library.
    /// Undefined entries are skipped; any other non-function entry fails
    /// the whole call.
    pub fn funcs(&self, map: &HostValue) -> Result<&Self> {
        let bindings = functions::bindings_from_map(map)?;
        guard("funcs", || self.lock().register(bindings))?;
        Ok(self)
    }

    /// Registers a single host function.
    pub fn func(&self, name: &str, function: HostFunction) -> Result<&Self> {
        let bindings = vec![(name.to_string(), FunctionBinding::Host(function))];
        guard("funcs", || self.lock().register(bindings))?;
        Ok(self)
    }

    /// Merges a function library into the namespace.
    pub fn add_library(&self, library: &Library) -> Result<&Self> {
        let bindings = library.bindings();
        guard("library", || self.lock().register(bindings))?;
        Ok(self)
    }

    /// The binding registered under `name`, if any.
    pub fn function(&self, name: &str) -> Option<FunctionBinding> {
        self.lock().function(name).cloned()
    }

    /// Renders this template with `data`.
    pub fn execute(&self, data: &HostValue) -> Result<String> {
        self.execute_template(&self.name, data)
    }

    /// Renders the template `name` from this namespace with `data`.
    pub fn execute_template(&self, name: &str, data: &HostValue) -> Result<String> {
        let data = value::to_value(&marshal::to_engine(data)?)?;
        let env = self.lock().environment();
        guard("render", || engine::render(&env, name, data))
    }

    /// Parses each file into the template named after its base name. A file
    /// named like this handle becomes this handle's content.
    pub fn parse_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<&Self> {
        for (name, text) in loader::read_templates(paths)? {
            if name == self.name {
                self.parse(&text)?;
            } else {
                self.derive_named(&name).parse(&text)?;
            }
        }
        Ok(self)
    }

    /// Parses every file matching `pattern`, as [`parse_files`](Self::parse_files).
    pub fn parse_glob(&self, pattern: &str) -> Result<&Self> {
        let paths = loader::glob(pattern)?;
        self.parse_files(&paths)
    }

    /// Creates a namespace from files. The handle is named after the first
    /// file.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Template> {
        let first = paths.first().ok_or(LoadError::NoFiles)?;
        let template = Template::new(loader::template_name(first.as_ref()));
        template.parse_files(paths)?;
        Ok(template)
    }

    /// Creates a namespace from the files matching `pattern`.
    pub fn from_glob(pattern: &str) -> Result<Template> {
        let paths = loader::glob(pattern)?;
        Template::from_files(&paths)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}
