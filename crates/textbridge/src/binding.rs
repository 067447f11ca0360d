//! Dynamically-typed binding surface.
//!
//! A host runtime sees a [`Template`] as an opaque native object
//! ([`HostValue::External`]) and calls its methods by name with untyped
//! arguments. This module validates those arguments and dispatches to the
//! typed API.
//!
//! | Method | Arguments | Returns |
//! |--------|-----------|---------|
//! | `name` | | the handle's name |
//! | `clone` | | an independent copy |
//! | `new` | `name` | a handle in the same namespace |
//! | `lookup` | `name` | a handle, or `undefined` |
//! | `templates` | | array of handles |
//! | `definedTemplates` | | listing text |
//! | `delims` | `left, right` | `this` |
//! | `option` | `...options` | `this` |
//! | `parse` | `text` | `this` |
//! | `funcs` | `map` | `this` |
//! | `executeString` | `data` | rendered text |
//! | `executeTemplateString` | `name, data` | rendered text |
//! | `parseFiles` | `...paths` | `this` |
//! | `parseGlob` | `pattern` | `this` |
//! | `addStandardFuncs` / `addHermeticFuncs` | | `this` |
//!
//! `parseFiles` and `parseGlob` are also available through
//! [`invoke_static`], where they create a new handle.

use once_cell::sync::Lazy;
use textbridge_host::{External, HostValue};
use tracing::debug;

use crate::error::{Error, Result};
use crate::escape;
use crate::library::Library;
use crate::template::Template;

static STANDARD: Lazy<Library> = Lazy::new(Library::standard);
static HERMETIC: Lazy<Library> = Lazy::new(Library::hermetic);

/// Wraps a handle for the host.
pub fn wrap(template: Template) -> HostValue {
    HostValue::External(External::new(template))
}

/// The handle wrapped by `value`, if it is one.
pub fn as_template(value: &HostValue) -> Option<&Template> {
    value.as_external()?.downcast_ref::<Template>()
}

/// Constructs a handle from `(name)`.
pub fn construct(args: &[HostValue]) -> Result<HostValue> {
    let name = string_arg(args, 0)?;
    debug!(template = name, "constructed");
    Ok(wrap(Template::new(name)))
}

/// Calls `method` on the handle wrapped by `this`.
pub fn invoke(this: &HostValue, method: &str, args: &[HostValue]) -> Result<HostValue> {
    let template =
        as_template(this).ok_or_else(|| Error::Argument("missing or invalid type tag".to_string()))?;
    match method {
        "name" => Ok(HostValue::from(template.name())),
        "clone" => Ok(wrap(template.deep_clone())),
        "new" => Ok(wrap(template.derive_named(string_arg(args, 0)?))),
        "lookup" => Ok(template
            .lookup(string_arg(args, 0)?)
            .map(wrap)
            .unwrap_or(HostValue::Undefined)),
        "templates" => Ok(HostValue::from(
            template
                .templates()
                .into_iter()
                .map(wrap)
                .collect::<Vec<_>>(),
        )),
        "definedTemplates" => Ok(HostValue::from(template.defined_templates())),
        "delims" => {
            template.delims(string_arg(args, 0)?, string_arg(args, 1)?);
            Ok(this.clone())
        }
        "option" => {
            template.option(&string_args(args)?)?;
            Ok(this.clone())
        }
        "parse" => {
            template.parse(string_arg(args, 0)?)?;
            Ok(this.clone())
        }
        "funcs" => {
            template.funcs(args.first().unwrap_or(&HostValue::Undefined))?;
            Ok(this.clone())
        }
        "executeString" => {
            let data = args.first().unwrap_or(&HostValue::Undefined);
            Ok(HostValue::from(template.execute(data)?))
        }
        "executeTemplateString" => {
            let name = string_arg(args, 0)?;
            let data = args.get(1).unwrap_or(&HostValue::Undefined);
            Ok(HostValue::from(template.execute_template(name, data)?))
        }
        "parseFiles" => {
            template.parse_files(&string_args(args)?)?;
            Ok(this.clone())
        }
        "parseGlob" => {
            template.parse_glob(string_arg(args, 0)?)?;
            Ok(this.clone())
        }
        "addStandardFuncs" => {
            template.add_library(&STANDARD)?;
            Ok(this.clone())
        }
        "addHermeticFuncs" => {
            template.add_library(&HERMETIC)?;
            Ok(this.clone())
        }
        other => Err(not_a_function(other)),
    }
}

/// Calls a static loading method: `parseFiles(...paths)` or
/// `parseGlob(pattern)`.
pub fn invoke_static(method: &str, args: &[HostValue]) -> Result<HostValue> {
    match method {
        "parseFiles" => Ok(wrap(Template::from_files(&string_args(args)?)?)),
        "parseGlob" => Ok(wrap(Template::from_glob(string_arg(args, 0)?)?)),
        other => Err(not_a_function(other)),
    }
}

/// Calls an escaping helper by name.
pub fn invoke_helper(name: &str, args: &[HostValue]) -> Result<HostValue> {
    let text = match name {
        "htmlEscapeString" => escape::html_escape_string(string_arg(args, 0)?),
        "jsEscapeString" => escape::js_escape_string(string_arg(args, 0)?),
        "htmlEscaper" => escape::html_escaper(args)?,
        "jsEscaper" => escape::js_escaper(args)?,
        "urlQueryEscaper" => escape::url_query_escaper(args)?,
        other => return Err(not_a_function(other)),
    };
    Ok(HostValue::from(text))
}

fn string_arg(args: &[HostValue], index: usize) -> Result<&str> {
    args.get(index)
        .and_then(HostValue::as_str)
        .ok_or_else(Error::expected_string)
}

fn string_args(args: &[HostValue]) -> Result<Vec<&str>> {
    args.iter()
        .map(|arg| arg.as_str().ok_or_else(Error::expected_string))
        .collect()
}

fn not_a_function(name: &str) -> Error {
    Error::Argument(format!("{} is not a function", name))
}
