//! Bundled function library.
//!
//! A [`Library`] is a table of engine-native functions that a namespace can
//! merge in with [`Template::add_library`](crate::Template::add_library).
//! Merged entries follow the usual rule: the last registration of a name
//! wins, whether it came from a library or from the host.
//!
//! | Function | Example | Result |
//! |----------|---------|--------|
//! | `dict` | `dict("a", 1, "b", 2)` | map of the pairs |
//! | `list` | `list(1, 2)` | sequence of the arguments |
//! | `atoi` | `atoi("42")` | integer, 0 when unparsable |
//! | `upper` / `lower` / `trim` | `upper("a")` | `A` |
//! | `repeat` | `repeat(3, "ab")` | `ababab` |
//! | `join` | `join(", ", items)` | items joined by the separator |
//! | `add` | `add(1, 2, 3)` | `6` |
//! | `default` | `default("n/a", value)` | value when truthy, else `n/a` |
//! | `quote` | `quote("a", "b")` | `"a" "b"` |
//! | `env` | `env("HOME")` | environment variable, empty if unset |
//! | `expandenv` | `expandenv("$HOME/x")` | text with `$VAR` / `${VAR}` expanded |
//!
//! [`Library::hermetic`] leaves out `env` and `expandenv`, so templates
//! cannot observe the process environment.

use std::collections::BTreeMap;

use minijinja::value::{Rest, Value};
use minijinja::{Error, ErrorKind};

use crate::functions::FunctionBinding;

/// A table of engine-native functions.
#[derive(Debug, Clone)]
pub struct Library {
    functions: BTreeMap<&'static str, Value>,
}

impl Library {
    /// Every bundled function, including those that read the environment.
    pub fn standard() -> Self {
        let mut library = Self::hermetic();
        library.insert("env", Value::from_function(env));
        library.insert("expandenv", Value::from_function(expandenv));
        library
    }

    /// The bundled functions that do not depend on the environment.
    pub fn hermetic() -> Self {
        let mut library = Library {
            functions: BTreeMap::new(),
        };
        library.insert("dict", Value::from_function(dict));
        library.insert("list", Value::from_function(list));
        library.insert("atoi", Value::from_function(atoi));
        library.insert("upper", Value::from_function(|s: String| s.to_uppercase()));
        library.insert("lower", Value::from_function(|s: String| s.to_lowercase()));
        library.insert("trim", Value::from_function(|s: String| s.trim().to_string()));
        library.insert("repeat", Value::from_function(|count: usize, s: String| s.repeat(count)));
        library.insert("join", Value::from_function(join));
        library.insert("add", Value::from_function(add));
        library.insert("default", Value::from_function(default));
        library.insert("quote", Value::from_function(quote));
        library
    }

    fn insert(&mut self, name: &'static str, function: Value) {
        self.functions.insert(name, function);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub(crate) fn bindings(&self) -> Vec<(String, FunctionBinding)> {
        self.functions
            .iter()
            .map(|(name, function)| (name.to_string(), FunctionBinding::Engine(function.clone())))
            .collect()
    }
}

fn dict(args: Rest<Value>) -> Value {
    let mut pairs = Vec::with_capacity(args.len() / 2 + 1);
    for chunk in args.chunks(2) {
        let key = chunk[0].to_string();
        let value = chunk.get(1).cloned().unwrap_or_else(|| Value::from(""));
        pairs.push((key, value));
    }
    Value::from_iter(pairs)
}

fn list(args: Rest<Value>) -> Value {
    Value::from(args.0)
}

fn atoi(s: String) -> i64 {
    s.trim().parse().unwrap_or(0)
}

fn join(separator: String, items: Value) -> Result<String, Error> {
    let items = items.try_iter().map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            "join() requires a sequence of values",
        )
    })?;
    Ok(items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(&separator))
}

fn add(args: Rest<i64>) -> Result<i64, Error> {
    args.iter().try_fold(0i64, |sum, n| {
        sum.checked_add(*n)
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "add() overflowed"))
    })
}

fn default(fallback: Value, given: Option<Value>) -> Value {
    match given {
        Some(value) if value.is_true() => value,
        _ => fallback,
    }
}

fn quote(args: Rest<Value>) -> String {
    args.iter()
        .filter(|value| !value.is_none() && !value.is_undefined())
        .map(|value| format!("{:?}", value.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn env(name: String) -> String {
    std::env::var(name).unwrap_or_default()
}

fn expandenv(s: String) -> String {
    expand(&s, |name| std::env::var(name).unwrap_or_default())
}

/// Replaces `$NAME` and `${NAME}` using `lookup`.
fn expand(s: &str, lookup: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    out.push_str(&lookup(&braced[..end]));
                    rest = &braced[end + 1..];
                }
                None => {
                    out.push_str(&rest[pos..]);
                    rest = "";
                }
            }
            continue;
        }
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]));
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(library: &Library, source: &str) -> String {
        let mut env = minijinja::Environment::new();
        for (name, binding) in library.bindings() {
            if let FunctionBinding::Engine(function) = binding {
                env.add_global(name, function);
            }
        }
        env.render_str(source, ()).unwrap()
    }

    #[test]
    fn test_hermetic_has_no_environment_access() {
        let hermetic = Library::hermetic();
        assert!(!hermetic.contains("env"));
        assert!(!hermetic.contains("expandenv"));
        assert!(Library::standard().contains("env"));
    }

    #[test]
    fn test_dict_pairs() {
        let library = Library::hermetic();
        let out = render(&library, r#"{% set d = dict("a", 1, "b") %}{{ d.a }}|{{ d.b }}|"#);
        assert_eq!(out, "1||");
    }

    #[test]
    fn test_list_and_join() {
        let library = Library::hermetic();
        let out = render(&library, r#"{{ join(", ", list(1, "two", 3)) }}"#);
        assert_eq!(out, "1, two, 3");
    }

    #[test]
    fn test_add_and_atoi() {
        let library = Library::hermetic();
        assert_eq!(render(&library, "{{ add(1, 2, 3) }}"), "6");
        assert_eq!(render(&library, r#"{{ atoi(" 42 ") + 1 }}"#), "43");
        assert_eq!(render(&library, r#"{{ atoi("x") }}"#), "0");
    }

    #[test]
    fn test_default() {
        let library = Library::hermetic();
        assert_eq!(render(&library, r#"{{ default("n/a") }}"#), "n/a");
        assert_eq!(render(&library, r#"{{ default("n/a", "") }}"#), "n/a");
        assert_eq!(render(&library, r#"{{ default("n/a", "set") }}"#), "set");
    }

    #[test]
    fn test_string_helpers() {
        let library = Library::hermetic();
        assert_eq!(
            render(&library, r#"{{ upper("a") }}{{ lower("B") }}[{{ trim("  c ") }}]{{ repeat(2, "d") }}"#),
            "Ab[c]dd"
        );
        assert_eq!(render(&library, r#"{{ quote("a", 1) }}"#), r#""a" "1""#);
    }

    #[test]
    fn test_expand() {
        let lookup = |name: &str| match name {
            "HOME" => "/home/ada".to_string(),
            "X" => "x".to_string(),
            _ => String::new(),
        };
        assert_eq!(expand("$HOME/bin", lookup), "/home/ada/bin");
        assert_eq!(expand("${X}y$X", lookup), "xyx");
        assert_eq!(expand("cost: $", lookup), "cost: $");
        assert_eq!(expand("${unterminated", lookup), "${unterminated");
        assert_eq!(expand("$MISSING!", lookup), "!");
    }
}
