//! Engine adapter.
//!
//! This is the only module that drives minijinja. It owns the namespace
//! arena ([`TemplateSet`]) and translates values in and out of the engine.
//!
//! Engine operations report failures as [`EngineFailure`], which keeps two
//! channels apart: an error the engine reported during normal execution,
//! and a fault, an internal condition the engine treats as fatal. The
//! [`guard`](crate::guard) turns the first into [`Error::Engine`] and the
//! second into [`Error::Panic`].
//!
//! [`Error::Engine`]: crate::Error::Engine
//! [`Error::Panic`]: crate::Error::Panic

mod set;
pub(crate) mod value;

use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

use minijinja::{Environment, ErrorKind, Value};
use tracing::debug;

pub(crate) use set::TemplateSet;
pub use value::WideInt;

/// Outcome of a failed engine operation.
#[derive(Debug)]
pub(crate) enum EngineFailure {
    Reported(minijinja::Error),
    Fault(String),
}

impl From<minijinja::Error> for EngineFailure {
    fn from(err: minijinja::Error) -> Self {
        EngineFailure::Reported(err)
    }
}

pub(crate) type EngineResult<T> = Result<T, EngineFailure>;

/// Renders `name` with `data` bound as `dot`.
///
/// An undefined-value failure names the data key whose lookup missed last.
pub(crate) fn render(env: &Environment<'static>, name: &str, data: Value) -> EngineResult<String> {
    debug!(template = name, "render");
    let template = env.get_template(name)?;
    let globals: BTreeSet<String> = env.globals().map(|(key, _)| key.to_string()).collect();
    let missed = value::MissedKey::track();
    let output = template
        .render(value::RenderContext::new(data, Arc::new(globals)))
        .map_err(|err| name_missing_key(err, &missed))?;
    debug!(template = name, bytes = output.len(), "render finished");
    Ok(output)
}

fn name_missing_key(err: minijinja::Error, missed: &value::MissedKey) -> minijinja::Error {
    if err.kind() != ErrorKind::UndefinedError {
        return err;
    }
    let Some(key) = missed.last() else {
        return err;
    };
    debug!(key = %key, "undefined value traced to missing key");
    let mut detail = format!("missing key {key:?}");
    if let (Some(name), Some(line)) = (err.name(), err.line()) {
        let _ = write!(detail, " (in {name}:{line})");
    }
    minijinja::Error::new(ErrorKind::UndefinedError, detail).with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::{MapKey, MarshaledValue};

    fn strict_env(source: &str) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        env.add_template_owned("t", source.to_string()).unwrap();
        env
    }

    fn data(entries: &[(&str, &str)]) -> Value {
        let entries = entries
            .iter()
            .map(|(key, item)| (MapKey::Text(key.to_string()), MarshaledValue::from(*item)))
            .collect();
        value::to_value(&MarshaledValue::Map(entries)).unwrap()
    }

    fn failure(result: EngineResult<String>) -> minijinja::Error {
        match result {
            Err(EngineFailure::Reported(err)) => err,
            other => panic!("expected a reported error, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_root_miss_names_the_key() {
        let env = strict_env("[{{ absent_key }}]");
        let err = failure(render(&env, "t", data(&[("present", "x")])));
        assert_eq!(err.kind(), ErrorKind::UndefinedError);
        assert!(err.to_string().contains("missing key \"absent_key\""), "{err}");
        assert!(err.to_string().contains("(in t:1)"), "{err}");
    }

    #[test]
    fn test_strict_dot_miss_names_the_key() {
        let env = strict_env("{{ dot.present }}{{ dot.absent_key }}");
        let err = failure(render(&env, "t", data(&[("present", "x")])));
        assert_eq!(err.kind(), ErrorKind::UndefinedError);
        assert!(err.to_string().contains("missing key \"absent_key\""), "{err}");
    }

    #[test]
    fn test_global_lookups_are_not_blamed() {
        let env = strict_env("{{ absent_key ~ range(1)|length }}");
        let err = failure(render(&env, "t", data(&[])));
        assert!(err.to_string().contains("\"absent_key\""), "{err}");
    }

    #[test]
    fn test_other_errors_pass_through() {
        let env = strict_env("{{ absent_key is defined }}{{ present + 1 }}");
        let err = failure(render(&env, "t", data(&[("present", "x")])));
        assert_ne!(err.kind(), ErrorKind::UndefinedError);
        assert!(!err.to_string().contains("missing key"));
    }

    #[test]
    fn test_present_keys_render() {
        let env = strict_env("{{ name }} {{ dot.name }}");
        assert_eq!(render(&env, "t", data(&[("name", "Ada")])).unwrap(), "Ada Ada");
    }
}
