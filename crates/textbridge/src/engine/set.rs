use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::Environment;
use tracing::debug;

use super::{EngineFailure, EngineResult};
use crate::config::{Delimiters, TemplateConfig};
use crate::functions::{self, FunctionBinding};

/// A named slot in a namespace. `source` is set once content is parsed.
#[derive(Debug, Clone)]
struct Node {
    source: Option<String>,
    delimiters: Delimiters,
}

/// A template namespace: named nodes sharing one environment and one
/// function table.
///
/// The environment sits behind an `Arc` and is copied on write, so a render
/// can keep using a snapshot while the namespace is mutated.
#[derive(Debug, Clone)]
pub(crate) struct TemplateSet {
    env: Arc<Environment<'static>>,
    nodes: BTreeMap<String, Node>,
    functions: BTreeMap<String, FunctionBinding>,
    config: TemplateConfig,
}

impl TemplateSet {
    pub(crate) fn new(config: TemplateConfig) -> Self {
        let mut env = Environment::new();
        config.apply_to(&mut env);
        TemplateSet {
            env: Arc::new(env),
            nodes: BTreeMap::new(),
            functions: BTreeMap::new(),
            config,
        }
    }

    /// Snapshot of the environment for rendering.
    pub(crate) fn environment(&self) -> Arc<Environment<'static>> {
        Arc::clone(&self.env)
    }

    pub(crate) fn default_delimiters(&self) -> &Delimiters {
        &self.config.delimiters
    }

    /// Makes sure `name` has a node, creating an empty one with `delimiters`.
    pub(crate) fn ensure_node(&mut self, name: &str, delimiters: Delimiters) {
        self.nodes.entry(name.to_string()).or_insert_with(|| {
            debug!(template = name, "new node");
            Node {
                source: None,
                delimiters,
            }
        });
    }

    pub(crate) fn delimiters(&self, name: &str) -> Delimiters {
        self.nodes
            .get(name)
            .map(|node| node.delimiters.clone())
            .unwrap_or_else(|| self.config.delimiters.clone())
    }

    pub(crate) fn set_delimiters(&mut self, name: &str, delimiters: Delimiters) {
        match self.nodes.get_mut(name) {
            Some(node) => node.delimiters = delimiters,
            None => {
                self.nodes.insert(
                    name.to_string(),
                    Node {
                        source: None,
                        delimiters,
                    },
                );
            }
        }
    }

    pub(crate) fn is_defined(&self, name: &str) -> bool {
        self.nodes
            .get(name)
            .is_some_and(|node| node.source.is_some())
    }

    /// Names of nodes with parsed content, sorted.
    pub(crate) fn defined_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.source.is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Compiles `source` into node `name`. On failure nothing changes.
    pub(crate) fn parse(&mut self, name: &str, source: &str) -> EngineResult<()> {
        let delimiters = self.delimiters(name);
        let syntax = delimiters.syntax()?;
        let mut env = (*self.env).clone();
        env.set_syntax(syntax);
        env.add_template_owned(name.to_string(), source.to_string())?;
        self.env = Arc::new(env);
        let node = self.nodes.entry(name.to_string()).or_insert(Node {
            source: None,
            delimiters,
        });
        node.source = Some(source.to_string());
        debug!(template = name, bytes = source.len(), "parsed");
        Ok(())
    }

    /// Installs function bindings. Every name is validated before any
    /// binding is installed.
    pub(crate) fn register(&mut self, bindings: Vec<(String, FunctionBinding)>) -> EngineResult<()> {
        for (name, _) in &bindings {
            functions::validate_name(name)?;
        }
        let env = Arc::make_mut(&mut self.env);
        for (name, binding) in bindings {
            env.add_global(name.clone(), binding.to_value(&name));
            debug!(function = %name, origin = binding.origin(), "registered function");
            self.functions.insert(name, binding);
        }
        Ok(())
    }

    pub(crate) fn function(&self, name: &str) -> Option<&FunctionBinding> {
        self.functions.get(name)
    }

    /// Applies option strings. All options are checked before any is applied.
    pub(crate) fn set_options<S: AsRef<str>>(&mut self, options: &[S]) -> EngineResult<()> {
        let mut config = self.config.clone();
        for option in options {
            config
                .apply_option(option.as_ref())
                .map_err(EngineFailure::Fault)?;
        }
        config.apply_to(Arc::make_mut(&mut self.env));
        debug!(?config, "options applied");
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingKey;
    use minijinja::ErrorKind;

    fn set() -> TemplateSet {
        TemplateSet::new(TemplateConfig::default())
    }

    #[test]
    fn test_parse_defines_node() {
        let mut set = set();
        set.ensure_node("root", Delimiters::default());
        assert!(!set.is_defined("root"));
        set.parse("root", "hi").unwrap();
        assert!(set.is_defined("root"));
        assert_eq!(set.defined_names(), vec!["root"]);
    }

    #[test]
    fn test_failed_parse_keeps_previous_content() {
        let mut set = set();
        set.parse("root", "v1").unwrap();
        let err = set.parse("root", "{{ broken").unwrap_err();
        assert!(matches!(err, EngineFailure::Reported(ref e) if e.kind() == ErrorKind::SyntaxError));
        let env = set.environment();
        let output = env.get_template("root").unwrap().render(()).unwrap();
        assert_eq!(output, "v1");
    }

    #[test]
    fn test_node_delimiters_apply_to_parse() {
        let mut set = set();
        set.set_delimiters("angle", Delimiters::new("<<", ">>"));
        set.parse("angle", "<< 1 + 1 >> {{ x }}").unwrap();
        let env = set.environment();
        let output = env.get_template("angle").unwrap().render(()).unwrap();
        assert_eq!(output, "2 {{ x }}");
    }

    #[test]
    fn test_bad_option_changes_nothing() {
        let mut set = set();
        let err = set.set_options(&["missingkey=error", "bogus"]).unwrap_err();
        assert!(matches!(err, EngineFailure::Fault(ref msg) if msg == "unrecognized option: bogus"));
        assert_eq!(set.config.missing_key, MissingKey::Default);
    }

    #[test]
    fn test_invalid_name_registers_nothing() {
        let mut set = set();
        let err = set
            .register(vec![
                ("ok".into(), FunctionBinding::Engine(minijinja::Value::from(1))),
                ("".into(), FunctionBinding::Engine(minijinja::Value::from(2))),
            ])
            .unwrap_err();
        assert!(matches!(err, EngineFailure::Fault(_)));
        assert!(set.function("ok").is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = set();
        original.parse("a", "A").unwrap();
        let mut copy = original.clone();
        copy.parse("b", "B").unwrap();
        assert_eq!(original.defined_names(), vec!["a"]);
        assert_eq!(copy.defined_names(), vec!["a", "b"]);
        assert!(original.environment().get_template("b").is_err());
    }
}
