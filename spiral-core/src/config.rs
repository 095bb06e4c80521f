//! Configuration-based container setup

use crate::binding::Definition;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::options::Options;
use crate::value::{Arguments, Autowire, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Binding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Identifier to bind
    pub alias: String,
    /// Class or identifier the alias resolves to; the alias itself when omitted
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub lifetime: BindingLifetime,
    /// Bind into every future scope with this name instead of the root
    #[serde(default)]
    pub scope: Option<String>,
    /// Constructor arguments by parameter name
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

/// Binding lifetime configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingLifetime {
    #[default]
    Transient,
    Singleton,
}

impl BindingConfig {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            target: None,
            lifetime: BindingLifetime::Transient,
            scope: None,
            parameters: HashMap::new(),
        }
    }

    fn definition(&self) -> Definition {
        let target = self.target.as_deref().unwrap_or(&self.alias);
        if self.parameters.is_empty() {
            return Definition::Alias(target.to_string());
        }

        let arguments = self
            .parameters
            .iter()
            .map(|(name, value)| (name.as_str(), json_to_value(value)))
            .collect::<Arguments>();
        Definition::Autowire(Autowire::new(target, arguments))
    }
}

fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::Array(Arguments::positional(items.iter().map(json_to_value)))
        }
        serde_json::Value::Object(map) => Value::Array(
            map.iter()
                .map(|(key, value)| (key.as_str(), json_to_value(value)))
                .collect(),
        ),
    }
}

/// Container configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

impl ContainerConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> DiResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| DiError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from JSON string
    pub fn from_json(json_str: &str) -> DiResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| DiError::Config(format!("Failed to parse JSON: {}", e)))
    }

    /// Register every configured binding on `container`
    pub fn apply(&self, container: &Container) -> DiResult<()> {
        for binding in &self.bindings {
            let singleton = binding.lifetime == BindingLifetime::Singleton;
            let definition = binding.definition();
            match (&binding.scope, singleton) {
                (Some(scope), true) => container
                    .binder(scope.as_str())
                    .bind_singleton(binding.alias.as_str(), definition)?,
                (Some(scope), false) => container
                    .binder(scope.as_str())
                    .bind(binding.alias.as_str(), definition)?,
                (None, true) => container.bind_singleton(binding.alias.as_str(), definition)?,
                (None, false) => container.bind(binding.alias.as_str(), definition)?,
            }
        }
        Ok(())
    }

    /// Root container with the configured options and bindings
    pub fn build(&self) -> DiResult<Container> {
        let container = Container::with_options(self.options);
        self.apply(&container)?;
        Ok(container)
    }
}

/// Configuration builder
pub struct ConfigBuilder {
    options: Options,
    bindings: Vec<BindingConfig>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            options: Options::default(),
            bindings: Vec::new(),
        }
    }

    pub fn options(&mut self, options: Options) -> &mut Self {
        self.options = options;
        self
    }

    pub fn add_binding(&mut self, config: BindingConfig) -> &mut Self {
        self.bindings.push(config);
        self
    }

    /// Build the configuration, rejecting duplicate aliases within one scope
    pub fn build(self) -> DiResult<ContainerConfig> {
        for (i, binding) in self.bindings.iter().enumerate() {
            let duplicate = self.bindings[..i]
                .iter()
                .any(|b| b.alias == binding.alias && b.scope == binding.scope);
            if duplicate {
                return Err(DiError::Config(format!(
                    "Duplicate binding for `{}`",
                    binding.alias
                )));
            }
        }
        Ok(ContainerConfig {
            options: self.options,
            bindings: self.bindings,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Example configuration file format:
// ```toml
// [options]
// check_scope = true
// validate_arguments = true
//
// [[bindings]]
// alias = "LoggerInterface"
// target = "FileLogger"
// lifetime = "singleton"
//
// [[bindings]]
// alias = "RequestContext"
// scope = "http"
//
// [bindings.parameters]
// timeout = 30
// ```
