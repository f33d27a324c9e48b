//! Type definitions for the plugin system
//!
//! This module contains the descriptor shapes reported by plugin images and
//! the enumerations shared with the catalog. The descriptor arrives as free-form
//! JSON; it is parsed into [`RawDescriptor`] and converted into the strongly
//! typed [`PluginDescriptor`] with explicit presence checks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Plugin type classification
///
/// - `Fs`: filesystem-source plugins. They produce data without upstream input.
/// - `Ds`: data-consuming plugins. They read the output directory of the
///   previous instance in the pipeline.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PluginType {
    Fs,
    Ds,
}

impl PluginType {
    /// Whether plugins of this type read an upstream input directory
    pub fn consumes_input(&self) -> bool {
        matches!(self, PluginType::Ds)
    }

    /// All accepted type names, in declaration order
    pub fn names() -> Vec<&'static str> {
        PluginType::iter().map(<&'static str>::from).collect()
    }
}

/// Catalog parameter type
///
/// The catalog stores the long names (`string`, `integer`, ...) while plugin
/// descriptors report the short names (`str`, `int`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Float,
    Boolean,
    Path,
}

impl ParameterType {
    /// Name used for this type inside plugin descriptors
    pub fn descriptor_name(&self) -> &'static str {
        match self {
            ParameterType::String => "str",
            ParameterType::Integer => "int",
            ParameterType::Float => "float",
            ParameterType::Boolean => "bool",
            ParameterType::Path => "path",
        }
    }

    /// Map a descriptor-reported type name into the catalog enumeration
    pub fn from_descriptor_name(name: &str) -> Option<Self> {
        ParameterType::iter().find(|t| t.descriptor_name() == name)
    }
}

/// How a parameter is rendered on the plugin command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterAction {
    /// Flag followed by a value
    #[default]
    Store,
    /// Boolean toggle
    StoreTrue,
    /// Boolean toggle
    StoreFalse,
    /// Any other action; rendered as a bare flag
    #[serde(other)]
    Other,
}

impl ParameterAction {
    pub fn takes_value(&self) -> bool {
        matches!(self, ParameterAction::Store)
    }
}

/// Descriptor exactly as emitted by the plugin image
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDescriptor {
    #[serde(rename = "type")]
    plugin_type: Option<String>,
    selfexec: Option<String>,
    selfpath: Option<String>,
    execshell: Option<String>,
    #[serde(default)]
    authors: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    documentation: String,
    #[serde(default)]
    license: String,
    #[serde(default)]
    version: String,
    min_number_of_workers: Option<u32>,
    max_number_of_workers: Option<u32>,
    cpu_limit: Option<String>,
    memory_limit: Option<String>,
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawParameter {
    name: String,
    #[serde(rename = "type")]
    param_type: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    help: String,
    flag: String,
    #[serde(default)]
    action: ParameterAction,
}

/// Validated self-description of a plugin
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub plugin_type: PluginType,
    /// Name-bearing executable, e.g. `simplefsapp.py`
    pub selfexec: String,
    pub selfpath: Option<String>,
    pub execshell: Option<String>,
    pub authors: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub documentation: String,
    pub license: String,
    pub version: String,
    pub min_number_of_workers: Option<u32>,
    pub max_number_of_workers: Option<u32>,
    pub cpu_limit: Option<String>,
    pub memory_limit: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
}

/// One declared plugin parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub param_type: ParameterType,
    pub optional: bool,
    pub default: Option<Value>,
    pub help: String,
    pub flag: String,
    pub action: ParameterAction,
}

impl PluginDescriptor {
    /// Parse the bytes printed by a plugin image
    ///
    /// Returns a human-readable reason on failure; callers attach the image
    /// reference.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
        let raw: RawDescriptor = serde_json::from_slice(bytes)
            .map_err(|e| format!("descriptor is not valid JSON: {}", e))?;
        Self::try_from(raw)
    }

    /// Registered plugin name derived from `selfexec`
    pub fn name(&self) -> String {
        derive_name(self)
    }

    /// Look up a declared parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl TryFrom<RawDescriptor> for PluginDescriptor {
    type Error = String;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let type_name = raw
            .plugin_type
            .ok_or_else(|| "missing 'type' field".to_string())?;
        let plugin_type = type_name.parse::<PluginType>().map_err(|_| {
            format!(
                "plugin type '{}' is not one of {:?}",
                type_name,
                PluginType::names()
            )
        })?;

        let selfexec = raw
            .selfexec
            .ok_or_else(|| "missing 'selfexec' field".to_string())?;

        let parameters = raw
            .parameters
            .into_iter()
            .map(ParameterDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            plugin_type,
            selfexec,
            selfpath: raw.selfpath,
            execshell: raw.execshell,
            authors: raw.authors,
            title: raw.title,
            category: raw.category,
            description: raw.description,
            documentation: raw.documentation,
            license: raw.license,
            version: raw.version,
            min_number_of_workers: raw.min_number_of_workers,
            max_number_of_workers: raw.max_number_of_workers,
            cpu_limit: raw.cpu_limit,
            memory_limit: raw.memory_limit,
            parameters,
        })
    }
}

impl TryFrom<RawParameter> for ParameterDescriptor {
    type Error = String;

    fn try_from(raw: RawParameter) -> Result<Self, Self::Error> {
        let param_type = ParameterType::from_descriptor_name(&raw.param_type).ok_or_else(|| {
            format!(
                "parameter '{}' has unknown type '{}'",
                raw.name, raw.param_type
            )
        })?;

        Ok(Self {
            name: raw.name,
            param_type,
            optional: raw.optional,
            default: raw.default,
            help: raw.help,
            flag: raw.flag,
            action: raw.action,
        })
    }
}

impl ParameterDescriptor {
    /// Default value in the string form stored by the catalog
    ///
    /// Absent and null defaults become the empty string; strings are stored
    /// without quotes; other scalars use their JSON text.
    pub fn default_as_string(&self) -> String {
        match &self.default {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Strip the final extension segment from the descriptor's executable name
///
/// `"myapp.py"` becomes `"myapp"`; a name without a dot is returned unchanged.
pub fn derive_name(descriptor: &PluginDescriptor) -> String {
    match descriptor.selfexec.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => descriptor.selfexec.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor_json() -> Value {
        json!({
            "type": "ds",
            "selfexec": "simpledsapp.py",
            "selfpath": "/usr/src/simpledsapp",
            "execshell": "python3",
            "authors": "FNNDSC",
            "title": "Simple ds app",
            "category": "",
            "description": "copies files",
            "documentation": "",
            "license": "MIT",
            "version": "0.1",
            "parameters": [
                {"name": "prefix", "type": "str", "optional": false, "default": null,
                 "help": "prefix", "flag": "--prefix", "action": "store"},
                {"name": "sleepLength", "type": "int", "optional": true, "default": 5,
                 "help": "sleep", "flag": "--sleepLength", "action": "store"},
                {"name": "verbose", "type": "bool", "optional": true, "default": false,
                 "help": "verbose", "flag": "--verbose", "action": "store_true"}
            ]
        })
    }

    fn parse(value: &Value) -> Result<PluginDescriptor, String> {
        PluginDescriptor::from_slice(value.to_string().as_bytes())
    }

    #[test]
    fn test_parse_full_descriptor() {
        let descriptor = parse(&descriptor_json()).unwrap();

        assert_eq!(descriptor.plugin_type, PluginType::Ds);
        assert_eq!(descriptor.selfexec, "simpledsapp.py");
        assert_eq!(descriptor.execshell.as_deref(), Some("python3"));
        assert_eq!(descriptor.parameters.len(), 3);
        assert_eq!(descriptor.parameters[1].param_type, ParameterType::Integer);
        assert_eq!(descriptor.parameters[2].action, ParameterAction::StoreTrue);
        assert_eq!(descriptor.min_number_of_workers, None);
    }

    #[test]
    fn test_unknown_plugin_type_is_rejected() {
        let mut value = descriptor_json();
        value["type"] = json!("xx");

        let err = parse(&value).unwrap_err();
        assert!(err.contains("'xx'"), "unexpected reason: {}", err);
        assert!(err.contains("fs"));
    }

    #[test]
    fn test_missing_selfexec_is_rejected() {
        let mut value = descriptor_json();
        value.as_object_mut().unwrap().remove("selfexec");

        let err = parse(&value).unwrap_err();
        assert_eq!(err, "missing 'selfexec' field");
    }

    #[test]
    fn test_unknown_parameter_type_is_rejected() {
        let mut value = descriptor_json();
        value["parameters"][0]["type"] = json!("complex");

        let err = parse(&value).unwrap_err();
        assert!(err.contains("unknown type 'complex'"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = PluginDescriptor::from_slice(b"Usage: app.py [-h]").unwrap_err();
        assert!(err.starts_with("descriptor is not valid JSON"));
    }

    #[test]
    fn test_derive_name_strips_last_extension_only() {
        let mut descriptor = parse(&descriptor_json()).unwrap();
        assert_eq!(derive_name(&descriptor), "simpledsapp");

        descriptor.selfexec = "my.app.py".to_string();
        assert_eq!(descriptor.name(), "my.app");

        descriptor.selfexec = "noextension".to_string();
        assert_eq!(descriptor.name(), "noextension");
    }

    #[test]
    fn test_derive_name_is_stable_across_parses() {
        let first = parse(&descriptor_json()).unwrap();
        let second = parse(&descriptor_json()).unwrap();
        assert_eq!(first.name(), second.name());
    }

    #[test]
    fn test_default_as_string() {
        let descriptor = parse(&descriptor_json()).unwrap();
        assert_eq!(descriptor.parameters[0].default_as_string(), "");
        assert_eq!(descriptor.parameters[1].default_as_string(), "5");
        assert_eq!(descriptor.parameters[2].default_as_string(), "false");

        let mut param = descriptor.parameters[0].clone();
        param.default = Some(json!("./"));
        assert_eq!(param.default_as_string(), "./");
    }

    #[test]
    fn test_parameter_type_mapping_round_trips() {
        for param_type in ParameterType::iter() {
            assert_eq!(
                ParameterType::from_descriptor_name(param_type.descriptor_name()),
                Some(param_type)
            );
        }
        assert_eq!(ParameterType::Integer.to_string(), "integer");
    }

    #[test]
    fn test_unknown_action_is_a_toggle() {
        let mut value = descriptor_json();
        value["parameters"][0]["action"] = json!("append");

        let descriptor = parse(&value).unwrap();
        assert_eq!(descriptor.parameters[0].action, ParameterAction::Other);
        assert!(!descriptor.parameters[0].action.takes_value());
    }

    #[test]
    fn test_plugin_type_consumes_input() {
        assert!(PluginType::Ds.consumes_input());
        assert!(!PluginType::Fs.consumes_input());
        assert_eq!(PluginType::names(), vec!["fs", "ds"]);
    }
}
