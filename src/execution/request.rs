//! Execution Request Compiler
//!
//! Turns a plugin instance, its predecessor and the caller's parameter values
//! into the argument list and directories a backend needs. Nothing here is
//! persisted.

use crate::catalog::api::{Plugin, PluginInstance};
use crate::execution::backend::BackendKind;
use crate::plugin::api::{PluginDescriptor, PluginType};
use std::path::{Path, PathBuf};

/// Flags passed to every plugin so it records its inputs and outputs
pub const SAVE_INPUT_META: &str = "--saveinputmeta";
pub const SAVE_OUTPUT_META: &str = "--saveoutputmeta";

/// Directory substitutions for plugins that see the filesystem differently
///
/// Empty strings are treated as not supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryOverrides {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
}

impl DirectoryOverrides {
    fn pick(value: &Option<String>) -> Option<PathBuf> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    pub fn input(&self) -> Option<PathBuf> {
        Self::pick(&self.input_dir)
    }

    pub fn output(&self) -> Option<PathBuf> {
        Self::pick(&self.output_dir)
    }
}

/// Where the plugin executable lives inside its environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableSpec {
    pub selfexec: String,
    pub selfpath: Option<String>,
    pub execshell: Option<String>,
}

impl ExecutableSpec {
    pub fn from_descriptor(descriptor: &PluginDescriptor) -> Self {
        Self {
            selfexec: descriptor.selfexec.clone(),
            selfpath: descriptor.selfpath.clone(),
            execshell: descriptor.execshell.clone(),
        }
    }

    /// Full path of the executable
    pub fn executable_path(&self) -> PathBuf {
        match self.selfpath.as_deref().filter(|p| !p.is_empty()) {
            Some(dir) => Path::new(dir).join(&self.selfexec),
            None => PathBuf::from(&self.selfexec),
        }
    }

    /// Program and leading arguments, e.g. `["python3", "/usr/src/app/app.py"]`
    pub fn invocation(&self) -> Vec<String> {
        let mut command = Vec::with_capacity(2);
        if let Some(shell) = self.execshell.as_deref().filter(|s| !s.is_empty()) {
            command.push(shell.to_string());
        }
        command.push(self.executable_path().to_string_lossy().into_owned());
        command
    }
}

/// Fully resolved description of one plugin run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub instance_id: u64,
    pub owner: String,
    pub plugin_name: String,
    pub plugin_type: PluginType,
    pub image: String,
    pub executable: ExecutableSpec,
    pub args: Vec<String>,
    /// Input directory as the plugin sees it
    pub input_dir: Option<PathBuf>,
    /// Output directory as the plugin sees it
    pub output_dir: PathBuf,
    /// Predecessor output as the catalog knows it
    pub catalog_input_dir: Option<PathBuf>,
    /// Instance output as the catalog knows it
    pub catalog_output_dir: PathBuf,
    pub cpu_limit: String,
    pub memory_limit: String,
    pub number_of_workers: u32,
    pub backend: BackendKind,
}

impl ExecutionRequest {
    pub fn with_workers(mut self, number_of_workers: u32) -> Self {
        self.number_of_workers = number_of_workers;
        self
    }
}

/// Compile the execution request for `instance`
///
/// Parameter values are applied in the order given; names the plugin does not
/// declare are skipped.
pub fn compile(
    instance: &PluginInstance,
    previous: Option<&PluginInstance>,
    plugin: &Plugin,
    descriptor: &PluginDescriptor,
    parameter_values: &[(String, String)],
    overrides: &DirectoryOverrides,
    backend: BackendKind,
) -> ExecutionRequest {
    let catalog_input_dir = previous.map(|p| p.get_output_path().to_path_buf());
    let catalog_output_dir = instance.get_output_path().to_path_buf();

    let input_dir = overrides.input().or_else(|| catalog_input_dir.clone());
    let output_dir = overrides
        .output()
        .unwrap_or_else(|| catalog_output_dir.clone());

    let mut args = Vec::new();
    if plugin.plugin_type.consumes_input() {
        if let Some(dir) = &input_dir {
            args.push(dir.to_string_lossy().into_owned());
        }
    }
    args.push(output_dir.to_string_lossy().into_owned());
    args.push(SAVE_INPUT_META.to_string());
    args.push(SAVE_OUTPUT_META.to_string());

    for (name, value) in parameter_values {
        match descriptor.parameter(name) {
            Some(declared) => {
                args.push(declared.flag.clone());
                if declared.action.takes_value() {
                    args.push(value.clone());
                }
            }
            None => log::debug!(
                "Ignoring undeclared parameter '{}' for plugin '{}'",
                name,
                plugin.name
            ),
        }
    }

    ExecutionRequest {
        instance_id: instance.id,
        owner: instance.owner.clone(),
        plugin_name: plugin.name.clone(),
        plugin_type: plugin.plugin_type,
        image: plugin.dock_image.clone(),
        executable: ExecutableSpec::from_descriptor(descriptor),
        args,
        input_dir: if plugin.plugin_type.consumes_input() {
            input_dir
        } else {
            None
        },
        output_dir,
        catalog_input_dir,
        catalog_output_dir,
        cpu_limit: plugin.cpu_limit.clone(),
        memory_limit: plugin.memory_limit.clone(),
        number_of_workers: Plugin::DEFAULT_NUMBER_OF_WORKERS,
        backend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(plugin_type: &str) -> PluginDescriptor {
        let value = json!({
            "type": plugin_type,
            "selfexec": "simpledsapp.py",
            "selfpath": "/usr/src/simpledsapp",
            "execshell": "python3",
            "parameters": [
                {"name": "dir", "type": "path", "optional": true, "default": "./",
                 "help": "", "flag": "--dir", "action": "store"},
                {"name": "verbose", "type": "bool", "optional": true, "default": false,
                 "help": "", "flag": "--verbose", "action": "store_true"}
            ]
        });
        PluginDescriptor::from_slice(value.to_string().as_bytes()).unwrap()
    }

    fn instances() -> (PluginInstance, PluginInstance) {
        let mut previous = PluginInstance::new("simplefsapp", "chris", "/data/prev");
        previous.id = 1;
        let mut instance = PluginInstance::new("simpledsapp", "chris", "/data/own").with_previous(1);
        instance.id = 2;
        (instance, previous)
    }

    fn values(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_ds_argument_order() {
        let (instance, previous) = instances();
        let plugin = Plugin::new("simpledsapp", "fnndsc/pl-simpledsapp", PluginType::Ds);

        let request = compile(
            &instance,
            Some(&previous),
            &plugin,
            &descriptor("ds"),
            &values(&[("dir", "./")]),
            &DirectoryOverrides::default(),
            BackendKind::Local,
        );

        assert_eq!(
            request.args,
            vec![
                "/data/prev",
                "/data/own",
                "--saveinputmeta",
                "--saveoutputmeta",
                "--dir",
                "./"
            ]
        );
        assert_eq!(request.input_dir, Some(PathBuf::from("/data/prev")));
        assert_eq!(request.number_of_workers, 1);
    }

    #[test]
    fn test_fs_plugin_has_no_input_argument() {
        let (instance, previous) = instances();
        let plugin = Plugin::new("simplefsapp", "img", PluginType::Fs);

        let request = compile(
            &instance,
            Some(&previous),
            &plugin,
            &descriptor("fs"),
            &[],
            &DirectoryOverrides::default(),
            BackendKind::Local,
        );

        assert_eq!(request.args, vec!["/data/own", "--saveinputmeta", "--saveoutputmeta"]);
        assert_eq!(request.input_dir, None);
    }

    #[test]
    fn test_toggles_and_unknown_names() {
        let (instance, previous) = instances();
        let plugin = Plugin::new("simpledsapp", "img", PluginType::Ds);

        let request = compile(
            &instance,
            Some(&previous),
            &plugin,
            &descriptor("ds"),
            &values(&[("verbose", "true"), ("bogus", "x"), ("dir", "/in")]),
            &DirectoryOverrides::default(),
            BackendKind::Local,
        );

        assert_eq!(&request.args[4..], &["--verbose", "--dir", "/in"]);
    }

    #[test]
    fn test_overrides_replace_plugin_space_only() {
        let (instance, previous) = instances();
        let plugin = Plugin::new("simpledsapp", "img", PluginType::Ds);
        let overrides = DirectoryOverrides {
            input_dir: Some("/share/incoming".to_string()),
            output_dir: Some("/share/outgoing".to_string()),
        };

        let request = compile(
            &instance,
            Some(&previous),
            &plugin,
            &descriptor("ds"),
            &[],
            &overrides,
            BackendKind::Remote,
        );

        assert_eq!(&request.args[..2], &["/share/incoming", "/share/outgoing"]);
        assert_eq!(request.catalog_input_dir, Some(PathBuf::from("/data/prev")));
        assert_eq!(request.catalog_output_dir, PathBuf::from("/data/own"));
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let (instance, previous) = instances();
        let plugin = Plugin::new("simpledsapp", "img", PluginType::Ds);
        let overrides = DirectoryOverrides {
            input_dir: Some(String::new()),
            output_dir: Some(String::new()),
        };

        let request = compile(
            &instance,
            Some(&previous),
            &plugin,
            &descriptor("ds"),
            &[],
            &overrides,
            BackendKind::Local,
        );

        assert_eq!(&request.args[..2], &["/data/prev", "/data/own"]);
    }

    #[test]
    fn test_ds_without_predecessor_compiles() {
        let (instance, _) = instances();
        let plugin = Plugin::new("simpledsapp", "img", PluginType::Ds);

        let request = compile(
            &instance,
            None,
            &plugin,
            &descriptor("ds"),
            &[],
            &DirectoryOverrides::default(),
            BackendKind::Local,
        );

        assert_eq!(request.input_dir, None);
        assert_eq!(request.args[0], "/data/own");
    }

    #[test]
    fn test_invocation() {
        let spec = ExecutableSpec::from_descriptor(&descriptor("fs"));
        assert_eq!(
            spec.invocation(),
            vec!["python3", "/usr/src/simpledsapp/simpledsapp.py"]
        );

        let bare = ExecutableSpec {
            selfexec: "tool".to_string(),
            selfpath: None,
            execshell: None,
        };
        assert_eq!(bare.invocation(), vec!["tool"]);
    }
}
