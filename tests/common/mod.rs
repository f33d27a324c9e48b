//! Common test utilities and helpers
//!
//! Fakes for the container runtime and the remote compute service, plus
//! shell-script plugins usable with the local backend.

#![allow(dead_code)]

use async_trait::async_trait;
use plugctl::execution::api::{ComputeService, JobSpec};
use plugctl::plugin::api::ContainerRuntime;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const FS_IMAGE: &str = "fnndsc/pl-simplefsapp";
pub const DS_IMAGE: &str = "fnndsc/pl-simpledsapp";

/// Container runtime answering with canned descriptors
#[derive(Debug, Default)]
pub struct FakeRuntime {
    descriptors: Mutex<HashMap<String, Value>>,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn publish(&self, image: &str, descriptor: Value) {
        self.descriptors
            .lock()
            .unwrap()
            .insert(image.to_string(), descriptor);
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn pull(&self, image: &str) -> Result<(), String> {
        Err(format!("pull access denied for {}", image))
    }

    async fn run(&self, image: &str) -> Result<Vec<u8>, String> {
        self.descriptors
            .lock()
            .unwrap()
            .get(image)
            .map(|d| d.to_string().into_bytes())
            .ok_or_else(|| format!("Unable to find image '{}' locally", image))
    }
}

/// Compute service with a settable job status
#[derive(Debug, Default)]
pub struct FakeComputeService {
    pub jobs: Mutex<Vec<JobSpec>>,
    pub status: Mutex<String>,
}

impl FakeComputeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }
}

#[async_trait]
impl ComputeService for FakeComputeService {
    async fn submit(&self, job: &JobSpec) -> Result<String, String> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job.jid.clone())
    }

    async fn status(&self, _job_id: &str) -> Result<String, String> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn cancel(&self, _job_id: &str) -> Result<(), String> {
        Ok(())
    }

    async fn check_available(&self) -> Result<bool, String> {
        Ok(true)
    }

    async fn request_shutdown(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Descriptor of the demo filesystem plugin
pub fn fs_descriptor() -> Value {
    json!({
        "type": "fs",
        "selfexec": "simplefsapp.py",
        "selfpath": "/usr/src/simplefsapp",
        "execshell": "python3",
        "title": "Simple chris fs app",
        "license": "Opensource (MIT)",
        "version": "0.1",
        "parameters": [
            {"name": "dir", "type": "path", "optional": true, "default": "./",
             "help": "look up directory", "flag": "--dir", "action": "store"}
        ]
    })
}

/// Descriptor of a plugin implemented by a shell script in `dir`
pub fn script_descriptor(plugin_type: &str, script: &str, dir: &Path) -> Value {
    json!({
        "type": plugin_type,
        "selfexec": script,
        "selfpath": dir.to_string_lossy(),
        "execshell": "sh",
        "title": "script plugin",
        "parameters": [
            {"name": "greeting", "type": "str", "optional": true, "default": "hello",
             "help": "text to write", "flag": "--greeting", "action": "store"}
        ]
    })
}

pub fn values(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
