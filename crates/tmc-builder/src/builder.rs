use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tmc_core::{Frontend, TargetOs};

/// Declarative description of one builder bot: which worker runs it, how
/// the tree is prepared, and the (variant, run) matrix to expand.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuilderFile {
    pub checkout_url: String,
    pub worker: WorkerSection,
    #[serde(default)]
    pub setup: Vec<SetupEntry>,
    /// Analyzer self-test configurations (e.g. `amd64-linux-debug`).
    #[serde(default)]
    pub self_test_configs: Vec<String>,
    /// Expected-output test sweeps, one per os/width pair.
    #[serde(default)]
    pub output_tests: Vec<OutputTestEntry>,
    /// Forwarded to pin frontends via the environment.
    #[serde(default)]
    pub pin_root: Option<String>,
    #[serde(default)]
    pub matrix: Vec<MatrixEntry>,
    #[serde(default)]
    pub uploads: Vec<UploadEntry>,
    #[serde(default = "default_true")]
    pub race_verifier: bool,
    /// `strict` or `suffix`; defaults to suffix so repeated runs of one
    /// variant stay plannable.
    #[serde(default)]
    pub on_duplicate: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerSection {
    pub name: String,
    pub slave_name: String,
    pub builder_dir: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetupEntry {
    pub description: String,
    pub command: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputTestEntry {
    pub os: TargetOs,
    pub bits: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub variant: VariantSection,
    pub run: RunSection,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub extra_test_args: Vec<String>,
    /// Numbered benchmark sub-test: appended to the description and the
    /// test arguments.
    #[serde(default)]
    pub test_id: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Raw axis numbers. Converted to the closed enums during lowering so an
/// out-of-domain width is a configuration error, not a parse failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantSection {
    pub os: TargetOs,
    pub bits: u8,
    pub opt: u8,
    #[serde(default, rename = "static")]
    pub static_link: bool,
    #[serde(default)]
    pub base_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSection {
    pub debug: bool,
    pub mode: String,
    #[serde(default)]
    pub threaded: bool,
    pub frontend: Frontend,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadEntry {
    pub local: String,
    pub remote: String,
}

impl BuilderFile {
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read builder file: {}", path.display()))?;
        let file: BuilderFile = serde_yaml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(file)
    }

    /// Structural checks, before any lowering. Axis-domain checks live in
    /// the lowering step where they become `PlanError::Configuration`.
    pub fn validate(&self) -> Result<()> {
        if self.checkout_url.trim().is_empty() {
            return Err(anyhow!("builder file missing checkout_url"));
        }
        if self.worker.name.trim().is_empty() || self.worker.slave_name.trim().is_empty() {
            return Err(anyhow!("builder file worker needs name and slave_name"));
        }
        let mut setup_descs = HashSet::new();
        for entry in &self.setup {
            if entry.command.is_empty() {
                return Err(anyhow!("setup step {:?} has an empty command", entry.description));
            }
            if !setup_descs.insert(entry.description.as_str()) {
                return Err(anyhow!("duplicate setup description {:?}", entry.description));
            }
        }
        for upload in &self.uploads {
            if !upload.remote.contains("%s") {
                return Err(anyhow!(
                    "upload pattern {:?} has no %s revision placeholder",
                    upload.remote
                ));
            }
        }
        if let Some(policy) = self.on_duplicate.as_deref() {
            if policy != "strict" && policy != "suffix" {
                return Err(anyhow!("on_duplicate must be strict or suffix, got {policy:?}"));
            }
        }
        Ok(())
    }
}
