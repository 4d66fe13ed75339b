use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{PlanError, RunDescriptor, VariantKey};

/// Compile one distinct binary. Emitted at most once per variant key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildStep {
    pub variant: VariantKey,
    pub description: String,
    pub artifact_path: String,
}

/// Execute one binary one way. The description always extends the owning
/// build step's description, which keeps report grouping unambiguous.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestStep {
    pub variant: VariantKey,
    pub run: RunDescriptor,
    pub description: String,
    pub command: Vec<String>,
    // BTreeMap keeps serialized plans byte-stable across runs.
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Checkout / setup / output-test style shell step, passed through to the
/// executor without any matrix semantics.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShellStep {
    pub description: String,
    pub command: Vec<String>,
}

/// Artifact upload. `remote_pattern` carries a `%s` revision placeholder
/// the executor substitutes after checkout.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadStep {
    pub local_path: String,
    pub remote_pattern: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Checkout(ShellStep),
    Setup(ShellStep),
    Build(BuildStep),
    Test(TestStep),
    Upload(UploadStep),
}

impl Step {
    pub fn description(&self) -> Option<&str> {
        match self {
            Step::Checkout(s) | Step::Setup(s) => Some(&s.description),
            Step::Build(b) => Some(&b.description),
            Step::Test(t) => Some(&t.description),
            Step::Upload(_) => None,
        }
    }
}

/// Which machine runs the plan. Opaque to planning; scheduling is the
/// executor's business.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerAssignment {
    pub name: String,
    pub slave_name: String,
    pub builder_dir: String,
}

/// Ordered step sequence for one builder. Append-only while planning,
/// handed over whole and never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub worker: WorkerAssignment,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(worker: WorkerAssignment) -> Self {
        Self { worker, steps: vec![] }
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn build_steps(&self) -> impl Iterator<Item = &BuildStep> {
        self.steps.iter().filter_map(|s| match s {
            Step::Build(b) => Some(b),
            _ => None,
        })
    }

    pub fn test_steps(&self) -> impl Iterator<Item = &TestStep> {
        self.steps.iter().filter_map(|s| match s {
            Step::Test(t) => Some(t),
            _ => None,
        })
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| s.description())
    }

    /// Fails if any two non-build steps share a description string. A build
    /// step named after its primary test step is expected; reporting keys
    /// off test results, so builds stay out of the scan.
    pub fn check_unique_descriptions(&self) -> Result<(), PlanError> {
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if matches!(step, Step::Build(_)) {
                continue;
            }
            if let Some(desc) = step.description() {
                if !seen.insert(desc) {
                    return Err(PlanError::DuplicateDescription { description: desc.to_string() });
                }
            }
        }
        Ok(())
    }

    /// sha256 over the serialized plan. Two expansions of the same input
    /// must produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("plan serializable");
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }
}
