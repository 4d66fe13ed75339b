use std::path::Path;

use anyhow::Result;
use tmc_core::{
    Bits, OptLevel, Plan, PlanError, RunDescriptor, ShellStep, Step, UploadStep, VariantKey, WorkerAssignment,
};
use tmc_matrix::{DuplicatePolicy, ExpandRequest, Expander, ExpansionPolicy};

use crate::{BuilderFile, MatrixEntry};

/// Expansion inputs distilled from a builder file.
#[derive(Debug)]
pub struct Lowered {
    pub worker: WorkerAssignment,
    pub prelude: Vec<Step>,
    pub requests: Vec<ExpandRequest>,
    pub uploads: Vec<Step>,
    pub policy: ExpansionPolicy,
    pub pin_root: Option<String>,
}

/// Convert the declarative file into expansion inputs. All axis numbers
/// are checked here, before a single step is emitted, so a bad matrix
/// never produces a partial plan.
pub fn lower(file: &BuilderFile) -> Result<Lowered, PlanError> {
    let mut requests = Vec::with_capacity(file.matrix.len());
    for entry in &file.matrix {
        requests.push(lower_entry(entry)?);
    }

    let mut prelude = vec![Step::Checkout(ShellStep {
        description: "checkout".to_string(),
        command: vec!["svn".to_string(), "checkout".to_string(), file.checkout_url.clone(), ".".to_string()],
    })];
    for entry in &file.setup {
        prelude.push(Step::Setup(ShellStep {
            description: entry.description.clone(),
            command: entry.command.clone(),
        }));
    }
    if !file.self_test_configs.is_empty() {
        let mut command = vec!["./run_self_tests.sh".to_string()];
        command.extend(file.self_test_configs.iter().cloned());
        prelude.push(Step::Setup(ShellStep {
            description: "analyzer self tests".to_string(),
            command,
        }));
    }
    for out in &file.output_tests {
        let bits = Bits::try_from(out.bits)?;
        prelude.push(Step::Setup(ShellStep {
            description: format!("output tests {}", bits.width()),
            command: vec![
                "make".to_string(),
                "-C".to_string(),
                "unittest".to_string(),
                format!("OS={}", out.os.as_str()),
                format!("ARCH={}", bits.arch()),
                "run_output_tests".to_string(),
            ],
        }));
    }

    let uploads = file
        .uploads
        .iter()
        .map(|u| {
            Step::Upload(UploadStep {
                local_path: u.local.clone(),
                remote_pattern: u.remote.clone(),
            })
        })
        .collect();

    let policy = ExpansionPolicy {
        race_verifier: file.race_verifier,
        on_duplicate: match file.on_duplicate.as_deref() {
            Some("strict") => DuplicatePolicy::Strict,
            _ => DuplicatePolicy::Suffix,
        },
    };

    Ok(Lowered {
        worker: WorkerAssignment {
            name: file.worker.name.clone(),
            slave_name: file.worker.slave_name.clone(),
            builder_dir: file.worker.builder_dir.clone(),
        },
        prelude,
        requests,
        uploads,
        policy,
        pin_root: file.pin_root.clone(),
    })
}

fn lower_entry(entry: &MatrixEntry) -> Result<ExpandRequest, PlanError> {
    let mut variant = VariantKey::new(
        entry.variant.os,
        Bits::try_from(entry.variant.bits)?,
        OptLevel::try_from(entry.variant.opt)?,
        entry.variant.static_link,
    );
    if let Some(base) = &entry.variant.base_name {
        variant = variant.with_base_name(base.clone());
    }

    let mut run = RunDescriptor::new(
        entry.run.debug,
        entry.run.mode.clone(),
        entry.run.threaded,
        entry.run.frontend,
    );
    run.extra_args = entry.extra_args.clone();
    run.extra_test_args = entry.extra_test_args.clone();
    run.timeout_secs = entry.timeout_secs;

    let mut request = ExpandRequest::new(variant, run);
    if let Some(id) = entry.test_id {
        request.run.extra_test_args.push(id.to_string());
        request = request.with_label(format!(", test {id}"));
    }
    Ok(request)
}

/// Load, validate, lower, and expand one builder file into a plan.
pub fn compile(path: &Path) -> Result<Plan> {
    let file = BuilderFile::load(path)?;
    file.validate()?;
    let lowered = lower(&file)?;

    let mut plan = Plan::new(lowered.worker);
    for step in lowered.prelude {
        plan.push(step);
    }
    let mut expander = Expander::new(lowered.policy);
    if let Some(root) = lowered.pin_root {
        expander = expander.with_pin_root(root);
    }
    expander.run(&mut plan, &lowered.requests)?;
    for step in lowered.uploads {
        plan.push(step);
    }
    // Final invariant on the whole plan, prelude and uploads included.
    plan.check_unique_descriptions()?;
    Ok(plan)
}
