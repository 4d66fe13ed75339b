use std::collections::HashMap;

use tmc_core::{binary_path, describe, Bits, BuildStep, Plan, PlanError, Step, TargetOs, VariantKey};

/// Owns the variant -> build-step memo. One distinct binary is compiled at
/// most once per plan, however many runs request it.
#[derive(Default)]
pub struct BuildCache {
    built: HashMap<VariantKey, BuildStep>,
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// First request for a variant validates it, emits a build step into
    /// the plan, and memoizes. Later requests return the memoized step
    /// without touching the plan.
    pub fn get_or_build(&mut self, variant: &VariantKey, plan: &mut Plan) -> Result<BuildStep, PlanError> {
        if let Some(step) = self.built.get(variant) {
            tracing::trace!(desc = %step.description, "build cache hit");
            return Ok(step.clone());
        }
        validate_variant(variant)?;
        let step = BuildStep {
            description: describe(variant),
            artifact_path: binary_path(variant),
            variant: variant.clone(),
        };
        tracing::debug!(desc = %step.description, artifact = %step.artifact_path, "emitting build step");
        plan.push(Step::Build(step.clone()));
        self.built.insert(variant.clone(), step.clone());
        Ok(step)
    }

    pub fn len(&self) -> usize {
        self.built.len()
    }

    pub fn is_empty(&self) -> bool {
        self.built.is_empty()
    }
}

/// Axis combinations no builder supports.
pub fn validate_variant(variant: &VariantKey) -> Result<(), PlanError> {
    if variant.os == TargetOs::Windows && variant.bits == Bits::B64 {
        return Err(PlanError::configuration("64-bit windows builds are not supported"));
    }
    Ok(())
}
