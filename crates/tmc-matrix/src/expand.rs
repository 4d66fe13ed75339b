use std::collections::HashMap;

use tmc_core::{Plan, PlanError, RunDescriptor, Step, TestStep, VariantKey, WorkerAssignment};

use crate::{
    race_verifier_first_pass, race_verifier_log, race_verifier_second_pass, test_command, validate_run, BuildCache,
    DuplicatePolicy, ExpansionPolicy,
};

/// One requested (variant, run) pair. `label` is appended to the primary
/// step's description (e.g. `", test 512"` for numbered benchmark
/// sub-tests).
#[derive(Clone, Debug)]
pub struct ExpandRequest {
    pub variant: VariantKey,
    pub run: RunDescriptor,
    pub label: Option<String>,
}

impl ExpandRequest {
    pub fn new(variant: VariantKey, run: RunDescriptor) -> Self {
        Self { variant, run, label: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Single-pass, synchronous planner. Owns the build cache and the
/// description-uniqueness bookkeeping for the steps it emits.
pub struct Expander {
    cache: BuildCache,
    policy: ExpansionPolicy,
    pin_root: Option<String>,
    seen: HashMap<String, usize>,
}

impl Expander {
    pub fn new(policy: ExpansionPolicy) -> Self {
        Self {
            cache: BuildCache::new(),
            policy,
            pin_root: None,
            seen: HashMap::new(),
        }
    }

    pub fn with_pin_root(mut self, pin_root: impl Into<String>) -> Self {
        self.pin_root = Some(pin_root.into());
        self
    }

    /// Expand `requests` in input order into `plan`. Request order decides
    /// plan order and thus reporting order. Any error leaves the caller
    /// without a plan; nothing partial escapes.
    pub fn run(&mut self, plan: &mut Plan, requests: &[ExpandRequest]) -> Result<(), PlanError> {
        // Steps already in the plan (checkout, setup) take part in
        // description uniqueness too.
        for desc in plan.descriptions() {
            *self.seen.entry(desc.to_string()).or_insert(0) += 1;
        }

        for req in requests {
            validate_run(&req.variant, &req.run)?;
            let build = self.cache.get_or_build(&req.variant, plan)?;

            let mut desc = build.description.clone();
            if let Some(label) = &req.label {
                desc.push_str(label);
            }
            // The primary step may pick up a dedup suffix; the RV passes
            // chain off whatever it ended up being called.
            let desc = self.emit_test(plan, &req.variant, &req.run, desc)?;

            let pair_rv = self.policy.race_verifier && req.run.frontend.supports_race_verifier() && !req.run.threaded;
            if pair_rv {
                // Two chained passes: pass 2 replays the log pass 1 wrote,
                // so their order is load-bearing. Threaded runs are
                // non-deterministic and never get the pairing.
                let log = race_verifier_log(&req.variant);
                let first = race_verifier_first_pass(&req.run, &log);
                let second = race_verifier_second_pass(&req.run, &log);
                self.emit_test(plan, &req.variant, &first, format!("{desc} RV 1st pass"))?;
                self.emit_test(plan, &req.variant, &second, format!("{desc} RV 2nd pass"))?;
            }
            tracing::debug!(desc = %desc, rv = pair_rv, "expanded request");
        }
        Ok(())
    }

    fn emit_test(
        &mut self,
        plan: &mut Plan,
        variant: &VariantKey,
        run: &RunDescriptor,
        description: String,
    ) -> Result<String, PlanError> {
        let description = self.unique_description(description)?;
        let (command, env) = test_command(variant, run, self.pin_root.as_deref());
        plan.push(Step::Test(TestStep {
            variant: variant.clone(),
            run: run.clone(),
            description: description.clone(),
            command,
            env,
            timeout_secs: run.timeout_secs,
        }));
        Ok(description)
    }

    // Uniqueness covers test and shell steps; a build step reusing its
    // variant description next to its primary test step is expected, since
    // reporting keys off test results.
    fn unique_description(&mut self, description: String) -> Result<String, PlanError> {
        let count = self.seen.entry(description.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return Ok(description);
        }
        match self.policy.on_duplicate {
            DuplicatePolicy::Strict => Err(PlanError::DuplicateDescription { description }),
            DuplicatePolicy::Suffix => {
                // An input step may already carry a literal " #n" name, so
                // keep advancing until the minted suffix is actually fresh.
                let mut n = *count;
                let suffixed = loop {
                    let candidate = format!("{description} #{n}");
                    if !self.seen.contains_key(&candidate) {
                        break candidate;
                    }
                    n += 1;
                };
                self.seen.insert(suffixed.clone(), 1);
                self.seen.insert(description, n);
                Ok(suffixed)
            }
        }
    }
}

/// Convenience wrapper: a fresh plan containing only matrix output.
pub fn expand(
    worker: WorkerAssignment,
    requests: &[ExpandRequest],
    policy: ExpansionPolicy,
) -> Result<Plan, PlanError> {
    let mut plan = Plan::new(worker);
    Expander::new(policy).run(&mut plan, requests)?;
    Ok(plan)
}
