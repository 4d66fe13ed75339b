use tmc_core::{
    describe, Bits, Frontend, OptLevel, Plan, PlanError, RunDescriptor, ShellStep, Step, TargetOs, VariantKey,
    WorkerAssignment,
};
use tmc_matrix::{expand, DuplicatePolicy, ExpandRequest, Expander, ExpansionPolicy};

fn worker() -> WorkerAssignment {
    WorkerAssignment {
        name: "linux".into(),
        slave_name: "vm44-m3".into(),
        builder_dir: "full-linux".into(),
    }
}

fn linux(bits: Bits, opt: OptLevel) -> VariantKey {
    VariantKey::new(TargetOs::Linux, bits, opt, false)
}

#[test]
fn pin_run_gets_build_plus_three_tests() {
    let requests = [ExpandRequest::new(
        linux(Bits::B64, OptLevel::O0),
        RunDescriptor::new(true, "phb", false, Frontend::Pin),
    )];
    let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();

    assert_eq!(plan.build_steps().count(), 1);
    assert_eq!(plan.test_steps().count(), 3);

    let build_desc = plan.build_steps().next().unwrap().description.clone();
    for t in plan.test_steps() {
        assert!(t.description.starts_with(&build_desc));
    }
    let descs: Vec<_> = plan.test_steps().map(|t| t.description.as_str()).collect();
    assert_eq!(descs[0], build_desc);
    assert_eq!(descs[1], format!("{build_desc} RV 1st pass"));
    assert_eq!(descs[2], format!("{build_desc} RV 2nd pass"));
}

#[test]
fn rv_passes_follow_the_primary_immediately() {
    let requests = [ExpandRequest::new(
        linux(Bits::B64, OptLevel::O1),
        RunDescriptor::new(false, "hybrid", false, Frontend::Valgrind),
    )];
    let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();

    let kinds: Vec<_> = plan
        .steps
        .iter()
        .map(|s| match s {
            Step::Build(_) => "build",
            Step::Test(t) if t.description.ends_with("RV 1st pass") => "rv1",
            Step::Test(t) if t.description.ends_with("RV 2nd pass") => "rv2",
            Step::Test(_) => "test",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["build", "test", "rv1", "rv2"]);
}

#[test]
fn threaded_runs_never_pair_race_verification() {
    for frontend in [Frontend::Valgrind, Frontend::Pin] {
        let requests = [ExpandRequest::new(
            linux(Bits::B64, OptLevel::O1),
            RunDescriptor::new(true, "phb", true, frontend),
        )];
        let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();
        assert_eq!(plan.test_steps().count(), 1, "frontend {frontend:?}");
    }
}

#[test]
fn memcheck_and_bare_runs_never_pair_race_verification() {
    for frontend in [Frontend::Memcheck, Frontend::None] {
        let requests = [ExpandRequest::new(
            linux(Bits::B32, OptLevel::O0),
            RunDescriptor::new(true, "phb", false, frontend),
        )];
        let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();
        assert_eq!(plan.test_steps().count(), 1, "frontend {frontend:?}");
    }
}

#[test]
fn shared_variant_builds_once_runs_in_request_order() {
    let v = linux(Bits::B32, OptLevel::O1);
    let requests = [
        ExpandRequest::new(v.clone(), RunDescriptor::new(true, "phb", false, Frontend::None)),
        ExpandRequest::new(v, RunDescriptor::new(true, "hybrid", false, Frontend::None)),
    ];
    let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();

    assert_eq!(plan.build_steps().count(), 1);
    let tests: Vec<_> = plan.test_steps().collect();
    assert_eq!(tests.len(), 2);
    assert_eq!(tests[0].run.mode.as_str(), "phb");
    assert_eq!(tests[1].run.mode.as_str(), "hybrid");
}

#[test]
fn equal_variant_and_run_produce_two_test_steps() {
    let v = linux(Bits::B64, OptLevel::O0).with_base_name("racecheck_unittest");
    let run = RunDescriptor::new(false, "phb", false, Frontend::None);
    let requests = [
        ExpandRequest::new(v.clone(), run.clone()).with_label(", test 72"),
        ExpandRequest::new(v, run).with_label(", test 512"),
    ];
    let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();

    assert_eq!(plan.build_steps().count(), 1);
    assert_eq!(plan.test_steps().count(), 2);
    let descs: Vec<_> = plan.test_steps().map(|t| t.description.as_str()).collect();
    assert!(descs[0].ends_with(", test 72"));
    assert!(descs[1].ends_with(", test 512"));
}

#[test]
fn expansion_is_deterministic() {
    let requests = [
        ExpandRequest::new(
            linux(Bits::B64, OptLevel::O1),
            RunDescriptor::new(true, "hybrid", false, Frontend::Valgrind).with_extra_args(&["--error_exitcode=1"]),
        ),
        ExpandRequest::new(
            linux(Bits::B32, OptLevel::O0),
            RunDescriptor::new(false, "phb", true, Frontend::Valgrind),
        ),
    ];
    let a = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();
    let b = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn invalid_axis_combination_yields_no_plan() {
    let requests = [
        ExpandRequest::new(
            linux(Bits::B64, OptLevel::O1),
            RunDescriptor::new(true, "phb", false, Frontend::Valgrind),
        ),
        ExpandRequest::new(
            VariantKey::new(TargetOs::Windows, Bits::B64, OptLevel::O0, false),
            RunDescriptor::new(true, "phb", false, Frontend::None),
        ),
    ];
    let err = expand(worker(), &requests, ExpansionPolicy::default()).unwrap_err();
    assert!(matches!(err, PlanError::Configuration { .. }));
}

#[test]
fn strict_policy_rejects_duplicate_descriptions() {
    let v = linux(Bits::B32, OptLevel::O1);
    let run = RunDescriptor::new(true, "phb", false, Frontend::None);
    let requests = [
        ExpandRequest::new(v.clone(), run.clone()),
        ExpandRequest::new(v, run),
    ];
    let policy = ExpansionPolicy {
        race_verifier: true,
        on_duplicate: DuplicatePolicy::Strict,
    };
    let err = expand(worker(), &requests, policy).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateDescription { .. }));
}

#[test]
fn suffix_policy_disambiguates_duplicates() {
    let v = linux(Bits::B32, OptLevel::O1);
    let run = RunDescriptor::new(true, "phb", false, Frontend::None);
    let requests = [
        ExpandRequest::new(v.clone(), run.clone()),
        ExpandRequest::new(v, run),
    ];
    let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();
    let descs: Vec<_> = plan.test_steps().map(|t| t.description.as_str()).collect();
    assert_ne!(descs[0], descs[1]);
    assert!(descs[1].ends_with(" #2"));
}

#[test]
fn suffixing_skips_names_already_in_the_plan() {
    let v = linux(Bits::B32, OptLevel::O1);
    let run = RunDescriptor::new(true, "phb", false, Frontend::None);

    // A prelude step already squats on the name the first dedup suffix
    // would mint.
    let mut plan = Plan::new(worker());
    plan.push(Step::Setup(ShellStep {
        description: format!("{} #2", describe(&v)),
        command: vec!["true".into()],
    }));

    let requests = [
        ExpandRequest::new(v.clone(), run.clone()),
        ExpandRequest::new(v.clone(), run),
    ];
    Expander::new(ExpansionPolicy::default()).run(&mut plan, &requests).unwrap();

    let descs: Vec<_> = plan.test_steps().map(|t| t.description.as_str()).collect();
    assert_eq!(descs[0], describe(&v));
    assert_eq!(descs[1], format!("{} #3", describe(&v)));

    let mut seen = std::collections::HashSet::new();
    for step in &plan.steps {
        if matches!(step, Step::Build(_)) {
            continue;
        }
        if let Some(d) = step.description() {
            assert!(seen.insert(d), "duplicate description: {d}");
        }
    }
}

#[test]
fn test_steps_appear_after_their_build_step() {
    let requests = [
        ExpandRequest::new(
            linux(Bits::B64, OptLevel::O1),
            RunDescriptor::new(true, "hybrid", false, Frontend::Valgrind),
        ),
        ExpandRequest::new(
            linux(Bits::B32, OptLevel::O1),
            RunDescriptor::new(true, "hybrid", false, Frontend::Valgrind),
        ),
        ExpandRequest::new(
            linux(Bits::B64, OptLevel::O1),
            RunDescriptor::new(false, "phb", false, Frontend::Valgrind),
        ),
    ];
    let plan = expand(worker(), &requests, ExpansionPolicy::default()).unwrap();
    for (i, step) in plan.steps.iter().enumerate() {
        if let Step::Test(t) = step {
            let build_pos = plan
                .steps
                .iter()
                .position(|s| matches!(s, Step::Build(b) if b.variant == t.variant))
                .unwrap();
            assert!(build_pos < i);
        }
    }
}
