use std::collections::BTreeMap;

use tmc_core::{binary_path, Frontend, PlanError, RunDescriptor, TargetOs, VariantKey};

/// Frontend launcher prefix. Bare runs have none; the analyzer arguments
/// are passed through the environment instead (see `test_command`).
pub fn launcher(frontend: Frontend) -> Vec<String> {
    match frontend {
        Frontend::Valgrind => vec!["./tsan.sh".to_string()],
        Frontend::Pin => vec!["./tsan_pin.sh".to_string()],
        Frontend::PinWin => vec!["tsan-pin.bat".to_string()],
        Frontend::Memcheck => vec!["./memcheck.sh".to_string()],
        Frontend::None => vec![],
    }
}

fn analyzer_args(run: &RunDescriptor) -> Vec<String> {
    let mut args = vec![format!("--mode={}", run.mode.as_str())];
    if run.debug_instrumentation {
        args.push("--debug".to_string());
    }
    args.extend(run.extra_args.iter().cloned());
    args
}

fn test_args(run: &RunDescriptor) -> Vec<String> {
    let mut args = run.extra_test_args.clone();
    if run.threaded {
        args.push("--threaded".to_string());
    }
    args
}

/// Frontend/os compatibility. The pin toolchain ships per-os launchers and
/// the valgrind-based ones only exist on linux.
pub fn validate_run(variant: &VariantKey, run: &RunDescriptor) -> Result<(), PlanError> {
    match (run.frontend, variant.os) {
        (Frontend::PinWin, TargetOs::Windows) => Ok(()),
        (Frontend::PinWin, other) => Err(PlanError::configuration(format!(
            "frontend pin-win requires windows, got {}",
            other.as_str()
        ))),
        (Frontend::Valgrind | Frontend::Memcheck | Frontend::Pin, TargetOs::Linux) => Ok(()),
        (f @ (Frontend::Valgrind | Frontend::Memcheck | Frontend::Pin), other) => Err(PlanError::configuration(
            format!("frontend {} requires linux, got {}", f.as_str(), other.as_str()),
        )),
        (Frontend::None, _) => Ok(()),
    }
}

/// Pure argv + env derivation for one (variant, run) pair. Distinct runs
/// of the same binary always yield distinct commands or environments.
pub fn test_command(
    variant: &VariantKey,
    run: &RunDescriptor,
    pin_root: Option<&str>,
) -> (Vec<String>, BTreeMap<String, String>) {
    let binary = binary_path(variant);
    let mut env = BTreeMap::new();
    if let Some(root) = pin_root {
        if matches!(run.frontend, Frontend::Pin | Frontend::PinWin) {
            env.insert("PIN_ROOT".to_string(), root.to_string());
        }
    }

    let mut command = launcher(run.frontend);
    if run.frontend == Frontend::None {
        // No wrapper to take flags; hand them to the runtime via env.
        env.insert("TSAN_ARGS".to_string(), analyzer_args(run).join(" "));
    } else {
        command.extend(analyzer_args(run));
    }
    command.push(binary);
    command.extend(test_args(run));
    (command, env)
}

/// Log artifact shared by the two race-verifier passes. Derived from the
/// variant so both passes agree on the file without shared state.
pub fn race_verifier_log(variant: &VariantKey) -> String {
    format!("{}.raceverifier.log", binary_path(variant))
}

/// Pass 1: run only the race-verifier suite and record suspected races.
pub fn race_verifier_first_pass(run: &RunDescriptor, log: &str) -> RunDescriptor {
    let mut rv = run.clone();
    rv.extra_args.push("--show-expected-races".to_string());
    rv.extra_args.push(format!("--record-races={log}"));
    rv.extra_test_args.push("--gtest_filter=RaceVerifierTests.*".to_string());
    rv
}

/// Pass 2: replay targeting only the candidates recorded by pass 1.
pub fn race_verifier_second_pass(run: &RunDescriptor, log: &str) -> RunDescriptor {
    let mut rv = run.clone();
    rv.extra_args.push(format!("--race-verifier={log}"));
    rv.extra_test_args.push("--gtest_filter=RaceVerifierTests.*".to_string());
    rv
}
