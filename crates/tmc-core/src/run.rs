use serde::{Deserialize, Serialize};

/// Instrumentation frontend wrapping the test binary at run time.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Frontend {
    Valgrind,
    Pin,
    PinWin,
    Memcheck,
    None,
}

impl Frontend {
    /// Whether the frontend performs two-pass race verification. Memcheck
    /// only checks memory, and bare runs have no recorder at all.
    pub fn supports_race_verifier(&self) -> bool {
        matches!(self, Frontend::Valgrind | Frontend::Pin | Frontend::PinWin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frontend::Valgrind => "valgrind",
            Frontend::Pin => "pin",
            Frontend::PinWin => "pin-win",
            Frontend::Memcheck => "memcheck",
            Frontend::None => "none",
        }
    }
}

/// Detector mode. Open set: `phb`, `hybrid`, `fast` and anything a builder
/// file names are all passed through opaquely to command construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ConcurrencyMode(pub String);

impl ConcurrencyMode {
    pub fn new(mode: impl Into<String>) -> Self {
        Self(mode.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One way of executing a compiled binary. Many run descriptors may share
/// a single variant; the build is only emitted once.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunDescriptor {
    pub debug_instrumentation: bool,
    pub mode: ConcurrencyMode,
    pub threaded: bool,
    pub frontend: Frontend,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub extra_test_args: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl RunDescriptor {
    pub fn new(debug_instrumentation: bool, mode: impl Into<String>, threaded: bool, frontend: Frontend) -> Self {
        Self {
            debug_instrumentation,
            mode: ConcurrencyMode::new(mode),
            threaded,
            frontend,
            extra_args: vec![],
            extra_test_args: vec![],
            timeout_secs: None,
        }
    }

    pub fn with_extra_args(mut self, args: &[&str]) -> Self {
        self.extra_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_extra_test_args(mut self, args: &[&str]) -> Self {
        self.extra_test_args = args.iter().map(|s| s.to_string()).collect();
        self
    }
}
