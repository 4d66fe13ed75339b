use serde::{Deserialize, Serialize};

use crate::PlanError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    Windows,
}

impl TargetOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::Windows => "windows",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum Bits {
    B32,
    B64,
}

impl Bits {
    /// Toolchain arch name as it appears in binary paths.
    pub fn arch(&self) -> &'static str {
        match self {
            Bits::B32 => "x86",
            Bits::B64 => "amd64",
        }
    }

    pub fn width(&self) -> u8 {
        match self {
            Bits::B32 => 32,
            Bits::B64 => 64,
        }
    }
}

impl TryFrom<u8> for Bits {
    type Error = PlanError;

    fn try_from(v: u8) -> Result<Self, PlanError> {
        match v {
            32 => Ok(Bits::B32),
            64 => Ok(Bits::B64),
            other => Err(PlanError::configuration(format!("unsupported bit width: {other}"))),
        }
    }
}

impl From<Bits> for u8 {
    fn from(b: Bits) -> u8 {
        b.width()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptLevel {
    O0,
    O1,
}

impl OptLevel {
    pub fn level(&self) -> u8 {
        match self {
            OptLevel::O0 => 0,
            OptLevel::O1 => 1,
        }
    }
}

impl TryFrom<u8> for OptLevel {
    type Error = PlanError;

    fn try_from(v: u8) -> Result<Self, PlanError> {
        match v {
            0 => Ok(OptLevel::O0),
            1 => Ok(OptLevel::O1),
            other => Err(PlanError::configuration(format!("unsupported opt level: {other}"))),
        }
    }
}

impl From<OptLevel> for u8 {
    fn from(o: OptLevel) -> u8 {
        o.level()
    }
}

pub const DEFAULT_BASE_NAME: &str = "unit_tests";

fn default_base_name() -> String {
    DEFAULT_BASE_NAME.to_string()
}

/// Identity of one distinct compiled test binary. Structural equality over
/// all fields; used as the build-cache key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub os: TargetOs,
    pub bits: Bits,
    pub opt: OptLevel,
    #[serde(default)]
    pub static_link: bool,
    #[serde(default = "default_base_name")]
    pub base_name: String,
}

impl VariantKey {
    pub fn new(os: TargetOs, bits: Bits, opt: OptLevel, static_link: bool) -> Self {
        Self {
            os,
            bits,
            opt,
            static_link,
            base_name: default_base_name(),
        }
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }
}
