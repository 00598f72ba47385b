//! Configuration types deserialized from `tock.toml`.

use serde::Deserialize;

use crate::error::InvalidSetting;

/// The top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Kernel settings (settling bound, visitation order, reset length).
    #[serde(default)]
    pub sim: KernelConfig,
    /// Which advisories are reported to the diagnostic sink.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl SimConfig {
    /// Checks the value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        if self.sim.settle_limit_factor == 0 {
            return Err(InvalidSetting {
                key: "sim.settle_limit_factor",
                requirement: "must be greater than 0",
            });
        }
        if self.sim.reset_cycles == 0 {
            return Err(InvalidSetting {
                key: "sim.reset_cycles",
                requirement: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Settings for the settle/commit loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelConfig {
    /// Evaluation budget per settle, as a multiple of the block count.
    /// Exceeding it is reported as a combinational loop.
    #[serde(default = "default_settle_limit_factor")]
    pub settle_limit_factor: u32,
    /// Order in which pending blocks are visited while settling.
    #[serde(default)]
    pub settle_order: SettleOrder,
    /// Number of cycles `reset` is held asserted by `Simulator::reset`.
    #[serde(default = "default_reset_cycles")]
    pub reset_cycles: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            settle_limit_factor: default_settle_limit_factor(),
            settle_order: SettleOrder::default(),
            reset_cycles: default_reset_cycles(),
        }
    }
}

fn default_settle_limit_factor() -> u32 {
    64
}

fn default_reset_cycles() -> u32 {
    1
}

/// Worklist discipline used while settling combinational logic.
///
/// The fixpoint does not depend on the order; only the number of block
/// evaluations does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettleOrder {
    /// Lowest dependency rank first; acyclic logic settles in one pass.
    #[default]
    Ranked,
    /// First scheduled, first evaluated.
    Fifo,
    /// Last scheduled, first evaluated.
    Lifo,
}

/// Reporting policy for a class of advisory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Report {
    /// Emit a warning diagnostic.
    #[default]
    Warn,
    /// Stay silent.
    Allow,
}

impl Report {
    /// Returns true if the advisory should be emitted.
    pub fn enabled(self) -> bool {
        self == Report::Warn
    }
}

/// Advisory reporting settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Values truncated to fit a narrower signal.
    #[serde(default)]
    pub width_overflow: Report,
    /// Combinational cycles found in the block graph at elaboration.
    #[serde(default)]
    pub combinational_cycles: Report,
    /// Wires and output ports nothing drives.
    #[serde(default)]
    pub undriven: Report,
}
