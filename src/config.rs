use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Treatment of months with no sales inside a training window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Keep the window as observed.
    #[default]
    Passthrough,
    /// Insert missing months with zero sales.
    ZeroFill,
    /// Refuse to build a window with missing months.
    Error,
}

/// Independent variable of the linear trend fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TimeAxis {
    /// Position of the observation within the window (0, 1, 2, ...).
    #[default]
    Ordinal,
    /// Calendar months elapsed since the first month of the window.
    ElapsedMonths,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineOptions {
    pub gap_policy: GapPolicy,
    pub time_axis: TimeAxis,
}
