//! Configuration: command-line targets, durations and plan files.

pub mod duration;
pub mod plan;
pub mod target;

pub use duration::parse_duration;
pub use plan::PlanConfig;
pub use target::{
    parse_json_filter, JsonTarget, ReadsTarget, TargetConfig, VariantAnnotationsTarget,
};
