//! Configuration module for archrisk
//!
//! This module handles:
//! - Project-level configuration (archrisk.toml)
//! - Rule enablement and threshold overrides
//! - Attractiveness estimator selection
//! - CLI defaults

mod project_config;

pub use project_config::{
    AttractivenessConfig,
    CliDefaults,
    ProjectConfig,
    RuleConfigOverride,
    ThresholdValue,
    TrackingConfig,
    load_project_config,
    normalize_rule_name,
    DEFAULT_TRACKING_FILE,
};
