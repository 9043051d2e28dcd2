//! Analysis configuration files.

use crate::error::{MotorError, MotorResult};
use crate::model::MotorOutput;
use crate::params::MotorParams;
use pm_sim::StepMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One complete analysis: plant, loop and step settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub name: String,
    #[serde(default)]
    pub motor: MotorParams,
    #[serde(default)]
    pub output: MotorOutput,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub step: StepConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            name: "pmsm".to_string(),
            motor: MotorParams::default(),
            output: MotorOutput::default(),
            control: ControlConfig::default(),
            step: StepConfig::default(),
        }
    }
}

/// Control law closing the loop around the motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ControlConfig {
    #[default]
    OpenLoop,
    /// `u = r / kr − K·x`.
    StateFeedback {
        gain: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference_gain: Option<f64>,
        /// Choose `kr` so the closed-loop DC gain is one (overrides `reference_gain`).
        #[serde(default)]
        unity_dc_gain: bool,
    },
    /// `kp + ki / s` with unity negative feedback.
    Pi { kp: f64, ki: f64 },
    Pid {
        kp: f64,
        ti: f64,
        td: f64,
        td_filter: f64,
    },
}

impl ControlConfig {
    pub fn is_compensator(&self) -> bool {
        matches!(self, ControlConfig::Pi { .. } | ControlConfig::Pid { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    /// Final time (seconds).
    #[serde(default = "default_t_end")]
    pub t_end: f64,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default)]
    pub method: StepMethod,
}

fn default_amplitude() -> f64 {
    1.0
}

fn default_t_end() -> f64 {
    5.0
}

fn default_samples() -> usize {
    10_000
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            t_end: default_t_end(),
            samples: default_samples(),
            method: StepMethod::default(),
        }
    }
}

/// Cross-field checks that serde cannot express.
pub fn validate_config(config: &AnalysisConfig) -> MotorResult<()> {
    config.motor.validate()?;
    if let ControlConfig::StateFeedback { gain, .. } = &config.control {
        if gain.len() != 3 {
            return Err(MotorError::InvalidConfig {
                what: format!("state feedback gain needs 3 entries, got {}", gain.len()),
            });
        }
    }
    if config.control.is_compensator() && config.output == MotorOutput::All {
        return Err(MotorError::InvalidConfig {
            what: "compensator loops need a single output".to_string(),
        });
    }
    if !config.step.amplitude.is_finite() {
        return Err(MotorError::InvalidConfig {
            what: "step amplitude must be finite".to_string(),
        });
    }
    Ok(())
}

pub fn load_config(path: &Path) -> MotorResult<AnalysisConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AnalysisConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &AnalysisConfig) -> MotorResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
