use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use segway_control::{ActuatorLimits, ControlGains};
use segway_physics::{Part, WorldSettings};
use serde::Deserialize;
use tracing::{error, info};

use crate::controller::ControllerSettings;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_VAR: &str = "SEGWAY_CONFIG";
const ENV_PREFIX: &str = "SEGWAY";

/// Everything the binary needs to build and drive a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SimulationConfig {
    pub actuators: ActuatorLimits,
    pub control: ControlSettings,
    #[serde(default)]
    pub physics: WorldSettings,
    #[serde(default)]
    pub frontend: FrontendSettings,
}

/// Balance law parameters as they appear in the `[control]` table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ControlSettings {
    pub proportional_gain_left: f64,
    pub proportional_gain_right: f64,
    #[serde(default)]
    pub steering_bias: f64,
    #[serde(default)]
    pub base_speed: f64,
    #[serde(default = "default_reference_part")]
    pub reference_part: Part,
}

fn default_reference_part() -> Part {
    Part::Handle
}

impl ControlSettings {
    pub fn gains(&self) -> ControlGains {
        ControlGains {
            proportional_gain_left: self.proportional_gain_left,
            proportional_gain_right: self.proportional_gain_right,
            steering_bias: self.steering_bias,
            base_speed: self.base_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontendMode {
    /// Macroquad window drawing the rig every frame.
    Window,
    /// No window; frames are paced on the main thread.
    Headless,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontendSettings {
    pub mode: FrontendMode,
    /// Stop after this many frames. Runs until closed or failed when unset.
    pub frames: Option<u64>,
    /// Headless frame rate (Hz).
    pub frame_rate: f64,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        FrontendSettings {
            mode: FrontendMode::Window,
            frames: None,
            frame_rate: 60.0,
        }
    }
}

impl SimulationConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            limits: self.actuators,
            gains: self.control.gains(),
            reference_part: self.control.reference_part,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |e: &dyn std::fmt::Display| ConfigError::Message(e.to_string());
        self.actuators.validate().map_err(|e| invalid(&e))?;
        self.control.gains().validate().map_err(|e| invalid(&e))?;
        if !(self.physics.timestep.is_finite() && self.physics.timestep > 0.0) {
            return Err(ConfigError::Message("physics.timestep must be finite and positive".into()));
        }
        if !(self.frontend.frame_rate.is_finite() && self.frontend.frame_rate > 0.0) {
            return Err(ConfigError::Message("frontend.frame_rate must be finite and positive".into()));
        }
        Ok(())
    }
}

/// Load the configuration file named by `SEGWAY_CONFIG`, or the default one.
pub fn load_config() -> Result<SimulationConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(&path)
}

/// Load `path` layered with `SEGWAY_`-prefixed environment variables
/// (`SEGWAY_CONTROL__STEERING_BIAS=0.5`).
pub fn load_config_from(path: &str) -> Result<SimulationConfig, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let builder = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    match finish(builder) {
        Ok(config) => {
            info!(?config, "Successfully loaded configuration.");
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

/// Parse a TOML document without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<SimulationConfig, ConfigError> {
    finish(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<SimulationConfig, ConfigError> {
    let config: SimulationConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [actuators]
        max_left_torque = 50.0
        max_right_torque = 40.0

        [control]
        proportional_gain_left = -25.0
        proportional_gain_right = -20.0
    "#;

    #[test]
    fn test_minimal_document_uses_defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.actuators.max_right_torque, 40.0);
        assert_eq!(config.control.steering_bias, 0.0);
        assert_eq!(config.control.base_speed, 0.0);
        assert_eq!(config.control.reference_part, Part::Handle);
        assert_eq!(config.physics, WorldSettings::default());
        assert_eq!(config.frontend, FrontendSettings::default());

        let settings = config.controller_settings();
        assert_eq!(settings.gains.proportional_gain_right, -20.0);
        assert_eq!(settings.reference_part, Part::Handle);
    }

    #[test]
    fn test_shipped_default_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let text = std::fs::read_to_string(path).unwrap();
        let config = load_config_from_str(&text).unwrap();
        assert!(config.actuators.max_left_torque > 0.0);
        assert_eq!(config.control.reference_part, Part::Handle);
        assert_eq!(config.frontend.mode, FrontendMode::Window);
    }

    #[test]
    fn test_frontend_and_reference_part() {
        let text = format!(
            "{MINIMAL}\nreference_part = \"base\"\n\n[frontend]\nmode = \"headless\"\nframes = 300\n"
        );
        let config = load_config_from_str(&text).unwrap();
        assert_eq!(config.control.reference_part, Part::Base);
        assert_eq!(config.frontend.mode, FrontendMode::Headless);
        assert_eq!(config.frontend.frames, Some(300));
        assert_eq!(config.frontend.frame_rate, 60.0);
    }

    #[test]
    fn test_unknown_part_rejected() {
        let text = format!("{MINIMAL}\nreference_part = \"tail\"\n");
        assert!(load_config_from_str(&text).is_err());
    }

    #[test]
    fn test_missing_gain_rejected() {
        let text = r#"
            [actuators]
            max_left_torque = 50.0
            max_right_torque = 50.0

            [control]
            proportional_gain_left = 1.0
        "#;
        assert!(load_config_from_str(text).is_err());
    }

    #[test]
    fn test_negative_torque_rejected() {
        let text = MINIMAL.replace("max_left_torque = 50.0", "max_left_torque = -1.0");
        assert!(load_config_from_str(&text).is_err());
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        let text = format!("{MINIMAL}\n[physics]\ntimestep = 0.0\n");
        assert!(load_config_from_str(&text).is_err());
    }
}
