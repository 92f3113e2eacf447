use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DepthcamConfig {
    pub camera: CameraConfig,
    pub buffer: BufferConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Stream width in pixels, shared by depth and color
    #[serde(default = "default_camera_width")]
    pub width: u32,

    /// Stream height in pixels, shared by depth and color
    #[serde(default = "default_camera_height")]
    pub height: u32,

    /// Frames per second for both streams
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Product line a device must report to be selected (e.g. D400)
    #[serde(default = "default_product_line")]
    pub product_line: String,

    /// Restrict selection to this serial number
    #[serde(default)]
    pub serial: Option<String>,

    /// Auto exposure setting applied at startup; left untouched when unset
    #[serde(default)]
    pub auto_exposure: Option<bool>,

    /// Auto white balance setting applied at startup; left untouched when unset
    #[serde(default)]
    pub auto_white_balance: Option<bool>,

    /// How long the capture thread waits for a frameset before re-checking shutdown
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Generate frames instead of opening hardware
    #[serde(default)]
    pub synthetic: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BufferConfig {
    /// Number of pre-allocated slots per ring
    #[serde(default = "default_num_buffers")]
    pub num_buffers: usize,
}

impl CameraConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

impl DepthcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("depthcam.toml")
    }

    /// Load configuration from a specific file path
    ///
    /// Environment variables override the file, e.g. `DEPTHCAM_CAMERA__FPS=15`
    /// or `DEPTHCAM_BUFFER__NUM_BUFFERS=4`. Values stay strings until
    /// deserialization, so a serial such as `017322070419` keeps its leading zero.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.width", default_camera_width())?
            .set_default("camera.height", default_camera_height())?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.product_line", default_product_line())?
            .set_default("camera.wait_timeout_ms", default_wait_timeout_ms())?
            .set_default("camera.synthetic", false)?
            .set_default("buffer.num_buffers", default_num_buffers() as i64)?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("DEPTHCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: DepthcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.product_line.trim().is_empty() {
            return Err(ConfigError::Message(
                "Camera product_line must not be empty".to_string(),
            ));
        }

        if self.camera.wait_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Camera wait_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.buffer.num_buffers == 0 {
            return Err(ConfigError::Message(
                "Buffer num_buffers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for DepthcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            buffer: BufferConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: default_camera_width(),
            height: default_camera_height(),
            fps: default_camera_fps(),
            product_line: default_product_line(),
            serial: None,
            auto_exposure: None,
            auto_white_balance: None,
            wait_timeout_ms: default_wait_timeout_ms(),
            synthetic: false,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            num_buffers: default_num_buffers(),
        }
    }
}

fn default_camera_width() -> u32 {
    640
}
fn default_camera_height() -> u32 {
    480
}
fn default_camera_fps() -> u32 {
    30
}
fn default_product_line() -> String {
    "D400".to_string()
}
fn default_wait_timeout_ms() -> u64 {
    1000
}

fn default_num_buffers() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_depthcam_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with("DEPTHCAM_") {
                std::env::remove_var(key);
            }
        }
    }

    /// Sets `DEPTHCAM_*` variables for one test and removes every one on drop
    struct EnvGuard;

    impl EnvGuard {
        fn new(vars: &[(&str, &str)]) -> Self {
            clear_depthcam_env();
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            EnvGuard
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            clear_depthcam_env();
        }
    }

    #[test]
    fn test_default_config() {
        let config = DepthcamConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.camera.product_line, "D400");
        assert_eq!(config.buffer.num_buffers, 10);
        assert_eq!(config.camera.wait_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_validation() {
        let mut config = DepthcamConfig::default();
        config.camera.width = 0;
        assert!(config.validate().is_err());

        config.camera.width = 640;
        config.buffer.num_buffers = 0;
        assert!(config.validate().is_err());

        config.buffer.num_buffers = 4;
        config.camera.product_line = "  ".to_string();
        assert!(config.validate().is_err());

        config.camera.product_line = "D400".to_string();
        config.camera.fps = 0;
        assert!(config.validate().is_err());

        config.camera.fps = 15;
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let _env = EnvGuard::new(&[]);
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[camera]
width = 848
height = 480
fps = 15
serial = "123456789"
auto_exposure = true

[buffer]
num_buffers = 4
"#
        )
        .unwrap();

        let config = DepthcamConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.camera.width, 848);
        assert_eq!(config.camera.fps, 15);
        assert_eq!(config.camera.serial.as_deref(), Some("123456789"));
        assert_eq!(config.camera.auto_exposure, Some(true));
        assert_eq!(config.camera.auto_white_balance, None);
        // Unspecified values fall back to defaults
        assert_eq!(config.camera.product_line, "D400");
        assert_eq!(config.buffer.num_buffers, 4);
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        let _env = EnvGuard::new(&[]);
        let dir = tempfile::tempdir().unwrap();
        let config = DepthcamConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.camera.width, 640);
        assert_eq!(config.camera.height, 480);
        assert!(!config.camera.synthetic);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_keep_strings() {
        let _env = EnvGuard::new(&[
            ("DEPTHCAM_CAMERA__SERIAL", "017322070419"),
            ("DEPTHCAM_CAMERA__AUTO_EXPOSURE", "true"),
            ("DEPTHCAM_BUFFER__NUM_BUFFERS", "4"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let config = DepthcamConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.camera.serial.as_deref(), Some("017322070419"));
        assert_eq!(config.camera.auto_exposure, Some(true));
        assert_eq!(config.buffer.num_buffers, 4);
        assert_eq!(config.camera.width, 640);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let _env = EnvGuard::new(&[("DEPTHCAM_CAMERA__FPS", "6")]);
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[camera]\nfps = 15\nwidth = 848").unwrap();

        let config = DepthcamConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.camera.fps, 6);
        assert_eq!(config.camera.width, 848);
    }

    #[test]
    fn test_toml_output_parses_back() {
        let mut config = DepthcamConfig::default();
        config.camera.serial = Some("0042".to_string());

        let rendered = config.to_toml().unwrap();
        let parsed: DepthcamConfig = toml::from_str(&rendered).unwrap();

        assert_eq!(parsed, config);
    }
}
