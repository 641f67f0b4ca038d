use std::path::Path;

use serde::Deserialize;

use crate::error::{DriverError, Result};

/// Configuration for the virtual device
///
/// Read once when the driver is constructed. Every field has a default, so a
/// JSON file only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Device name shown to users (default: "`AppFaders` Virtual Device")
    pub device_name: String,

    /// Manufacturer string
    pub manufacturer: String,

    /// Persistent device UID
    pub device_uid: String,

    /// Model UID
    pub model_uid: String,

    /// Nominal sample rate at startup (default: 48 kHz)
    pub sample_rate: f64,

    /// Rates the host may switch to
    pub supported_sample_rates: Vec<f64>,

    /// Interleaved channel count of both streams (default: 2)
    pub channels: u32,

    /// Nominal IO buffer size in frames (default: 512)
    pub buffer_frame_size: u32,

    /// Largest IO buffer the render path accepts (default: 4096)
    pub max_buffer_frame_size: u32,

    /// Frames between zero time stamps, also the loopback ring size
    /// (default: 16384)
    pub zero_timestamp_period: u32,

    /// Device latency in frames (default: 0)
    pub latency_frames: u32,

    /// Safety offset in frames (default: 0)
    pub safety_offset_frames: u32,

    /// Frames a full-scale (0.0 to 1.0) gain change takes to ramp
    /// (default: 480, 10 ms at 48 kHz)
    pub gain_ramp_frames: u32,

    /// Upper clamp for client gain (default: 2.0)
    pub max_gain: f32,

    /// Number of gain slots; must be a power of two (default: 256)
    pub max_clients: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_name: "AppFaders Virtual Device".to_string(),
            manufacturer: "AppFaders".to_string(),
            device_uid: "com.appfaders.driver.device".to_string(),
            model_uid: "com.appfaders.driver.model".to_string(),
            sample_rate: 48_000.0,
            supported_sample_rates: vec![44_100.0, 48_000.0, 88_200.0, 96_000.0],
            channels: 2,
            buffer_frame_size: 512,
            max_buffer_frame_size: 4096,
            zero_timestamp_period: 16_384,
            latency_frames: 0,
            safety_offset_frames: 0,
            gain_ramp_frames: 480,
            max_gain: 2.0,
            max_clients: 256,
        }
    }
}

impl DriverConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// Load overrides from a JSON file and validate the result
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Config` if the file cannot be read or parsed, or
    /// `DriverError::InvalidConfig` if a value is out of range.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DriverError::Config {
            message: format!("failed to read {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::from_json_str(&text)
    }

    /// Parse overrides from a JSON string and validate the result
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Config` on malformed JSON, or
    /// `DriverError::InvalidConfig` if a value is out of range.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| DriverError::Config {
            message: "failed to parse configuration".to_string(),
            source: Some(Box::new(e)),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a usable device
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> DriverError {
            DriverError::InvalidConfig {
                field,
                reason: reason.into(),
            }
        }

        if self.channels == 0 {
            return Err(invalid("channels", "must be at least 1"));
        }
        if self.supported_sample_rates.is_empty() {
            return Err(invalid("supported_sample_rates", "must not be empty"));
        }
        if self
            .supported_sample_rates
            .iter()
            .any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(invalid("supported_sample_rates", "rates must be positive"));
        }
        if !self.supports_rate(self.sample_rate) {
            return Err(invalid(
                "sample_rate",
                format!("{} is not in supported_sample_rates", self.sample_rate),
            ));
        }
        if self.buffer_frame_size == 0 || self.buffer_frame_size > self.max_buffer_frame_size {
            return Err(invalid(
                "buffer_frame_size",
                "must be between 1 and max_buffer_frame_size",
            ));
        }
        if self.zero_timestamp_period < self.max_buffer_frame_size {
            return Err(invalid(
                "zero_timestamp_period",
                "must be at least max_buffer_frame_size",
            ));
        }
        if self.gain_ramp_frames == 0 {
            return Err(invalid("gain_ramp_frames", "must be at least 1"));
        }
        if !self.max_gain.is_finite() || self.max_gain < 1.0 {
            return Err(invalid("max_gain", "must be finite and at least 1.0"));
        }
        if self.max_clients == 0 || !self.max_clients.is_power_of_two() {
            return Err(invalid("max_clients", "must be a non-zero power of two"));
        }
        Ok(())
    }

    /// Check whether `rate` is one of the supported sample rates
    #[must_use]
    pub fn supports_rate(&self, rate: f64) -> bool {
        self.supported_sample_rates
            .iter()
            .any(|r| (r - rate).abs() < f64::EPSILON)
    }

    /// Per-frame gain increment of the smoothing ramp
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn gain_ramp_step(&self) -> f32 {
        1.0 / self.gain_ramp_frames as f32
    }
}

/// Builder for `DriverConfig`
#[derive(Debug, Clone, Default)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// Set the device name
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.config.device_name = name.into();
        self
    }

    /// Set the device UID
    #[must_use]
    pub fn device_uid(mut self, uid: impl Into<String>) -> Self {
        self.config.device_uid = uid.into();
        self
    }

    /// Set the startup sample rate
    #[must_use]
    pub fn sample_rate(mut self, rate: f64) -> Self {
        self.config.sample_rate = rate;
        self
    }

    /// Set the supported sample rates
    #[must_use]
    pub fn supported_sample_rates(mut self, rates: impl Into<Vec<f64>>) -> Self {
        self.config.supported_sample_rates = rates.into();
        self
    }

    /// Set the channel count
    #[must_use]
    pub fn channels(mut self, channels: u32) -> Self {
        self.config.channels = channels;
        self
    }

    /// Set the nominal IO buffer size
    #[must_use]
    pub fn buffer_frame_size(mut self, frames: u32) -> Self {
        self.config.buffer_frame_size = frames;
        self
    }

    /// Set the zero time stamp period
    #[must_use]
    pub fn zero_timestamp_period(mut self, frames: u32) -> Self {
        self.config.zero_timestamp_period = frames;
        self
    }

    /// Set the gain ramp length
    #[must_use]
    pub fn gain_ramp_frames(mut self, frames: u32) -> Self {
        self.config.gain_ramp_frames = frames;
        self
    }

    /// Set the gain clamp
    #[must_use]
    pub fn max_gain(mut self, gain: f32) -> Self {
        self.config.max_gain = gain;
        self
    }

    /// Set the gain slot count
    #[must_use]
    pub fn max_clients(mut self, count: usize) -> Self {
        self.config.max_clients = count;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> DriverConfig {
        self.config
    }
}
