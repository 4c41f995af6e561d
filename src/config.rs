// src/config.rs
//! Configuration management

use crate::api::DEFAULT_API_URL;
use crate::error::{Result, TrackerError};
use crate::location::{Accuracy, SubscriptionOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the workout API
    pub api_base_url: String,
    /// Location source: "gpsd" or "serial"
    pub source_type: String,
    pub gpsd_host: Option<String>,
    pub gpsd_port: Option<u16>,
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    /// Minimum milliseconds between recorded position updates
    pub update_interval_ms: Option<u64>,
    /// Minimum meters of displacement between recorded position updates
    pub min_displacement_meters: Option<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            source_type: "gpsd".to_string(),
            gpsd_host: Some("localhost".to_string()),
            gpsd_port: Some(2947),
            serial_port: None,
            serial_baudrate: Some(9600),
            update_interval_ms: Some(1000),
            min_displacement_meters: Some(5.0),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from the config file, falling back to defaults
    /// when none exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| TrackerError::Other(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| TrackerError::Other(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the config file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrackerError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TrackerError::Other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| TrackerError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| TrackerError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("cardio-tracker")
            .join("config.json"))
    }

    /// The subscription policy configured for live tracking
    pub fn subscription_options(&self) -> SubscriptionOptions {
        let defaults = SubscriptionOptions::default();
        SubscriptionOptions {
            accuracy: Accuracy::High,
            min_interval: self
                .update_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_interval),
            min_displacement_meters: self
                .min_displacement_meters
                .unwrap_or(defaults.min_displacement_meters),
        }
    }

    /// Point the client at a different API instance
    pub fn update_api_url(&mut self, url: String) {
        self.api_base_url = url;
    }

    /// Switch to the gpsd source
    pub fn update_gpsd(&mut self, host: String, port: u16) {
        self.source_type = "gpsd".to_string();
        self.gpsd_host = Some(host);
        self.gpsd_port = Some(port);
    }

    /// Switch to the serial NMEA source
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.source_type, "gpsd");
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.gpsd_port, Some(2947));
    }

    #[test]
    fn test_default_subscription_options() {
        let options = TrackerConfig::default().subscription_options();
        assert_eq!(options.min_interval, Duration::from_secs(1));
        assert_eq!(options.min_displacement_meters, 5.0);
    }

    #[test]
    fn test_update_serial() {
        let mut config = TrackerConfig::default();
        config.update_serial("/dev/ttyUSB0".to_string(), 115200);
        assert_eq!(config.source_type, "serial");
        assert_eq!(config.serial_port, Some("/dev/ttyUSB0".to_string()));
        assert_eq!(config.serial_baudrate, Some(115200));
    }

    #[test]
    fn test_update_gpsd() {
        let mut config = TrackerConfig::default();
        config.update_gpsd("gps.local".to_string(), 2948);
        assert_eq!(config.source_type, "gpsd");
        assert_eq!(config.gpsd_host, Some("gps.local".to_string()));
        assert_eq!(config.gpsd_port, Some(2948));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = TrackerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.source_type, config.source_type);
        assert_eq!(parsed.api_base_url, config.api_base_url);
    }
}
