// src/location/nmea.rs
//! Serial NMEA location provider

use super::{
    position::{Accuracy, Position},
    LocationProvider, PositionStream, SubscriptionOptions, UpdateFilter,
};
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_serial::SerialPortBuilderExt;

/// How long to wait for a single fix before giving up
const FIX_TIMEOUT: Duration = Duration::from_secs(15);

/// Running fix state accumulated from NMEA sentences.
#[derive(Debug, Clone, Default)]
pub struct NmeaFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fix_quality: Option<u8>,
    pub hdop: Option<f64>,
}

impl NmeaFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single NMEA sentence to the accumulated state
    pub fn apply_sentence(&mut self, line: &str) {
        let parts: Vec<&str> = line.split(',').collect();

        if line.starts_with("$GPGGA") || line.starts_with("$GNGGA") {
            self.apply_gga(&parts);
        } else if line.starts_with("$GPRMC") || line.starts_with("$GNRMC") {
            self.apply_rmc(&parts);
        }
    }

    /// The current position, once a valid fix has been seen
    pub fn position(&self) -> Option<Position> {
        if self.fix_quality == Some(0) {
            return None;
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position {
                latitude,
                longitude,
                // HDOP scaled by a nominal 5 m UERE gives a rough accuracy figure
                accuracy: self.hdop.map(|h| h * 5.0),
                timestamp: Utc::now(),
            }),
            _ => None,
        }
    }

    /// GGA: Global Positioning System Fix Data
    fn apply_gga(&mut self, parts: &[&str]) {
        if parts.len() < 15 {
            return;
        }

        if let Some(latitude) = parse_coordinate(parts[2], parts[3], "S") {
            self.latitude = Some(latitude);
        }
        if let Some(longitude) = parse_coordinate(parts[4], parts[5], "W") {
            self.longitude = Some(longitude);
        }
        if let Ok(quality) = parts[6].parse::<u8>() {
            self.fix_quality = Some(quality);
        }
        if let Ok(hdop) = parts[8].parse::<f64>() {
            self.hdop = Some(hdop);
        }
    }

    /// RMC: Recommended Minimum sentence
    fn apply_rmc(&mut self, parts: &[&str]) {
        if parts.len() < 10 {
            return;
        }

        // Field 2 is the status flag; V means void
        if parts[2] != "A" {
            return;
        }

        if let Some(latitude) = parse_coordinate(parts[3], parts[4], "S") {
            self.latitude = Some(latitude);
        }
        if let Some(longitude) = parse_coordinate(parts[5], parts[6], "W") {
            self.longitude = Some(longitude);
        }
    }
}

/// Convert a ddmm.mmmm coordinate plus hemisphere into decimal degrees
fn parse_coordinate(value: &str, hemisphere: &str, negative: &str) -> Option<f64> {
    if value.is_empty() || hemisphere.is_empty() {
        return None;
    }

    let raw = value.parse::<f64>().ok()?;
    let degrees = (raw / 100.0) as i32;
    let minutes = raw % 100.0;
    let mut decimal = degrees as f64 + minutes / 60.0;
    if hemisphere == negative {
        decimal = -decimal;
    }
    Some(decimal)
}

/// Location provider backed by a serial NMEA GPS unit.
pub struct NmeaSerialProvider {
    port: String,
    baudrate: u32,
}

impl NmeaSerialProvider {
    pub fn new(port: impl Into<String>, baudrate: u32) -> Self {
        Self {
            port: port.into(),
            baudrate,
        }
    }

    fn open(&self) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(&self.port, self.baudrate)
            .timeout(Duration::from_millis(1000))
            .open_native_async()
            .map_err(|e| match e.kind() {
                tokio_serial::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                    TrackerError::PermissionDenied(format!(
                        "no access to serial port {}: {}",
                        self.port, e
                    ))
                }
                _ => TrackerError::LocationUnavailable(format!(
                    "failed to open serial port {}: {}",
                    self.port, e
                )),
            })
    }
}

#[async_trait]
impl LocationProvider for NmeaSerialProvider {
    async fn request_permission(&self) -> Result<()> {
        // Opening the device is the desktop analogue of a location grant
        self.open().map(|_| ())
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Position> {
        let serial = self.open()?;
        let mut reader = BufReader::new(serial);
        let mut line = String::new();
        let mut fix = NmeaFix::new();

        tokio::time::timeout(FIX_TIMEOUT, async {
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        return Err(TrackerError::LocationUnavailable(
                            "serial GPS stream ended".to_string(),
                        ))
                    }
                    Ok(_) => {
                        fix.apply_sentence(line.trim());
                        if let Some(position) = fix.position() {
                            return Ok(position);
                        }
                    }
                    Err(e) => return Err(TrackerError::Io(e)),
                }
            }
        })
        .await
        .map_err(|_| {
            TrackerError::LocationUnavailable("timed out waiting for a GPS fix".to_string())
        })?
    }

    async fn subscribe(&self, options: SubscriptionOptions) -> Result<PositionStream> {
        let serial = self.open()?;
        let (tx, rx) = mpsc::channel(32);
        let mut filter = UpdateFilter::new(&options);

        let producer = tokio::spawn(async move {
            let mut reader = BufReader::new(serial);
            let mut line = String::new();
            let mut fix = NmeaFix::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        fix.apply_sentence(line.trim());
                        if let Some(position) = fix.position() {
                            if !filter.accept(&position, Instant::now()) {
                                continue;
                            }
                            if tx.send(position).await.is_err() {
                                break; // subscriber is gone
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("Error reading from serial port: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(PositionStream::with_producer(rx, producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gga_produces_fix() {
        let mut fix = NmeaFix::new();
        fix.apply_sentence("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47");

        let position = fix.position().unwrap();
        assert!((position.latitude - 48.1173).abs() < 0.0001);
        assert!((position.longitude - 11.5166).abs() < 0.001);
        assert_eq!(fix.fix_quality, Some(1));
        assert_eq!(fix.hdop, Some(0.9));
    }

    #[test]
    fn test_gga_without_fix_quality_zero() {
        let mut fix = NmeaFix::new();
        fix.apply_sentence("$GPGGA,123519,4807.038,N,01131.000,E,0,00,,,M,,M,,*47");
        assert!(fix.position().is_none());
    }

    #[test]
    fn test_rmc_updates_position() {
        let mut fix = NmeaFix::new();
        fix.apply_sentence("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A");

        let position = fix.position().unwrap();
        assert!((position.latitude - 48.1173).abs() < 0.0001);
    }

    #[test]
    fn test_void_rmc_is_ignored() {
        let mut fix = NmeaFix::new();
        fix.apply_sentence("$GPRMC,123519,V,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A");
        assert!(fix.position().is_none());
    }

    #[test]
    fn test_southern_and_western_hemispheres() {
        let mut fix = NmeaFix::new();
        fix.apply_sentence("$GPGGA,123519,3351.000,S,15112.000,W,1,08,0.9,10.0,M,,M,,*47");

        let position = fix.position().unwrap();
        assert!(position.latitude < 0.0);
        assert!(position.longitude < 0.0);
    }

    #[test]
    fn test_unknown_sentence_is_ignored() {
        let mut fix = NmeaFix::new();
        fix.apply_sentence("$INVALID,123,456");
        assert!(fix.position().is_none());
    }
}
