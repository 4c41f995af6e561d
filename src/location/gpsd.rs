// src/location/gpsd.rs
//! gpsd-backed location provider

use super::{
    position::{Accuracy, Position},
    LocationProvider, PositionStream, SubscriptionOptions, UpdateFilter,
};
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc,
};

/// How long to wait for a single fix before giving up
const FIX_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(flatten)]
    data: HashMap<String, serde_json::Value>,
}

/// Location provider backed by a gpsd daemon.
pub struct GpsdProvider {
    host: String,
    port: u16,
}

impl GpsdProvider {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Connect, enable JSON watching, and return a line reader
    async fn connect(&self) -> Result<BufReader<TcpStream>> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                TrackerError::PermissionDenied(format!(
                    "cannot reach gpsd at {}:{}: {}",
                    self.host, self.port, e
                ))
            })?;

        let watch_cmd = "?WATCH={\"enable\":true,\"json\":true}\n";
        stream.write_all(watch_cmd.as_bytes()).await.map_err(|e| {
            TrackerError::LocationUnavailable(format!("failed to send WATCH command: {}", e))
        })?;

        Ok(BufReader::new(stream))
    }
}

/// Parse one line of gpsd JSON; `Ok(Some(_))` for a TPV message with a 2D fix
pub fn parse_tpv_position(line: &str) -> Result<Option<Position>> {
    let msg: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| TrackerError::Parse(format!("bad gpsd JSON: {}", e)))?;

    if msg.class != "TPV" {
        return Ok(None);
    }

    // Mode 2 (2D) or 3 (3D) is required for a usable fix
    let mode = msg.data.get("mode").and_then(|v| v.as_u64()).unwrap_or(0);
    if mode < 2 {
        return Ok(None);
    }

    let lat = msg.data.get("lat").and_then(|v| v.as_f64());
    let lon = msg.data.get("lon").and_then(|v| v.as_f64());

    match (lat, lon) {
        (Some(latitude), Some(longitude)) => Ok(Some(Position {
            latitude,
            longitude,
            accuracy: msg.data.get("eph").and_then(|v| v.as_f64()),
            timestamp: Utc::now(),
        })),
        _ => Ok(None),
    }
}

#[async_trait]
impl LocationProvider for GpsdProvider {
    async fn request_permission(&self) -> Result<()> {
        // Access to the daemon is the desktop analogue of a location grant
        self.connect().await.map(|_| ())
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Position> {
        let mut reader = self.connect().await?;
        let mut line = String::new();

        let fix = tokio::time::timeout(FIX_TIMEOUT, async {
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        return Err(TrackerError::LocationUnavailable(
                            "gpsd closed the connection".to_string(),
                        ))
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        // Tolerate unparseable interleaved messages
                        if let Ok(Some(position)) = parse_tpv_position(trimmed) {
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
        })??;

        Ok(fix)
    }

    async fn subscribe(&self, options: SubscriptionOptions) -> Result<PositionStream> {
        let mut reader = self.connect().await?;
        let (tx, rx) = mpsc::channel(32);
        let mut filter = UpdateFilter::new(&options);

        let producer = tokio::spawn(async move {
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        if let Ok(Some(position)) = parse_tpv_position(trimmed) {
                            if !filter.accept(&position, Instant::now()) {
                                continue;
                            }
                            if tx.send(position).await.is_err() {
                                break; // subscriber is gone
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("Error reading from gpsd: {}", e);
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
    fn test_tpv_with_fix() {
        let json = r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":3,"time":"2023-01-01T12:00:00.000Z","lat":48.117,"lon":11.517,"alt":545.4,"eph":8.5,"speed":0.091}"#;
        let position = parse_tpv_position(json).unwrap().unwrap();
        assert_eq!(position.latitude, 48.117);
        assert_eq!(position.longitude, 11.517);
        assert_eq!(position.accuracy, Some(8.5));
    }

    #[test]
    fn test_tpv_without_fix_is_skipped() {
        let json = r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":1}"#;
        assert!(parse_tpv_position(json).unwrap().is_none());
    }

    #[test]
    fn test_non_tpv_messages_are_skipped() {
        let json = r#"{"class":"SKY","device":"/dev/ttyUSB0","hdop":1.2,"satellites":[]}"#;
        assert!(parse_tpv_position(json).unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_tpv_position(r#"{"invalid": json"#).is_err());
    }
}
