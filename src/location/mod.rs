// src/location/mod.rs
//! Location capability: providers, subscriptions and update filtering

pub mod gpsd;
pub mod nmea;
pub mod position;

pub use position::{Accuracy, Position};

use crate::error::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::{sync::mpsc, task::JoinHandle};

/// Update policy for a continuous position subscription.
///
/// An update is delivered when either the interval or the displacement
/// threshold triggers, whichever comes first. The defaults match the
/// workout service (1 second / 5 meters) and keep GPS jitter at rest
/// from being recorded as movement.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionOptions {
    pub accuracy: Accuracy,
    pub min_interval: Duration,
    pub min_displacement_meters: f64,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_interval: Duration::from_secs(1),
            min_displacement_meters: 5.0,
        }
    }
}

/// A live position subscription.
///
/// Owns the producer task reading from the underlying source; dropping or
/// cancelling the stream aborts the task and releases the GPS resource.
pub struct PositionStream {
    rx: mpsc::Receiver<Position>,
    producer: Option<JoinHandle<()>>,
}

impl PositionStream {
    /// Wrap a receiver whose producer is managed elsewhere (used by tests)
    pub fn from_receiver(rx: mpsc::Receiver<Position>) -> Self {
        Self { rx, producer: None }
    }

    /// Wrap a receiver together with the task feeding it
    pub fn with_producer(rx: mpsc::Receiver<Position>, producer: JoinHandle<()>) -> Self {
        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// Wait for the next position update; `None` once the source is gone
    pub async fn next(&mut self) -> Option<Position> {
        self.rx.recv().await
    }

    /// Stop the subscription and release the underlying source
    pub fn cancel(&mut self) {
        if let Some(task) = self.producer.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for PositionStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A source of position fixes (device GPS, gpsd daemon, serial NMEA unit).
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Request access to the location source.
    ///
    /// Fails with `PermissionDenied` when the device or daemon refuses
    /// access; no tracking state changes in that case.
    async fn request_permission(&self) -> Result<()>;

    /// Take a single position fix
    async fn current_position(&self, accuracy: Accuracy) -> Result<Position>;

    /// Open a continuous position subscription
    async fn subscribe(&self, options: SubscriptionOptions) -> Result<PositionStream>;
}

/// Gate deciding which raw fixes are forwarded to subscribers.
pub struct UpdateFilter {
    min_interval: Duration,
    min_displacement_meters: f64,
    last: Option<(Instant, Position)>,
}

impl UpdateFilter {
    pub fn new(options: &SubscriptionOptions) -> Self {
        Self {
            min_interval: options.min_interval,
            min_displacement_meters: options.min_displacement_meters,
            last: None,
        }
    }

    /// Decide whether a fix should be delivered.
    ///
    /// The first fix is always delivered; afterwards a fix passes when the
    /// interval has elapsed or the displacement threshold is exceeded.
    pub fn accept(&mut self, position: &Position, now: Instant) -> bool {
        let pass = match &self.last {
            None => true,
            Some((at, from)) => {
                now.duration_since(*at) >= self.min_interval
                    || from.distance_to(position) >= self.min_displacement_meters
            }
        };

        if pass {
            self.last = Some((now, *position));
        }
        pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SubscriptionOptions {
        SubscriptionOptions::default()
    }

    #[test]
    fn test_filter_accepts_first_fix() {
        let mut filter = UpdateFilter::new(&options());
        let p = Position::new(59.3293, 18.0686);
        assert!(filter.accept(&p, Instant::now()));
    }

    #[test]
    fn test_filter_rejects_jitter_at_rest() {
        let mut filter = UpdateFilter::new(&options());
        let now = Instant::now();
        let p = Position::new(59.3293, 18.0686);
        assert!(filter.accept(&p, now));

        // ~1 meter away, 100 ms later: below both thresholds
        let jitter = Position::new(59.329309, 18.0686);
        assert!(!filter.accept(&jitter, now + Duration::from_millis(100)));
    }

    #[test]
    fn test_filter_accepts_displacement_before_interval() {
        let mut filter = UpdateFilter::new(&options());
        let now = Instant::now();
        assert!(filter.accept(&Position::new(59.3293, 18.0686), now));

        // ~7.8 meters north after only 200 ms
        let moved = Position::new(59.32937, 18.0686);
        assert!(filter.accept(&moved, now + Duration::from_millis(200)));
    }

    #[test]
    fn test_filter_accepts_after_interval_without_movement() {
        let mut filter = UpdateFilter::new(&options());
        let now = Instant::now();
        let p = Position::new(59.3293, 18.0686);
        assert!(filter.accept(&p, now));
        assert!(filter.accept(&p, now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_stream_delivers_in_order_and_closes() {
        let (tx, rx) = mpsc::channel(8);
        let mut stream = PositionStream::from_receiver(rx);

        tx.send(Position::new(1.0, 1.0)).await.unwrap();
        tx.send(Position::new(2.0, 2.0)).await.unwrap();
        drop(tx);

        assert_eq!(stream.next().await.unwrap().latitude, 1.0);
        assert_eq!(stream.next().await.unwrap().latitude, 2.0);
        assert!(stream.next().await.is_none());
    }
}
