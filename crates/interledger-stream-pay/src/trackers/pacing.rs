use crate::config::StreamPayerConfig;
use interledger_packet::ErrorCode;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Longest the sender ever waits before re-evaluating whether it can send.
const MAX_DELAY: Duration = Duration::from_secs(1);

/// Weight of the previous average when folding in a new round trip time.
const RTT_SMOOTHING: f64 = 0.9;

/// Decides when the next packet may be sent.
pub trait PacingTracker: Send + Sync {
    fn on_packet_sent(&self);

    fn on_packet_fulfilled(&self, round_trip_time: Duration);

    fn on_packet_rejected(&self, code: ErrorCode, round_trip_time: Duration);

    /// `None` if a packet can be sent right now, otherwise how long to wait.
    fn next_packet_delay(&self) -> Option<Duration>;

    fn packets_in_flight(&self) -> usize;

    fn packets_per_second(&self) -> f64;

    fn average_round_trip_time(&self) -> Duration;
}

/// Additive Increase, Multiplicative Decrease over a packets-per-second rate,
/// with a cap on packets in flight.
pub struct InMemoryPacingTracker {
    state: Mutex<PacingState>,
    increase: f64,
    decrease_factor: f64,
    min_packets_per_second: f64,
    max_packets_per_second: f64,
    max_in_flight: usize,
}

struct PacingState {
    packets_per_second: f64,
    last_sent_at: Option<Instant>,
    in_flight: usize,
    round_trip_time: Duration,
}

impl InMemoryPacingTracker {
    pub fn new(config: &StreamPayerConfig) -> Self {
        let min_packets_per_second = config.min_packets_per_second.max(1.0);
        let max_packets_per_second = config.max_packets_per_second.max(min_packets_per_second);
        InMemoryPacingTracker {
            state: Mutex::new(PacingState {
                packets_per_second: config
                    .initial_packets_per_second
                    .max(min_packets_per_second)
                    .min(max_packets_per_second),
                last_sent_at: None,
                in_flight: 0,
                round_trip_time: config.initial_round_trip_time(),
            }),
            increase: config.pacing_increase,
            decrease_factor: config.pacing_decrease_factor,
            min_packets_per_second,
            max_packets_per_second,
            max_in_flight: config.max_in_flight_packets.max(1),
        }
    }

    fn update_round_trip_time(state: &mut PacingState, sample: Duration) {
        let average = state.round_trip_time.as_secs_f64() * RTT_SMOOTHING
            + sample.as_secs_f64() * (1.0 - RTT_SMOOTHING);
        state.round_trip_time = Duration::from_secs_f64(average);
    }
}

impl PacingTracker for InMemoryPacingTracker {
    fn on_packet_sent(&self) {
        let mut state = self.state.lock();
        state.in_flight += 1;
        state.last_sent_at = Some(Instant::now());
    }

    fn on_packet_fulfilled(&self, round_trip_time: Duration) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        Self::update_round_trip_time(&mut state, round_trip_time);
        state.packets_per_second =
            (state.packets_per_second + self.increase).min(self.max_packets_per_second);
    }

    fn on_packet_rejected(&self, code: ErrorCode, round_trip_time: Duration) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        Self::update_round_trip_time(&mut state, round_trip_time);
        match code {
            ErrorCode::T02_PEER_BUSY
            | ErrorCode::T03_CONNECTOR_BUSY
            | ErrorCode::T04_INSUFFICIENT_LIQUIDITY
            | ErrorCode::T05_RATE_LIMITED => {
                state.packets_per_second = (state.packets_per_second * self.decrease_factor)
                    .max(self.min_packets_per_second);
                debug!(
                    "Rejected packet with {:?}, decreasing rate to {} packets per second",
                    code, state.packets_per_second
                );
            }
            _ => {}
        }
    }

    fn next_packet_delay(&self) -> Option<Duration> {
        let state = self.state.lock();
        if state.in_flight >= self.max_in_flight {
            return Some(state.round_trip_time.min(MAX_DELAY));
        }
        let last_sent_at = state.last_sent_at?;
        let interval = Duration::from_secs_f64(1.0 / state.packets_per_second);
        let elapsed = last_sent_at.elapsed();
        if elapsed >= interval {
            None
        } else {
            Some((interval - elapsed).min(MAX_DELAY))
        }
    }

    fn packets_in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    fn packets_per_second(&self) -> f64 {
        self.state.lock().packets_per_second
    }

    fn average_round_trip_time(&self) -> Duration {
        self.state.lock().round_trip_time
    }
}
