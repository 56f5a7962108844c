use serde::Deserialize;
use std::time::Duration;

fn default_packet_expiry() -> u64 {
    30000
}
fn default_max_probe_packets() -> u32 {
    40
}
fn default_probe_timeout() -> u64 {
    10000
}
fn default_probe_concurrency() -> usize {
    5
}
fn default_max_probe_retries() -> u32 {
    3
}
fn default_rate_convergence_threshold() -> f64 {
    0.0001
}
fn default_initial_packets_per_second() -> f64 {
    40.0
}
fn default_min_packets_per_second() -> f64 {
    1.0
}
fn default_max_packets_per_second() -> f64 {
    200.0
}
fn default_pacing_increase() -> f64 {
    0.5
}
fn default_pacing_decrease_factor() -> f64 {
    0.5
}
fn default_max_in_flight_packets() -> usize {
    20
}
fn default_initial_round_trip_time() -> u64 {
    200
}
fn default_idle_timeout() -> u64 {
    60000
}
fn default_max_consecutive_rejects() -> u32 {
    50
}

/// Tunables for quoting and sending. Durations are in milliseconds.
///
/// Every field has a default, so an empty document deserializes to
/// `StreamPayerConfig::default()`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StreamPayerConfig {
    /// How long a Prepare may be in flight before it expires
    #[serde(default = "default_packet_expiry")]
    pub packet_expiry: u64,
    /// Upper bound on packets sent while probing a path
    #[serde(default = "default_max_probe_packets")]
    pub max_probe_packets: u32,
    /// Probing gives up after this long
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,
    /// Probe packets in flight at once
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
    /// Times a probe amount is retried after a temporary reject
    #[serde(default = "default_max_probe_retries")]
    pub max_probe_retries: u32,
    /// Probing may stop once `(upper - lower) / lower` falls below this
    #[serde(default = "default_rate_convergence_threshold")]
    pub rate_convergence_threshold: f64,
    #[serde(default = "default_initial_packets_per_second")]
    pub initial_packets_per_second: f64,
    #[serde(default = "default_min_packets_per_second")]
    pub min_packets_per_second: f64,
    #[serde(default = "default_max_packets_per_second")]
    pub max_packets_per_second: f64,
    /// Added to the packet rate after each fulfill
    #[serde(default = "default_pacing_increase")]
    pub pacing_increase: f64,
    /// Packet rate is multiplied by this after congestion rejects
    #[serde(default = "default_pacing_decrease_factor")]
    pub pacing_decrease_factor: f64,
    #[serde(default = "default_max_in_flight_packets")]
    pub max_in_flight_packets: usize,
    /// Round trip estimate before any reply has been seen
    #[serde(default = "default_initial_round_trip_time")]
    pub initial_round_trip_time: u64,
    /// A payment fails if nothing is fulfilled for this long
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
    /// Temporary or relative rejects in a row before a payment fails
    #[serde(default = "default_max_consecutive_rejects")]
    pub max_consecutive_rejects: u32,
}

impl StreamPayerConfig {
    pub fn packet_expiry(&self) -> Duration {
        Duration::from_millis(self.packet_expiry)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout)
    }

    pub fn initial_round_trip_time(&self) -> Duration {
        Duration::from_millis(self.initial_round_trip_time)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout)
    }
}

impl Default for StreamPayerConfig {
    fn default() -> Self {
        StreamPayerConfig {
            packet_expiry: default_packet_expiry(),
            max_probe_packets: default_max_probe_packets(),
            probe_timeout: default_probe_timeout(),
            probe_concurrency: default_probe_concurrency(),
            max_probe_retries: default_max_probe_retries(),
            rate_convergence_threshold: default_rate_convergence_threshold(),
            initial_packets_per_second: default_initial_packets_per_second(),
            min_packets_per_second: default_min_packets_per_second(),
            max_packets_per_second: default_max_packets_per_second(),
            pacing_increase: default_pacing_increase(),
            pacing_decrease_factor: default_pacing_decrease_factor(),
            max_in_flight_packets: default_max_in_flight_packets(),
            initial_round_trip_time: default_initial_round_trip_time(),
            idle_timeout: default_idle_timeout(),
            max_consecutive_rejects: default_max_consecutive_rejects(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: StreamPayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StreamPayerConfig::default());
        assert_eq!(config.packet_expiry(), Duration::from_secs(30));
        assert_eq!(config.max_in_flight_packets, 20);
        assert_eq!(config.max_probe_packets, 40);
    }

    #[test]
    fn overrides_individual_fields() {
        let config: StreamPayerConfig =
            serde_json::from_str(r#"{"probe_timeout": 500, "max_in_flight_packets": 2}"#).unwrap();
        assert_eq!(config.probe_timeout(), Duration::from_millis(500));
        assert_eq!(config.max_in_flight_packets, 2);
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
    }
}
