//! Fixed sizes and unit-conversion factors used throughout the crate.

/// Fixed size of a Data packet, in bytes.
pub const DATA_PCK_SIZE: u32 = 1024;
/// Fixed size of an Ack packet, in bytes.
pub const ACK_PCK_SIZE: u32 = 64;
/// Fixed size of a Fin packet, in bytes.
pub const FIN_PCK_SIZE: u32 = 64;
/// Fixed size of a RoutingUpdate packet, in bytes.
pub const ROUTING_UPDATE_PCK_SIZE: u32 = 1024;

/// 1 Mbps expressed in bytes per millisecond: 1_000_000 / 8 / 1000.
pub const MBPS_TO_BYTES_PER_MS: f64 = 131.072;
/// KB (as used in the topology file) to bytes.
pub const KB_TO_BYTES: u32 = 1024;
/// MB (as used in the topology file) to bytes.
pub const MB_TO_BYTES: f64 = 1_048_576.0;

/// Window never shrinks below this during slow start / FAST updates.
pub const MIN_WINDOW: f64 = 1.0;
/// Retransmit timeout used before the first RTT sample exists.
pub const INITIAL_RTO_MS: f64 = 1_000.0;
/// Floor applied to `3 * rtt_latest` so a vanishing RTT sample can't collapse the timer.
pub const MIN_RTO_MS: f64 = 50.0;
/// Minimum spacing between counted duplicate ACKs.
pub const DUP_ACK_GAP_MS: f64 = 16.0;
/// Number of duplicate ACKs that triggers a fast retransmit.
pub const DUP_ACK_THRESHOLD: u32 = 3;
