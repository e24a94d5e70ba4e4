//! Flow: a reliable byte stream between two hosts, Go-Back-N over an
//! unreliable packet network. Each flow id has a sending side at the
//! source host and a receiving side at the destination host. Two separate
//! registry entries, never one shared object, matching how `Host.flows` is
//! scoped per-host in the source material.

pub mod congestion;
pub mod receiving;
pub mod sending;

use crate::env::Environment;
use crate::host::Host;
use crate::packet::Packet;
use crate::sim::Simulator;
pub use congestion::CongestionControl;
pub use receiving::ReceivingFlow;
pub use sending::{FlowState, SendingFlow};

#[derive(Debug)]
pub enum FlowEntry {
    Sending(SendingFlow),
    Receiving(ReceivingFlow),
}

impl FlowEntry {
    pub fn on_packet(&mut self, pkt: &Packet, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        match self {
            FlowEntry::Sending(f) => f.on_packet(pkt, host, env, sim),
            FlowEntry::Receiving(f) => f.on_packet(pkt, host, env, sim),
        }
    }
}
