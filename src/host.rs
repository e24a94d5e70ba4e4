//! 主机
//!
//! 拥有一条链路挂接和一张流表。入站包按 `flow_id` 路由给对应流，首次遇到
//! 未知 `flow_id` 时自动创建接收流；出站包直接推给挂接的链路（单链路主机
//! 没有冲突模型）。

use crate::env::Environment;
use crate::error::{invariant, SimError};
use crate::flow::{FlowEntry, ReceivingFlow};
use crate::ids::{FlowId, LinkId, NodeId};
use crate::packet::{Packet, PacketKind};
use crate::sim::Simulator;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Host {
    pub id: NodeId,
    pub link: Option<LinkId>,
    pub flows: HashMap<FlowId, FlowEntry>,
    pub amt_sent: u64,
    pub amt_recv: u64,
    pub sent_interval: u64,
    pub recv_interval: u64,
}

impl Host {
    pub fn new(id: NodeId) -> Self {
        Host {
            id,
            link: None,
            flows: HashMap::new(),
            amt_sent: 0,
            amt_recv: 0,
            sent_interval: 0,
            recv_interval: 0,
        }
    }

    pub fn record_sent(&mut self, bytes: u32) {
        self.amt_sent += bytes as u64;
        self.sent_interval += bytes as u64;
    }

    pub fn record_recv(&mut self, bytes: u32) {
        self.amt_recv += bytes as u64;
        self.recv_interval += bytes as u64;
    }

    pub fn send_rate_mbps(&self, interval_ms: f64) -> f64 {
        rate_mbps(self.sent_interval, interval_ms)
    }

    pub fn recv_rate_mbps(&self, interval_ms: f64) -> f64 {
        rate_mbps(self.recv_interval, interval_ms)
    }

    pub fn reset_interval_counters(&mut self) {
        self.sent_interval = 0;
        self.recv_interval = 0;
    }

    /// Routes an inbound packet to the flow it belongs to, auto-creating a
    /// receiving flow on first contact with a Data packet for an unknown id.
    /// RoutingUpdate packets should never reach a host: that indicates a
    /// router bug, not attacker input, so it is an enforced invariant rather
    /// than a routine drop.
    pub fn receive(&mut self, pkt: Packet, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        invariant!(pkt.kind != PacketKind::RoutingUpdate, "routing update packet delivered to host {:?}", self.id);
        if let Some(mut entry) = self.flows.remove(&pkt.flow_id) {
            entry.on_packet(&pkt, self, env, sim);
            self.flows.insert(pkt.flow_id, entry);
        } else if pkt.kind == PacketKind::Data {
            let mut entry = FlowEntry::Receiving(ReceivingFlow::new(pkt.flow_id, self.id, pkt.src));
            entry.on_packet(&pkt, self, env, sim);
            self.flows.insert(pkt.flow_id, entry);
        } else {
            tracing::debug!(host = ?self.id, flow = ?pkt.flow_id, kind = ?pkt.kind, "packet for unknown/finished flow, dropping");
        }
        Ok(())
    }
}

pub(crate) fn rate_mbps(bytes: u64, interval_ms: f64) -> f64 {
    if interval_ms <= 0.0 {
        return 0.0;
    }
    let bpms = bytes as f64 / interval_ms;
    bpms / crate::constants::MBPS_TO_BYTES_PER_MS
}
