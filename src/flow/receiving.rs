//! Receiving-flow state machine: cumulative-ACK bookkeeping, one entry per
//! (flow id, destination host), auto-created on first contact.

use crate::env::Environment;
use crate::host::Host;
use crate::ids::{FlowId, NodeId};
use crate::packet::{Packet, PacketKind};
use crate::sim::Simulator;

#[derive(Debug)]
pub struct ReceivingFlow {
    pub id: FlowId,
    pub local_host_id: NodeId,
    pub remote_host_id: NodeId,
    pub next_expected_seq: i64,
    pub done: bool,
    pub recv_interval_packets: u64,
}

impl ReceivingFlow {
    pub fn new(id: FlowId, local_host_id: NodeId, remote_host_id: NodeId) -> Self {
        ReceivingFlow {
            id,
            local_host_id,
            remote_host_id,
            next_expected_seq: 1,
            done: false,
            recv_interval_packets: 0,
        }
    }

    pub fn on_packet(&mut self, pkt: &Packet, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        if self.done {
            return;
        }
        let link_id = host.link.expect("receiving flow's host must have an attached link");
        match pkt.kind {
            PacketKind::Data => {
                host.record_recv(pkt.length_bytes);
                self.recv_interval_packets += 1;
                if pkt.seq_num == self.next_expected_seq {
                    self.next_expected_seq += 1;
                }
                let ack = Packet::ack(self.id, self.local_host_id, self.remote_host_id, self.next_expected_seq, pkt.timestamp);
                host.record_sent(ack.length_bytes);
                env.enqueue_on_link(link_id, ack, self.local_host_id, sim);
            }
            PacketKind::Fin => {
                host.record_recv(pkt.length_bytes);
                let fin = Packet::fin(self.id, self.local_host_id, self.remote_host_id, pkt.seq_num, sim.now());
                host.record_sent(fin.length_bytes);
                env.enqueue_on_link(link_id, fin, self.local_host_id, sim);
                self.done = true;
            }
            _ => tracing::debug!(flow = ?self.id, kind = ?pkt.kind, "unexpected packet for receiving flow"),
        }
    }
}
