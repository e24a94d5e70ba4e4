//! Sending-flow state machine: Go-Back-N with cumulative ACKs, a dynamic
//! window, a retransmit timer, and Tahoe/FAST congestion control.

use crate::constants::{DATA_PCK_SIZE, DUP_ACK_GAP_MS, DUP_ACK_THRESHOLD, INITIAL_RTO_MS, MIN_RTO_MS};
use crate::env::Environment;
use crate::events;
use crate::flow::congestion::CongestionControl;
use crate::host::Host;
use crate::ids::{FlowId, LinkId, NodeId};
use crate::packet::{Packet, PacketKind};
use crate::sim::{SimTime, Simulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Sending,
    Finishing,
    Done,
}

#[derive(Debug)]
pub struct SendingFlow {
    pub id: FlowId,
    pub src_host_id: NodeId,
    pub dest_host_id: NodeId,
    pub data_remaining_bytes: u64,
    pub start_ms: SimTime,
    pub end_ms: Option<SimTime>,
    pub window_size: f64,
    pub retransmit_timeout_ms: f64,
    pub batch_start_seq: i64,
    pub window_start_seq: i64,
    pub window_end_seq: i64,
    pub window_start_ts: SimTime,
    pub rtt_latest_ms: f64,
    pub sum_rtt_ms: f64,
    pub rtt_samples: u64,
    pub cc: CongestionControl,
    pub state: FlowState,
    pub dup_ack: u32,
    pub last_dup_ack_ts: Option<SimTime>,
    pub generation: u64,
    pub sent_interval_packets: u64,
}

impl SendingFlow {
    pub fn new(
        id: FlowId,
        src_host_id: NodeId,
        dest_host_id: NodeId,
        data_remaining_bytes: u64,
        start_ms: SimTime,
        cc: CongestionControl,
    ) -> Self {
        SendingFlow {
            id,
            src_host_id,
            dest_host_id,
            data_remaining_bytes,
            start_ms,
            end_ms: None,
            window_size: 1.0,
            retransmit_timeout_ms: INITIAL_RTO_MS,
            batch_start_seq: 1,
            window_start_seq: 1,
            window_end_seq: 0,
            window_start_ts: SimTime::ZERO,
            rtt_latest_ms: 0.0,
            sum_rtt_ms: 0.0,
            rtt_samples: 0,
            cc,
            state: FlowState::Idle,
            dup_ack: 0,
            last_dup_ack_ts: None,
            generation: 0,
            sent_interval_packets: 0,
        }
    }

    pub fn avg_rtt_ms(&self) -> f64 {
        if self.rtt_samples == 0 { 0.0 } else { self.sum_rtt_ms / self.rtt_samples as f64 }
    }

    fn remaining_packets(&self) -> i64 {
        self.data_remaining_bytes.div_ceil(DATA_PCK_SIZE as u64) as i64
    }

    fn link_id(&self, host: &Host) -> LinkId {
        host.link.expect("sending flow's host must have an attached link")
    }

    /// `FlowStart`: Idle -> Sending.
    pub fn start(&mut self, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        debug_assert_eq!(self.state, FlowState::Idle);
        self.begin_batch(host, env, sim);
    }

    fn begin_batch(&mut self, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        self.state = FlowState::Sending;
        self.generation += 1;
        let gen = self.generation;

        let remaining_pkts = self.remaining_packets();
        let window_pkts = (self.window_size.floor() as i64).max(1).min(remaining_pkts);
        self.window_start_seq = self.batch_start_seq;
        self.window_end_seq = self.batch_start_seq + window_pkts - 1;
        self.window_start_ts = sim.now();

        let link_id = self.link_id(host);
        let rate = env.link_rate_bpms(link_id);
        let pace_ms = DATA_PCK_SIZE as f64 / rate;
        for (i, seq) in (self.window_start_seq..=self.window_end_seq).enumerate() {
            let at = sim.now() + SimTime::from_millis_f64(pace_ms * i as f64);
            sim.schedule(
                at,
                events::flow::SendNextInBatch { flow_id: self.id, host_id: self.src_host_id, seq, generation: gen },
            );
        }

        let rto = self.retransmit_timeout_ms;
        sim.schedule(
            sim.now() + SimTime::from_millis_f64(rto),
            events::flow::BatchTimer { flow_id: self.id, host_id: self.src_host_id, generation: gen },
        );

        if let CongestionControl::Fast(_) = &self.cc {
            let interval = match &self.cc {
                CongestionControl::Fast(f) => f.fast_interval_ms,
                _ => unreachable!(),
            };
            sim.schedule(
                sim.now() + SimTime::from_millis_f64(interval),
                events::flow::FastTimer { flow_id: self.id, host_id: self.src_host_id, generation: gen },
            );
        }
    }

    /// Sends a single Data packet for `seq`, called from the `SendNextInBatch` event.
    pub fn send_one(&mut self, seq: i64, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        let link_id = self.link_id(host);
        let pkt = Packet::data(self.id, self.src_host_id, self.dest_host_id, seq, sim.now());
        host.record_sent(pkt.length_bytes);
        self.sent_interval_packets += 1;
        env.enqueue_on_link(link_id, pkt, self.src_host_id, sim);
    }

    fn start_finishing(&mut self, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        self.state = FlowState::Finishing;
        self.generation += 1;
        let gen = self.generation;

        let link_id = self.link_id(host);
        let pkt = Packet::fin(self.id, self.src_host_id, self.dest_host_id, self.batch_start_seq, sim.now());
        host.record_sent(pkt.length_bytes);
        env.enqueue_on_link(link_id, pkt, self.src_host_id, sim);
        self.window_start_ts = sim.now();

        let rto = self.retransmit_timeout_ms;
        sim.schedule(
            sim.now() + SimTime::from_millis_f64(rto),
            events::flow::FinTimer { flow_id: self.id, host_id: self.src_host_id, generation: gen },
        );

        if let CongestionControl::Fast(f) = &self.cc {
            let interval = f.fast_interval_ms;
            sim.schedule(
                sim.now() + SimTime::from_millis_f64(interval),
                events::flow::FastTimer { flow_id: self.id, host_id: self.src_host_id, generation: gen },
            );
        }
    }

    fn record_rtt_sample(&mut self, now: SimTime, ack_ts: SimTime) {
        let rtt_ms = (now - ack_ts).as_millis_f64();
        debug_assert!(rtt_ms >= 0.0, "RTT sample must be non-negative");
        self.rtt_latest_ms = rtt_ms;
        self.sum_rtt_ms += rtt_ms;
        self.rtt_samples += 1;
        self.cc.record_rtt_sample(rtt_ms);
        self.retransmit_timeout_ms = (3.0 * rtt_ms).max(MIN_RTO_MS);
    }

    fn on_ack(&mut self, pkt: &Packet, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        let now = sim.now();
        if pkt.timestamp < self.window_start_ts {
            return; // stale ACK from a superseded batch
        }

        let req = pkt.seq_num;
        if req > self.batch_start_seq {
            self.record_rtt_sample(now, pkt.timestamp);

            let newly_acked = req - self.batch_start_seq;
            self.data_remaining_bytes = self.data_remaining_bytes.saturating_sub(newly_acked as u64 * DATA_PCK_SIZE as u64);
            self.batch_start_seq = req;
            self.dup_ack = 0;
            self.last_dup_ack_ts = None;

            if let CongestionControl::Tahoe(t) = &mut self.cc {
                for _ in 0..newly_acked {
                    t.on_segment_acked(&mut self.window_size);
                }
            }

            if self.batch_start_seq > self.window_end_seq {
                self.generation += 1; // cancel the now-irrelevant BatchTimer/FastTimer
                if self.data_remaining_bytes == 0 {
                    self.start_finishing(host, env, sim);
                } else {
                    self.begin_batch(host, env, sim);
                }
            }
        } else if req == self.batch_start_seq {
            let is_fresh_dup = self.last_dup_ack_ts.is_none_or(|t| (now - t).as_millis_f64() > DUP_ACK_GAP_MS);
            if is_fresh_dup {
                self.dup_ack += 1;
                self.last_dup_ack_ts = Some(now);
                if self.dup_ack >= DUP_ACK_THRESHOLD {
                    self.dup_ack = 0;
                    if let CongestionControl::Tahoe(t) = &mut self.cc {
                        t.on_loss(&mut self.window_size);
                    }
                    self.send_one(self.batch_start_seq, host, env, sim);
                }
            }
        }
    }

    pub fn on_packet(&mut self, pkt: &Packet, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        match (self.state, pkt.kind) {
            (FlowState::Sending, PacketKind::Ack) => self.on_ack(pkt, host, env, sim),
            (FlowState::Finishing, PacketKind::Fin) => {
                self.state = FlowState::Done;
                self.end_ms = Some(sim.now());
                self.generation += 1;
            }
            (FlowState::Finishing, PacketKind::Ack) => {} // stray ack for the last data batch, ignore
            (FlowState::Done, _) => {}
            _ => tracing::debug!(flow = ?self.id, state = ?self.state, kind = ?pkt.kind, "unexpected packet for sending flow"),
        }
    }

    /// `BatchTimer` fired: resend the whole current window (Go-Back-N).
    pub fn on_batch_timeout(&mut self, token: u64, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        if token != self.generation || self.state != FlowState::Sending {
            return;
        }
        if let CongestionControl::Tahoe(t) = &mut self.cc {
            t.on_loss(&mut self.window_size);
        }
        self.begin_batch(host, env, sim);
    }

    /// `FinTimer` fired: the FIN was lost, resend it.
    pub fn on_fin_timeout(&mut self, token: u64, host: &mut Host, env: &mut Environment, sim: &mut Simulator) {
        if token != self.generation || self.state != FlowState::Finishing {
            return;
        }
        self.start_finishing(host, env, sim);
    }

    /// `FastTimer` fired: periodic FAST window update, re-armed while active.
    pub fn on_fast_timer(&mut self, token: u64, sim: &mut Simulator) {
        if token != self.generation {
            return;
        }
        if matches!(self.state, FlowState::Done) {
            return;
        }
        let rtt_latest = self.rtt_latest_ms;
        if let CongestionControl::Fast(f) = &mut self.cc {
            f.update_window(&mut self.window_size, rtt_latest);
            let interval = f.fast_interval_ms;
            sim.schedule(
                sim.now() + SimTime::from_millis_f64(interval),
                events::flow::FastTimer { flow_id: self.id, host_id: self.src_host_id, generation: token },
            );
        }
    }
}
