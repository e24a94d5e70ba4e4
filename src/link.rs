//! 链路类型
//!
//! 双向管道：每个方向一个尾丢弃缓冲区、一个服务速率（B/ms）、一个固定传播
//! 时延。出队进程由调度出的 `LinkDrain`/`LinkDepart` 事件驱动，而不是一个
//! 真正阻塞的循环。

use crate::ids::{LinkId, NodeId};
use crate::queue::DropTailQueue;
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    A,
    B,
}

impl Endpoint {
    pub fn opposite(self) -> Endpoint {
        match self {
            Endpoint::A => Endpoint::B,
            Endpoint::B => Endpoint::A,
        }
    }
}

#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub rate_bpms: f64,
    pub delay_ms: f64,
    pub endpoints: (NodeId, NodeId),
    pub buf_a: DropTailQueue,
    pub buf_b: DropTailQueue,
    pub busy: bool,
    pub drops: u64,
    pub enqueue_attempts: u64,
    /// bytes transmitted since the last metrics snapshot
    pub xmit_bytes_interval: u64,
}

impl Link {
    pub fn new(id: LinkId, a: NodeId, b: NodeId, rate_bpms: f64, delay_ms: f64, cap_bytes: u32) -> Self {
        Link {
            id,
            rate_bpms,
            delay_ms,
            endpoints: (a, b),
            buf_a: DropTailQueue::new(cap_bytes),
            buf_b: DropTailQueue::new(cap_bytes),
            busy: false,
            drops: 0,
            enqueue_attempts: 0,
            xmit_bytes_interval: 0,
        }
    }

    pub fn other_end(&self, from: NodeId) -> NodeId {
        if from == self.endpoints.0 {
            self.endpoints.1
        } else {
            debug_assert_eq!(from, self.endpoints.1);
            self.endpoints.0
        }
    }

    fn endpoint_of(&self, from: NodeId) -> Endpoint {
        if from == self.endpoints.0 { Endpoint::A } else { Endpoint::B }
    }

    fn buf_mut(&mut self, end: Endpoint) -> &mut DropTailQueue {
        match end {
            Endpoint::A => &mut self.buf_a,
            Endpoint::B => &mut self.buf_b,
        }
    }

    fn buf(&self, end: Endpoint) -> &DropTailQueue {
        match end {
            Endpoint::A => &self.buf_a,
            Endpoint::B => &self.buf_b,
        }
    }

    /// The node sitting at `end` of this link.
    pub fn node_at(&self, end: Endpoint) -> NodeId {
        match end {
            Endpoint::A => self.endpoints.0,
            Endpoint::B => self.endpoints.1,
        }
    }

    pub fn peek_length(&self, end: Endpoint) -> u32 {
        self.buf(end).peek().expect("peek_length called without a pending packet").0.length_bytes
    }

    /// Admits `pkt` to the buffer for `from -> other_endpoint`. Tail-drops if full.
    /// Returns `true` iff the drain process needs to be (re)started.
    pub fn enqueue(&mut self, pkt: crate::packet::Packet, from: NodeId, now: SimTime) -> bool {
        self.enqueue_attempts += 1;
        let was_busy = self.busy;
        let end = self.endpoint_of(from);
        if !self.buf_mut(end).enqueue(pkt, now) {
            self.drops += 1;
            return false;
        }
        if !was_busy {
            self.busy = true;
        }
        !was_busy
    }

    /// Picks the earliest-enqueued head across both directional buffers,
    /// breaking same-timestamp ties by endpoint order (A before B).
    pub fn peek_next(&self) -> Option<Endpoint> {
        match (self.buf_a.peek(), self.buf_b.peek()) {
            (Some((_, ta)), Some((_, tb))) => Some(if ta <= tb { Endpoint::A } else { Endpoint::B }),
            (Some(_), None) => Some(Endpoint::A),
            (None, Some(_)) => Some(Endpoint::B),
            (None, None) => None,
        }
    }

    pub fn tx_time_ms(&self, length_bytes: u32) -> f64 {
        length_bytes as f64 / self.rate_bpms
    }

    /// Pops the head of `end`'s buffer. Caller must have already peeked it.
    pub fn pop(&mut self, end: Endpoint) -> (crate::packet::Packet, SimTime) {
        self.buf_mut(end).pop().expect("pop after peek_next")
    }

    pub fn used_bytes_total(&self) -> u32 {
        self.buf_a.used_bytes() + self.buf_b.used_bytes()
    }

    pub fn cap_bytes(&self) -> u32 {
        self.buf_a.cap_bytes()
    }

    /// `(used_a + used_b) / rate + delay`, the routing-weight convention
    /// implemented by the original source's `Link.get_weight`.
    pub fn get_weight(&self) -> f64 {
        self.used_bytes_total() as f64 / self.rate_bpms + self.delay_ms
    }

    pub fn buffer_occupancy(&self) -> f64 {
        self.used_bytes_total() as f64 / (2.0 * self.cap_bytes() as f64)
    }

    /// Mbps transmitted over the last collection interval.
    pub fn flow_rate_mbps(&self, interval_ms: f64) -> f64 {
        if interval_ms <= 0.0 {
            return 0.0;
        }
        let bpms = self.xmit_bytes_interval as f64 / interval_ms;
        bpms / crate::constants::MBPS_TO_BYTES_PER_MS
    }

    pub fn reset_interval_counters(&mut self) {
        self.xmit_bytes_interval = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FlowId;
    use crate::packet::Packet;

    fn pkt() -> Packet {
        Packet::data(FlowId(0), NodeId(0), NodeId(1), 1, SimTime::ZERO)
    }

    #[test]
    fn tail_drop_past_capacity() {
        let mut link = Link::new(LinkId(0), NodeId(0), NodeId(1), 1.0, 5.0, 1024);
        assert!(link.enqueue(pkt(), NodeId(0), SimTime::ZERO));
        assert!(!link.enqueue(pkt(), NodeId(0), SimTime::ZERO));
        assert_eq!(link.drops, 1);
        assert_eq!(link.enqueue_attempts, 2);
    }

    #[test]
    fn weight_reflects_occupancy_and_delay() {
        let mut link = Link::new(LinkId(0), NodeId(0), NodeId(1), 10.0, 2.0, 4096);
        let base = link.get_weight();
        assert!((base - 2.0).abs() < 1e-9);
        link.enqueue(pkt(), NodeId(0), SimTime::ZERO);
        assert!(link.get_weight() > base);
    }

    #[test]
    fn same_time_ties_break_towards_endpoint_a() {
        let mut link = Link::new(LinkId(0), NodeId(0), NodeId(1), 1.0, 1.0, 4096);
        link.enqueue(pkt(), NodeId(1), SimTime::ZERO);
        link.enqueue(pkt(), NodeId(0), SimTime::ZERO);
        assert_eq!(link.peek_next(), Some(Endpoint::A));
    }
}
