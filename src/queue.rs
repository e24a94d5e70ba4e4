//! Tail-drop queue.
//!
//! The simulator only ever needs one queueing discipline (a plain FIFO
//! that tail-drops once it is full), so this stays a concrete struct rather
//! than a trait with a single implementation. Each entry also carries the
//! time it was admitted, since `Link::select_next` needs enqueue order
//! across both directional buffers to break same-time ties deterministically.

use crate::packet::Packet;
use crate::sim::SimTime;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct DropTailQueue {
    cap_bytes: u32,
    used_bytes: u32,
    q: VecDeque<(Packet, SimTime)>,
}

impl DropTailQueue {
    pub fn new(cap_bytes: u32) -> Self {
        DropTailQueue {
            cap_bytes,
            used_bytes: 0,
            q: VecDeque::new(),
        }
    }

    /// Admits `pkt` if there is room; returns `false` (and drops it) otherwise.
    pub fn enqueue(&mut self, pkt: Packet, at: SimTime) -> bool {
        if self.used_bytes.saturating_add(pkt.length_bytes) > self.cap_bytes {
            return false;
        }
        self.used_bytes += pkt.length_bytes;
        self.q.push_back((pkt, at));
        true
    }

    pub fn peek(&self) -> Option<&(Packet, SimTime)> {
        self.q.front()
    }

    pub fn pop(&mut self) -> Option<(Packet, SimTime)> {
        let item = self.q.pop_front()?;
        self.used_bytes = self.used_bytes.saturating_sub(item.0.length_bytes);
        Some(item)
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn used_bytes(&self) -> u32 {
        self.used_bytes
    }

    pub fn cap_bytes(&self) -> u32 {
        self.cap_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FlowId, NodeId};

    fn data_pkt() -> Packet {
        Packet::data(FlowId(0), NodeId(0), NodeId(1), 1, SimTime::ZERO)
    }

    #[test]
    fn tail_drop_rejects_once_full() {
        let mut q = DropTailQueue::new(1024);
        assert!(q.enqueue(data_pkt(), SimTime::ZERO));
        assert!(!q.enqueue(data_pkt(), SimTime::ZERO));
        assert_eq!(q.used_bytes(), 1024);
    }

    #[test]
    fn pop_restores_capacity() {
        let mut q = DropTailQueue::new(1024);
        q.enqueue(data_pkt(), SimTime::ZERO);
        q.pop();
        assert_eq!(q.used_bytes(), 0);
        assert!(q.enqueue(data_pkt(), SimTime::ZERO));
    }
}
