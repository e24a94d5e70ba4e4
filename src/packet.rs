//! 数据包定义
//!
//! 一旦发出即不可变的消息记录：来源、所属流、目的、时间戳、长度、类型、
//! 序列号，以及仅路由更新包携带的距离向量。

use crate::constants::{ACK_PCK_SIZE, DATA_PCK_SIZE, FIN_PCK_SIZE, ROUTING_UPDATE_PCK_SIZE};
use crate::ids::{FlowId, LinkId, NodeId};
use crate::sim::SimTime;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Data,
    Ack,
    Fin,
    RoutingUpdate,
}

/// 数据包。`RoutingUpdate` 包的 `src` 字段刻意复用为发出方链路的 id
/// （而非节点 id），`dest` 被忽略，`dv_payload` 携带距离向量。这是
/// 一个有意为之、记录在文档里的字段复用，而非疏漏。
#[derive(Debug, Clone)]
pub struct Packet {
    pub src: NodeId,
    pub flow_id: FlowId,
    pub dest: NodeId,
    pub timestamp: SimTime,
    pub length_bytes: u32,
    pub kind: PacketKind,
    pub seq_num: i64,
    pub dv_payload: Option<HashMap<NodeId, SimTime>>,
}

impl Packet {
    pub fn data(flow_id: FlowId, src: NodeId, dest: NodeId, seq_num: i64, now: SimTime) -> Packet {
        debug_assert!(seq_num >= 1);
        Packet {
            src,
            flow_id,
            dest,
            timestamp: now,
            length_bytes: DATA_PCK_SIZE,
            kind: PacketKind::Data,
            seq_num,
            dv_payload: None,
        }
    }

    pub fn ack(flow_id: FlowId, src: NodeId, dest: NodeId, next_expected_seq: i64, data_timestamp: SimTime) -> Packet {
        debug_assert!(next_expected_seq >= 1);
        Packet {
            src,
            flow_id,
            dest,
            timestamp: data_timestamp,
            length_bytes: ACK_PCK_SIZE,
            kind: PacketKind::Ack,
            seq_num: next_expected_seq,
            dv_payload: None,
        }
    }

    pub fn fin(flow_id: FlowId, src: NodeId, dest: NodeId, seq_num: i64, now: SimTime) -> Packet {
        Packet {
            src,
            flow_id,
            dest,
            timestamp: now,
            length_bytes: FIN_PCK_SIZE,
            kind: PacketKind::Fin,
            seq_num,
            dv_payload: None,
        }
    }

    /// `originating_link` reinterprets `src` as a `LinkId`; only valid for `RoutingUpdate`.
    pub fn routing_update(originating_link: LinkId, dv: HashMap<NodeId, SimTime>, now: SimTime) -> Packet {
        Packet {
            src: NodeId(originating_link.0),
            flow_id: FlowId(0),
            dest: NodeId(0),
            timestamp: now,
            length_bytes: ROUTING_UPDATE_PCK_SIZE,
            kind: PacketKind::RoutingUpdate,
            seq_num: 0,
            dv_payload: Some(dv),
        }
    }

    pub fn originating_link(&self) -> LinkId {
        debug_assert_eq!(self.kind, PacketKind::RoutingUpdate);
        LinkId(self.src.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_reuses_data_timestamp_for_exact_rtt_sampling() {
        let t = SimTime::from_millis_f64(5.0);
        let ack = Packet::ack(FlowId(0), NodeId(1), NodeId(0), 3, t);
        assert_eq!(ack.timestamp, t);
        assert_eq!(ack.seq_num, 3);
    }

    #[test]
    fn routing_update_overloads_src_as_link_id() {
        let link = LinkId(7);
        let pkt = Packet::routing_update(link, HashMap::new(), SimTime::ZERO);
        assert_eq!(pkt.originating_link(), link);
    }
}
