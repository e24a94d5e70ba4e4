//! 链路相关事件：驱动链路出队进程与包交付。

use crate::env::Environment;
use crate::error::SimError;
use crate::ids::{LinkId, NodeId};
use crate::link::Endpoint;
use crate::packet::Packet;
use crate::sim::{Event, SimTime, Simulator};
use tracing::trace;

/// 尝试从链路的两个方向缓冲区中各选出队头，挑选入队时间最早的一个并
/// 开始对其进行序列化；两侧皆空时把链路标记为空闲。
#[derive(Debug)]
pub struct LinkStep {
    pub link_id: LinkId,
}

impl Event for LinkStep {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let link_id = self.link_id;
        let Some(end) = env.links.get(&link_id).and_then(|l| l.peek_next()) else {
            if let Some(l) = env.links.get_mut(&link_id) {
                l.busy = false;
            }
            return Ok(());
        };
        let link = env.links.get(&link_id).expect("link exists");
        let len = link.peek_length(end);
        let tx_ms = link.tx_time_ms(len);
        sim.schedule(sim.now() + SimTime::from_millis_f64(tx_ms), LinkDepart { link_id, end });
        Ok(())
    }
}

/// 串行化完成：真正弹出这个 packet，记账，并安排一个传播时延后的交付；
/// 随后立即继续检查是否还有待发的 packet。
#[derive(Debug)]
pub struct LinkDepart {
    pub link_id: LinkId,
    pub end: Endpoint,
}

impl Event for LinkDepart {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let LinkDepart { link_id, end } = *self;
        let link = env.links.get_mut(&link_id).expect("link exists");
        let (pkt, _enqueued_at) = link.pop(end);
        link.xmit_bytes_interval += pkt.length_bytes as u64;
        let target = link.node_at(end.opposite());
        let delay_ms = link.delay_ms;

        trace!(link = ?link_id, to = ?target, seq = pkt.seq_num, "link departing packet");
        sim.schedule(sim.now() + SimTime::from_millis_f64(delay_ms), DeliverPacket { to: target, pkt });
        sim.schedule(sim.now(), LinkStep { link_id });
        Ok(())
    }
}

/// 把一个 packet 交给目标节点（主机或路由器）处理。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: NodeId,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let DeliverPacket { to, pkt } = *self;
        env.deliver_to_node(to, pkt, sim)
    }
}
