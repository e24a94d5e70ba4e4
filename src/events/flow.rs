//! 流相关事件：启动、按批次分批发送、重传计时器、FAST 周期计时器。

use crate::env::Environment;
use crate::error::SimError;
use crate::flow::FlowEntry;
use crate::ids::{FlowId, NodeId};
use crate::sim::{Event, Simulator};

#[derive(Debug)]
pub struct FlowStart {
    pub flow_id: FlowId,
    pub host_id: NodeId,
}

impl Event for FlowStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let FlowStart { flow_id, host_id } = *self;
        env.with_sending_flow(host_id, flow_id, sim, |flow, host, env, sim| {
            flow.start(host, env, sim);
        });
        Ok(())
    }
}

#[derive(Debug)]
pub struct SendNextInBatch {
    pub flow_id: FlowId,
    pub host_id: NodeId,
    pub seq: i64,
    pub generation: u64,
}

impl Event for SendNextInBatch {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let SendNextInBatch { flow_id, host_id, seq, generation } = *self;
        env.with_sending_flow(host_id, flow_id, sim, |flow, host, env, sim| {
            if flow.generation == generation {
                flow.send_one(seq, host, env, sim);
            }
        });
        Ok(())
    }
}

#[derive(Debug)]
pub struct BatchTimer {
    pub flow_id: FlowId,
    pub host_id: NodeId,
    pub generation: u64,
}

impl Event for BatchTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let BatchTimer { flow_id, host_id, generation } = *self;
        env.with_sending_flow(host_id, flow_id, sim, |flow, host, env, sim| {
            flow.on_batch_timeout(generation, host, env, sim);
        });
        Ok(())
    }
}

#[derive(Debug)]
pub struct FinTimer {
    pub flow_id: FlowId,
    pub host_id: NodeId,
    pub generation: u64,
}

impl Event for FinTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let FinTimer { flow_id, host_id, generation } = *self;
        env.with_sending_flow(host_id, flow_id, sim, |flow, host, env, sim| {
            flow.on_fin_timeout(generation, host, env, sim);
        });
        Ok(())
    }
}

#[derive(Debug)]
pub struct FastTimer {
    pub flow_id: FlowId,
    pub host_id: NodeId,
    pub generation: u64,
}

impl Event for FastTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let FastTimer { flow_id, host_id, generation } = *self;
        env.with_sending_flow(host_id, flow_id, sim, |flow, _host, _env, sim| {
            flow.on_fast_timer(generation, sim);
        });
        Ok(())
    }
}

/// Helper shared by every flow-timer event: lift a `SendingFlow` out of its
/// host's flow table for the duration of the call, then put it back (remove,
/// process, reinsert, avoiding a simultaneous borrow of an entity and the
/// registry that owns it).
pub(crate) fn with_sending_flow_impl<F>(env: &mut Environment, host_id: NodeId, flow_id: FlowId, sim: &mut Simulator, f: F)
where
    F: FnOnce(&mut crate::flow::SendingFlow, &mut crate::host::Host, &mut Environment, &mut Simulator),
{
    let Some(mut host) = env.hosts.remove(&host_id) else { return };
    if let Some(FlowEntry::Sending(mut flow)) = host.flows.remove(&flow_id) {
        f(&mut flow, &mut host, env, sim);
        host.flows.insert(flow_id, FlowEntry::Sending(flow));
    }
    env.hosts.insert(host_id, host);
}
