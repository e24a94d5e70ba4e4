//! 路由器控制面事件：周期性广播距离向量。

use crate::env::Environment;
use crate::error::SimError;
use crate::ids::NodeId;
use crate::sim::{Event, SimTime, Simulator};

#[derive(Debug)]
pub struct RouterBroadcastTick {
    pub router_id: NodeId,
}

impl Event for RouterBroadcastTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError> {
        let router_id = self.router_id;
        env.broadcast_from_router(router_id, sim);

        let interval = env
            .routers
            .get(&router_id)
            .map(|r| r.update_interval)
            .unwrap_or(SimTime::ZERO);
        sim.schedule(sim.now() + interval, RouterBroadcastTick { router_id });
        Ok(())
    }
}
