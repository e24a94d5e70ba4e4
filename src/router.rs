//! 路由器：距离向量路由控制面。
//!
//! 周期性地在所有非主机直连链路上广播 `min_dist`，并根据每条链路最新的
//! 距离向量重新计算转发表。陈旧（超过 `2·update_interval` 未刷新）的链路
//! 向量在重算时被忽略，这隐式地充当了故障检测。

use crate::ids::{LinkId, NodeId};
use crate::sim::SimTime;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Router {
    pub id: NodeId,
    pub all_links: Vec<LinkId>,
    pub host_links: HashMap<LinkId, NodeId>,
    pub forwarding: HashMap<NodeId, LinkId>,
    pub min_dist: HashMap<NodeId, SimTime>,
    pub via: HashMap<LinkId, HashMap<NodeId, SimTime>>,
    pub last_update_ts: HashMap<LinkId, SimTime>,
    pub update_interval: SimTime,
    pub drops: u64,
}

impl Router {
    pub fn new(id: NodeId, update_interval: SimTime) -> Self {
        let mut min_dist = HashMap::new();
        min_dist.insert(id, SimTime::ZERO);
        Router {
            id,
            all_links: Vec::new(),
            host_links: HashMap::new(),
            forwarding: HashMap::new(),
            min_dist,
            via: HashMap::new(),
            last_update_ts: HashMap::new(),
            update_interval,
            drops: 0,
        }
    }

    pub fn attach_router_link(&mut self, link: LinkId) {
        self.all_links.push(link);
    }

    pub fn attach_host_link(&mut self, link: LinkId, host: NodeId) {
        self.all_links.push(link);
        self.host_links.insert(link, host);
    }

    /// Records a freshly-received distance vector for `link` and triggers a
    /// recompute. Returns `true` if the forwarding table changed.
    pub fn on_routing_update(&mut self, link: LinkId, link_cost: f64, dv: HashMap<NodeId, SimTime>, now: SimTime) -> bool {
        let via: HashMap<NodeId, SimTime> = dv
            .into_iter()
            .map(|(node, dist)| (node, SimTime::from_millis_f64(link_cost + dist.as_millis_f64())))
            .collect();
        self.via.insert(link, via);
        self.last_update_ts.insert(link, now);
        self.recompute_forwarding(now)
    }

    /// Rebuilds `min_dist`/`forwarding` from the freshest per-link vectors.
    /// Returns `true` if the result differs from what was there before (the
    /// caller should then broadcast immediately instead of waiting for the
    /// next periodic tick).
    pub fn recompute_forwarding(&mut self, now: SimTime) -> bool {
        let mut new_min_dist: HashMap<NodeId, SimTime> = HashMap::new();
        let mut new_forwarding: HashMap<NodeId, LinkId> = HashMap::new();
        new_min_dist.insert(self.id, SimTime::ZERO);

        for (&link, &host) in &self.host_links {
            new_min_dist.insert(host, SimTime::ZERO);
            new_forwarding.insert(host, link);
        }

        let stale_after = SimTime(self.update_interval.0.saturating_mul(2));
        for &link in &self.all_links {
            if self.host_links.contains_key(&link) {
                continue;
            }
            let Some(&last) = self.last_update_ts.get(&link) else {
                continue;
            };
            if now - last > stale_after {
                tracing::trace!(router = ?self.id, link = ?link, "stale routing vector, skipping");
                continue;
            }
            let Some(dv) = self.via.get(&link) else { continue };
            for (&dest, &cost) in dv {
                match new_min_dist.get(&dest) {
                    None => {
                        new_min_dist.insert(dest, cost);
                        new_forwarding.insert(dest, link);
                    }
                    Some(&cur) => {
                        let cur_link = new_forwarding[&dest];
                        if cost < cur || (cost == cur && link.0 < cur_link.0) {
                            new_min_dist.insert(dest, cost);
                            new_forwarding.insert(dest, link);
                        }
                    }
                }
            }
        }

        let changed = new_min_dist != self.min_dist;
        self.min_dist = new_min_dist;
        self.forwarding = new_forwarding;
        changed
    }

    pub fn forward_link_for(&self, dest: NodeId) -> Option<LinkId> {
        self.forwarding.get(&dest).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_host_links_always_have_zero_distance() {
        let mut r = Router::new(NodeId(0), SimTime::from_millis_f64(100.0));
        r.attach_host_link(LinkId(1), NodeId(5));
        r.recompute_forwarding(SimTime::ZERO);
        assert_eq!(r.min_dist[&NodeId(5)], SimTime::ZERO);
        assert_eq!(r.forwarding[&NodeId(5)], LinkId(1));
    }

    #[test]
    fn stale_vectors_are_ignored() {
        let interval = SimTime::from_millis_f64(100.0);
        let mut r = Router::new(NodeId(0), interval);
        r.attach_router_link(LinkId(2));
        let mut dv = HashMap::new();
        dv.insert(NodeId(9), SimTime::ZERO);
        r.on_routing_update(LinkId(2), 5.0, dv, SimTime::ZERO);
        assert!(r.forwarding.contains_key(&NodeId(9)));

        // advance past the staleness window without a fresh update
        let changed = r.recompute_forwarding(SimTime::from_millis_f64(500.0));
        assert!(changed);
        assert!(!r.forwarding.contains_key(&NodeId(9)));
    }

    #[test]
    fn ties_break_on_smallest_link_id() {
        let mut r = Router::new(NodeId(0), SimTime::from_millis_f64(100.0));
        r.attach_router_link(LinkId(5));
        r.attach_router_link(LinkId(2));
        let mut dv = HashMap::new();
        dv.insert(NodeId(9), SimTime::ZERO);
        r.on_routing_update(LinkId(5), 3.0, dv.clone(), SimTime::ZERO);
        r.on_routing_update(LinkId(2), 3.0, dv, SimTime::ZERO);
        assert_eq!(r.forwarding[&NodeId(9)], LinkId(2));
    }
}
