//! 环境 / 拓扑注册表
//!
//! 唯一拥有全部实体（主机、路由器、链路、流）的地方，给它们分配 id，
//! 在拓扑加载完成后派生初始事件（路由器广播、流启动），并以上报周期
//! 推进虚拟钟、收集并转发度量快照。

use crate::cli::{GraphKind, GraphSelector};
use crate::error::SimError;
use crate::events::flow::with_sending_flow_impl;
use crate::events::router::RouterBroadcastTick;
use crate::events::flow::FlowStart;
use crate::flow::{CongestionControl, FlowEntry, SendingFlow};
use crate::host::Host;
use crate::ids::{FlowId, IdAllocator, LinkId, NodeId};
use crate::link::Link;
use crate::metrics::{FlowMetrics, HostMetrics, LinkMetrics, MetricsSink, MetricsSnapshot};
use crate::packet::{Packet, PacketKind};
use crate::router::Router;
use crate::sim::{SimTime, Simulator};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Host,
    Router,
}

pub struct Environment {
    alloc: IdAllocator,
    pub hosts: HashMap<NodeId, Host>,
    pub routers: HashMap<NodeId, Router>,
    pub links: HashMap<LinkId, Link>,
    node_kind: HashMap<NodeId, NodeKind>,
    pub duration: SimTime,
    pub report_interval: SimTime,
    pub routing_update_interval: SimTime,
    sinks: Vec<Box<dyn MetricsSink>>,
    graph_filter: Option<GraphSelector>,
}

impl Environment {
    pub fn new(duration: SimTime, report_interval: SimTime, routing_update_interval: SimTime) -> Self {
        Environment {
            alloc: IdAllocator::default(),
            hosts: HashMap::new(),
            routers: HashMap::new(),
            links: HashMap::new(),
            node_kind: HashMap::new(),
            duration,
            report_interval,
            routing_update_interval,
            sinks: Vec::new(),
            graph_filter: None,
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn MetricsSink>) {
        self.sinks.push(sink);
    }

    /// Restricts what `collect()` hands to the output sinks to entities of
    /// one kind/id set. The simulation itself never branches on this, it
    /// only narrows the snapshot forwarded to `MetricsSink`s.
    pub fn set_graph_filter(&mut self, filter: Option<GraphSelector>) {
        self.graph_filter = filter;
    }

    // ---- topology construction, used by the loader ----

    pub fn add_host(&mut self) -> NodeId {
        let id = self.alloc.node();
        self.hosts.insert(id, Host::new(id));
        self.node_kind.insert(id, NodeKind::Host);
        id
    }

    pub fn add_router(&mut self) -> NodeId {
        let id = self.alloc.node();
        self.routers.insert(id, Router::new(id, self.routing_update_interval));
        self.node_kind.insert(id, NodeKind::Router);
        id
    }

    pub fn add_link(&mut self, a: NodeId, b: NodeId, rate_bpms: f64, delay_ms: f64, cap_bytes: u32) -> LinkId {
        let id = self.alloc.link();
        self.links.insert(id, Link::new(id, a, b, rate_bpms, delay_ms, cap_bytes));
        self.attach_link_endpoint(id, a, b);
        self.attach_link_endpoint(id, b, a);
        id
    }

    fn attach_link_endpoint(&mut self, link_id: LinkId, node: NodeId, other: NodeId) {
        match self.node_kind.get(&node) {
            Some(NodeKind::Host) => {
                self.hosts.get_mut(&node).expect("host registered").link = Some(link_id);
            }
            Some(NodeKind::Router) => {
                let other_is_host = matches!(self.node_kind.get(&other), Some(NodeKind::Host));
                let router = self.routers.get_mut(&node).expect("router registered");
                if other_is_host {
                    router.attach_host_link(link_id, other);
                } else {
                    router.attach_router_link(link_id);
                }
            }
            None => {}
        }
    }

    pub fn add_flow(&mut self, src: NodeId, dest: NodeId, data_bytes: u64, start_ms: SimTime, cc: CongestionControl) -> FlowId {
        let id = self.alloc.flow();
        let sending = SendingFlow::new(id, src, dest, data_bytes, start_ms, cc);
        self.hosts
            .get_mut(&src)
            .expect("flow source host registered")
            .flows
            .insert(id, FlowEntry::Sending(sending));
        id
    }

    /// Schedules each router's first broadcast tick and every flow's `FlowStart`.
    pub fn spawn_startup_events(&self, sim: &mut Simulator) {
        for &router_id in self.routers.keys() {
            sim.schedule(SimTime::ZERO, RouterBroadcastTick { router_id });
        }
        for (&host_id, host) in &self.hosts {
            for (&flow_id, entry) in &host.flows {
                if let FlowEntry::Sending(sf) = entry {
                    sim.schedule(sf.start_ms, FlowStart { flow_id, host_id });
                }
            }
        }
    }

    // ---- dispatch ----

    pub fn link_rate_bpms(&self, link_id: LinkId) -> f64 {
        self.links.get(&link_id).map(|l| l.rate_bpms).unwrap_or(1.0)
    }

    pub fn enqueue_on_link(&mut self, link_id: LinkId, pkt: Packet, from: NodeId, sim: &mut Simulator) {
        let now = sim.now();
        let Some(link) = self.links.get_mut(&link_id) else {
            warn!(link = ?link_id, "enqueue on unknown link, dropping");
            return;
        };
        let needs_start = link.enqueue(pkt, from, now);
        if needs_start {
            sim.schedule(now, crate::events::link::LinkStep { link_id });
        }
    }

    pub fn deliver_to_node(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) -> Result<(), SimError> {
        match self.node_kind.get(&to) {
            Some(NodeKind::Host) => self.deliver_to_host(to, pkt, sim),
            Some(NodeKind::Router) => {
                self.deliver_to_router(to, pkt, sim);
                Ok(())
            }
            None => {
                warn!(to = ?to, "packet addressed to unknown node, dropping");
                Ok(())
            }
        }
    }

    fn deliver_to_host(&mut self, host_id: NodeId, pkt: Packet, sim: &mut Simulator) -> Result<(), SimError> {
        let Some(mut host) = self.hosts.remove(&host_id) else { return Ok(()) };
        let result = host.receive(pkt, sim, self);
        self.hosts.insert(host_id, host);
        result
    }

    fn deliver_to_router(&mut self, router_id: NodeId, pkt: Packet, sim: &mut Simulator) {
        let Some(mut router) = self.routers.remove(&router_id) else { return };
        match pkt.kind {
            PacketKind::RoutingUpdate => {
                let link_id = pkt.originating_link();
                let link_cost = self.links.get(&link_id).map(|l| l.get_weight()).unwrap_or(0.0);
                let dv = pkt.dv_payload.unwrap_or_default();
                let changed = router.on_routing_update(link_id, link_cost, dv, sim.now());
                self.routers.insert(router_id, router);
                if changed {
                    self.broadcast_from_router(router_id, sim);
                }
                return;
            }
            _ => match router.forward_link_for(pkt.dest) {
                Some(link_id) => self.enqueue_on_link(link_id, pkt, router_id, sim),
                None => {
                    router.drops += 1;
                    debug!(router = ?router_id, dest = ?pkt.dest, "unroutable destination, dropping");
                }
            },
        }
        self.routers.insert(router_id, router);
    }

    pub(crate) fn broadcast_from_router(&mut self, router_id: NodeId, sim: &mut Simulator) {
        let Some(router) = self.routers.get(&router_id) else { return };
        let dv = router.min_dist.clone();
        let non_host_links: Vec<LinkId> = router
            .all_links
            .iter()
            .copied()
            .filter(|l| !router.host_links.contains_key(l))
            .collect();
        let now = sim.now();
        for link_id in non_host_links {
            let pkt = Packet::routing_update(link_id, dv.clone(), now);
            self.enqueue_on_link(link_id, pkt, router_id, sim);
        }
    }

    /// Lifts a `SendingFlow` out of its host's flow table, runs `f`, and
    /// reinserts it (remove/process/reinsert, the pattern every flow timer
    /// event needs to sidestep the simultaneous `&mut Host` / `&mut Environment`
    /// borrow).
    pub fn with_sending_flow<F>(&mut self, host_id: NodeId, flow_id: FlowId, sim: &mut Simulator, f: F)
    where
        F: FnOnce(&mut SendingFlow, &mut Host, &mut Environment, &mut Simulator),
    {
        with_sending_flow_impl(self, host_id, flow_id, sim, f);
    }

    // ---- metrics ----

    pub fn run(&mut self, sim: &mut Simulator) -> Result<(), SimError> {
        while sim.now() < self.duration {
            let candidate = sim.now() + self.report_interval;
            let until = if candidate.0 > self.duration.0 { self.duration } else { candidate };
            sim.run_until(until, self)?;
            self.collect(sim.now());
        }
        Ok(())
    }

    fn collect(&mut self, at: SimTime) {
        let interval_ms = self.report_interval.as_millis_f64();

        let mut hosts = Vec::with_capacity(self.hosts.len());
        for host in self.hosts.values_mut() {
            hosts.push(HostMetrics {
                id: host.id,
                send_rate_mbps: host.send_rate_mbps(interval_ms),
                receive_rate_mbps: host.recv_rate_mbps(interval_ms),
            });
            host.reset_interval_counters();
        }

        let mut flows = Vec::new();
        for host in self.hosts.values_mut() {
            for (&flow_id, entry) in host.flows.iter_mut() {
                match entry {
                    FlowEntry::Sending(sf) => {
                        flows.push(FlowMetrics {
                            id: flow_id,
                            send_rate_mbps: crate::host::rate_mbps(
                                sf.sent_interval_packets * crate::constants::DATA_PCK_SIZE as u64,
                                interval_ms,
                            ),
                            receive_rate_mbps: 0.0,
                            avg_rtt_ms: sf.avg_rtt_ms(),
                            window_size: sf.window_size,
                        });
                        sf.sent_interval_packets = 0;
                    }
                    FlowEntry::Receiving(rf) => {
                        if let Some(existing) = flows.iter_mut().find(|m: &&mut FlowMetrics| m.id == flow_id) {
                            existing.receive_rate_mbps = crate::host::rate_mbps(
                                rf.recv_interval_packets * crate::constants::DATA_PCK_SIZE as u64,
                                interval_ms,
                            );
                        } else {
                            flows.push(FlowMetrics {
                                id: flow_id,
                                send_rate_mbps: 0.0,
                                receive_rate_mbps: crate::host::rate_mbps(
                                    rf.recv_interval_packets * crate::constants::DATA_PCK_SIZE as u64,
                                    interval_ms,
                                ),
                                avg_rtt_ms: 0.0,
                                window_size: 0.0,
                            });
                        }
                        rf.recv_interval_packets = 0;
                    }
                }
            }
        }

        let mut links = Vec::with_capacity(self.links.len());
        for link in self.links.values_mut() {
            links.push(LinkMetrics {
                id: link.id,
                packet_loss: link.drops,
                buffer_occupancy: link.buffer_occupancy(),
                link_rate_mbps: link.flow_rate_mbps(interval_ms),
            });
            link.reset_interval_counters();
        }

        let mut snapshot = MetricsSnapshot { at, hosts, flows, links };
        if let Some(filter) = &self.graph_filter {
            // `-g` ids are 1-based positions within a kind (the same numbering
            // `raw_data.txt` and the topology file use), not raw entity ids.
            // Those are drawn from one counter shared across every kind, so
            // e.g. the first link's raw id is rarely 0 or 1. Translate before
            // matching.
            let host_pos = positions(self.hosts.keys().map(|n| n.0));
            let link_pos = positions(self.links.keys().map(|l| l.0));
            let flow_pos = positions(snapshot.flows.iter().map(|f| f.id.0));

            snapshot.hosts.retain(|h| host_pos.get(&h.id.0).is_some_and(|&p| filter.matches(GraphKind::Host, p)));
            snapshot.flows.retain(|f| flow_pos.get(&f.id.0).is_some_and(|&p| filter.matches(GraphKind::Flow, p)));
            snapshot.links.retain(|l| link_pos.get(&l.id.0).is_some_and(|&p| filter.matches(GraphKind::Link, p)));
        }
        for sink in &mut self.sinks {
            sink.on_snapshot(&snapshot);
        }
    }

    pub fn finish(self) -> Result<(), SimError> {
        for sink in self.sinks {
            sink.finish()?;
        }
        Ok(())
    }
}

/// Maps raw ids to their 1-based position in ascending order, within one kind.
fn positions(ids: impl Iterator<Item = u64>) -> HashMap<u64, u64> {
    let mut sorted: Vec<u64> = ids.collect();
    sorted.sort_unstable();
    sorted.into_iter().enumerate().map(|(i, id)| (id, i as u64 + 1)).collect()
}
