//! Metrics snapshot and sink trait, plus the `RawDataSink` implementation
//! that writes `raw_data.txt` in the format `output.py`'s `export_to_file`
//! uses: one `legend` header line, then one `index:value` line per sample.

use crate::error::SimError;
use crate::ids::{FlowId, LinkId, NodeId};
use crate::sim::SimTime;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct HostMetrics {
    pub id: NodeId,
    pub send_rate_mbps: f64,
    pub receive_rate_mbps: f64,
}

#[derive(Debug, Clone)]
pub struct FlowMetrics {
    pub id: FlowId,
    pub send_rate_mbps: f64,
    pub receive_rate_mbps: f64,
    pub avg_rtt_ms: f64,
    pub window_size: f64,
}

#[derive(Debug, Clone)]
pub struct LinkMetrics {
    pub id: LinkId,
    pub packet_loss: u64,
    pub buffer_occupancy: f64,
    pub link_rate_mbps: f64,
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub at: SimTime,
    pub hosts: Vec<HostMetrics>,
    pub flows: Vec<FlowMetrics>,
    pub links: Vec<LinkMetrics>,
}

pub trait MetricsSink {
    fn on_snapshot(&mut self, snap: &MetricsSnapshot);
    fn finish(self: Box<Self>) -> Result<(), SimError>;
}

/// One named, per-entity time series (e.g. legend `host_send_rate`, entity 0's samples).
#[derive(Debug, Default)]
struct Series(BTreeMap<u64, Vec<f64>>);

impl Series {
    fn push(&mut self, entity: u64, value: f64) {
        self.0.entry(entity).or_default().push(value);
    }
}

#[derive(Debug, Default)]
pub struct RawDataSink {
    dir: PathBuf,
    legends: BTreeMap<&'static str, Series>,
}

impl RawDataSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        RawDataSink { dir: dir.into(), legends: BTreeMap::new() }
    }

    fn record(&mut self, legend: &'static str, entity: u64, value: f64) {
        self.legends.entry(legend).or_default().push(entity, value);
    }
}

const HOST_FIELDS: [&str; 2] = ["host_send_rate", "host_receive_rate"];
const FLOW_FIELDS: [&str; 4] = ["flow_send_rate", "flow_receive_rate", "flow_avg_RTT", "flow_window_size"];
const LINK_FIELDS: [&str; 3] = ["packet_loss", "buffer_occupancy", "link_rate"];

impl MetricsSink for RawDataSink {
    fn on_snapshot(&mut self, snap: &MetricsSnapshot) {
        for h in &snap.hosts {
            self.record(HOST_FIELDS[0], h.id.0, h.send_rate_mbps);
            self.record(HOST_FIELDS[1], h.id.0, h.receive_rate_mbps);
        }
        for f in &snap.flows {
            self.record(FLOW_FIELDS[0], f.id.0, f.send_rate_mbps);
            self.record(FLOW_FIELDS[1], f.id.0, f.receive_rate_mbps);
            self.record(FLOW_FIELDS[2], f.id.0, f.avg_rtt_ms);
            self.record(FLOW_FIELDS[3], f.id.0, f.window_size);
        }
        for l in &snap.links {
            self.record(LINK_FIELDS[0], l.id.0, l.packet_loss as f64);
            self.record(LINK_FIELDS[1], l.id.0, l.buffer_occupancy);
            self.record(LINK_FIELDS[2], l.id.0, l.link_rate_mbps);
        }
    }

    fn finish(self: Box<Self>) -> Result<(), SimError> {
        write_raw_data(&self.dir.join("raw_data.txt"), &self.legends)
    }
}

fn write_raw_data(path: &Path, legends: &BTreeMap<&'static str, Series>) -> Result<(), SimError> {
    let mut out = File::create(path).map_err(|e| SimError::Config(format!("cannot create {}: {e}", path.display())))?;
    for (legend, series) in legends {
        writeln!(out, "{legend}").map_err(io_err)?;
        for (i, values) in series.0.values().enumerate() {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            writeln!(out, "{}:[{}]", i + 1, rendered.join(", ")).map_err(io_err)?;
        }
    }
    Ok(())
}

fn io_err(e: std::io::Error) -> SimError {
    SimError::Config(format!("failed writing metrics output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_legend_header_per_metrics_key() {
        let mut sink = RawDataSink::new(std::env::temp_dir());
        let snap = MetricsSnapshot {
            at: SimTime::ZERO,
            hosts: vec![HostMetrics { id: NodeId(0), send_rate_mbps: 1.0, receive_rate_mbps: 2.0 }],
            flows: vec![],
            links: vec![],
        };
        sink.on_snapshot(&snap);
        assert!(sink.legends.contains_key("host_send_rate"));
        assert!(sink.legends.contains_key("host_receive_rate"));
        assert_eq!(sink.legends["host_send_rate"].0[&0], vec![1.0]);
    }
}
