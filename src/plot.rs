//! `JpegPlotSink`: renders one stacked subplot per metrics legend to
//! `performance_curves.jpg`, the headless-raster equivalent of the original
//! `matplotlib` figure (one `Axes` per legend, no live/interactive display).

use crate::error::SimError;
use crate::metrics::{MetricsSink, MetricsSnapshot};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

const LEGENDS: [&str; 9] = [
    "host_send_rate",
    "host_receive_rate",
    "flow_send_rate",
    "flow_receive_rate",
    "flow_avg_RTT",
    "flow_window_size",
    "packet_loss",
    "buffer_occupancy",
    "link_rate",
];

pub struct JpegPlotSink {
    dir: PathBuf,
    // legend -> entity id -> samples over time
    series: BTreeMap<&'static str, BTreeMap<u64, Vec<f64>>>,
}

impl JpegPlotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JpegPlotSink { dir: dir.into(), series: BTreeMap::new() }
    }

    fn push(&mut self, legend: &'static str, entity: u64, value: f64) {
        self.series.entry(legend).or_default().entry(entity).or_default().push(value);
    }
}

impl MetricsSink for JpegPlotSink {
    fn on_snapshot(&mut self, snap: &MetricsSnapshot) {
        for h in &snap.hosts {
            self.push(LEGENDS[0], h.id.0, h.send_rate_mbps);
            self.push(LEGENDS[1], h.id.0, h.receive_rate_mbps);
        }
        for f in &snap.flows {
            self.push(LEGENDS[2], f.id.0, f.send_rate_mbps);
            self.push(LEGENDS[3], f.id.0, f.receive_rate_mbps);
            self.push(LEGENDS[4], f.id.0, f.avg_rtt_ms);
            self.push(LEGENDS[5], f.id.0, f.window_size);
        }
        for l in &snap.links {
            self.push(LEGENDS[6], l.id.0, l.packet_loss as f64);
            self.push(LEGENDS[7], l.id.0, l.buffer_occupancy);
            self.push(LEGENDS[8], l.id.0, l.link_rate_mbps);
        }
    }

    fn finish(self: Box<Self>) -> Result<(), SimError> {
        render_jpeg(&self.dir.join("performance_curves.jpg"), &self.series)
    }
}

fn render_jpeg(path: &std::path::Path, series: &BTreeMap<&'static str, BTreeMap<u64, Vec<f64>>>) -> Result<(), SimError> {
    let populated: Vec<_> = LEGENDS.iter().filter(|l| series.contains_key(**l)).collect();
    if populated.is_empty() {
        return Ok(());
    }

    let rows = populated.len() as u32;
    let root = BitMapBackend::new(path, (1200, 300 * rows)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly(((rows as usize), 1));

    for (panel, legend) in panels.into_iter().zip(populated) {
        let by_entity = &series[*legend];
        let max_len = by_entity.values().map(|v| v.len()).max().unwrap_or(1).max(1);
        let max_y = by_entity
            .values()
            .flat_map(|v| v.iter().copied())
            .fold(0.0_f64, f64::max)
            .max(1.0);

        let mut chart = ChartBuilder::on(&panel)
            .caption(*legend, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(20)
            .y_label_area_size(40)
            .build_cartesian_2d(0..max_len, 0.0..(max_y * 1.1))
            .map_err(plot_err)?;
        chart.configure_mesh().draw().map_err(plot_err)?;

        for (i, (_entity, values)) in by_entity.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            chart
                .draw_series(LineSeries::new(values.iter().enumerate().map(|(x, &y)| (x, y)), color.stroke_width(2)))
                .map_err(plot_err)?;
        }
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

fn plot_err<E: std::fmt::Display>(e: E) -> SimError {
    SimError::Config(format!("failed rendering performance_curves.jpg: {e}"))
}
