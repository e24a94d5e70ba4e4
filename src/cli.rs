//! Command-line arguments for the simulator binary.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Parser)]
#[command(name = "netsim", about = "Discrete-event packet-switched network simulator")]
pub struct Args {
    /// Path to the topology JSON file.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Total simulated duration, in seconds.
    #[arg(short = 't', long = "duration")]
    pub duration_s: f64,

    /// Metrics reporting interval, in seconds.
    #[arg(short = 'p', long = "report-interval")]
    pub report_interval_s: f64,

    /// Distance-vector broadcast interval, in seconds.
    #[arg(short = 'r', long = "routing-update-interval", default_value_t = 0.1)]
    pub routing_update_interval_s: f64,

    /// Directory to write `raw_data.txt` and `performance_curves.jpg` into.
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Restricts the rendered graph to one entity kind and a list of 1-based
    /// ids, e.g. `host:1,2` or `link:3`. Leave unset to plot every entity.
    #[arg(short = 'g', long = "graph")]
    pub graph: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Host,
    Flow,
    Link,
}

#[derive(Debug, Clone)]
pub struct GraphSelector {
    pub kind: GraphKind,
    pub ids: Vec<u64>,
}

impl GraphSelector {
    /// Whether an entity of `kind` at 1-based position `id` (within that
    /// kind, ascending by raw id) should be included in the rendered/written
    /// output. An empty id list means "every entity of this kind"; a selector
    /// for a different kind excludes everything.
    pub fn matches(&self, kind: GraphKind, id: u64) -> bool {
        self.kind == kind && (self.ids.is_empty() || self.ids.contains(&id))
    }
}

impl FromStr for GraphSelector {
    type Err = crate::error::SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind_str, ids_str) = match s.split_once(':') {
            Some((k, ids)) => (k, Some(ids)),
            None => (s, None),
        };
        let kind = match kind_str {
            "host" => GraphKind::Host,
            "flow" => GraphKind::Flow,
            "link" => GraphKind::Link,
            other => return Err(crate::error::SimError::Config(format!("unknown graph selector kind '{other}', expected host, flow, or link"))),
        };
        let ids = match ids_str {
            None => Vec::new(),
            Some(ids) => ids
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<u64>()
                        .map_err(|_| crate::error::SimError::Config(format!("invalid id '{part}' in graph selector")))
                })
                .collect::<Result<Vec<u64>, _>>()?,
        };
        Ok(GraphSelector { kind, ids })
    }
}

impl Args {
    pub fn validate(&self) -> Result<(), crate::error::SimError> {
        if self.duration_s <= 0.0 {
            return Err(crate::error::SimError::Config("duration must be positive".into()));
        }
        if self.report_interval_s <= 0.0 {
            return Err(crate::error::SimError::Config("report interval must be positive".into()));
        }
        if self.routing_update_interval_s <= 0.0 {
            return Err(crate::error::SimError::Config("routing update interval must be positive".into()));
        }
        if let Some(g) = &self.graph {
            GraphSelector::from_str(g)?;
        }
        Ok(())
    }

    pub fn graph_selector(&self) -> Option<GraphSelector> {
        self.graph.as_deref().and_then(|s| GraphSelector::from_str(s).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_and_ids() {
        let sel = GraphSelector::from_str("host:1,2").unwrap();
        assert_eq!(sel.kind, GraphKind::Host);
        assert_eq!(sel.ids, vec![1, 2]);
    }

    #[test]
    fn kind_without_ids_selects_everything_of_that_kind() {
        let sel = GraphSelector::from_str("link").unwrap();
        assert_eq!(sel.kind, GraphKind::Link);
        assert!(sel.ids.is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(GraphSelector::from_str("switch:1").is_err());
    }
}
