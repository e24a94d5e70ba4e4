//! Topology loader: parses the JSON descriptor of the external interface
//! into an `Environment`, validating references and remapping the file's
//! 1-based host/router ids to the registry's 0-based global ids. Hosts and
//! routers are built first so link endpoints resolve, then links, then
//! flows, the same order `input.py`/`env.py` assume.

use crate::constants::{KB_TO_BYTES, MBPS_TO_BYTES_PER_MS, MB_TO_BYTES};
use crate::env::Environment;
use crate::error::SimError;
use crate::flow::congestion::{DEFAULT_FAST_ALPHA, DEFAULT_FAST_INTERVAL_MS};
use crate::flow::CongestionControl;
use crate::ids::NodeId;
use crate::sim::SimTime;
use serde_json::Value;
use std::path::Path;

pub fn load_topology(path: &Path, duration: SimTime, report_interval: SimTime, routing_update_interval: SimTime) -> Result<Environment, SimError> {
    let text = std::fs::read_to_string(path).map_err(|e| SimError::Config(format!("cannot read {}: {e}", path.display())))?;
    let root: Value = serde_json::from_str(&text).map_err(|e| SimError::Config(format!("malformed topology JSON: {e}")))?;

    let num_hosts = field_u64(&root, "Hosts")? as usize;
    let num_routers = field_u64(&root, "Routers")? as usize;

    let mut env = Environment::new(duration, report_interval, routing_update_interval);

    // 1-based file id -> environment NodeId, separately for hosts and routers.
    let host_ids: Vec<NodeId> = (0..num_hosts).map(|_| env.add_host()).collect();
    let router_ids: Vec<NodeId> = (0..num_routers).map(|_| env.add_router()).collect();

    let resolve = |kind: &str, one_based: u64| -> Result<NodeId, SimError> {
        let idx = one_based.checked_sub(1).ok_or_else(|| SimError::Topology(format!("id must be >= 1, got {one_based}")))? as usize;
        match kind {
            "H" => host_ids.get(idx).copied().ok_or_else(|| SimError::Topology(format!("host {one_based} out of range"))),
            "R" => router_ids.get(idx).copied().ok_or_else(|| SimError::Topology(format!("router {one_based} out of range"))),
            other => Err(SimError::Topology(format!("unknown endpoint kind '{other}', expected H or R"))),
        }
    };

    let links = root.get("Links").and_then(Value::as_array).ok_or_else(|| SimError::Topology("missing Links array".into()))?;
    for (i, link) in links.iter().enumerate() {
        let tuple = link.as_array().ok_or_else(|| SimError::Topology(format!("Links[{i}] must be an array")))?;
        if tuple.len() != 5 {
            return Err(SimError::Topology(format!("Links[{i}] must have 5 elements")));
        }
        let rate_mbps = tuple[0].as_f64().ok_or_else(|| SimError::Topology(format!("Links[{i}] rate must be a number")))?;
        let delay_ms = tuple[1].as_f64().ok_or_else(|| SimError::Topology(format!("Links[{i}] delay must be a number")))?;
        let cap_kb = tuple[2].as_u64().ok_or_else(|| SimError::Topology(format!("Links[{i}] cap must be an integer")))?;
        let a = parse_endpoint(&tuple[3], i)?;
        let b = parse_endpoint(&tuple[4], i)?;
        let a_id = resolve(&a.0, a.1)?;
        let b_id = resolve(&b.0, b.1)?;
        let rate_bpms = rate_mbps * MBPS_TO_BYTES_PER_MS;
        let cap_bytes = (cap_kb as u32) * KB_TO_BYTES;
        env.add_link(a_id, b_id, rate_bpms, delay_ms, cap_bytes);
    }

    if let Some(flows) = root.get("Flows").and_then(Value::as_array) {
        for (i, flow) in flows.iter().enumerate() {
            let tuple = flow.as_array().ok_or_else(|| SimError::Topology(format!("Flows[{i}] must be an array")))?;
            if tuple.len() != 5 {
                return Err(SimError::Topology(format!("Flows[{i}] must have 5 elements")));
            }
            let data_mb = tuple[0].as_f64().ok_or_else(|| SimError::Topology(format!("Flows[{i}] data amount must be a number")))?;
            let start_s = tuple[1].as_f64().ok_or_else(|| SimError::Topology(format!("Flows[{i}] start must be a number")))?;
            let src_one_based = tuple[2].as_u64().ok_or_else(|| SimError::Topology(format!("Flows[{i}] src must be an integer")))?;
            let dest_one_based = tuple[3].as_u64().ok_or_else(|| SimError::Topology(format!("Flows[{i}] dest must be an integer")))?;
            let cc_name = tuple[4].as_str().ok_or_else(|| SimError::Topology(format!("Flows[{i}] cc must be a string")))?;

            let src = resolve("H", src_one_based)?;
            let dest = resolve("H", dest_one_based)?;
            let cc = match cc_name {
                "Tahoe" => CongestionControl::tahoe(),
                "FAST" => CongestionControl::fast(DEFAULT_FAST_ALPHA, DEFAULT_FAST_INTERVAL_MS),
                other => return Err(SimError::Topology(format!("Flows[{i}] unknown congestion control '{other}'"))),
            };
            let data_bytes = (data_mb * MB_TO_BYTES) as u64;
            env.add_flow(src, dest, data_bytes, SimTime::from_secs_f64(start_s), cc);
        }
    }

    Ok(env)
}

fn field_u64(root: &Value, name: &str) -> Result<u64, SimError> {
    root.get(name).and_then(Value::as_u64).ok_or_else(|| SimError::Topology(format!("missing or invalid '{name}' field")))
}

fn parse_endpoint(v: &Value, link_index: usize) -> Result<(String, u64), SimError> {
    let arr = v.as_array().ok_or_else(|| SimError::Topology(format!("Links[{link_index}] endpoint must be [kind, id]")))?;
    if arr.len() != 2 {
        return Err(SimError::Topology(format!("Links[{link_index}] endpoint must have exactly 2 elements")));
    }
    let kind = arr[0].as_str().ok_or_else(|| SimError::Topology(format!("Links[{link_index}] endpoint kind must be a string")))?;
    let id = arr[1].as_u64().ok_or_else(|| SimError::Topology(format!("Links[{link_index}] endpoint id must be an integer")))?;
    Ok((kind.to_string(), id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_FIXTURE_ID: AtomicU64 = AtomicU64::new(0);

    struct TempJsonFile {
        path: PathBuf,
    }

    impl TempJsonFile {
        fn new(contents: &str) -> Self {
            let unique = NEXT_FIXTURE_ID.fetch_add(1, Ordering::Relaxed);
            let mut path = std::env::temp_dir();
            path.push(format!("netsim_topology_test_{}_{unique}.json", std::process::id()));
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(contents.as_bytes()).unwrap();
            TempJsonFile { path }
        }
    }

    impl Drop for TempJsonFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn write_fixture(json: &str) -> TempJsonFile {
        TempJsonFile::new(json)
    }

    #[test]
    fn single_hop_topology_loads() {
        let json = r#"{ "Hosts": 2, "Routers": 0,
            "Links": [[10,10,64,["H",1],["H",2]]],
            "Flows": [[20,1.0,1,2,"Tahoe"]] }"#;
        let fixture = write_fixture(json);
        let env = load_topology(&fixture.path, SimTime::from_secs_f64(120.0), SimTime::from_secs_f64(0.5), SimTime::from_secs_f64(0.1)).unwrap();
        assert_eq!(env.hosts.len(), 2);
        assert_eq!(env.links.len(), 1);
    }

    #[test]
    fn out_of_range_host_reference_is_a_topology_error() {
        let json = r#"{ "Hosts": 1, "Routers": 0,
            "Links": [[10,10,64,["H",1],["H",2]]],
            "Flows": [] }"#;
        let fixture = write_fixture(json);
        let err = load_topology(&fixture.path, SimTime::from_secs_f64(1.0), SimTime::from_secs_f64(1.0), SimTime::from_secs_f64(1.0)).unwrap_err();
        assert!(matches!(err, SimError::Topology(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let fixture = write_fixture("not json");
        let err = load_topology(&fixture.path, SimTime::from_secs_f64(1.0), SimTime::from_secs_f64(1.0), SimTime::from_secs_f64(1.0)).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }
}
