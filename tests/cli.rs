//! Integration tests spawning the `netsim` binary directly via `CARGO_BIN_EXE_netsim`.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("time went backwards").as_nanos();
    let dir = std::env::temp_dir().join(format!("netsim-rs-{prefix}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const MINIMAL_TOPOLOGY: &str = r#"{ "Hosts": 2, "Routers": 0,
    "Links": [[10,10,64,["H",1],["H",2]]],
    "Flows": [[1,0.0,1,2,"Tahoe"]] }"#;

#[test]
fn missing_input_file_exits_with_config_error_code() {
    let dir = unique_temp_dir("missing-input");
    let missing = dir.join("does_not_exist.json");

    let output = Command::new(env!("CARGO_BIN_EXE_netsim"))
        .args(["-i", missing.to_str().unwrap(), "-t", "1.0", "-p", "1.0"])
        .output()
        .expect("run netsim");

    assert_eq!(output.status.code(), Some(2));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn non_positive_duration_exits_with_config_error_code() {
    let dir = unique_temp_dir("bad-duration");
    let topo = write_file(&dir, "topology.json", MINIMAL_TOPOLOGY);

    let output = Command::new(env!("CARGO_BIN_EXE_netsim"))
        .args(["-i", topo.to_str().unwrap(), "-t", "0", "-p", "1.0"])
        .output()
        .expect("run netsim");

    assert_eq!(output.status.code(), Some(2));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn valid_topology_run_produces_both_output_files() {
    let dir = unique_temp_dir("happy-path");
    let topo = write_file(&dir, "topology.json", MINIMAL_TOPOLOGY);

    let output = Command::new(env!("CARGO_BIN_EXE_netsim"))
        .args([
            "-i",
            topo.to_str().unwrap(),
            "-t",
            "5.0",
            "-p",
            "0.5",
            "-o",
            dir.to_str().unwrap(),
        ])
        .output()
        .expect("run netsim");

    assert!(output.status.success(), "netsim failed: stderr={}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.join("raw_data.txt").exists());
    assert!(dir.join("performance_curves.jpg").exists());

    let _ = fs::remove_dir_all(&dir);
}
