use clap::Parser;
use netsim_rs::cli::Args;
use netsim_rs::error::SimError;
use netsim_rs::metrics::RawDataSink;
use netsim_rs::plot::JpegPlotSink;
use netsim_rs::sim::{SimTime, Simulator};
use netsim_rs::topology::load_topology;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        tracing::error!(%e, "simulation failed");
        std::process::exit(e.exit_code());
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    args.validate()?;

    let duration = SimTime::from_secs_f64(args.duration_s);
    let report_interval = SimTime::from_secs_f64(args.report_interval_s);
    let routing_update_interval = SimTime::from_secs_f64(args.routing_update_interval_s);

    let mut env = load_topology(&args.input, duration, report_interval, routing_update_interval)?;
    env.set_graph_filter(args.graph_selector());
    env.add_sink(Box::new(RawDataSink::new(&args.output_dir)));
    env.add_sink(Box::new(JpegPlotSink::new(&args.output_dir)));

    let mut sim = Simulator::default();
    env.spawn_startup_events(&mut sim);
    env.run(&mut sim)?;
    env.finish()?;

    Ok(())
}
