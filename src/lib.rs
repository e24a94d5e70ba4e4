pub mod cli;
pub mod constants;
pub mod env;
pub mod error;
pub mod events;
pub mod flow;
pub mod host;
pub mod ids;
pub mod link;
pub mod metrics;
pub mod packet;
pub mod plot;
pub mod queue;
pub mod router;
pub mod sim;
pub mod topology;
