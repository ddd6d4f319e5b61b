pub mod analysis_routes;
pub mod responses;
pub mod server;

pub use server::{start_server, ApiState};
