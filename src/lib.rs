pub mod config;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod routes;
pub mod state;
pub mod types;
