pub mod health;
pub mod route;
pub mod sessions;
pub mod snapshot;
