pub mod marker;
pub mod playback;
pub mod route;
