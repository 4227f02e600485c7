pub mod clamp;
pub mod error;
pub mod models;
pub mod session;
pub mod settings;
pub mod tilt;
