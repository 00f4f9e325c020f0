//! HTTP request handlers organized by route

pub mod health;
pub mod play;
pub mod proxy;
pub mod video;
