pub mod cache;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod models;
pub mod origin;
pub mod relay;
pub mod selection;
pub mod services;
pub mod web;
