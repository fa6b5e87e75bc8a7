pub mod generator;
pub mod handlers;
pub mod models;
pub mod scoring;
pub mod service;
pub mod validation;
