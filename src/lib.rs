// dongju-gateway - Personal color & face shape analysis gateway
// Author: kelexine (https://github.com/kelexine)

pub mod cli;
pub mod config;
pub mod error;
pub mod localization;
pub mod metrics;
pub mod models;
pub mod server;
pub mod upstream;
pub mod utils;
pub mod vision;
