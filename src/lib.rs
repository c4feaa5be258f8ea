pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod model;
pub mod output;
pub mod shell;
pub mod store;
pub mod utils;

#[cfg(test)]
mod tests;
