pub mod actions;
pub mod api;
pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod poller;
pub mod snapshot;
pub mod table;
pub mod ui;
pub mod views;
