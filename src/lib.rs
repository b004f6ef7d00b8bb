pub mod aggregate;
pub mod app;
pub mod config;
pub mod controller;
pub mod domain;
pub mod entry;
pub mod error;
pub mod output;
pub mod remote;
