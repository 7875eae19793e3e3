//! copilot-dash: a data dashboard with three chart panels and a question box,
//! backed by a remote HTTP API.

pub mod cancel;
pub mod chart;
pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod panels;
pub mod series;
pub mod web;
