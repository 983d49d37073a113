//! rulesdesk: terminal admin client for rules-engine management services
//!
//! Layers, inner to outer:
//! - `domain`: condition tree, JSON codec, rule and fact payloads
//! - `application`: editing session, services, notifications
//! - `infrastructure`: HTTP backend and service wiring
//! - `cli`: argument parsing, commands, builder shell

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
