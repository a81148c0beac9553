pub mod boot;
pub mod config;

#[macro_use]
extern crate log;
