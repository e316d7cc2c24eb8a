extern crate nano_hd;

#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate serde_json;
extern crate serde_yaml;
extern crate dirs;
#[macro_use]
extern crate log;

pub mod error;
pub mod config;
pub mod commands;
