//! Script definitions and their resolution into shell commands
//!
//! A [`script::Registry`] holds the named scripts read from the config file.
//! [`builder`] turns one of them into the flat list of commands it runs,
//! following references to other scripts, and [`hooks`] finds the `pre`/`post`
//! scripts that run around it.

pub mod builder;
pub mod hooks;
pub mod script;
