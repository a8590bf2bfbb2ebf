//! Utility modules for the blog build pipeline.

pub mod assets;
pub mod checker;
pub mod command;
pub mod compile;
pub mod log;
pub mod minify;
