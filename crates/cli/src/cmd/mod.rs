//! Command implementations

pub mod delete;
pub mod diff;
pub mod fork;
pub mod init;
pub mod label;
pub mod lineages;
pub mod log;
pub mod merge;
pub mod show;
pub mod write;
