//! CLI subcommand implementations

pub mod deliver;
pub mod init;
pub mod process;
pub mod status;
pub mod validate;
