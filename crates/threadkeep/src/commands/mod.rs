//! Command implementations that work outside an initialized root.

pub mod init;
