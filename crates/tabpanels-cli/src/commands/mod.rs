//! Command implementations, one module per subcommand.

pub mod rebuild;
pub mod refs;
pub mod render;
pub mod show;
