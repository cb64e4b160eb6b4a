//! One module per subcommand, each exposing `execute`.

pub mod completions;
pub mod device_id;
pub mod query;
pub mod regions;
