//! CLI command implementations

mod results;
mod search;
mod targets;
mod version;

pub use results::{group_results, list_command, print_groups};
pub use search::{search_command, search_filter, search_options, Dimension};
pub use targets::targets_command;
pub use version::{version_command, version_string};
