//! CLI command handlers. Each command is in its own file for clarity.

mod analyze;
mod check;
mod init;
mod submit;

pub use analyze::run_analyze;
pub use check::run_check;
pub use init::run_init;
pub use submit::run_submit;
