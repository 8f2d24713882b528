pub mod config;
pub mod logging;

pub mod history;
pub mod payload;
pub mod record;
pub mod submit;
pub mod transport;
