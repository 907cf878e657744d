mod config_warnings;
mod layout;

pub use config_warnings::warn_unconfigured;
pub use layout::RunLayout;
