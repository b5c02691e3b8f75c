mod language;
mod sweep;
mod token;

pub use language::cmd_detect_language;
pub use sweep::cmd_sweep;
pub use token::cmd_token_issue;
