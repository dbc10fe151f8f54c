//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod close;
pub mod commit;
pub mod completions;
pub mod delete_key;
pub mod globs;
pub mod init;
pub mod ls;
pub mod open;
pub mod reveal_key;
pub mod rm;
pub mod set_key;
pub mod status;
