//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::context::VaultContext;
use crate::vault::{StatusRow, StatusState};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the status table (File, Updated, Pattern, Hash).
pub fn print_status_table(ctx: &VaultContext, rows: &[StatusRow]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Updated", "Pattern", "Hash"]);

    for row in rows {
        let state = match row.state {
            StatusState::Unchanged => style(row.state.to_string()).dim(),
            StatusState::Updated => style(row.state.to_string()).yellow(),
            StatusState::Unavailable => style(row.state.to_string()).red(),
            StatusState::New => style(row.state.to_string()).green(),
        };
        table.add_row(vec![
            ctx.rel_to_working(&row.abs_path),
            state.to_string(),
            row.pattern.clone().unwrap_or_default(),
            style(status_hash(row)).dim().to_string(),
        ]);
    }

    println!("{table}");
}

/// The stored digest of a row, empty for files not yet in the vault.
fn status_hash(row: &StatusRow) -> String {
    row.digest.map(|d| d.to_base64()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ContentDigest;
    use std::path::PathBuf;

    fn row(digest: Option<ContentDigest>, state: StatusState) -> StatusRow {
        StatusRow {
            path: "a.env".into(),
            abs_path: PathBuf::from("/p/a.env"),
            digest,
            state,
            pattern: None,
        }
    }

    #[test]
    fn hash_column_shows_stored_digest() {
        let digest = ContentDigest::compute(b"a");
        assert_eq!(
            status_hash(&row(Some(digest), StatusState::Unchanged)),
            digest.to_base64()
        );
        assert_eq!(status_hash(&row(None, StatusState::New)), "");
    }
}
