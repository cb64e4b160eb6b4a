//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::region::{Region, RegionDirectory};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the region table (Region, Host, Carrier, Language, Key version, Key).
pub fn print_regions_table(directory: &RegionDirectory) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Region", "Host", "Carrier", "Language", "Key version", "Key"]);

    for region in Region::ALL {
        let group = region.key_group();
        let configured = if directory.has_key(group) {
            "configured"
        } else if directory.key_error(group).is_some() {
            "invalid"
        } else {
            "missing"
        };
        table.add_row(vec![
            region.code().to_string(),
            directory.host(group).to_string(),
            region.carrier_id().to_string(),
            region.language().to_string(),
            group.public_key_version().to_string(),
            configured.to_string(),
        ]);
    }

    println!("{table}");
}
