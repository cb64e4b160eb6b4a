//! `otacheck regions` — show the region table and which keys are configured.

use crate::cli::output;
use crate::cli::{region_directory, Cli};
use crate::errors::Result;
use crate::region::KeyGroup;

/// Execute the `regions` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_, directory) = region_directory(cli)?;
    output::print_regions_table(&directory);

    for group in KeyGroup::ALL {
        if let Some(reason) = directory.key_error(group) {
            output::warning(&format!("Public key for '{}' is unusable: {reason}", group.name()));
        }
    }

    let missing: Vec<&str> = KeyGroup::ALL
        .into_iter()
        .filter(|g| !directory.has_key(*g) && directory.key_error(*g).is_none())
        .map(KeyGroup::name)
        .collect();
    if !missing.is_empty() {
        output::tip(&format!(
            "Add public keys for {} under [public_keys] in .otacheck.toml to query those regions.",
            missing.join(", ")
        ));
    }

    Ok(())
}
