//! `otacheck device-id` — print the device id a query would send.

use crate::cli::{device_id_store, load_settings, Cli};
use crate::errors::Result;

/// Execute the `device-id` command.
pub fn execute(cli: &Cli, imei: Option<&str>) -> Result<()> {
    let (settings, _) = load_settings(cli)?;
    let store = device_id_store(&settings);
    println!("{}", store.resolve(imei)?);
    Ok(())
}
