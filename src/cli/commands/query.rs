//! `otacheck query` — send one update query and print the decrypted reply.

use std::time::Duration;

use crate::cli::output;
use crate::cli::{device_id_store, region_directory, Cli};
use crate::envelope::QueryArgs;
use crate::errors::Result;
use crate::query::{query_update, QueryContext};
use crate::transport::HttpTransport;

/// Execute the `query` command.
pub fn execute(
    cli: &Cli,
    args: &QueryArgs,
    proxy: Option<&str>,
    timeout: Option<u64>,
    raw: bool,
) -> Result<()> {
    // 1. Config, keys and device id store.
    let (settings, directory) = region_directory(cli)?;
    let device_ids = device_id_store(&settings);
    let mut ctx = QueryContext::new(&directory, &device_ids);
    if args.region.trim().is_empty() {
        ctx = ctx.with_home_region(settings.default_region()?);
    }

    // 2. Transport: CLI flags win over the config file.
    let proxy = proxy.or(settings.proxy.as_deref());
    let timeout = Duration::from_secs(timeout.unwrap_or(settings.timeout_secs));
    let transport = HttpTransport::new(timeout, proxy)?;

    // 3. Query.
    let result = query_update(args, &ctx, &transport)?;

    // 4. Print.
    let printable = if raw {
        serde_json::to_value(&result)?
    } else {
        result.body.clone().unwrap_or(serde_json::Value::Null)
    };
    println!("{}", serde_json::to_string_pretty(&printable)?);

    if result.is_success() {
        output::success("Query completed.");
    } else {
        let msg = result.err_msg.as_deref().unwrap_or("no message");
        output::warning(&format!(
            "Server answered with code {}: {msg}",
            result.response_code
        ));
        if result.response_code == 2004 {
            output::tip("2004 usually means no newer build exists for this version.");
        }
    }

    Ok(())
}
