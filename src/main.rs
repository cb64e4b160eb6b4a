use clap::Parser;
use otacheck::cli::{Cli, Commands};
use otacheck::envelope::QueryArgs;
use otacheck::errors::Stage;

fn main() {
    let cli = Cli::parse();
    otacheck::cli::init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Query {
            ref ota_version,
            ref region,
            ref model,
            ref carrier,
            ref mode,
            ref imei,
            ref android_version,
            ref coloros_version,
            ref proxy,
            timeout,
            raw,
        } => {
            let args = QueryArgs {
                ota_version: ota_version.clone(),
                region: region.clone(),
                model: model.clone(),
                nv_carrier: carrier.clone(),
                mode: mode.clone(),
                imei: imei.clone(),
                android_version: android_version.clone(),
                coloros_version: coloros_version.clone(),
            };
            otacheck::cli::commands::query::execute(&cli, &args, proxy.as_deref(), timeout, raw)
        }
        Commands::Regions => otacheck::cli::commands::regions::execute(&cli),
        Commands::DeviceId { ref imei } => {
            otacheck::cli::commands::device_id::execute(&cli, imei.as_deref())
        }
        Commands::Completions { shell } => otacheck::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        otacheck::cli::output::error(&e.to_string());
        match e.stage() {
            Stage::Request => otacheck::cli::output::tip(
                "The request could not be built; check the configured public keys.",
            ),
            Stage::Response => otacheck::cli::output::tip(
                "The server reply could not be read; check the network, proxy and region.",
            ),
            Stage::Local => {}
        }
        std::process::exit(1);
    }
}
