mod config;
mod logging;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use config::AppConfig;
use livery_adapters::{
    present_asset_check, present_variant_row, BackgroundAssetPipeline, FsAssetDecoder,
    JsonCatalogSource, SystemClock,
};
use livery_application::{
    AssetDecoder, CatalogSource, CheckAssetsCommand, ConfiguratorService,
};
use livery_domain::{Catalog, VariantMachine};
use tracing::info;

fn main() -> ExitCode {
    logging::init_logging();
    let args: Vec<String> = std::env::args().collect();

    let invocation = parse_command(&args);
    match run_command(invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Usage(msg)) => {
            eprintln!("{msg}");
            print_usage();
            ExitCode::from(2)
        }
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Ui,
    List,
    Check,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Overrides {
    asset_root: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    transition_ms: Option<u64>,
}

impl Overrides {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(root) = self.asset_root {
            config.asset_root = root;
        }
        if let Some(path) = self.catalog_path {
            config.catalog_path = Some(path);
        }
        if let Some(millis) = self.transition_ms {
            config.transition_delay = Duration::from_millis(millis);
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    command: Command,
    overrides: Overrides,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CommandError {
    Usage(String),
    Runtime(String),
}

fn parse_command(args: &[String]) -> Result<Invocation, CommandError> {
    let mut command = None;
    let mut overrides = Overrides::default();
    let mut rest = args.iter().skip(1);

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--assets" => {
                overrides.asset_root = Some(PathBuf::from(flag_value(&mut rest, "--assets")?));
            }
            "--catalog" => {
                overrides.catalog_path = Some(PathBuf::from(flag_value(&mut rest, "--catalog")?));
            }
            "--transition-ms" => {
                let raw = flag_value(&mut rest, "--transition-ms")?;
                let millis = raw.parse::<u64>().map_err(|_| {
                    CommandError::Usage(format!("invalid transition duration: {raw}"))
                })?;
                overrides.transition_ms = Some(millis);
            }
            "ui" | "list" | "check" if command.is_none() => {
                command = Some(match arg.as_str() {
                    "list" => Command::List,
                    "check" => Command::Check,
                    _ => Command::Ui,
                });
            }
            other => return Err(CommandError::Usage(format!("unknown argument: {other}"))),
        }
    }

    Ok(Invocation {
        command: command.unwrap_or(Command::Ui),
        overrides,
    })
}

fn flag_value<'a>(
    rest: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a String, CommandError> {
    rest.next()
        .filter(|value| !value.starts_with("--"))
        .ok_or_else(|| CommandError::Usage(format!("missing value for {flag}")))
}

fn run_command(invocation: Result<Invocation, CommandError>) -> Result<(), CommandError> {
    let Invocation { command, overrides } = invocation?;
    let config = overrides.apply(AppConfig::default());
    let catalog = load_catalog(&config)?;

    match command {
        Command::Ui => {
            info!(
                assets = %config.asset_root.display(),
                variants = catalog.len(),
                "starting configurator window"
            );
            let service = build_service(&config, catalog);
            ui::launch_window(service, config.window_size).map_err(CommandError::Runtime)
        }
        Command::List => {
            for variant in catalog.variants() {
                println!("{}", present_variant_row(variant));
            }
            Ok(())
        }
        Command::Check => {
            let service = build_service(&config, catalog);
            let checks = service.check_assets(CheckAssetsCommand);
            for check in &checks {
                println!("{}", present_asset_check(check));
            }
            let failed = checks.iter().filter(|check| check.result.is_err()).count();
            if failed > 0 {
                return Err(CommandError::Runtime(format!(
                    "{failed} of {} assets failed to load",
                    checks.len()
                )));
            }
            Ok(())
        }
    }
}

fn load_catalog(config: &AppConfig) -> Result<Catalog, CommandError> {
    let source = match &config.catalog_path {
        Some(path) => JsonCatalogSource::from_path(path),
        None => JsonCatalogSource::builtin(),
    };
    source
        .load_catalog()
        .map_err(|error| CommandError::Runtime(format!("failed to load catalog: {error}")))
}

fn build_service(config: &AppConfig, catalog: Catalog) -> ConfiguratorService {
    let decoder: Arc<dyn AssetDecoder> = Arc::new(FsAssetDecoder::new(config.asset_root.clone()));
    ConfiguratorService::new(
        VariantMachine::new(catalog).with_transition_delay(config.transition_delay),
        Arc::clone(&decoder),
        Box::new(BackgroundAssetPipeline::new(decoder)),
        Box::new(SystemClock::new()),
    )
}

fn print_usage() {
    println!("usage:");
    println!("  livery [ui] [--assets <dir>] [--catalog <file>] [--transition-ms <n>]");
    println!("  livery list [--catalog <file>]");
    println!("  livery check [--assets <dir>] [--catalog <file>]");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("livery")
            .chain(values.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_arguments_opens_the_window() {
        let invocation = parse_command(&args(&[])).expect("should parse");
        assert_eq!(invocation.command, Command::Ui);
        assert_eq!(invocation.overrides, Overrides::default());
    }

    #[test]
    fn parse_check_with_flags() {
        let invocation = parse_command(&args(&[
            "check",
            "--assets",
            "public",
            "--transition-ms",
            "250",
        ]))
        .expect("should parse");
        assert_eq!(invocation.command, Command::Check);

        let config = invocation.overrides.apply(AppConfig::default());
        assert_eq!(config.asset_root, PathBuf::from("public"));
        assert_eq!(config.transition_delay, Duration::from_millis(250));
        assert_eq!(config.catalog_path, None);
    }

    #[test]
    fn parse_rejects_unknown_and_incomplete_arguments() {
        assert!(matches!(
            parse_command(&args(&["paint"])),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            parse_command(&args(&["list", "--catalog"])),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            parse_command(&args(&["--catalog", "--assets", "x"])),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            parse_command(&args(&["--transition-ms", "soon"])),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            parse_command(&args(&["list", "check"])),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn missing_catalog_file_is_a_runtime_error() {
        let result = run_command(parse_command(&args(&[
            "list",
            "--catalog",
            "definitely/not/here.json",
        ])));
        assert!(matches!(result, Err(CommandError::Runtime(_))));
    }

    #[test]
    fn check_fails_when_assets_are_missing() {
        let result = run_command(parse_command(&args(&[
            "check",
            "--assets",
            "definitely/not/here",
        ])));
        assert!(matches!(result, Err(CommandError::Runtime(msg)) if msg.contains("4 of 4")));
    }
}
