use crate::config::{OfflineUpdateConfig, OfflineUpdateConfigFile};
use crate::errors::{AppError, AppResult};
use crate::offline::run_offline_update;
use crate::profile::{ConnectionProfile, ProfileStore};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Builds the command tree.
///
/// - `config set|show|clear`: manage the saved server connection
/// - `offline-update`: download the update bundles described by the licensing endpoint
/// - `toml`: same as `offline-update`, with settings read from a TOML file
pub fn build_command() -> Command<'static> {
    Command::new("xray-offline")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .arg(
            Arg::new("home")
                .long("home")
                .global(true)
                .help("Directory holding the saved configuration")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the saved server connection")
                .subcommand(
                    Command::new("set")
                        .about("Save the server connection, replacing any previous one")
                        .arg(
                            Arg::new("url")
                                .long("url")
                                .help("Server URL")
                                .required(true)
                                .action(ArgAction::Set),
                        )
                        .arg(Arg::new("user").long("user").help("User name").action(ArgAction::Set))
                        .arg(
                            Arg::new("password")
                                .long("password")
                                .help("Password")
                                .action(ArgAction::Set),
                        )
                        .arg(
                            Arg::new("apikey")
                                .long("apikey")
                                .help("API key, used instead of the password")
                                .action(ArgAction::Set),
                        )
                        .arg(
                            Arg::new("ssh_key_path")
                                .long("ssh-key-path")
                                .help("Path to the SSH private key")
                                .value_parser(clap::value_parser!(PathBuf))
                                .action(ArgAction::Set),
                        )
                        .arg(
                            Arg::new("ssh_passphrase")
                                .long("ssh-passphrase")
                                .help("Passphrase of the SSH private key")
                                .action(ArgAction::Set),
                        ),
                )
                .subcommand(Command::new("show").about("Print the saved server connection"))
                .subcommand(Command::new("clear").about("Delete the saved server connection")),
        )
        .subcommand(
            Command::new("offline-update")
                .about("Download vulnerability and component updates into zip bundles")
                .after_help("Example:\n  xray-offline offline-update --license-id <token> --url https://updates.example.com/api/v1/updates")
                .arg(
                    Arg::new("license_id")
                        .long("license-id")
                        .help("License token sent to the update list endpoint")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("Update list endpoint")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("scratch_root")
                        .long("scratch-root")
                        .help("Directory for temporary downloads (default: <tmp>/jfrog/xray)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory receiving vuln.zip and comp.zip (default: the scratch root)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("fail_on_download_error")
                        .long("fail-on-download-error")
                        .help("Fail instead of zipping a category with missing files")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("toml")
                .about("Run the offline update using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Parses the process arguments and runs the selected command.
pub async fn cli() -> AppResult<()> {
    let cmd = build_command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    if matches.subcommand().is_none() {
        cmd_for_help
            .print_help()
            .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
        return Ok(());
    }
    run(&matches).await
}

/// Runs the command described by already parsed arguments.
pub async fn run(matches: &ArgMatches) -> AppResult<()> {
    match matches.subcommand() {
        Some(("config", sub)) => run_config(sub),
        Some(("offline-update", sub)) => {
            let license_id = required_str(sub, "license_id")?;
            let url = required_str(sub, "url")?;
            let config = offline_config_from_args(sub);
            run_update(&license_id, &url, &config).await
        }
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .ok_or_else(|| AppError::InvalidInput("config path is required".into()))?;
            let file_config = OfflineUpdateConfigFile::from_toml_file(config_path)?;
            run_update(&file_config.license_id, &file_config.url, &file_config.resolved).await
        }
        _ => Err(AppError::InvalidInput("No command given, see --help".into())),
    }
}

fn run_config(matches: &ArgMatches) -> AppResult<()> {
    match matches.subcommand() {
        Some(("set", sub)) => {
            let store = profile_store(sub);
            let profile = profile_from_args(sub)?.normalized();
            profile.validate()?;
            store.save(&profile)
        }
        Some(("show", sub)) => {
            let store = profile_store(sub);
            match store.load()? {
                Some(profile) => print!("{profile}"),
                None => println!("No configuration saved in {}", store.path().display()),
            }
            Ok(())
        }
        Some(("clear", sub)) => profile_store(sub).clear(),
        _ => Err(AppError::InvalidInput(
            "Expected one of: config set, config show, config clear".into(),
        )),
    }
}

async fn run_update(license_id: &str, url: &str, config: &OfflineUpdateConfig) -> AppResult<()> {
    let client = config.http_client()?;
    let report = run_offline_update(&client, license_id, url, config).await?;

    for archive in &report.archives {
        info!(
            archive = %archive.path.display(),
            entries = archive.entries,
            "Update bundle ready"
        );
    }
    Ok(())
}

fn profile_store(matches: &ArgMatches) -> ProfileStore {
    ProfileStore::from_home(matches.get_one::<PathBuf>("home").map(PathBuf::as_path))
}

fn profile_from_args(matches: &ArgMatches) -> AppResult<ConnectionProfile> {
    Ok(ConnectionProfile {
        url: required_str(matches, "url")?,
        user: optional_str(matches, "user").unwrap_or_default(),
        password: optional_str(matches, "password").unwrap_or_default(),
        api_key: optional_str(matches, "apikey"),
        ssh_passphrase: optional_str(matches, "ssh_passphrase"),
        ssh_key_path: matches.get_one::<PathBuf>("ssh_key_path").cloned(),
        ssh_auth_headers: None,
    })
}

fn offline_config_from_args(matches: &ArgMatches) -> OfflineUpdateConfig {
    let mut config = OfflineUpdateConfig::default();
    if let Some(root) = matches.get_one::<PathBuf>("scratch_root") {
        config.scratch_root = root.clone();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = dir.clone();
    }
    if let Some(&timeout) = matches.get_one::<u64>("timeout") {
        config.timeout_secs = timeout;
    }
    config.fail_on_download_error = matches
        .get_one::<bool>("fail_on_download_error")
        .copied()
        .unwrap_or(false);
    config
}

fn optional_str(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn required_str(matches: &ArgMatches, id: &str) -> AppResult<String> {
    optional_str(matches, id).ok_or_else(|| AppError::InvalidInput(format!("{id} is required")))
}
