use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use mysql_grant_sync::engine::{Engine, MysqlCli};
use mysql_grant_sync::logging::{init_logging, LogFormat, LoggingConfig};
use mysql_grant_sync::manifest::parse_manifest;
use mysql_grant_sync::model::Principal;
use mysql_grant_sync::reconcile::{self, report};
use mysql_grant_sync::{
    client_config, parse_listing_file, parse_version, plan_from_listing, ClientOptions,
    GrantSyncError,
};

#[derive(Parser)]
#[command(name = "mysql-grant-sync")]
#[command(author, version, about = "Reconcile MySQL grants with a declared manifest")]
struct Cli {
    /// Path to the mysql client binary
    #[arg(long, global = true)]
    mysql: Option<PathBuf>,

    /// Directory holding .mylogin.cnf or .my.cnf
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Engine version to assume instead of asking the server (e.g. 8.0.36)
    #[arg(long, global = true)]
    engine_version: Option<String>,

    /// Log output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a saved SHOW GRANTS listing and print the normalized grants
    Parse {
        /// File holding SHOW GRANTS output
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the grants currently held on the server
    Show {
        /// Accounts to inspect as user@host (defaults to every account)
        #[arg(short, long)]
        user: Vec<String>,
    },

    /// Print the statements needed to reach the manifest
    Plan {
        /// Path to the grant manifest
        #[arg(short, long)]
        manifest: PathBuf,

        /// Plan against a saved SHOW GRANTS listing instead of the server
        #[arg(long)]
        observed: Option<PathBuf>,
    },

    /// Execute the statements needed to reach the manifest
    Apply {
        /// Path to the grant manifest
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::new(cli.log_format).with_verbosity(cli.verbose));

    let client = ClientOptions {
        program: cli.mysql.clone(),
        home: cli.home.clone(),
    };
    let version_override = cli.engine_version.as_deref();

    match cli.command {
        Commands::Parse { input } => {
            let version = parse_version(version_override)?;
            let grants = parse_listing_file(&input, version.as_ref())?;
            report::print_grants(&grants);
        }

        Commands::Show { user } => {
            let engine = MysqlCli::new(client_config(&client, None));
            let principals = if user.is_empty() {
                engine
                    .list_principals()
                    .map_err(|f| GrantSyncError::PrincipalListFailed { message: f.message })?
            } else {
                user.iter()
                    .map(|u| {
                        Principal::split(u).ok_or_else(|| GrantSyncError::InvalidPrincipal {
                            user: u.clone(),
                            message: "expected user@host".to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?
            };

            let version = reconcile::resolve_version(&engine, version_override)?;
            let observation = reconcile::observe(&engine, &principals, Some(&version));
            report::print_grants(&observation.grants);

            for (principal, message) in &observation.failures {
                eprintln!("error: {}: {}", principal, message);
            }
            if !observation.failures.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Plan { manifest, observed } => {
            let manifest = parse_manifest(&manifest)?;
            let plans = match observed {
                Some(listing) => plan_from_listing(&manifest, &listing, version_override)?,
                None => {
                    let engine = MysqlCli::new(client_config(&client, Some(&manifest.connection)));
                    let (plans, unobserved) =
                        reconcile::reconcile(&engine, &manifest, version_override, true)?;
                    if unobserved.has_failures() {
                        report::print_report(&unobserved);
                        return Ok(ExitCode::FAILURE);
                    }
                    plans
                }
            };
            report::print_plan(&plans);
        }

        Commands::Apply { manifest } => {
            let manifest = parse_manifest(&manifest)?;
            let engine = MysqlCli::new(client_config(&client, Some(&manifest.connection)));
            let (_, result) = reconcile::reconcile(&engine, &manifest, version_override, false)?;
            report::print_report(&result);

            if result.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
