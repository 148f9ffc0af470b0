//! Command-line shell over the user service.
//!
//! # Responsibility
//! - Wire configuration, logging and `UserService` together.
//! - Offer small commands to inspect, import and export record files.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use usermgmt_core::{
    core_version, init_logging, LoadOptions, LoadReport, ServiceConfig, ServiceError, User,
    UserService,
};

#[derive(Parser)]
#[command(name = "usermgmt", version, about = "User record management")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the core version.
    Ping,
    /// Load a record file and print its users.
    List {
        #[arg(long)]
        file: PathBuf,
    },
    /// Load a record file, optionally replacing, then export the result.
    Import {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        replace: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Add two sample users, export them, and reload the export.
    Demo {
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    init_logging(&config.log_level, config.log_dir.as_deref()).context("starting logging")?;

    let service = UserService::new(config);
    match cli.command {
        Command::Ping => {
            println!("usermgmt_core version={}", core_version());
        }
        Command::List { file } => {
            let report = unwrap_response(
                service.load_users_from_file(&file, LoadOptions::default()).into_result(),
            )?;
            print_report(&report);
            print_users(&unwrap_response(service.list_users().into_result())?);
        }
        Command::Import { file, replace, out } => {
            let options = LoadOptions {
                replace_existing: replace,
            };
            let report =
                unwrap_response(service.load_users_from_file(&file, options).into_result())?;
            print_report(&report);
            if let Some(out) = out {
                let written = unwrap_response(service.export_users_to_file(&out).into_result())?;
                println!("exported {written} users to {}", out.display());
            }
        }
        Command::Demo { file } => run_demo(&service, file)?,
    }
    Ok(())
}

fn run_demo(service: &UserService, file: PathBuf) -> Result<()> {
    for record in [
        json!({"id": 1, "name": "Alice Hetun", "email": "alice@example.com"}),
        json!({"id": 2, "name": "Bob Smith", "email": "bob@example.com"}),
    ] {
        unwrap_response(service.add_user(&record).into_result())?;
    }

    unwrap_response(service.export_users_to_file(&file).into_result())?;
    let report = unwrap_response(
        service
            .load_users_from_file(
                &file,
                LoadOptions {
                    replace_existing: true,
                },
            )
            .into_result(),
    )?;
    print_report(&report);

    let users = unwrap_response(service.list_users().into_result())?;
    if users.is_empty() {
        bail!("demo reload produced no users");
    }
    print_users(&users);
    Ok(())
}

fn unwrap_response<T>(result: Result<T, ServiceError>) -> Result<T> {
    result.map_err(|error| {
        let mut message = format!("{}: {}", error.code.as_str(), error.message);
        for violation in &error.violations {
            message.push_str(&format!("\n  - {violation}"));
        }
        anyhow::anyhow!(message)
    })
}

fn print_report(report: &LoadReport) {
    println!(
        "loaded: applied={} (inserted={} overwritten={}) skipped={}",
        report.applied(),
        report.inserted,
        report.overwritten,
        report.skipped
    );
    for skipped in &report.skipped_records {
        let reasons: Vec<String> = skipped.violations.iter().map(ToString::to_string).collect();
        println!("  skipped #{}: {}", skipped.position, reasons.join("; "));
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users in service.");
        return;
    }
    for (index, user) in users.iter().enumerate() {
        println!("{}. {user}", index + 1);
    }
}
