#![forbid(unsafe_code)]

mod cli;
mod commands;
mod shutdown;
mod startup;

use anyhow::Result;
use tracing::warn;

use cli::Command;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();
    let output = cli.output;

    if let Some(Command::Version) = cli.command {
        println!("aliastables {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = startup::init(&cli)?;

    // Service root span; fields appear in every subsequent log entry
    let _root_span = tracing::span!(
        tracing::Level::INFO,
        "service",
        service.name = "aliastables",
        service.version = env!("CARGO_PKG_VERSION"),
    )
    .entered();

    let service = startup::build_service(&config)?;

    match cli.command {
        Some(Command::Show { alias }) => commands::cmd_show(&service, &alias, output),
        Some(Command::Deps) => commands::cmd_deps(&service, output),
        Some(Command::Resolve { force, aliases }) => {
            run_resolve(&service, &aliases, force, output).await
        }
        None => run_resolve(&service, &[], false, output).await,
        Some(Command::Version) => Ok(()),
    }
}

async fn run_resolve(
    service: &application::alias_service_impl::AliasAppService,
    aliases: &[String],
    force: bool,
    output: cli::OutputFormat,
) -> Result<()> {
    tokio::select! {
        result = commands::cmd_resolve(service, aliases, force, output) => result,
        () = shutdown::shutdown_signal() => {
            warn!("interrupted, stopping alias resolution");
            anyhow::bail!("interrupted")
        }
    }
}
