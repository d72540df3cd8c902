use anyhow::Context;
use clap::Parser;
use pingpong::cli::{open_transport, AppContext, Cli, Commands, Menu};
use pingpong::logging::init_logging;
use pingpong::output;
use pingpong::probe::BoxedTransport;
use std::io;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut app = AppContext::from_cli(&cli).context("failed to load settings")?;

    match cli.command {
        Some(Commands::Probe(ref cmd)) => cmd.execute(&app).await.context("probe failed"),
        Some(Commands::Load(ref cmd)) => cmd.execute(&app).context("could not load report"),
        Some(Commands::Menu) | None => {
            let stdin = io::stdin();
            let mut menu = Menu::new(&mut app, stdin.lock(), io::stdout());
            menu.run(|| open_transport().map(|t| Box::new(t) as BoxedTransport))
                .await
                .context("menu session failed")
        }
    }
}
