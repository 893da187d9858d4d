use anyhow::Result;
use agent_repl::{
    App, AppConfig, TerminalDisplay,
    cli::Cli,
    console::{console, init_console},
    repl::{InterruptHandle, StdinLines, StdinReader},
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config_dir {
        Some(dir) => AppConfig::load_from(dir),
        None => AppConfig::load(),
    };

    // CLI verbosity takes precedence over config
    init_console(cli.get_effective_verbosity(config.get_verbosity()));

    let input = StdinLines::new();
    let display = Arc::new(TerminalDisplay::new(input.clone()));
    let interrupt = InterruptHandle::new();
    let mut app = App::new(config, display).with_interrupt(interrupt.clone());
    app.load_plugins(!cli.no_agent).await;

    if let Some((name, args)) = cli.single_command() {
        let code = app.run_cli_command(name, args).await;
        app.plugins().unload_all().await;
        std::process::exit(code);
    }

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupt.trigger();
        }
        console().debug("Interrupt listener stopped");
    });

    if let Err(e) = app.run(&mut StdinReader::new(input)).await {
        console().error(&format!("{:#}", e));
        std::process::exit(1);
    }
    // A blocked stdin read would otherwise hold up runtime shutdown.
    std::process::exit(0)
}
