use anyhow::Result;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod util;
mod cmd_serve;
mod cmd_check;
mod cmd_dump;
mod cmd_get;
mod cmd_walk;

fn init_logger(debug: bool) {
    // RUST_LOG wins; otherwise info, or debug with --debug.
    let default = if debug { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let cli = cli::Cli::parse_args();
    init_logger(cli.debug);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: cli::Cli) -> Result<()> {
    let debug = cli.debug;
    match cli.cmd {
        cli::Cmd::Serve { src, poll_ms, force_after } =>
            cmd_serve::exec(src.config(debug)?, poll_ms, force_after),

        cli::Cmd::Check { src, json } =>
            cmd_check::exec(src.config(debug)?, json),

        cli::Cmd::Dump { src, json } =>
            cmd_dump::exec(src.config(debug)?, json),

        cli::Cmd::Get { src, oid } =>
            cmd_get::exec(src.config(debug)?, oid),

        cli::Cmd::Walk { src, oid, json } =>
            cmd_walk::exec(src.config(debug)?, oid, json),
    }
}
