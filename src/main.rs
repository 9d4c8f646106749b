use clap::Parser;
use form_autofill::cli::commands::{cmd_bookmarklet, cmd_classify, cmd_extract, cmd_extract_script};
use form_autofill::cli::config::{Cli, Commands, load_config, resolve_inference};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve inference settings: CLI > config > env > defaults
    let inference = resolve_inference(&cli, &config, |key| std::env::var(key).ok());

    match cli.command {
        Commands::Extract { html, form_index } => {
            cmd_extract(&html, form_index)?;
        }
        Commands::ExtractScript => cmd_extract_script(),
        Commands::Classify {
            html,
            fields,
            project,
            trace,
        } => {
            cmd_classify(
                html.as_deref(),
                fields.as_deref(),
                &project,
                trace.as_deref(),
                &inference,
                &config,
            )?;
        }
        Commands::Bookmarklet {
            project,
            html,
            fields,
            output,
            uri_only,
        } => {
            cmd_bookmarklet(
                &project,
                html.as_deref(),
                fields.as_deref(),
                output.as_deref(),
                uri_only,
                &inference,
                &config,
            )?;
        }
    }

    Ok(())
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
