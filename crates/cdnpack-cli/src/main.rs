use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

mod completion;
mod dispatch;
mod logging;
mod render;

use completion::CliCompletionShell;
use render::{current_output_style, render_status_line};

#[derive(Parser, Debug)]
#[command(name = "cdnpack")]
#[command(about = "Front-end asset manager for CDN-hosted libraries", long_about = None)]
struct Cli {
    /// Config file; defaults to ./cdnpack.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    js_root: Option<PathBuf>,
    #[arg(long, global = true)]
    css_root: Option<PathBuf>,
    /// Print the JSON response instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the registry; short or missing queries list everything.
    Search { query: Option<String> },
    Versions { name: String },
    Install { name: String, version: String },
    Reinstall { name: String, version: String },
    Uninstall { name: String },
    /// List installed package versions.
    List,
    /// List installed versions with a newer release.
    Updates,
    /// List installed files; every filter takes `*`, `none` or a comma list.
    Files {
        #[arg(long = "package", default_value = "*")]
        packages: String,
        #[arg(long = "type", default_value = "*")]
        types: String,
        #[arg(long = "skip-package", default_value = "*")]
        skip_packages: String,
        #[arg(long = "skip-file", default_value = "*")]
        skip_files: String,
    },
    /// Run a raw action and print its JSON response.
    Request {
        action: String,
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = dispatch::parse_param)]
        params: Vec<(String, String)>,
    },
    Completions {
        #[arg(value_enum)]
        shell: CliCompletionShell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init_logging(cli.verbose) {
        eprintln!("warning: {err:#}");
    }

    match dispatch::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!(
                "{}",
                render_status_line(current_output_style(), "error", &format!("{err:#}"))
            );
            ExitCode::FAILURE
        }
    }
}
