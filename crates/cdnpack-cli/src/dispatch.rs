use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use cdnpack_core::CdnpackConfig;
use cdnpack_engine::{Engine, Request, Response};
use cdnpack_installer::{FileQuery, Selector};
use cdnpack_registry::{AssetSource, HttpAssetSource, HttpRegistryClient, RegistryClient};
use tracing::debug;

use crate::completion::write_completions_script;
use crate::render::{
    format_file_lines, format_installed_lines, format_search_lines, format_update_lines,
    TerminalProgress, TerminalRenderer,
};
use crate::{Cli, Commands};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "cdnpack.toml";

pub(crate) fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Completions { shell } = &cli.command {
        let mut stdout = io::stdout().lock();
        write_completions_script(*shell, &mut stdout)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config = resolve_config(cli.config.as_deref(), &cwd)?
        .with_roots(cli.js_root.clone(), cli.css_root.clone());
    debug!(
        js_root = %config.js_root.display(),
        css_root = %config.css_root.display(),
        policy = config.uninstall_match.as_str(),
        "configuration resolved"
    );

    let registry = HttpRegistryClient::new(&config)?;
    let assets = HttpAssetSource::new(&config)?;
    let engine = Engine::new(config, registry, assets);

    if cli.json || matches!(cli.command, Commands::Request { .. }) {
        let response = match command_request(&cli.command) {
            Ok(request) => engine.handle(request),
            Err(err) => Response::from(err),
        };
        return print_response(&response);
    }

    run_interactive(&engine, cli.command)?;
    Ok(ExitCode::SUCCESS)
}

/// Explicit `--config` wins; otherwise `cdnpack.toml` in `cwd` is used when present.
pub(crate) fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<CdnpackConfig> {
    if let Some(path) = explicit {
        return CdnpackConfig::load(path);
    }

    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        return CdnpackConfig::load(&candidate);
    }
    Ok(CdnpackConfig::default())
}

pub(crate) fn parse_param(raw: &str) -> Result<(String, String), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{raw}'"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Maps a subcommand onto the request it stands for.
pub(crate) fn command_request(command: &Commands) -> cdnpack_core::CdnResult<Request> {
    let request = match command {
        Commands::Search { query } => Request::Search {
            query: query.clone().unwrap_or_default(),
        },
        Commands::Versions { name } => Request::Versions { name: name.clone() },
        Commands::Install { name, version } => Request::Install {
            name: name.clone(),
            version: version.clone(),
        },
        Commands::Reinstall { name, version } => Request::Reinstall {
            name: name.clone(),
            version: version.clone(),
        },
        Commands::Uninstall { name } => Request::Uninstall { name: name.clone() },
        Commands::List => Request::Installed,
        Commands::Updates => Request::Updates,
        Commands::Files {
            packages,
            types,
            skip_packages,
            skip_files,
        } => Request::Files(file_query(packages, types, skip_packages, skip_files)),
        Commands::Request { action, params } => {
            let params: BTreeMap<String, String> = params.iter().cloned().collect();
            Request::from_action(action, &params)?
        }
        Commands::Completions { .. } => {
            return Err(cdnpack_core::CdnError::invalid_request(
                "completions do not map to a request",
            ))
        }
    };
    Ok(request)
}

fn file_query(packages: &str, types: &str, skip_packages: &str, skip_files: &str) -> FileQuery {
    FileQuery {
        packages: Selector::parse(packages),
        types: Selector::parse(types),
        skip_packages: Selector::parse(skip_packages),
        skip_files: Selector::parse(skip_files),
    }
}

fn print_response(response: &Response) -> Result<ExitCode> {
    let json = response
        .to_json()
        .context("failed to serialise response")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("failed writing response")?;
    Ok(if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_interactive<R, A>(engine: &Engine<R, A>, command: Commands) -> Result<()>
where
    R: RegistryClient,
    A: AssetSource,
{
    let renderer = TerminalRenderer::current();
    let style = renderer.style();

    match command {
        Commands::Search { query } => {
            let hits = engine.search(query.as_deref().unwrap_or_default())?;
            if hits.is_empty() {
                renderer.print_status("info", "No packages found");
            }
            renderer.print_lines(&format_search_lines(&hits, style));
        }
        Commands::Versions { name } => {
            let versions = engine.list_versions(&name)?;
            renderer.print_lines(&versions);
        }
        Commands::Install { name, version } => {
            install(engine, renderer, &name, &version, false)?;
        }
        Commands::Reinstall { name, version } => {
            install(engine, renderer, &name, &version, true)?;
        }
        Commands::Uninstall { name } => {
            let outcome = engine.uninstall(&name)?;
            if outcome.removed_dirs == 0 {
                renderer.print_status("warn", &format!("No installed directories matched {name}"));
            }
            renderer.print_status("ok", &outcome.message());
        }
        Commands::List => {
            let installed: Vec<_> = engine.list_installed()?.into_iter().collect();
            if installed.is_empty() {
                renderer.print_status("info", "No packages installed");
            }
            renderer.print_lines(&format_installed_lines(&installed));
        }
        Commands::Updates => {
            let updates = engine.list_updates()?;
            if updates.is_empty() {
                renderer.print_status("ok", "All installed packages are up to date");
            }
            renderer.print_lines(&format_update_lines(&updates, style));
        }
        Commands::Files {
            packages,
            types,
            skip_packages,
            skip_files,
        } => {
            let query = file_query(&packages, &types, &skip_packages, &skip_files);
            let files = engine.select_files(&query)?;
            renderer.print_lines(&format_file_lines(&files));
        }
        Commands::Request { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

fn install<R, A>(
    engine: &Engine<R, A>,
    renderer: TerminalRenderer,
    name: &str,
    version: &str,
    reinstall: bool,
) -> Result<()>
where
    R: RegistryClient,
    A: AssetSource,
{
    let label = if reinstall { "reinstall" } else { "install" };
    let mut progress: Option<TerminalProgress> = None;

    let result = engine.install_with_progress(name, version, reinstall, &mut |step| {
        let bar =
            progress.get_or_insert_with(|| renderer.start_progress(label, step.total as u64));
        bar.set(step.done as u64, step.path);
    });

    match result {
        Ok(outcome) => {
            if let Some(bar) = progress {
                bar.finish_success();
            }
            renderer.print_status("ok", &outcome.message());
            Ok(())
        }
        Err(err) => {
            if let Some(bar) = progress {
                bar.finish_abandon();
            }
            Err(err.into())
        }
    }
}
