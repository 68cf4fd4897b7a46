// Main CLI entrypoint
// (c) 2024 Ross Younger

use std::{path::PathBuf, process::ExitCode};

use anstream::{eprintln, print, println};
use anyhow::Context as _;
use clap::Parser as _;
use tracing::debug;

use super::{
    args::{CliArgs, Command},
    styles::{DIM, ERROR},
};
use crate::{
    config::Parser,
    os::{AbstractPlatform as _, Platform},
    util::setup_tracing,
    UserSettings,
};

/// Main CLI entrypoint
pub fn cli() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();
    setup_tracing(args.trace_level(), args.log_file.as_deref())
        .inspect_err(|e| eprintln!("{e:?}"))?;

    let settings = args.settings();
    let result = match &args.command {
        Command::Get {
            alias,
            key,
            all,
            splits,
        } => get(&settings, args.strict, alias, key, *all, *splits),
        Command::Show { alias } => show(&settings, alias),
        Command::Render { file } => render(file.as_ref().or(args.config.as_ref())),
    };
    result
        .inspect_err(|e| eprintln!("{ERROR}ERROR{ERROR:#} {e:#}"))
        .or_else(|_| Ok(false))
        .map(|success| {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        })
}

fn get(
    settings: &UserSettings,
    strict: bool,
    alias: &str,
    key: &str,
    all: bool,
    splits: bool,
) -> anyhow::Result<bool> {
    let values = if strict {
        match (all, splits) {
            (false, false) => vec![settings.get_strict(alias, key)?],
            (true, false) => settings.get_all_strict(alias, key)?,
            (false, true) => settings.get_splits_strict(alias, key)?,
            (true, true) => settings.get_all_splits_strict(alias, key)?,
        }
    } else {
        match (all, splits) {
            (false, false) => vec![settings.get(alias, key)],
            (true, false) => settings.get_all(alias, key),
            (false, true) => settings.get_splits(alias, key),
            (true, true) => settings.get_all_splits(alias, key),
        }
    };
    for v in values.iter().filter(|v| !v.is_empty()) {
        println!("{v}");
    }
    Ok(true)
}

fn show(settings: &UserSettings, alias: &str) -> anyhow::Result<bool> {
    for doc in [settings.user_config()?, settings.system_config()?]
        .into_iter()
        .flatten()
    {
        let hc = doc.host_configuration(alias);
        debug!("{}: {} settings apply", doc.source(), hc.iter().count());
        for (key, setting) in hc.iter() {
            println!(
                "{key} {args}  {DIM}# {src}:{line}{DIM:#}",
                args = setting.args.join(" "),
                src = setting.source,
                line = setting.line_number,
            );
        }
    }
    Ok(true)
}

fn render(file: Option<&PathBuf>) -> anyhow::Result<bool> {
    let path = match file {
        Some(f) => f.clone(),
        None => Platform::user_ssh_config()
            .context("could not determine the user configuration file")?,
    };
    let doc = Parser::for_path(&path, true)
        .and_then(Parser::parse)
        .with_context(|| format!("reading {}", path.display()))?;
    print!("{doc}");
    Ok(true)
}
