use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

#[allow(dead_code)]
#[path = "../shared/config.rs"]
mod config;
#[allow(dead_code)]
#[path = "../shared/i18n/mod.rs"]
mod i18n;
#[allow(dead_code)]
#[path = "../shared/logging.rs"]
mod logging;

use i18n::{Catalog, FilePreferences, Language, LocaleContext, TranslationParams};

#[derive(Parser, Debug)]
#[command(name = "deskmate", version, about = "Inspect and switch the Deskmate interface language")]
struct Cli {
    /// Preference file (default: ~/.deskmate/preferences.json)
    #[arg(long, global = true, env = "DESKMATE_PREFS")]
    prefs: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported languages
    Languages,
    /// Print the active language
    Get,
    /// Persist a language preference
    Set { code: String },
    /// Translate a dotted key
    Translate {
        key: String,
        #[arg(long)]
        lang: Option<String>,
        /// Interpolation parameter as name=value; repeatable
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Report keys missing from non-fallback dictionaries
    Check,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("parameter name missing in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn main() -> Result<ExitCode> {
    logging::init_cli_logging();
    let cli = Cli::parse();

    let catalog = Arc::new(Catalog::builtin().context("Failed to load built-in dictionaries")?);
    let prefs = FilePreferences::new(config::resolve_preferences_path(cli.prefs));
    let mut context = LocaleContext::initialize(catalog, prefs, sys_locale::get_locales());

    match cli.command {
        Command::Languages => {
            for definition in context.languages() {
                let marker = if definition.code == context.language() { "*" } else { " " };
                println!(
                    "{marker} {:<6} {:<20} {}",
                    definition.code.code(),
                    definition.label,
                    definition.native_label
                );
            }
        }
        Command::Get => println!("{}", context.language()),
        Command::Set { code } => {
            let language: Language = code.parse()?;
            context
                .set_language(language)
                .map_err(|e| anyhow!("Failed to save language preference: {e}"))?;
            println!(
                "{}: {}",
                context.t("common.language"),
                language.definition().native_label
            );
        }
        Command::Translate { key, lang, params } => {
            let language = match lang {
                Some(code) => code.parse::<Language>()?,
                None => context.language(),
            };
            let params = (!params.is_empty()).then(|| {
                let mut set = TranslationParams::new();
                for (name, value) in params {
                    set.insert(name, value);
                }
                set
            });
            println!("{}", context.catalog().translate(language, &key, params.as_ref()));
        }
        Command::Check => {
            let report = context.catalog().validate();
            for (language, missing) in &report.missing {
                if missing.is_empty() {
                    println!("{language}: complete");
                    continue;
                }
                println!("{language}: {} missing", missing.len());
                for key in missing {
                    println!("  {key}");
                }
            }
            if !report.is_complete() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("title=GPT = 4").unwrap(),
            ("title".to_string(), "GPT = 4".to_string())
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_cli_parses_translate() {
        let cli = Cli::try_parse_from([
            "deskmate", "translate", "settings.title", "--lang", "zh-CN", "-p", "n=5",
        ])
        .unwrap();
        match cli.command {
            Command::Translate { key, lang, params } => {
                assert_eq!(key, "settings.title");
                assert_eq!(lang.as_deref(), Some("zh-CN"));
                assert_eq!(params, vec![("n".to_string(), "5".to_string())]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
