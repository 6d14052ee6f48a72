use anyhow::Result;

use crate::fetcher_traits::{PoolsFetcher, PositionsFetcher};
use crate::report::{self, ReportSettings};

pub const USAGE: &str = "usage: scout [--config <path>] [--json] <command>

commands:
  report <wallet>                 positions with ranked alternatives (default)
  positions <wallet>              normalized position table
  alternatives <symbol> [limit]   best pools for a token or A/B pair";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Report { wallet: String },
    Positions { wallet: String },
    Alternatives { symbol: String, limit: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config_path: Option<String>,
    pub json: bool,
    pub command: Command,
}

fn required(arg: Option<String>, what: &str) -> std::result::Result<String, String> {
    arg.filter(|a| !a.trim().is_empty())
        .ok_or_else(|| format!("missing {what}\n{USAGE}"))
}

pub fn parse_args<I>(args: I) -> std::result::Result<Args, String>
where
    I: Iterator<Item = String>,
{
    let mut config_path = None;
    let mut json = false;
    let mut positional = Vec::new();

    // Drop argv[0].
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--config" => {
                config_path = Some(required(args.next(), "value for --config")?);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => {
                return Err(format!("unknown flag: {flag}\n{USAGE}"));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None => return Err(USAGE.to_string()),
        Some("report") => Command::Report {
            wallet: required(positional.next(), "wallet address")?,
        },
        Some("positions") => Command::Positions {
            wallet: required(positional.next(), "wallet address")?,
        },
        Some("alternatives") => {
            let symbol = required(positional.next(), "token symbol")?;
            let limit = positional
                .next()
                .map(|l| match l.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(format!("invalid limit: {l}")),
                })
                .transpose()?;
            Command::Alternatives { symbol, limit }
        }
        // A bare wallet address runs the full report.
        Some(wallet) => Command::Report {
            wallet: wallet.to_string(),
        },
    };

    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {extra}\n{USAGE}"));
    }

    Ok(Args {
        config_path,
        json,
        command,
    })
}

fn to_output<T: serde::Serialize>(value: &T, json: bool, text: impl FnOnce(&T) -> String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text(value))
    }
}

/// Run a command and return what should be printed on stdout.
pub async fn run_command<F>(fetcher: &F, settings: &ReportSettings, args: &Args) -> Result<String>
where
    F: PositionsFetcher + PoolsFetcher + Sync,
{
    match &args.command {
        Command::Report { wallet } => {
            let r = report::build_wallet_report(fetcher, wallet, settings).await;
            to_output(&r, args.json, report::render_wallet_report)
        }
        Command::Positions { wallet } => {
            let r = report::build_positions_report(fetcher, wallet, settings).await;
            to_output(&r, args.json, report::render_positions)
        }
        Command::Alternatives { symbol, limit } => {
            let limit = limit.unwrap_or(settings.limit);
            let r = report::build_alternatives_report(fetcher, symbol, limit).await;
            to_output(&r, args.json, report::render_alternatives)
        }
    }
}
