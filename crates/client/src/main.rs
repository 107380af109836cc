//! Line-oriented operator console.
//!
//! Reads one command per line from stdin, prints cart state and results to
//! stdout. Logs go to stderr.

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};

use vuzoll_client::session::{Command, Notice, Session};
use vuzoll_client::{ApiUrlStore, ClientConfig};
use vuzoll_core::{Action, ItemId};

const USAGE: &str = "\
usage: vuzoll-client [--api <url>]

commands:
  scan <code>            add the item behind a scanned code
  search <text>          look items up by name (2+ characters)
  pick <id>              add a search hit
  qty <id> <n>           set the quantity of a line
  action <id> <action>   take | restock | fact
  default <action>       action for newly added lines
  rm <id>                remove a line
  submit                 send the cart
  logs                   show recent server logs
  status                 show the connection indicator
  quit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Command(Command),
    Help,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vuzoll_observability::init();

    let Some(api_override) = parse_args(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    let store = ApiUrlStore::default_location();
    let config =
        ClientConfig::from_env(api_override, store.as_ref()).context("failed to load configuration")?;
    let (mut session, monitor) = Session::launch(&config).context("failed to start session")?;

    let mut status_rx = monitor.subscribe();
    let mut status_open = true;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => println!("{USAGE}"),
                    Ok(Input::Command(command)) => {
                        for notice in session.handle(command).await {
                            render(&notice);
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            changed = status_rx.changed(), if status_open => {
                match changed {
                    Ok(()) => {
                        let status = *status_rx.borrow_and_update();
                        render(&Notice::Connectivity(status));
                    }
                    Err(_) => status_open = false,
                }
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}

/// `Ok(None)` means help was requested.
fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Option<String>>> {
    let mut api = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--api" => match args.next() {
                Some(url) => api = Some(url),
                None => bail!("--api needs a URL"),
            },
            other => match other.strip_prefix("--api=") {
                Some(url) => api = Some(url.to_string()),
                None => bail!("unknown argument {other:?}\n\n{USAGE}"),
            },
        }
    }
    Ok(Some(api))
}

fn parse_command(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb {
        "" => Command::Activity,
        "quit" | "exit" => return Ok(Input::Quit),
        "help" => return Ok(Input::Help),
        "scan" => Command::Scanned(rest.to_string()),
        "search" => Command::Search(rest.to_string()),
        "pick" => Command::Pick(item_id(rest)?),
        "rm" => Command::Remove(item_id(rest)?),
        "qty" => {
            let (id, raw) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Command::SetQuantity {
                id: item_id(id)?,
                raw: raw.trim().to_string(),
            }
        }
        "action" => {
            let (id, action) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: action <id> <take|restock|fact>".to_string())?;
            Command::SetAction {
                id: item_id(id)?,
                action: action.trim().parse::<Action>().map_err(|e| e.to_string())?,
            }
        }
        "default" => Command::SetDefaultAction(
            rest.parse::<Action>().map_err(|e| e.to_string())?,
        ),
        "submit" => Command::Submit,
        "logs" => Command::FetchServerLogs,
        "status" => Command::Status,
        other => return Err(format!("unknown command {other:?}; type `help`")),
    };
    Ok(Input::Command(command))
}

fn item_id(raw: &str) -> Result<ItemId, String> {
    ItemId::new(raw).map_err(|_| "missing item id".to_string())
}

fn render(notice: &Notice) {
    match notice {
        Notice::Cart(lines) if lines.is_empty() => println!("cart is empty"),
        Notice::Cart(lines) => {
            for (n, line) in lines.iter().enumerate() {
                println!(
                    "{}. {} [{}] qty {} {} @ {} (stock {})",
                    n + 1,
                    line.name,
                    line.id,
                    line.input_qty,
                    line.action,
                    line.location_or_unknown(),
                    line.quantity
                );
            }
        }
        Notice::SearchResults(hits) if hits.is_empty() => println!("no results"),
        Notice::SearchResults(hits) => {
            for hit in hits {
                println!("  {}  {}", hit.id, hit.name);
            }
        }
        Notice::Alert(message) => println!("{message}"),
        Notice::Report(report) => {
            for line in report.lines() {
                println!("{line}");
            }
            println!("{} sent, {} failed", report.succeeded(), report.failed());
        }
        Notice::ServerLogs(logs) => println!("{logs}"),
        Notice::Connectivity(status) => {
            let dot = if status.is_connected() { "🟢" } else { "🔴" };
            println!("{dot} {}", status.as_str());
        }
    }
}
