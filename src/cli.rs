//! Command-line interface and REPL

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

use cec_tv_gw::{PowerState, TvStateMachine};

/// Commands understood by the REPL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    On,
    Off,
    Status,
    Query,
    Help,
    Exit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "on" | "power on" => Some(Self::On),
            "off" | "standby" | "power off" => Some(Self::Off),
            "status" | "s" => Some(Self::Status),
            "query" | "q" => Some(Self::Query),
            "help" | "?" => Some(Self::Help),
            "exit" | "quit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Run the interactive console until `exit`, Ctrl+C or Ctrl+D
///
/// Blocking; run it on a blocking thread.
pub fn run_repl(machine: Arc<TvStateMachine>, name: &str) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let prompt = format!("{}> ", name.to_lowercase().replace(' ', "-"));

    println!("{} (type 'help' for commands)", name.bold().cyan());

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let Some(command) = ReplCommand::parse(line) else {
                    println!("{} unknown command '{}'", "?".yellow(), line);
                    continue;
                };

                if command == ReplCommand::Exit {
                    break;
                }
                if let Err(e) = execute(&machine, command) {
                    println!("{} {}", "error:".red().bold(), e);
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn execute(machine: &TvStateMachine, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::On => {
            machine.set_power(true)?;
            println!("Power on requested");
        }
        ReplCommand::Off => {
            machine.set_power(false)?;
            println!("Standby requested");
        }
        ReplCommand::Status => {
            let snapshot = machine.snapshot();
            let power = match snapshot.power {
                PowerState::On => "on".green(),
                PowerState::Off => "off".red(),
                PowerState::Unknown => "unknown".dimmed(),
            };
            let input = snapshot
                .input
                .map(|port| format!("HDMI{}", port))
                .unwrap_or_else(|| "-".to_string());
            println!("power: {}  input: {}", power, input);
        }
        ReplCommand::Query => {
            let last = machine.get_power()?;
            println!("Power status requested (last known: {})", last);
        }
        ReplCommand::Help => {
            println!("  on       switch the TV on");
            println!("  off      put the TV in standby");
            println!("  status   show last known state");
            println!("  query    ask the TV for its power status");
            println!("  exit     leave the console");
        }
        ReplCommand::Exit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("on"), Some(ReplCommand::On));
        assert_eq!(ReplCommand::parse("  Standby "), Some(ReplCommand::Off));
        assert_eq!(ReplCommand::parse("q"), Some(ReplCommand::Query));
        assert_eq!(ReplCommand::parse("quit"), Some(ReplCommand::Exit));
        assert_eq!(ReplCommand::parse("volume up"), None);
    }

    #[test]
    fn test_execute_sends_commands() {
        let (tx, mut rx) = cec_tv_gw::adapter::command_channel();
        let machine = TvStateMachine::new(tx, std::time::Duration::from_secs(5));

        execute(&machine, ReplCommand::On).unwrap();
        execute(&machine, ReplCommand::Status).unwrap();
        execute(&machine, ReplCommand::Query).unwrap();

        assert_eq!(rx.try_recv().unwrap(), cec_tv_gw::CecCommand::PowerOn);
        assert_eq!(rx.try_recv().unwrap(), cec_tv_gw::CecCommand::PowerQuery);
        assert!(rx.try_recv().is_err());
    }
}
