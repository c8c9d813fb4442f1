//! Interactive capture source
//!
//! A line-oriented stand-in for the OS keyboard and mouse hooks. Each
//! command is stamped with the shared clock at the moment it is entered.

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::input::{Clock, Handled, InputEvent, InputListener, MouseButton};

/// One REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Press(String),
    Release(String),
    /// Press then immediately release (hotkeys)
    Tap(String),
    Click,
    RightClick,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next().map(str::to_string);
    if parts.next().is_some() {
        return Err(format!("too many arguments: '{}'", line.trim()));
    }

    let needs_key = |arg: Option<String>, verb: &str| {
        arg.ok_or_else(|| format!("'{}' needs a key, e.g. '{} a'", verb, verb))
    };

    let command = match verb.to_lowercase().as_str() {
        "press" | "p" => ReplCommand::Press(needs_key(arg, verb)?),
        "release" | "r" => ReplCommand::Release(needs_key(arg, verb)?),
        "tap" | "t" => ReplCommand::Tap(needs_key(arg, verb)?),
        "click" | "fire" | "c" => ReplCommand::Click,
        "rclick" => ReplCommand::RightClick,
        "help" | "?" => ReplCommand::Help,
        "exit" | "quit" | "q" => ReplCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  press <key>    key down (p)");
    println!("  release <key>  key up (r)");
    println!("  tap <key>      key down and up, for hotkeys (t)");
    println!("  click          left click / fire (c)");
    println!("  rclick         right click");
    println!("  quit           exit (q)");
}

/// Run the REPL on the calling thread until quit, EOF or terminate hotkey
pub fn run_repl(listener: InputListener, clock: Clock) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "=== cStrafe input console ===".bold().cyan());
    print_help();

    loop {
        let line = match rl.readline("cstrafe> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                println!("{}", msg.yellow());
                continue;
            }
        };
        let _ = rl.add_history_entry(line.as_str());

        let ts = clock.now_ms();
        let events = match command {
            ReplCommand::Press(key) => vec![InputEvent::KeyDown { key, ts }],
            ReplCommand::Release(key) => vec![InputEvent::KeyUp { key, ts }],
            ReplCommand::Tap(key) => vec![
                InputEvent::KeyDown {
                    key: key.clone(),
                    ts,
                },
                InputEvent::KeyUp { key, ts },
            ],
            ReplCommand::Click => vec![InputEvent::Click {
                button: MouseButton::Left,
                pressed: true,
                ts,
            }],
            ReplCommand::RightClick => vec![InputEvent::Click {
                button: MouseButton::Right,
                pressed: true,
                ts,
            }],
            ReplCommand::Help => {
                print_help();
                continue;
            }
            ReplCommand::Quit => break,
        };

        for event in &events {
            match listener.handle(event) {
                Handled::Terminate => return Ok(()),
                Handled::Ignored if matches!(event, InputEvent::KeyDown { .. }) => {
                    println!("{}", "(no binding)".dimmed())
                }
                handled => debug!("{:?} -> {:?}", event, handled),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("press a"), Ok(Some(ReplCommand::Press("a".into()))));
        assert_eq!(parse_command("  r   D "), Ok(Some(ReplCommand::Release("D".into()))));
        assert_eq!(parse_command("tap f6"), Ok(Some(ReplCommand::Tap("f6".into()))));
        assert_eq!(parse_command("FIRE"), Ok(Some(ReplCommand::Click)));
        assert_eq!(parse_command("quit"), Ok(Some(ReplCommand::Quit)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("press").unwrap_err().contains("needs a key"));
        assert!(parse_command("jump").unwrap_err().contains("unknown command"));
        assert!(parse_command("press a b").unwrap_err().contains("too many"));
    }
}
