//! Interactive prompt loop.
//!
//! Each line is tokenised, parsed with the same [`Commands`] definition as the
//! one-shot CLI and executed against a shared [`TaskService`]. Failures are
//! printed and the loop carries on; only I/O errors on the terminal end it.

use std::io::{BufRead, Write};

use anyhow::bail;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;

use crate::cmd::{execute, Commands};
use crate::format::TaskFormatter;
use crate::service::TaskService;

#[derive(Parser, Debug)]
#[command(name = "tm", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

enum Flow {
    Continue,
    Exit,
}

/// Run the prompt loop until `exit`, `quit` or end of input.
pub fn run_shell<R: BufRead, W: Write>(
    service: &mut TaskService,
    fmt: &TaskFormatter,
    mut input: R,
    out: &mut W,
) -> anyhow::Result<()> {
    writeln!(out, "{}", fmt.header())?;
    writeln!(out, "{}", fmt.success("Task Manager initialized successfully!"))?;
    writeln!(out, "{}", fmt.help_menu())?;

    loop {
        write!(out, "{}", fmt.prompt("Enter command"))?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Flow::Exit = handle_line(service, fmt, line, out)? {
            break;
        }
    }

    writeln!(out, "{}", fmt.info("Goodbye!"))?;
    Ok(())
}

fn handle_line<W: Write>(
    service: &mut TaskService,
    fmt: &TaskFormatter,
    line: &str,
    out: &mut W,
) -> anyhow::Result<Flow> {
    let mut tokens = match split_line(line) {
        Ok(tokens) => tokens,
        Err(e) => {
            writeln!(out, "{}", fmt.error(&e.to_string()))?;
            return Ok(Flow::Continue);
        }
    };
    tokens[0] = tokens[0].to_lowercase();
    debug!(command = %tokens[0], "Shell command");

    match tokens[0].as_str() {
        "help" => {
            writeln!(out, "{}", fmt.help_menu())?;
            return Ok(Flow::Continue);
        }
        "exit" | "quit" => {
            writeln!(out, "{}", fmt.success("Exiting Task Manager..."))?;
            return Ok(Flow::Exit);
        }
        _ => {}
    }

    let parsed = match ShellLine::try_parse_from(&tokens) {
        Ok(parsed) => parsed,
        Err(e) => {
            match e.kind() {
                ErrorKind::DisplayHelp => writeln!(out, "{}", e.to_string().trim_end())?,
                ErrorKind::InvalidSubcommand => {
                    writeln!(out, "{}", fmt.error(&format!("Unknown command: {}", tokens[0])))?;
                    writeln!(out, "{}", fmt.info("Type 'help' to see available commands"))?;
                }
                _ => writeln!(out, "{}", fmt.error(e.to_string().trim_start_matches("error: ").trim_end()))?,
            }
            return Ok(Flow::Continue);
        }
    };

    if let Err(e) = execute(parsed.command, service, fmt, out) {
        writeln!(out, "{}", fmt.error(&format!("{e:#}")))?;
    }
    Ok(Flow::Continue)
}

/// Split a command line on whitespace, keeping double-quoted runs together.
///
/// Returns at least one token for non-blank input.
pub fn split_line(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_quotes {
        bail!("Unterminated quote in command");
    }
    if in_token {
        tokens.push(current);
    }
    if tokens.is_empty() {
        bail!("Empty command");
    }
    Ok(tokens)
}
