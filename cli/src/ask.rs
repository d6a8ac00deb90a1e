//! The stdin/stdout `AskChannel` (spec §4.6): the only place this
//! binary reads from stdin, matching the core engine's rule that it
//! never does so itself.

use ptable_core::{Ask, AskChannel, AskResult, PtableError, Result};
use std::io::{self, Write};

pub struct StdioAskChannel;

impl AskChannel for StdioAskChannel {
    fn ask(&self, request: Ask) -> Result<AskResult> {
        match request {
            Ask::Info { message } => {
                println!("{}", message);
                Ok(AskResult::Acknowledged)
            }
            Ask::Warn { message } => {
                eprintln!("Warning: {}", message);
                Ok(AskResult::Acknowledged)
            }
            Ask::WarnErrno { message, errno } => {
                eprintln!("Warning: {} (errno {})", message, errno);
                Ok(AskResult::Acknowledged)
            }
            Ask::YesNo { query } => {
                print!("{} [y/N]: ", query);
                io::stdout().flush().ok();
                Ok(AskResult::YesNo(read_line()?.trim().eq_ignore_ascii_case("y")))
            }
            Ask::String { query, hint } => {
                if let Some(h) = &hint {
                    print!("{} ({}): ", query, h);
                } else {
                    print!("{}: ", query);
                }
                io::stdout().flush().ok();
                Ok(AskResult::String(read_line()?.trim().to_string()))
            }
            Ask::Number { query, spec } => {
                print!("{} ({}-{}, default {}): ", query, spec.low, spec.high, spec.default);
                io::stdout().flush().ok();
                let line = read_line()?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Ok(AskResult::Number(spec.default));
                }
                if let Some(rel) = trimmed.strip_prefix('+') {
                    let n: u64 = rel
                        .parse()
                        .map_err(|_| PtableError::InvalidArgument(format!("not a number: {}", trimmed)))?;
                    return Ok(AskResult::NumberRelative(n * spec.unit.max(1)));
                }
                let n: u64 = trimmed
                    .parse()
                    .map_err(|_| PtableError::InvalidArgument(format!("not a number: {}", trimmed)))?;
                Ok(AskResult::Number(n))
            }
            Ask::Menu { query, spec } => {
                println!("{}", query);
                for item in &spec.items {
                    println!("  {}  {} - {}", item.key, item.name, item.description);
                }
                print!("> ");
                io::stdout().flush().ok();
                let line = read_line()?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    if let Some(default_key) = spec.default_key {
                        return Ok(AskResult::MenuKey(default_key));
                    }
                }
                Ok(AskResult::MenuKey(trimmed.to_string()))
            }
        }
    }
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().read_line(&mut line).map_err(PtableError::IoError)?;
    Ok(line)
}
