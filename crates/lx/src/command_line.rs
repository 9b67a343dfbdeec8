use std::path::PathBuf;

use lx_core::{ConsoleCommand, ConsoleError, CueNumber};

/// Parse one line of operator input.
///
/// ```text
/// go | back | goto N | release | delete N | show | quit
/// rec [N] [UP DOWN] [description...]
/// <channels>*<level>           e.g. 1-3+7*200, /*0
/// new [name...] | load PATH | save [PATH]
/// ```
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.contains('*') {
        return Ok(Some(ConsoleCommand::SetChannels {
            input: line.to_string(),
        }));
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "go" => ConsoleCommand::Go,
        "back" => ConsoleCommand::Back,
        "goto" => ConsoleCommand::GoTo {
            number: required_number(rest, "goto")?,
        },
        "rec" | "record" => parse_record(rest)?,
        "release" => ConsoleCommand::ReleaseAll,
        "delete" => ConsoleCommand::DeleteCue {
            number: required_number(rest, "delete")?,
        },
        "new" => ConsoleCommand::NewShow {
            name: rest.to_string(),
        },
        "load" => {
            if rest.is_empty() {
                return Err(ConsoleError::InvalidInput("load needs a path".to_string()));
            }
            ConsoleCommand::LoadShow {
                path: PathBuf::from(rest),
            }
        }
        "save" => ConsoleCommand::SaveShow {
            path: (!rest.is_empty()).then(|| PathBuf::from(rest)),
        },
        "show" | "status" => ConsoleCommand::Snapshot,
        "quit" | "exit" => ConsoleCommand::Shutdown,
        other => {
            return Err(ConsoleError::InvalidInput(format!(
                "unknown command '{}'",
                other
            )))
        }
    };
    Ok(Some(command))
}

fn required_number(text: &str, command: &str) -> Result<CueNumber, ConsoleError> {
    if text.is_empty() {
        return Err(ConsoleError::InvalidInput(format!(
            "{} needs a cue number",
            command
        )));
    }
    text.parse()
}

/// `rec [N] [UP DOWN] [description...]`. Fade times are only taken as a
/// pair; a lone number after the cue number is part of the description.
fn parse_record(rest: &str) -> Result<ConsoleCommand, ConsoleError> {
    let mut tokens: Vec<&str> = rest.split_whitespace().collect();

    let number = match tokens.first().map(|token| token.parse::<CueNumber>()) {
        Some(Ok(number)) => {
            tokens.remove(0);
            Some(number)
        }
        _ => None,
    };

    let fades = match tokens.as_slice() {
        [up, down, ..] => up.parse::<f64>().ok().zip(down.parse::<f64>().ok()),
        _ => None,
    };
    if fades.is_some() {
        tokens.drain(..2);
    }
    let (up_time, down_time) = fades.unzip();

    Ok(ConsoleCommand::RecordCue {
        number,
        up_time,
        down_time,
        description: tokens.join(" "),
    })
}
