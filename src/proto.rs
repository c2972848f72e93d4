//! Line-oriented command protocol parser.
//!
//! Two surface syntaxes arrive on the same input:
//!
//! 1. The **button micro-protocol** `!B<id><state>` — fixed offsets, one
//!    digit each. Only state `'1'` (press) acts; releases are ignored.
//! 2. The **keyword protocol** — case-insensitive words, optionally with one
//!    numeric parameter.
//!
//! Parsing never touches control state. Out-of-range numerics are clamped to
//! the nearest bound here (the clamped value is what later shows up in the
//! status echo); unparseable numerics are rejected as
//! [`ProtoError::Malformed`] rather than silently defaulting.

use crate::app::commands::{ButtonAction, Command};
use crate::config::RAMP_TIME_MAX_MS;
use crate::error::ProtoError;

/// Marker opening a button event line.
const BUTTON_MARKER: &str = "!B";
/// Button state digit meaning "pressed".
const BUTTON_STATE_PRESS: u8 = b'1';

/// Parse one protocol line.
///
/// `Ok(None)` means the line is valid but carries no action (blank line or a
/// button release). Errors are diagnostics for the line's origin; they never
/// change state.
pub fn parse_line(line: &str) -> Result<Option<Command>, ProtoError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Some(rest) = line.strip_prefix(BUTTON_MARKER) {
        return parse_button(rest.as_bytes());
    }
    parse_keyword(line).map(Some)
}

/// Button micro-protocol body: `<id><state>` as single ASCII digits.
fn parse_button(body: &[u8]) -> Result<Option<Command>, ProtoError> {
    // 4-char minimum for the whole token: marker + id + state.
    let (&id, &state) = match (body.first(), body.get(1)) {
        (Some(id), Some(state)) => (id, state),
        _ => return Err(ProtoError::Malformed("button event")),
    };

    // Releases (and any other non-press state) are ignored before the id is
    // even considered.
    if state != BUTTON_STATE_PRESS {
        return Ok(None);
    }

    let action = match id {
        b'5' => ButtonAction::Up,
        b'6' => ButtonAction::Down,
        b'1' => ButtonAction::Full,
        b'2' => ButtonAction::Stop,
        other => return Err(ProtoError::UnknownButton(other)),
    };
    Ok(Some(Command::Button(action)))
}

fn parse_keyword(line: &str) -> Result<Command, ProtoError> {
    let upper = line.to_ascii_uppercase();
    let mut words = upper.split_whitespace();
    let keyword = words.next().unwrap_or("");
    let arg = words.next();

    let cmd = match (keyword, arg) {
        ("HELP", None) => Command::Help,
        ("STATUS", None) => Command::Status,
        ("ARM", None) => Command::Arm,
        ("STOP" | "0", None) => Command::Stop,
        ("FULL" | "1", None) => Command::Full,

        ("DBG", Some("ON")) => Command::Debug(true),
        ("DBG", Some("OFF")) => Command::Debug(false),
        ("DBG", _) => return Err(ProtoError::Malformed("DBG argument")),

        ("LED", Some("ON")) => Command::Led(true),
        ("LED", Some("OFF")) => Command::Led(false),
        ("LED", _) => return Err(ProtoError::Malformed("LED argument")),

        ("LOG", Some("START")) => Command::LogStart,
        ("LOG", Some("STOP")) => Command::LogStop,
        ("LOG", Some("PERIOD")) => {
            let ms = parse_int(words.next(), "log period")?;
            Command::LogPeriod(ms.clamp(0, i64::from(u32::MAX)) as u32)
        }
        ("LOG", _) => return Err(ProtoError::Malformed("LOG argument")),

        ("SET", arg) => {
            let pct = parse_int(arg, "percent")?;
            Command::Set(pct.clamp(0, 100) as u8)
        }
        ("RPM", arg) => {
            let rpm = arg
                .and_then(|a| a.parse::<f32>().ok())
                .filter(|v| v.is_finite())
                .ok_or(ProtoError::Malformed("rpm value"))?;
            Command::Rpm(rpm)
        }
        ("US", arg) => {
            let us = parse_int(arg, "pulse width")?;
            Command::PulseUs(us.clamp(0, i64::from(u16::MAX)) as u16)
        }
        ("RAMP", arg) => {
            let ms = parse_int(arg, "ramp time")?;
            Command::Ramp(ms.clamp(0, i64::from(RAMP_TIME_MAX_MS)) as u32)
        }

        _ => return Err(ProtoError::UnknownCommand),
    };

    // Parameterless forms reject trailing garbage via the exhaustive match
    // above; parameterized forms ignore anything after their argument, which
    // keeps copy-pasted lines with trailing comments usable on the bench.
    Ok(cmd)
}

fn parse_int(arg: Option<&str>, what: &'static str) -> Result<i64, ProtoError> {
    arg.and_then(|a| a.parse::<i64>().ok())
        .ok_or(ProtoError::Malformed(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> Command {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(cmd("status"), Command::Status);
        assert_eq!(cmd("StAtUs"), Command::Status);
        assert_eq!(cmd("ARM"), Command::Arm);
        assert_eq!(cmd("help"), Command::Help);
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(cmd("0"), Command::Stop);
        assert_eq!(cmd("stop"), Command::Stop);
        assert_eq!(cmd("1"), Command::Full);
        assert_eq!(cmd("full"), Command::Full);
    }

    #[test]
    fn parameterized_forms_parse() {
        assert_eq!(cmd("SET 42"), Command::Set(42));
        assert_eq!(cmd("set 42"), Command::Set(42));
        assert_eq!(cmd("US 1350"), Command::PulseUs(1350));
        assert_eq!(cmd("RAMP 2500"), Command::Ramp(2500));
        assert_eq!(cmd("LOG PERIOD 100"), Command::LogPeriod(100));
        assert_eq!(cmd("RPM 4500.5"), Command::Rpm(4500.5));
    }

    #[test]
    fn out_of_range_numbers_clamp() {
        assert_eq!(cmd("SET 250"), Command::Set(100));
        assert_eq!(cmd("SET -3"), Command::Set(0));
        assert_eq!(cmd("RAMP 99999"), Command::Ramp(RAMP_TIME_MAX_MS));
    }

    #[test]
    fn toggles_parse() {
        assert_eq!(cmd("DBG ON"), Command::Debug(true));
        assert_eq!(cmd("dbg off"), Command::Debug(false));
        assert_eq!(cmd("LED ON"), Command::Led(true));
        assert_eq!(cmd("LOG START"), Command::LogStart);
        assert_eq!(cmd("LOG STOP"), Command::LogStop);
    }

    #[test]
    fn malformed_numbers_are_rejected_not_defaulted() {
        assert_eq!(
            parse_line("SET abc"),
            Err(ProtoError::Malformed("percent"))
        );
        assert_eq!(parse_line("SET"), Err(ProtoError::Malformed("percent")));
        assert_eq!(
            parse_line("RPM not-a-number"),
            Err(ProtoError::Malformed("rpm value"))
        );
        assert_eq!(
            parse_line("LOG PERIOD"),
            Err(ProtoError::Malformed("log period"))
        );
    }

    #[test]
    fn unknown_lines_are_diagnosed() {
        assert_eq!(parse_line("FROBNICATE"), Err(ProtoError::UnknownCommand));
        assert_eq!(parse_line("STATUS NOW"), Err(ProtoError::UnknownCommand));
    }

    #[test]
    fn blank_lines_are_silent() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn button_press_maps_ids() {
        assert_eq!(cmd("!B51"), Command::Button(ButtonAction::Up));
        assert_eq!(cmd("!B61"), Command::Button(ButtonAction::Down));
        assert_eq!(cmd("!B11"), Command::Button(ButtonAction::Full));
        assert_eq!(cmd("!B21"), Command::Button(ButtonAction::Stop));
    }

    #[test]
    fn button_release_is_ignored() {
        assert_eq!(parse_line("!B50"), Ok(None));
        assert_eq!(parse_line("!B10"), Ok(None));
        // Unknown state digits are treated as non-press, not errors.
        assert_eq!(parse_line("!B57"), Ok(None));
    }

    #[test]
    fn unknown_button_id_is_diagnosed_on_press_only() {
        assert_eq!(parse_line("!B91"), Err(ProtoError::UnknownButton(b'9')));
        assert_eq!(parse_line("!B90"), Ok(None));
    }

    #[test]
    fn short_button_token_is_malformed() {
        assert_eq!(
            parse_line("!B5"),
            Err(ProtoError::Malformed("button event"))
        );
        assert_eq!(
            parse_line("!B"),
            Err(ProtoError::Malformed("button event"))
        );
    }
}
