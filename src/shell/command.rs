//! Parsing of shell input lines

use thiserror::Error;

use crate::metronome::{RhythmMode, MAX_BEATS_PER_MEASURE, MAX_BPM, MIN_BEATS_PER_MEASURE, MIN_BPM};

pub const QUIT_COMMAND: &str = "q";
pub const STOP_COMMAND: &str = "s";

/// A parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Stop the metronome and leave the shell
    Quit,
    /// Stop the metronome
    Stop,
    /// Select (or toggle off) a rhythm mode
    Mode(RhythmMode),
    /// Change the time-signature numerator
    TimeSignature(u32),
    /// "0" was entered
    ZeroBpm,
    /// Start the metronome or change its tempo
    Bpm(u32),
}

/// Why an input line is not a valid BPM
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("not a number or a known command")]
    NotANumber,

    #[error("not a whole number")]
    NotAWholeNumber,

    #[error("outside 10..=400")]
    OutOfRange,
}

impl InputError {
    pub fn code(&self) -> &'static str {
        match self {
            InputError::NotANumber => "NOT_A_NUMBER",
            InputError::NotAWholeNumber => "NOT_A_WHOLE_NUMBER",
            InputError::OutOfRange => "BPM_OUT_OF_RANGE",
        }
    }
}

/// Validate a BPM typed by the user
///
/// Decimal input is accepted only when it denotes a whole number (`"120.0"`).
pub fn validate_bpm_input(input: &str) -> Result<u32, InputError> {
    let value: f64 = input.trim().parse().map_err(|_| InputError::NotANumber)?;
    if !value.is_finite() {
        return Err(InputError::NotANumber);
    }
    if value.fract() != 0.0 {
        return Err(InputError::NotAWholeNumber);
    }
    if value < MIN_BPM as f64 || value > MAX_BPM as f64 {
        return Err(InputError::OutOfRange);
    }
    Ok(value as u32)
}

/// Parse one input line (case-insensitive, surrounding whitespace ignored)
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let input = line.trim().to_lowercase();

    match input.as_str() {
        QUIT_COMMAND => return Ok(Command::Quit),
        STOP_COMMAND => return Ok(Command::Stop),
        "0" => return Ok(Command::ZeroBpm),
        _ => {}
    }

    if let Ok(mode) = input.parse::<RhythmMode>() {
        return Ok(Command::Mode(mode));
    }

    if input.len() == 1 {
        if let Some(beats) = input.chars().next().and_then(|c| c.to_digit(10)) {
            if (MIN_BEATS_PER_MEASURE..=MAX_BEATS_PER_MEASURE).contains(&beats) {
                return Ok(Command::TimeSignature(beats));
            }
        }
    }

    validate_bpm_input(&input).map(Command::Bpm)
}
