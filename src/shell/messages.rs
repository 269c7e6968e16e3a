//! Status codes and their rendering in each supported language
//!
//! The metronome core only reports [`Status`] values; turning them into text is
//! done here, with the language chosen once by configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metronome::{RhythmMode, BEAT_UNIT, MAX_BPM, MIN_BPM};

use super::command::InputError;

/// Supported message languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Outcome of a shell command, independent of language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Started { bpm: u32 },
    TempoChanged { bpm: u32 },
    Stopped,
    NotRunning,
    Goodbye,
    ZeroBpm,
    ModeChanged(RhythmMode),
    ModeChangeWhileStopped,
    TimeSignatureChanged { beats: u32 },
    TimeSignaturePending { beats: u32 },
    InvalidInput(InputError),
    /// An engine operation failed; `code` is the error's stable code
    Failed { code: &'static str, detail: String },
}

/// Message catalogue for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Messages {
    language: Language,
}

impl Messages {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn welcome(&self) -> String {
        match self.language {
            Language::En => "Welcome to Metronomnom!\n\
                 Use 1-9 keys to set time signature (e.g., '3' for 3/4 time)\n\
                 Use 'e', 't' or 'x' to toggle eighth notes, triplets or sixteenth notes"
                .to_string(),
            Language::Fr => "Bienvenue dans Metronomnom !\n\
                 Touches 1 à 9 : signature rythmique (ex. '3' pour 3/4)\n\
                 'e', 't' ou 'x' : croches, triolets ou doubles croches"
                .to_string(),
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self.language {
            Language::En => "Enter BPM (or 'q' to quit, 's' to stop): ",
            Language::Fr => "Entrez le BPM ('q' pour quitter, 's' pour arrêter) : ",
        }
    }

    pub fn render(&self, status: &Status) -> String {
        match self.language {
            Language::En => render_en(status),
            Language::Fr => render_fr(status),
        }
    }
}

fn render_en(status: &Status) -> String {
    match status {
        Status::Started { bpm } => {
            format!("Metronome started. Press 's' to stop. {} BPM", bpm)
        }
        Status::TempoChanged { bpm } => format!("Tempo changed to {} BPM", bpm),
        Status::Stopped => "Metronome stopped.".to_string(),
        Status::NotRunning => "The metronome is not running.".to_string(),
        Status::Goodbye => "Goodbye!".to_string(),
        Status::ZeroBpm => "Ah finally, 0 BPM.".to_string(),
        Status::ModeChanged(mode) => match mode {
            RhythmMode::Normal => "Subdivisions off.".to_string(),
            RhythmMode::Eighth => "Eighth notes on.".to_string(),
            RhythmMode::Triplet => "Triplets on.".to_string(),
            RhythmMode::Sixteenth => "Sixteenth notes on.".to_string(),
        },
        Status::ModeChangeWhileStopped => {
            "Start the metronome before changing the rhythm mode.".to_string()
        }
        Status::TimeSignatureChanged { beats } => {
            format!("Time signature changed to {}/{}", beats, BEAT_UNIT)
        }
        Status::TimeSignaturePending { beats } => {
            format!("Switching to {} beats per measure on next start", beats)
        }
        Status::InvalidInput(error) => match error {
            InputError::NotANumber => "You must enter a number or a valid command.".to_string(),
            InputError::NotAWholeNumber => "You must enter a whole number.".to_string(),
            InputError::OutOfRange => {
                format!("Please enter a number between {} and {}", MIN_BPM, MAX_BPM)
            }
        },
        Status::Failed { code, detail } => {
            let summary = match *code {
                "AUDIO_UNAVAILABLE" => "Error: No audio device found.",
                "MISSING_SAMPLE" => "Error: sound file not found:",
                "SAMPLE_DECODE" => "Error: sound file could not be read:",
                "DEVICE_LOST" => "Error: audio device disconnected.",
                _ => "Error:",
            };
            format!("{} {}", summary, detail).trim_end().to_string()
        }
    }
}

fn render_fr(status: &Status) -> String {
    match status {
        Status::Started { bpm } => {
            format!("Métronome démarré. Tapez 's' pour arrêter. {} BPM", bpm)
        }
        Status::TempoChanged { bpm } => format!("Tempo changé : {} BPM", bpm),
        Status::Stopped => "Métronome arrêté.".to_string(),
        Status::NotRunning => "Le métronome n'est pas en marche.".to_string(),
        Status::Goodbye => "Au revoir !".to_string(),
        Status::ZeroBpm => "Enfin, 0 BPM.".to_string(),
        Status::ModeChanged(mode) => match mode {
            RhythmMode::Normal => "Subdivisions désactivées.".to_string(),
            RhythmMode::Eighth => "Croches activées.".to_string(),
            RhythmMode::Triplet => "Triolets activés.".to_string(),
            RhythmMode::Sixteenth => "Doubles croches activées.".to_string(),
        },
        Status::ModeChangeWhileStopped => {
            "Démarrez le métronome avant de changer de mode.".to_string()
        }
        Status::TimeSignatureChanged { beats } => {
            format!("Signature rythmique : {}/{}", beats, BEAT_UNIT)
        }
        Status::TimeSignaturePending { beats } => {
            format!("{} temps par mesure au prochain démarrage", beats)
        }
        Status::InvalidInput(error) => match error {
            InputError::NotANumber => "Entrez un nombre ou une commande valide.".to_string(),
            InputError::NotAWholeNumber => "Entrez un nombre entier.".to_string(),
            InputError::OutOfRange => {
                format!("Entrez un nombre entre {} et {}", MIN_BPM, MAX_BPM)
            }
        },
        Status::Failed { code, detail } => {
            let summary = match *code {
                "AUDIO_UNAVAILABLE" => "Erreur : aucun périphérique audio.",
                "MISSING_SAMPLE" => "Erreur : fichier son introuvable :",
                "SAMPLE_DECODE" => "Erreur : fichier son illisible :",
                "DEVICE_LOST" => "Erreur : périphérique audio déconnecté.",
                _ => "Erreur :",
            };
            format!("{} {}", summary, detail).trim_end().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<Language>(), Ok(Language::En));
        assert_eq!("fr".parse::<Language>(), Ok(Language::Fr));
        assert!("ja".parse::<Language>().is_err());
    }

    #[test]
    fn test_render_en() {
        let messages = Messages::new(Language::En);
        assert_eq!(
            messages.render(&Status::Started { bpm: 90 }),
            "Metronome started. Press 's' to stop. 90 BPM"
        );
        assert_eq!(
            messages.render(&Status::InvalidInput(InputError::OutOfRange)),
            "Please enter a number between 10 and 400"
        );
        assert_eq!(
            messages.render(&Status::TimeSignatureChanged { beats: 3 }),
            "Time signature changed to 3/4"
        );
        assert_eq!(
            messages.render(&Status::Failed {
                code: "MISSING_SAMPLE",
                detail: "subdivision".into()
            }),
            "Error: sound file not found: subdivision"
        );
    }

    #[test]
    fn test_every_status_renders_in_every_language() {
        let statuses = [
            Status::Started { bpm: 60 },
            Status::TempoChanged { bpm: 61 },
            Status::Stopped,
            Status::NotRunning,
            Status::Goodbye,
            Status::ZeroBpm,
            Status::ModeChanged(RhythmMode::Triplet),
            Status::ModeChangeWhileStopped,
            Status::TimeSignatureChanged { beats: 5 },
            Status::TimeSignaturePending { beats: 5 },
            Status::InvalidInput(InputError::NotANumber),
            Status::Failed {
                code: "AUDIO_UNAVAILABLE",
                detail: String::new(),
            },
        ];
        for language in [Language::En, Language::Fr] {
            let messages = Messages::new(language);
            for status in &statuses {
                assert!(!messages.render(status).is_empty());
            }
            assert!(!messages.prompt().is_empty());
        }
    }

    #[test]
    fn test_languages_differ() {
        let en = Messages::new(Language::En);
        let fr = Messages::new(Language::Fr);
        assert_ne!(en.render(&Status::Goodbye), fr.render(&Status::Goodbye));
        assert_ne!(en.welcome(), fr.welcome());
    }
}
