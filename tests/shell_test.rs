//! Interactive shell scenarios
//!
//! Drives a [`Session`] line by line the way the binary does, with a recording
//! sound bank in place of the audio device.

mod common;

use common::{wait_for, MockBank};
use metronomnom::audio::SampleId;
use metronomnom::metronome::{MetronomeConfig, MetronomeEngine, MetronomeError, RhythmMode};
use metronomnom::shell::{InputError, Language, Messages, Session, Status};

trait EngineFactory:
    FnMut(MetronomeConfig) -> Result<MetronomeEngine<MockBank>, MetronomeError>
{
}

impl<F> EngineFactory for F where
    F: FnMut(MetronomeConfig) -> Result<MetronomeEngine<MockBank>, MetronomeError>
{
}

fn session_with(bank: MockBank) -> Session<MockBank, impl EngineFactory> {
    Session::new(move |config: MetronomeConfig| MetronomeEngine::new(config, bank.clone()), 4)
}

fn statuses(session: &mut Session<MockBank, impl EngineFactory>, line: &str) -> Vec<Status> {
    session.handle_line(line).statuses
}

/// Test: Invalid BPM input is classified
/// Given the shell is waiting for input
/// When a word, a decimal and an out-of-range number are entered
/// Then each is rejected with its own message and no metronome starts
#[test]
fn test_bpm_validation_messages() {
    let bank = MockBank::default();
    let mut session = session_with(bank.clone());
    let messages = Messages::new(Language::En);

    let cases = [
        ("fast", InputError::NotANumber, "You must enter a number or a valid command."),
        ("92.5", InputError::NotAWholeNumber, "You must enter a whole number."),
        ("401", InputError::OutOfRange, "Please enter a number between 10 and 400"),
        ("-5", InputError::OutOfRange, "Please enter a number between 10 and 400"),
    ];
    for (line, error, text) in cases {
        let reply = statuses(&mut session, line);
        assert_eq!(reply, vec![Status::InvalidInput(error)], "input {:?}", line);
        assert_eq!(messages.render(&reply[0]), text);
    }

    assert!(session.engine().is_none());
    assert_eq!(bank.opens.load(std::sync::atomic::Ordering::SeqCst), 0);
}

/// Test: Commands that need a running metronome
/// Given no metronome is running
/// When a rhythm mode or stop is entered
/// Then the mode change is refused and stop reports that nothing is running
#[test]
fn test_commands_while_stopped() {
    let mut session = session_with(MockBank::default());

    assert_eq!(statuses(&mut session, "e"), vec![Status::ModeChangeWhileStopped]);
    assert_eq!(statuses(&mut session, "s"), vec![Status::NotRunning]);
    assert_eq!(statuses(&mut session, "0"), vec![Status::ZeroBpm]);
    assert!(!session.is_running());
}

/// Test: A full session
/// Given a time signature of 3 chosen before starting
/// When the user starts at 120 BPM, toggles eighth notes, changes tempo, stops and quits
/// Then every step reports the matching status
#[test]
fn test_full_session() {
    let bank = MockBank::default();
    let mut session = session_with(bank.clone());

    assert_eq!(
        statuses(&mut session, "3"),
        vec![Status::TimeSignaturePending { beats: 3 }]
    );
    assert_eq!(statuses(&mut session, "120"), vec![Status::Started { bpm: 120 }]);
    assert!(session.is_running());
    assert_eq!(session.engine().map(|e| e.beats_per_measure()), Some(3));

    assert_eq!(
        statuses(&mut session, "E"),
        vec![Status::ModeChanged(RhythmMode::Eighth)]
    );
    assert_eq!(
        statuses(&mut session, "e"),
        vec![Status::ModeChanged(RhythmMode::Normal)]
    );
    assert_eq!(
        statuses(&mut session, "t"),
        vec![Status::ModeChanged(RhythmMode::Triplet)]
    );

    assert_eq!(statuses(&mut session, "200"), vec![Status::TempoChanged { bpm: 200 }]);
    assert_eq!(session.engine().map(|e| e.bpm()), Some(200));

    assert_eq!(
        statuses(&mut session, "5"),
        vec![Status::TimeSignatureChanged { beats: 5 }]
    );
    assert_eq!(session.engine().map(|e| e.beats_per_measure()), Some(5));

    assert_eq!(statuses(&mut session, "s"), vec![Status::Stopped]);
    assert!(session.engine().is_none());
    assert!(!bank.is_open());

    let reply = session.handle_line("q");
    assert_eq!(reply.statuses, vec![Status::Goodbye]);
    assert!(reply.quit);
}

/// Test: A missing sample is reported when starting
/// Given the downbeat sample is missing
/// When a BPM is entered
/// Then the shell reports the missing file and stays stopped
#[test]
fn test_missing_sample_reported() {
    let mut session = session_with(MockBank::missing(SampleId::Downbeat));

    let reply = statuses(&mut session, "100");
    assert_eq!(
        reply,
        vec![Status::Failed {
            code: "MISSING_SAMPLE",
            detail: "downbeat".into()
        }]
    );
    assert_eq!(
        Messages::new(Language::Fr).render(&reply[0]),
        "Erreur : fichier son introuvable : downbeat"
    );
    assert!(session.engine().is_none());
}

/// Test: A run that ends on its own is reported on the next command
/// Given a running metronome whose device disappears
/// When the user enters a new tempo
/// Then the device loss is reported and the metronome starts again
#[test]
fn test_device_lost_reported_and_restarted() {
    let bank = MockBank::failing_after(2);
    let mut session = session_with(bank.clone());

    assert_eq!(statuses(&mut session, "400"), vec![Status::Started { bpm: 400 }]);
    assert!(wait_for(|| !session.is_running()));

    let reply = statuses(&mut session, "300");
    assert_eq!(
        reply,
        vec![
            Status::Failed {
                code: "DEVICE_LOST",
                detail: String::new()
            },
            Status::Started { bpm: 300 },
        ]
    );
    session.stop();
}

/// Test: Messages follow the configured language
/// Given the shell is configured for French
/// When the metronome starts
/// Then the start message is in French
#[test]
fn test_french_messages() {
    let mut session = session_with(MockBank::default());
    let messages = Messages::new(Language::Fr);

    let reply = statuses(&mut session, "90");
    assert_eq!(
        messages.render(&reply[0]),
        "Métronome démarré. Tapez 's' pour arrêter. 90 BPM"
    );
    assert_eq!(messages.render(&Status::Goodbye), "Au revoir !");
}

/// Test: A run that ends on its own is reported even on invalid input
/// Given a running metronome whose device disappears
/// When the user next types something that is not a command
/// Then the device loss is reported before the input error
#[test]
fn test_device_lost_reported_on_invalid_input() {
    let mut session = session_with(MockBank::failing_after(2));

    assert_eq!(statuses(&mut session, "400"), vec![Status::Started { bpm: 400 }]);
    assert!(wait_for(|| !session.is_running()));

    assert_eq!(
        statuses(&mut session, "faster"),
        vec![
            Status::Failed {
                code: "DEVICE_LOST",
                detail: String::new()
            },
            Status::InvalidInput(InputError::NotANumber),
        ]
    );
    // Reported once
    assert_eq!(
        statuses(&mut session, "faster"),
        vec![Status::InvalidInput(InputError::NotANumber)]
    );
}
