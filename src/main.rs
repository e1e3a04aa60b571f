//! Word Predict - next-word suggestions for sentence building
//!
//! One-shot mode prints the ranked words for a sentence; without a
//! sentence argument an interactive sentence-builder screen is started.

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cli::builder::SentenceBuilder;
use cli::display::Display;
use cli::input::{Action, InputHandler};
use tracing::info;
use tracing_subscriber::EnvFilter;
use word_predict::llm::filter::starting_letters;
use word_predict::{PredictionOutcome, PredictorConfig, WordPredictor};

#[derive(Parser, Debug)]
#[command(name = "word-predict")]
#[command(about = "Suggest the next word of a sentence with a masked language model")]
struct Args {
    /// Sentence to complete; omit for the interactive builder
    sentence: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to vocabulary file (overrides config)
    #[arg(short, long)]
    vocab: Option<PathBuf>,

    /// Path to scorer weights (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let mut config = match &args.config {
        Some(path) => PredictorConfig::from_file(path)?,
        None => PredictorConfig::load()?,
    };
    if let Some(vocab) = args.vocab {
        config.vocab.path = vocab;
    }
    if let Some(model) = args.model {
        config.model.path = model;
    }

    // Vocabulary failures are fatal; a missing scorer only disables predictions
    let predictor = WordPredictor::from_config(&config)?;
    info!(
        vocab = %config.vocab.path.display(),
        model = %config.model.path.display(),
        vocab_size = predictor.vocab().size(),
        model_available = predictor.is_available(),
        max_seq_len = config.encoder.max_seq_len,
        "predictor ready"
    );

    match args.sentence {
        Some(sentence) => {
            print_predictions(&predictor, &sentence);
            Ok(())
        }
        None => run_interactive(&predictor),
    }
}

fn print_predictions(predictor: &WordPredictor, sentence: &str) {
    let outcome = predictor.predict_outcome(sentence);
    match &outcome {
        PredictionOutcome::Unavailable => {
            eprintln!("⚠ Model not available - no predictions");
        }
        PredictionOutcome::Failed(error) => {
            eprintln!("⚠ Prediction failed: {}", error);
        }
        PredictionOutcome::NoPredictions => {
            println!("No valid word predictions for {:?}", sentence.trim());
        }
        PredictionOutcome::Starters(_) | PredictionOutcome::Predicted(_) => {}
    }

    for (i, prediction) in outcome.into_predictions().iter().enumerate() {
        if prediction.is_static() {
            println!("{:>2}. {}", i + 1, prediction.word);
        } else {
            println!(
                "{:>2}. {:<26}{:5.1}%",
                i + 1,
                prediction.word,
                prediction.percent()
            );
        }
    }
}

fn run_interactive(predictor: &WordPredictor) -> Result<()> {
    let display = Display::new();
    InputHandler::enable_raw_mode()?;
    let input = InputHandler::new();
    let mut builder = SentenceBuilder::new();

    // Event loop
    'session: loop {
        let outcome = predictor.predict_outcome(builder.sentence());
        let status = match &outcome {
            PredictionOutcome::Unavailable => Some("Model not available - no predictions"),
            PredictionOutcome::Failed(_) => Some("Prediction failed - see log"),
            PredictionOutcome::NoPredictions => Some("No valid word predictions"),
            PredictionOutcome::Starters(_) | PredictionOutcome::Predicted(_) => None,
        };
        let predictions = outcome.into_predictions();

        // Re-render until the sentence changes
        loop {
            let visible = builder.visible(&predictions);

            display.clear()?;
            display.show_sentence(builder.sentence())?;
            display.show_letters(&starting_letters(&predictions), builder.letter())?;
            display.show_predictions(&visible, builder.selected())?;
            if let Some(message) = status {
                display.show_status(visible.len(), message)?;
            }
            display.show_help(visible.len())?;

            let key = wait_for_key(&input)?;
            match InputHandler::action(&key) {
                Some(Action::Exit) => break 'session,
                Some(Action::Up) => builder.move_selection(-1, visible.len()),
                Some(Action::Down) => builder.move_selection(1, visible.len()),
                Some(Action::Letter(letter)) => builder.toggle_letter(letter),
                Some(Action::Select) => {
                    if let Some(prediction) = visible.get(builder.selected()) {
                        let word = prediction.word.clone();
                        builder.add_word(&word);
                        continue 'session;
                    }
                }
                Some(Action::RemoveWord) => {
                    builder.remove_last_word();
                    continue 'session;
                }
                None => {}
            }
        }
    }

    display.shutdown()?;
    println!();
    if !builder.sentence().is_empty() {
        println!("{}", builder.sentence());
    }
    Ok(())
}

/// Block until a key arrives
fn wait_for_key(input: &InputHandler) -> Result<crossterm::event::KeyEvent> {
    loop {
        if let Some(key) = input.read_key()? {
            return Ok(key);
        }
    }
}
