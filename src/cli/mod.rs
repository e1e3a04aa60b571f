//! CLI Interface: sentence-builder screen for the terminal
//!
//! # Components
//! - `builder.rs`: Sentence and selection state driven by key actions
//! - `input.rs`: Keystroke capture using crossterm
//! - `display.rs`: Terminal rendering of the sentence and word list

pub mod builder;
pub mod display;
pub mod input;
