//! Terminal display and UI rendering
//!
//! Features:
//! - Current sentence with placeholder when empty
//! - Ranked word list with confidence and highlight
//! - Available starting letters and the active filter
//! - Status line for degraded states

use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{stdout, Result as IoResult, Write};

use word_predict::WordPrediction;

const LIST_TOP: u16 = 6;

/// Terminal display manager
pub struct Display;

impl Display {
    pub fn new() -> Self {
        Display
    }

    /// Clear screen
    pub fn clear(&self) -> IoResult<()> {
        execute!(stdout(), terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))
    }

    /// Render the sentence built so far
    pub fn show_sentence(&self, sentence: &str) -> IoResult<()> {
        let mut stdout = stdout();
        let (color, text) = if sentence.is_empty() {
            (Color::DarkGrey, "Start building your sentence...")
        } else {
            (Color::White, sentence)
        };

        execute!(
            stdout,
            cursor::MoveTo(0, 1),
            SetForegroundColor(Color::Cyan),
            Print("Your Sentence: "),
            SetForegroundColor(color),
            Print(text),
            ResetColor
        )?;
        stdout.flush()
    }

    /// Show the letters words can be filtered by
    pub fn show_letters(&self, letters: &[char], active: Option<char>) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            cursor::MoveTo(0, 3),
            SetForegroundColor(Color::Magenta),
            Print("Letters: "),
            ResetColor
        )?;

        for &letter in letters {
            let color = if Some(letter) == active {
                Color::Yellow
            } else {
                Color::DarkGrey
            };
            execute!(
                stdout,
                SetForegroundColor(color),
                Print(format!("{} ", letter)),
                ResetColor
            )?;
        }

        if let Some(letter) = active {
            execute!(stdout, Print(format!("  (filter: {})", letter)))?;
        }
        stdout.flush()
    }

    /// Numbered word list, highlighted entry in green
    pub fn show_predictions(
        &self,
        predictions: &[&WordPrediction],
        selected: usize,
    ) -> IoResult<()> {
        let mut stdout = stdout();

        for (i, prediction) in predictions.iter().enumerate() {
            let marker = if i == selected { ">" } else { " " };
            let confidence = if prediction.is_static() {
                String::new()
            } else {
                format!("{:5.1}%", prediction.percent())
            };
            let color = if i == selected {
                Color::Green
            } else {
                Color::White
            };

            execute!(
                stdout,
                cursor::MoveTo(0, LIST_TOP + i as u16),
                SetForegroundColor(color),
                Print(format!("{} {:>2}. {:<26}", marker, i + 1, prediction.word)),
                SetForegroundColor(Color::DarkGrey),
                Print(confidence),
                ResetColor
            )?;
        }
        stdout.flush()
    }

    /// Status message under the list
    pub fn show_status(&self, row_offset: usize, message: &str) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            cursor::MoveTo(0, LIST_TOP + row_offset as u16 + 1),
            SetForegroundColor(Color::Red),
            Print(message),
            ResetColor
        )?;
        stdout.flush()
    }

    /// Show help text
    pub fn show_help(&self, row_offset: usize) -> IoResult<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            cursor::MoveTo(0, LIST_TOP + row_offset as u16 + 3),
            SetForegroundColor(Color::DarkGrey),
            Print("↑/↓ choose | ENTER add word | letter filter | BACKSPACE undo | ESC exit"),
            ResetColor
        )?;
        stdout.flush()
    }

    /// Reset terminal state and cleanup
    pub fn shutdown(&self) -> IoResult<()> {
        execute!(stdout(), cursor::Show)?;
        terminal::disable_raw_mode()
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}
