//! Keybindings for the terminal front end.
//!
//! Digits `1`..`N` select the class at index `N - 1`. Navigation also accepts
//! the escape sequences a terminal sends for the left and right arrow keys.

use std::path::PathBuf;

use crate::config::MAX_CLASSES;

/// Escape sequence sent by the right arrow key.
const ARROW_RIGHT: &str = "\u{1b}[C";
/// Escape sequence sent by the left arrow key.
const ARROW_LEFT: &str = "\u{1b}[D";

/// A user action decoded from one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Label the current image with the class at this index
    SelectClass(usize),
    Next,
    Previous,
    /// Write the store now
    Save,
    /// Scan a new folder
    OpenFolder(PathBuf),
    Help,
    Quit,
}

/// Keybinding configuration for the session.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Number of classes with a digit hotkey
    class_count: usize,
    pub next: char,
    pub previous: char,
    pub save: char,
    pub open: char,
    pub help: char,
    pub quit: char,
}

impl KeyBindings {
    /// Bindings for `class_count` classes (clamped to the digit range).
    pub fn new(class_count: usize) -> Self {
        Self {
            class_count: class_count.min(MAX_CLASSES),
            next: 'n',
            previous: 'p',
            save: 's',
            open: 'o',
            help: 'h',
            quit: 'q',
        }
    }

    /// Get the class index (0-based) that corresponds to a key press, if any.
    pub fn class_index_for_key(&self, key: char) -> Option<usize> {
        let digit = key.to_digit(10)? as usize;
        digit.checked_sub(1).filter(|&index| index < self.class_count)
    }

    /// Get the hotkey for a class index, if any.
    pub fn key_for_class_index(&self, index: usize) -> Option<char> {
        if index >= self.class_count {
            return None;
        }
        char::from_digit(index as u32 + 1, 10)
    }

    /// Decode one input line. Unknown input yields `None`.
    pub fn parse(&self, line: &str) -> Option<Action> {
        let line = line.trim();
        match line {
            ARROW_RIGHT => return Some(Action::Next),
            ARROW_LEFT => return Some(Action::Previous),
            _ => {}
        }

        let mut chars = line.chars();
        let key = chars.next()?;
        let rest = chars.as_str().trim();

        if key == self.open {
            return (!rest.is_empty()).then(|| Action::OpenFolder(PathBuf::from(rest)));
        }
        if !rest.is_empty() {
            return None;
        }

        if let Some(index) = self.class_index_for_key(key) {
            Some(Action::SelectClass(index))
        } else if key == self.next {
            Some(Action::Next)
        } else if key == self.previous {
            Some(Action::Previous)
        } else if key == self.save {
            Some(Action::Save)
        } else if key == self.help {
            Some(Action::Help)
        } else if key == self.quit {
            Some(Action::Quit)
        } else {
            None
        }
    }

    /// Shortcut summary, one entry per line.
    pub fn help_lines(&self) -> Vec<String> {
        vec![
            format!("1-{}: Select class", self.class_count),
            format!("{} / {} (or ← →): Navigate", self.previous, self.next),
            format!("{} <folder>: Open image folder", self.open),
            format!("{}: Save", self.save),
            format!("{}: Quit", self.quit),
        ]
    }
}
