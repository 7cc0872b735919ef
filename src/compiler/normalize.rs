//! Raw lines in, logical lines out.

use super::scanner::find_unquoted;
use crate::settings::Syntax;

/// Continuation buffer plus the comment waiting for the next card.
#[derive(Debug, Default)]
pub struct LineState {
    buffer: Option<String>,
    comment: String,
}

impl LineState {
    /// Feed one raw line. Returns the completed logical line, or `None` when
    /// the line is skipped or opens/extends a continuation.
    pub fn push(&mut self, raw: &str, syntax: &Syntax) -> Option<String> {
        // Tabs, carriage returns and friends go; plain spaces stay for strings.
        let line: String = raw.chars().filter(|c| !c.is_whitespace() || *c == ' ').collect();
        let trimmed = line.trim_start_matches(' ');
        if trimmed.is_empty() || trimmed.starts_with(syntax.comment) {
            return None;
        }

        let continuing = self.buffer.is_some();
        let content = match find_unquoted(trimmed, syntax.comment) {
            Some(at) => {
                let note = trimmed.get(at + syntax.comment.len_utf8()..).unwrap_or_default();
                self.note(note, continuing, syntax);
                trimmed.get(..at).unwrap_or_default()
            }
            None => trimmed,
        };
        let content = content.trim_matches(' ');
        if content.is_empty() {
            return None;
        }

        if let Some(head) = content.strip_suffix(syntax.continuation) {
            let head = head.trim_matches(' ');
            match &mut self.buffer {
                Some(buffer) => {
                    buffer.push(' ');
                    buffer.push_str(head);
                }
                None => self.buffer = Some(head.to_string()),
            }
            return None;
        }

        match self.buffer.take() {
            Some(mut buffer) => {
                buffer.push(' ');
                buffer.push_str(content);
                Some(buffer)
            }
            None => Some(content.to_string()),
        }
    }

    /// Flush a continuation left open at end of input.
    pub fn finish(&mut self) -> Option<String> {
        self.buffer.take().filter(|b| !b.trim().is_empty())
    }

    /// Hand the pending comment to a card, leaving none behind.
    pub fn take_comment(&mut self) -> String {
        std::mem::take(&mut self.comment)
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    fn note(&mut self, raw: &str, continuing: bool, syntax: &Syntax) {
        let text: String = raw.chars().filter(|c| *c != syntax.continuation).collect();
        let text = text.trim_matches(' ');
        if !continuing {
            self.comment = text.to_string();
        } else if !text.is_empty() {
            if !self.comment.is_empty() {
                self.comment.push(' ');
            }
            self.comment.push_str(text);
        }
    }
}
