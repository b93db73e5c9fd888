/// Location of a [`Cursor`] inside its runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub run: usize,
    pub offset: usize,
}

/// Forward-only character cursor over a sequence of text runs.
///
/// The runs are laid out end to end in one character arena, so reading past
/// the end of a run continues with the next non-empty one. The cursor never
/// moves backwards.
#[derive(Debug, Clone)]
pub struct Cursor {
    chars: Vec<char>,
    /// Exclusive end index of each run inside `chars`.
    run_ends: Vec<usize>,
    pos: usize,
}

impl Cursor {
    pub fn new<'a>(runs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut chars = Vec::new();
        let mut run_ends = Vec::new();
        for run in runs {
            chars.extend(run.chars());
            run_ends.push(chars.len());
        }
        Self {
            chars,
            run_ends,
            pos: 0,
        }
    }

    /// Run index and character offset of the next character. The tokenizer
    /// logs it at each field boundary. Empty runs are skipped; at end of
    /// input the position is one past the last run's text.
    pub fn position(&self) -> Position {
        let run = self
            .run_ends
            .iter()
            .position(|&end| end > self.pos)
            .unwrap_or_else(|| self.run_ends.len().saturating_sub(1));
        let start = if run == 0 { 0 } else { self.run_ends[run - 1] };
        Position {
            run,
            offset: self.pos.saturating_sub(start),
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Everything not consumed yet; `ahead()[0]` is the next character.
    pub fn ahead(&self) -> &[char] {
        &self.chars[self.pos..]
    }

    /// Text up to (not including) the first character for which `pred`
    /// holds, without consuming. `pred` sees the text collected so far and
    /// the candidate character.
    pub fn peek_until(&self, mut pred: impl FnMut(&str, char) -> bool) -> String {
        let mut result = String::new();
        for &c in self.ahead() {
            if pred(&result, c) {
                break;
            }
            result.push(c);
        }
        result
    }

    pub fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Consume exactly `n` characters (fewer at end of input).
    pub fn consume_n(&mut self, n: usize) -> String {
        let end = (self.pos + n).min(self.chars.len());
        let taken: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        taken
    }

    /// Like [`peek_until`](Self::peek_until) but consumes what it returns.
    /// Stops at end of input when `pred` never holds.
    pub fn consume_until(&mut self, pred: impl FnMut(&str, char) -> bool) -> String {
        let taken = self.peek_until(pred);
        self.pos += taken.chars().count();
        taken
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }
}
