/// Cursor-based reading of whitespace-separated data from program output.
use super::errors::CpuError;

/// Characters that separate tokens.
pub const WHITESPACE: &[char] = &['\n', '\r', '\t', ' '];

/// A cursor over a string that hands out tokens and the remaining text.
#[derive(Debug, Clone)]
pub struct StringParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> StringParser<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Whether the cursor has consumed the whole input.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Advance past any characters in `separators`.
    pub fn skip(&mut self, separators: &[char]) {
        let input = self.input;
        let rest = &input[self.pos..];
        let trimmed = rest.trim_start_matches(separators);
        self.pos += rest.len() - trimmed.len();
    }

    /// Read up to (not including) the next character in `separators`.
    ///
    /// When `skip_over` is set, the separator itself is consumed too.
    pub fn read_until(&mut self, separators: &[char], skip_over: bool) -> &'a str {
        let input = self.input;
        let rest = &input[self.pos..];
        match rest.find(separators) {
            Some(idx) => {
                self.pos += idx;
                if skip_over {
                    let sep_len = rest[idx..].chars().next().map_or(0, char::len_utf8);
                    self.pos += sep_len;
                }
                &rest[..idx]
            }
            None => {
                self.pos = self.input.len();
                rest
            }
        }
    }

    /// Read the next whitespace-separated token, skipping leading whitespace.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::UnexpectedEof` if only whitespace remains.
    pub fn read_token(&mut self, what: &'static str) -> Result<&'a str, CpuError> {
        self.skip(WHITESPACE);
        if self.is_at_end() {
            return Err(CpuError::UnexpectedEof { what });
        }
        Ok(self.read_until(WHITESPACE, true))
    }

    /// Consume and return everything left.
    pub fn read_rest(&mut self) -> &'a str {
        let input = self.input;
        let rest = &input[self.pos..];
        self.pos = self.input.len();
        rest
    }
}
