//! Directive mini-language parser.
//!
//! ```text
//! format := directive*
//! directive := [lv] [count] tag
//! lv    := '-' | '='              ; 1-byte or 2-byte length prefix
//! count := digit+
//! tag   := 'c'|'w'|'d'|'D'|'f'|'F'|'s'|'a'|'['
//! ']'   closes the nearest unmatched '['
//! ' '   ignorable, forbidden between lv/count and tag
//! ```
//!
//! The grammar is wire-compatible with the original protocol tooling and
//! must stay bit-exact: every tag maps to a fixed big-endian field layout.

use crate::error::{PackError, Result};

/// Field kind selected by the directive's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `c` — 1-byte integer.
    Char,
    /// `w` — 2-byte integer.
    Word,
    /// `d` — 4-byte integer.
    Dword,
    /// `D` — 8-byte integer.
    Ddword,
    /// `f` — IEEE-754 single.
    Float,
    /// `F` — IEEE-754 double.
    Double,
    /// `s` — string (NUL-terminated on the wire unless LV-prefixed).
    Str,
    /// `a` — zero-byte padding.
    Pad,
    /// `[` — enter a nested structure.
    Open,
    /// `]` — leave the current structure.
    Close,
}

/// Width of a length-value prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LvWidth {
    One,
    Two,
}

impl LvWidth {
    pub fn bytes(self) -> usize {
        match self {
            LvWidth::One => 1,
            LvWidth::Two => 2,
        }
    }

    /// Largest length representable by the prefix.
    pub fn max_len(self) -> usize {
        match self {
            LvWidth::One => u8::MAX as usize,
            LvWidth::Two => u16::MAX as usize,
        }
    }
}

/// One parsed unit of the format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    pub lv: Option<LvWidth>,
    pub count: Option<usize>,
    pub kind: Kind,
}

/// Whole-string bracket-balance pre-pass.  Runs before any buffer byte is
/// touched; only the final counter matters.
pub fn balanced(format: &str) -> bool {
    let mut depth = 0i64;
    for b in format.bytes() {
        match b {
            b'[' => depth += 1,
            b']' => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

/// One-directive-at-a-time cursor over a format string.
///
/// Cloning is cheap (a string slice); the engine clones the scanner at every
/// `[` so each array element replays the same body.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    rest: &'a str,
    mark: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(format: &'a str) -> Self {
        Self { rest: format, mark: format }
    }

    /// The format tail starting at the most recently parsed directive.
    /// Used as error context.
    pub fn mark(&self) -> &'a str {
        self.mark
    }

    /// Parse the next directive, or `None` at end of input.
    pub fn next(&mut self) -> Result<Option<Directive>> {
        while self.rest.as_bytes().first() == Some(&b' ') {
            self.rest = &self.rest[1..];
        }
        if self.rest.is_empty() {
            return Ok(None);
        }
        self.mark = self.rest;
        let bytes = self.rest.as_bytes();

        let mut i = 0;
        let lv = match bytes[0] {
            b'-' => {
                i = 1;
                Some(LvWidth::One)
            }
            b'=' => {
                i = 1;
                Some(LvWidth::Two)
            }
            _ => None,
        };

        let digits = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let count = if i > digits {
            let n = self.rest[digits..i]
                .parse::<usize>()
                .map_err(|_| PackError::NotFormat(self.mark.to_string()))?;
            Some(n)
        } else {
            None
        };

        let Some(&tag) = bytes.get(i) else {
            return Err(PackError::ExpectFormat(self.mark.to_string()));
        };
        let kind = match tag {
            b'c' => Kind::Char,
            b'w' => Kind::Word,
            b'd' => Kind::Dword,
            b'D' => Kind::Ddword,
            b'f' => Kind::Float,
            b'F' => Kind::Double,
            b's' => Kind::Str,
            b'a' => Kind::Pad,
            b'[' => Kind::Open,
            b']' => Kind::Close,
            _ => return Err(PackError::NotFormat(self.mark.to_string())),
        };
        self.rest = &self.rest[i + 1..];
        Ok(Some(Directive { lv, count, kind }))
    }

    /// Skip past the `]` matching an already-consumed `[`.
    pub fn skip_group(&mut self) -> Result<()> {
        let mut depth = 1usize;
        for (i, b) in self.rest.bytes().enumerate() {
            match b {
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.rest = &self.rest[i + 1..];
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(PackError::BracketMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(fmt: &str) -> Directive {
        Scanner::new(fmt).next().unwrap().unwrap()
    }

    #[test]
    fn plain_tags() {
        assert_eq!(one("d"), Directive { lv: None, count: None, kind: Kind::Dword });
        assert_eq!(one("F"), Directive { lv: None, count: None, kind: Kind::Double });
        assert_eq!(one("a"), Directive { lv: None, count: None, kind: Kind::Pad });
    }

    #[test]
    fn prefixes_and_counts() {
        assert_eq!(
            one("-100s"),
            Directive { lv: Some(LvWidth::One), count: Some(100), kind: Kind::Str }
        );
        assert_eq!(
            one("=10["),
            Directive { lv: Some(LvWidth::Two), count: Some(10), kind: Kind::Open }
        );
        assert_eq!(one("16a"), Directive { lv: None, count: Some(16), kind: Kind::Pad });
    }

    #[test]
    fn spaces_are_cosmetic() {
        let mut s = Scanner::new("  d   w ");
        assert_eq!(s.next().unwrap().unwrap().kind, Kind::Dword);
        assert_eq!(s.next().unwrap().unwrap().kind, Kind::Word);
        assert_eq!(s.next().unwrap(), None);
    }

    #[test]
    fn prefix_without_tag() {
        assert_eq!(
            Scanner::new("-").next(),
            Err(PackError::ExpectFormat("-".to_string()))
        );
        assert_eq!(
            Scanner::new("12").next(),
            Err(PackError::ExpectFormat("12".to_string()))
        );
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(Scanner::new("x").next(), Err(PackError::NotFormat("x".to_string())));
        assert_eq!(
            Scanner::new("4z").next(),
            Err(PackError::NotFormat("4z".to_string()))
        );
    }

    #[test]
    fn balance_pre_pass() {
        assert!(balanced(""));
        assert!(balanced("d[w[c]]"));
        assert!(balanced("]d["));
        assert!(!balanced("[d"));
        assert!(!balanced("d]"));
    }

    #[test]
    fn group_skipping() {
        let mut s = Scanner::new("[d[w]]c");
        assert_eq!(s.next().unwrap().unwrap().kind, Kind::Open);
        s.skip_group().unwrap();
        assert_eq!(s.next().unwrap().unwrap().kind, Kind::Char);
    }

    #[test]
    fn group_skipping_unterminated() {
        let mut s = Scanner::new("[d");
        s.next().unwrap();
        assert_eq!(s.skip_group(), Err(PackError::BracketMismatch));
    }
}
