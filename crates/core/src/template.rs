use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CAPTION_FORMAT: &str = "%v, %v";

const SLOT_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatPart {
    Literal(String),
    Slot,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("caption format is empty")]
    Empty,
    #[error("caption format needs exactly two %v slots, found {0}")]
    SlotCount(usize),
    #[error("unsupported verb in caption format: %{0}")]
    UnknownVerb(char),
    #[error("caption format ends with a lone %")]
    DanglingPercent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionFormat {
    source: String,
    parts: Vec<FormatPart>,
}

impl CaptionFormat {
    pub fn parse(input: &str) -> Result<Self, FormatError> {
        if input.is_empty() {
            return Err(FormatError::Empty);
        }

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut slots = 0usize;
        let mut chars = input.chars();

        while let Some(ch) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }
            match chars.next() {
                Some('v') => {
                    if !literal.is_empty() {
                        parts.push(FormatPart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(FormatPart::Slot);
                    slots += 1;
                }
                Some('%') => literal.push('%'),
                Some(other) => return Err(FormatError::UnknownVerb(other)),
                None => return Err(FormatError::DanglingPercent),
            }
        }

        if !literal.is_empty() {
            parts.push(FormatPart::Literal(literal));
        }

        if slots != SLOT_COUNT {
            return Err(FormatError::SlotCount(slots));
        }

        Ok(Self {
            source: input.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[FormatPart] {
        &self.parts
    }

    /// Fills the first slot with `location` and the second with `date`.
    pub fn render(&self, location: &str, date: &str) -> String {
        let mut values = [location, date].into_iter();
        let mut output = String::with_capacity(self.source.len() + location.len() + date.len());
        for part in &self.parts {
            match part {
                FormatPart::Literal(s) => output.push_str(s),
                FormatPart::Slot => output.push_str(values.next().unwrap_or_default()),
            }
        }
        output
    }
}

impl Default for CaptionFormat {
    fn default() -> Self {
        Self {
            source: DEFAULT_CAPTION_FORMAT.to_string(),
            parts: vec![
                FormatPart::Slot,
                FormatPart::Literal(", ".to_string()),
                FormatPart::Slot,
            ],
        }
    }
}

impl FromStr for CaptionFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
