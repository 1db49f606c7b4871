use crate::template::CaptionFormat;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

const FILE_NAME_LAYOUT: &str = "%Y-%m-%d_%H-%M-%S-pola.jpg";

const FILE_NAME_SHAPE: &[u8] = b"0000-00-00_00-00-00-pola.jpg";

const FRENCH_MONTHS: [(&str, &str); 12] = [
    ("January", "janvier"),
    ("February", "février"),
    ("March", "mars"),
    ("April", "avril"),
    ("May", "mai"),
    ("June", "juin"),
    ("July", "juillet"),
    ("August", "août"),
    ("September", "septembre"),
    ("October", "octobre"),
    ("November", "novembre"),
    ("December", "décembre"),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("file name does not follow YYYY-MM-DD_HH-MM-SS-pola.jpg: {0}")]
    Layout(String),
    #[error("file name carries an impossible date: {name} ({reason})")]
    Calendar { name: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionDate {
    date: NaiveDate,
}

impl CaptionDate {
    pub fn from_file_name(name: &str) -> Result<Self, DateParseError> {
        if !matches_shape(name) {
            return Err(DateParseError::Layout(name.to_string()));
        }

        let parsed = NaiveDateTime::parse_from_str(name, FILE_NAME_LAYOUT).map_err(|err| {
            DateParseError::Calendar {
                name: name.to_string(),
                reason: err.to_string(),
            }
        })?;

        Ok(Self {
            date: parsed.date(),
        })
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// French display form: `1er janvier 2023` on the first of the month,
    /// `15 mars 2023` otherwise.
    pub fn displayed(&self) -> String {
        let english = if self.date.day() == 1 {
            format!("1er {}", self.date.format("%B %Y"))
        } else {
            self.date.format("%d %B %Y").to_string()
        };
        localize_month(&english)
    }
}

pub fn resolve(
    file_name: &str,
    location: Option<&str>,
    format: &CaptionFormat,
) -> Result<String, DateParseError> {
    let date = CaptionDate::from_file_name(file_name)?;
    Ok(compose(&date, location, format))
}

pub fn compose(date: &CaptionDate, location: Option<&str>, format: &CaptionFormat) -> String {
    let displayed = date.displayed();
    match location.filter(|loc| !loc.is_empty()) {
        Some(location) => format.render(location, &displayed),
        None => displayed,
    }
}

pub fn french_month(english: &str) -> Option<&'static str> {
    FRENCH_MONTHS
        .iter()
        .find(|(en, _)| *en == english)
        .map(|(_, fr)| *fr)
}

// Only whole tokens equal to a month name are swapped; the day and year
// tokens are never touched.
fn localize_month(formatted: &str) -> String {
    formatted
        .split(' ')
        .map(|token| french_month(token).unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn matches_shape(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == FILE_NAME_SHAPE.len()
        && bytes
            .iter()
            .zip(FILE_NAME_SHAPE)
            .all(|(actual, expected)| match expected {
                b'0' => actual.is_ascii_digit(),
                other => actual == other,
            })
}
