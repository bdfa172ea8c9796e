use std::io::{Error, ErrorKind, Result};

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::files::open_reader;

/// Where the fields of interest sit in a delimited line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub delimiter: String,
    pub recipient: usize,
    pub zip: usize,
    pub date: usize,
    pub amount: usize,
    pub other_id: usize,
    pub zip_width: usize,
}

impl Default for Layout {
    // FEC individual contributions: CMTE_ID, ZIP_CODE, TRANSACTION_DT,
    // TRANSACTION_AMT, OTHER_ID.
    fn default() -> Self {
        Layout {
            delimiter: "|".to_string(),
            recipient: 0,
            zip: 10,
            date: 13,
            amount: 14,
            other_id: 15,
            zip_width: 5,
        }
    }
}

impl Layout {
    pub fn from_yaml(filename: &str) -> Result<Layout> {
        let reader = open_reader(filename)?;
        let layout: Layout = serde_yaml::from_reader(reader)
            .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?;
        layout.check()?;
        Ok(layout)
    }

    pub fn check(&self) -> Result<()> {
        if self.delimiter.chars().count() != 1 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("delimiter must be a single character, got {:?}", self.delimiter),
            ));
        }
        if self.zip_width == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "zip_width must be positive"));
        }
        Ok(())
    }

    pub fn min_fields(&self) -> usize {
        [self.recipient, self.zip, self.date, self.amount, self.other_id]
            .iter()
            .max()
            .map_or(0, |m| m + 1)
    }
}

/// The unvalidated fields of one input line.
#[derive(Debug, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub recipient: &'a str,
    pub zip: &'a str,
    pub date: &'a str,
    pub amount: &'a str,
    pub other_id: &'a str,
}

impl<'a> RawRecord<'a> {
    /// Splits `line` per `layout`; `None` if the line has too few fields.
    pub fn parse(line: &'a str, layout: &Layout) -> Option<RawRecord<'a>> {
        let parts: Vec<&str> = line.split(layout.delimiter.as_str()).collect();
        if parts.len() < layout.min_fields() {
            return None;
        }
        Some(RawRecord {
            recipient: parts[layout.recipient],
            zip: prefix(parts[layout.zip], layout.zip_width),
            date: parts[layout.date],
            amount: parts[layout.amount],
            other_id: parts[layout.other_id],
        })
    }
}

fn prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        None => s,
        Some((i, _)) => &s[..i],
    }
}

/// A record eligible for aggregation. `zip` and `date` are present only
/// when they passed validation.
#[derive(Debug, PartialEq, Eq)]
pub struct Contribution<'a> {
    pub recipient: &'a str,
    pub zip: Option<&'a str>,
    pub date: Option<&'a str>,
    pub amount: i64,
}

pub struct Validator {
    zip_re: Regex,
    amount_re: Regex,
    zip_width: usize,
}

impl Validator {
    pub fn new(layout: &Layout) -> Result<Validator> {
        let zip_re = Regex::new(&format!("^[0-9]{{{}}}$", layout.zip_width))
            .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?;
        let amount_re = Regex::new("^[0-9]+$")
            .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?;
        Ok(Validator {
            zip_re,
            amount_re,
            zip_width: layout.zip_width,
        })
    }

    pub fn zip_valid(&self, s: &str) -> bool {
        s.len() == self.zip_width && self.zip_re.is_match(s)
    }

    pub fn date_valid(&self, s: &str) -> bool {
        s.len() == 8
            && s.bytes().all(|b| b.is_ascii_digit())
            && NaiveDate::parse_from_str(s, "%m%d%Y").map_or(false, |d| d.year() >= 1)
    }

    pub fn amount_valid(&self, s: &str) -> bool {
        self.amount_re.is_match(s)
    }

    pub fn other_id_valid(&self, s: &str) -> bool {
        s.is_empty()
    }

    pub fn recipient_valid(&self, s: &str) -> bool {
        !s.is_empty()
    }

    /// `None` when the record is not eligible for either grouping.
    pub fn validate<'a>(&self, raw: &RawRecord<'a>) -> Option<Contribution<'a>> {
        if !self.other_id_valid(raw.other_id)
            || !self.recipient_valid(raw.recipient)
            || !self.amount_valid(raw.amount)
        {
            return None;
        }
        // digits only, so the only failure left is overflow
        let amount: i64 = raw.amount.parse().ok()?;
        Some(Contribution {
            recipient: raw.recipient,
            zip: Some(raw.zip).filter(|z| self.zip_valid(z)),
            date: Some(raw.date).filter(|d| self.date_valid(d)),
            amount,
        })
    }
}
