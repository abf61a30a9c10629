use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A calendar month in the general ledger, serialized as `YYYY-MM`.
///
/// Parent postings are recognized under a posting month that is independent
/// of the transaction dates of the leaf entries they summarize.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PostingMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("posting months must use the YYYY-MM format, got {0:?}")]
pub struct PostingMonthParseError(pub String);

impl PostingMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The posting month containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The first calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // The month component is validated on construction, so the date is
        // always representable.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every month from `self` through `last`, inclusive. An inverted range
    /// yields no months.
    pub fn through(self, last: Self) -> Vec<Self> {
        let mut months = Vec::new();
        let mut current = self;

        while current <= last {
            months.push(current);
            current = current.next();
        }

        months
    }
}

impl fmt::Display for PostingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PostingMonth {
    type Err = PostingMonthParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parse_error = || PostingMonthParseError(raw.to_owned());

        let (year_part, month_part) = raw.split_once('-').ok_or_else(parse_error)?;
        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(parse_error());
        }

        let year = year_part.parse().map_err(|_| parse_error())?;
        let month = month_part.parse().map_err(|_| parse_error())?;

        Self::new(year, month).ok_or_else(parse_error)
    }
}

impl Serialize for PostingMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PostingMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        raw.parse().map_err(de::Error::custom)
    }
}
