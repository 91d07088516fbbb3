//! Recurrence expansion -- projects a repeat rule onto the dates of a window.
//!
//! Only `daily` is understood today. Any other rule value is preserved as
//! [`RepeatRule::Unsupported`] and expands to no dates at all: the record is
//! treated as "not yet supported" rather than as corrupt data.

use std::fmt;
use std::iter::FusedIterator;

use chrono::NaiveDate;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::slot::{DateKey, DateWindow};

/// How a recurring event repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepeatRule {
    /// Every calendar day.
    Daily,
    /// A rule this version does not expand. Holds the raw value.
    Unsupported(String),
}

impl RepeatRule {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("daily") {
            RepeatRule::Daily
        } else {
            RepeatRule::Unsupported(raw.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RepeatRule::Daily => "daily",
            RepeatRule::Unsupported(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, RepeatRule::Unsupported(_))
    }
}

impl fmt::Display for RepeatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RepeatRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

struct RepeatRuleVisitor;

impl<'de> Visitor<'de> for RepeatRuleVisitor {
    type Value = RepeatRule;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a repeat rule string or boolean")
    }

    // The backend stores `"repeat": false` on events that do not repeat.
    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RepeatRule, E> {
        Ok(RepeatRule::Unsupported(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RepeatRule, E> {
        Ok(RepeatRule::parse(v))
    }
}

impl<'de> Deserialize<'de> for RepeatRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RepeatRuleVisitor)
    }
}

/// The dates a rule produces inside a window.
///
/// Cheap to hold and restartable: every call to [`Expansion::iter`] starts a
/// fresh pass from the beginning of the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    rule: RepeatRule,
    window: DateWindow,
}

impl Expansion {
    pub fn iter(&self) -> Dates {
        match self.rule {
            RepeatRule::Daily => Dates {
                next: Some(self.window.min_date().date()),
                last: self.window.max_date().date(),
            },
            RepeatRule::Unsupported(_) => Dates::empty(),
        }
    }
}

impl<'a> IntoIterator for &'a Expansion {
    type Item = DateKey;
    type IntoIter = Dates;

    fn into_iter(self) -> Dates {
        self.iter()
    }
}

/// Expand `rule` over `window`. Never yields a date outside the window.
pub fn expand(rule: &RepeatRule, window: DateWindow) -> Expansion {
    Expansion {
        rule: rule.clone(),
        window,
    }
}

/// Ascending calendar days produced by an [`Expansion`].
#[derive(Debug, Clone)]
pub struct Dates {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl Dates {
    fn empty() -> Self {
        Self {
            next: None,
            last: NaiveDate::MIN,
        }
    }
}

impl Iterator for Dates {
    type Item = DateKey;

    fn next(&mut self) -> Option<DateKey> {
        let current = self.next.filter(|d| *d <= self.last)?;
        // succ_opt handles month and year rollover.
        self.next = current.succ_opt();
        Some(DateKey::new(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(d) if d <= self.last => {
                let n = (self.last - d).num_days() as usize + 1;
                (n, Some(n))
            }
            _ => (0, Some(0)),
        }
    }
}

impl FusedIterator for Dates {}
