// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field cron expressions and the pure match predicate.
//!
//! `minute hour day month weekday`, where each field is `*`, an integer
//! literal, a step (`*/N`), an inclusive range (`A-B`) or a list (`A,B,C`).
//! Weekday numbering is fixed to Mon=0..Sun=6.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("expected 5 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid {field} value \"{value}\"")]
    InvalidValue { field: &'static str, value: String },

    #[error("{field} value {value} out of range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("invalid range \"{0}\" (start must not exceed end)")]
    InvalidRange(String),

    #[error("invalid step \"{0}\" (step must be at least 1)")]
    InvalidStep(String),
}

/// One cron field in parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CronField {
    Any,
    Value(u32),
    Step(u32),
    Range(u32, u32),
    List(Vec<u32>),
}

impl CronField {
    fn parse(text: &str, field: &'static str, min: u32, max: u32) -> Result<Self, CronError> {
        let invalid = || CronError::InvalidValue {
            field,
            value: text.to_string(),
        };
        let bounded = |value: u32| {
            if value < min || value > max {
                Err(CronError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                })
            } else {
                Ok(value)
            }
        };

        if text == "*" {
            return Ok(CronField::Any);
        }

        if let Some(step) = text.strip_prefix("*/") {
            let step: u32 = step.parse().map_err(|_| invalid())?;
            if step == 0 {
                return Err(CronError::InvalidStep(text.to_string()));
            }
            return Ok(CronField::Step(step));
        }

        if text.contains(',') {
            let values = text
                .split(',')
                .map(|part| {
                    part.parse::<u32>()
                        .map_err(|_| invalid())
                        .and_then(bounded)
                })
                .collect::<Result<Vec<u32>, CronError>>()?;
            return Ok(CronField::List(values));
        }

        if let Some((start, end)) = text.split_once('-') {
            let start = bounded(start.parse().map_err(|_| invalid())?)?;
            let end = bounded(end.parse().map_err(|_| invalid())?)?;
            if start > end {
                return Err(CronError::InvalidRange(text.to_string()));
            }
            return Ok(CronField::Range(start, end));
        }

        Ok(CronField::Value(bounded(
            text.parse().map_err(|_| invalid())?,
        )?))
    }

    fn matches(&self, value: u32) -> bool {
        match self {
            CronField::Any => true,
            CronField::Value(v) => value == *v,
            CronField::Step(n) => value % n == 0,
            CronField::Range(start, end) => (*start..=*end).contains(&value),
            CronField::List(values) => values.contains(&value),
        }
    }
}

/// A parsed five-field cron expression.
///
/// Matching is pure and minute-grained: seconds never participate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    minute: CronField,
    hour: CronField,
    day: CronField,
    month: CronField,
    weekday: CronField,
    text: String,
}

impl CronExpr {
    /// Does this expression match the given wall-clock minute?
    pub fn matches(&self, time: NaiveDateTime) -> bool {
        self.minute.matches(time.minute())
            && self.hour.matches(time.hour())
            && self.day.matches(time.day())
            && self.month.matches(time.month())
            && self.weekday.matches(time.weekday().num_days_from_monday())
    }
}

impl FromStr for CronExpr {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::FieldCount(fields.len()));
        }

        Ok(CronExpr {
            minute: CronField::parse(fields[0], "minute", 0, 59)?,
            hour: CronField::parse(fields[1], "hour", 0, 23)?,
            day: CronField::parse(fields[2], "day", 1, 31)?,
            month: CronField::parse(fields[3], "month", 1, 12)?,
            weekday: CronField::parse(fields[4], "weekday", 0, 6)?,
            text: s.to_string(),
        })
    }
}

impl Default for CronExpr {
    /// Midnight every day, the default job schedule.
    fn default() -> Self {
        CronExpr {
            minute: CronField::Value(0),
            hour: CronField::Value(0),
            day: CronField::Any,
            month: CronField::Any,
            weekday: CronField::Any,
            text: "0 0 * * *".to_string(),
        }
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Serialize for CronExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for CronExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
