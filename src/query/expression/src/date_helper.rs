// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::DateTime;
use chrono::Datelike;
use chrono::FixedOffset;
use chrono::Months;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeDelta;
use chrono::Timelike;
use chrono::Utc;
use tessera_common_exception::ErrorCode;
use tessera_common_exception::Result;

use crate::values::DateTimeOffsetScalar;

pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
pub const DATETIME_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    DayOfWeek,
    DayOfYear,
}

impl std::fmt::Display for DatePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DatePart::Year => "YEAR",
            DatePart::Month => "MONTH",
            DatePart::Day => "DAY",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
            DatePart::Second => "SECOND",
            DatePart::Millisecond => "MILLISECOND",
            DatePart::DayOfWeek => "DAYOFWEEK",
            DatePart::DayOfYear => "DAYOFYEAR",
        };
        write!(f, "{}", name)
    }
}

fn utc_datetime(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| ErrorCode::BadArguments(format!("timestamp out of range: {}", micros)))
}

pub fn parse_datetime_micros(text: &str) -> Result<i64> {
    Ok(parse_datetime_offset(text)?.micros)
}

pub fn parse_datetime_offset(text: &str) -> Result<DateTimeOffsetScalar> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(DateTimeOffsetScalar {
            micros: dt.timestamp_micros(),
            offset_seconds: dt.offset().local_minus_utc(),
        });
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(DateTimeOffsetScalar {
                micros: naive.and_utc().timestamp_micros(),
                offset_seconds: 0,
            });
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0).unwrap();
        return Ok(DateTimeOffsetScalar {
            micros: naive.and_utc().timestamp_micros(),
            offset_seconds: 0,
        });
    }
    Err(ErrorCode::BadArguments(format!(
        "unable to parse '{}' as datetime",
        text
    )))
}

pub fn format_datetime_micros(micros: i64) -> String {
    match DateTime::from_timestamp_micros(micros) {
        Some(dt) => dt.format(DATETIME_FORMAT).to_string(),
        None => micros.to_string(),
    }
}

pub fn format_datetime_offset(value: DateTimeOffsetScalar) -> String {
    let offset = FixedOffset::east_opt(value.offset_seconds);
    match (DateTime::from_timestamp_micros(value.micros), offset) {
        (Some(dt), Some(offset)) => dt
            .with_timezone(&offset)
            .format(DATETIME_OFFSET_FORMAT)
            .to_string(),
        _ => value.micros.to_string(),
    }
}

pub fn extract_part(part: DatePart, micros: i64) -> Result<i64> {
    let dt = utc_datetime(micros)?;
    let value = match part {
        DatePart::Year => dt.year() as i64,
        DatePart::Month => dt.month() as i64,
        DatePart::Day => dt.day() as i64,
        DatePart::Hour => dt.hour() as i64,
        DatePart::Minute => dt.minute() as i64,
        DatePart::Second => dt.second() as i64,
        DatePart::Millisecond => dt.timestamp_subsec_millis() as i64,
        DatePart::DayOfWeek => dt.weekday().number_from_monday() as i64,
        DatePart::DayOfYear => dt.ordinal() as i64,
    };
    Ok(value)
}

fn add_overflow(part: DatePart, number: i64) -> ErrorCode {
    ErrorCode::Overflow(format!("date add {} {} overflow", part, number))
}

pub fn add_part(part: DatePart, number: i64, micros: i64) -> Result<i64> {
    let dt = utc_datetime(micros)?;
    let result = match part {
        DatePart::Year | DatePart::Month => {
            let months = if part == DatePart::Year {
                number
                    .checked_mul(12)
                    .ok_or_else(|| add_overflow(part, number))?
            } else {
                number
            };
            let months_abs = months.unsigned_abs().min(u32::MAX as u64) as u32;
            if months >= 0 {
                dt.checked_add_months(Months::new(months_abs))
            } else {
                dt.checked_sub_months(Months::new(months_abs))
            }
        }
        DatePart::Day => TimeDelta::try_days(number).and_then(|d| dt.checked_add_signed(d)),
        DatePart::Hour => TimeDelta::try_hours(number).and_then(|d| dt.checked_add_signed(d)),
        DatePart::Minute => TimeDelta::try_minutes(number).and_then(|d| dt.checked_add_signed(d)),
        DatePart::Second => TimeDelta::try_seconds(number).and_then(|d| dt.checked_add_signed(d)),
        DatePart::Millisecond => {
            TimeDelta::try_milliseconds(number).and_then(|d| dt.checked_add_signed(d))
        }
        DatePart::DayOfWeek | DatePart::DayOfYear => {
            return Err(ErrorCode::BadArguments(format!(
                "cannot add to date part {}",
                part
            )));
        }
    };
    Ok(result
        .ok_or_else(|| add_overflow(part, number))?
        .timestamp_micros())
}
