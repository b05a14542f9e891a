// src/extract/time.rs
//
// Time windows. Upstream calls the recent bound `startTime` and the older
// bound `endTime`, so a valid period has start >= end.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 2010-01-01T00:00:00Z
pub const MIN_TIMESTAMP: i64 = 1_262_304_000;
/// 2050-01-01T00:00:00Z
pub const MAX_TIMESTAMP: i64 = 2_525_644_800;

lazy_static! {
    static ref LAST_PERIOD: Regex =
        Regex::new(r"(?i)last\s+(\d+)\s+(day|days|week|weeks|month|months|year|years)").unwrap();
    static ref PAST_PERIOD: Regex =
        Regex::new(r"(?i)past\s+(\d+)\s+(day|days|week|weeks|month|months|year|years)").unwrap();
    static ref MM_DD_YYYY: Regex = Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})$").unwrap();
    static ref YYYY_MM_DD: Regex = Regex::new(r"^(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})$").unwrap();
    static ref START_TIME: [Regex; 2] = [
        Regex::new(r"(?i)starttime\s*=?\s*(\d+)").unwrap(),
        Regex::new(r"(?i)start\s*time\s*=?\s*(\d+)").unwrap(),
    ];
    static ref END_TIME: [Regex; 2] = [
        Regex::new(r"(?i)endtime\s*=?\s*(\d+)").unwrap(),
        Regex::new(r"(?i)end\s*time\s*=?\s*(\d+)").unwrap(),
    ];
    static ref START_DATE: [Regex; 2] = [
        Regex::new(r"(?i)startdate\s*=?\s*([^\s,]+)").unwrap(),
        Regex::new(r"(?i)start\s*date\s*=?\s*([^\s,]+)").unwrap(),
    ];
    static ref END_DATE: [Regex; 2] = [
        Regex::new(r"(?i)enddate\s*=?\s*([^\s,]+)").unwrap(),
        Regex::new(r"(?i)end\s*date\s*=?\s*([^\s,]+)").unwrap(),
    ];
    static ref FROM_TO: Regex = Regex::new(r"(?i)from\s+([^\s,]+)\s+to\s+([^\s,]+)").unwrap();
}

/// A resolved window in unix seconds; `start_time` is the more recent bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriod {
    pub start_time: i64,
    pub end_time: i64,
}

pub fn is_valid_timestamp(timestamp: i64) -> bool {
    (MIN_TIMESTAMP..=MAX_TIMESTAMP).contains(&timestamp)
}

/// Accepts the leading integer of a string the way a lenient parser would.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let digits: String = raw
        .trim()
        .chars()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(_, c)| c)
        .collect();
    digits.parse().ok()
}

pub fn is_valid_time_period(start_time: i64, end_time: i64) -> bool {
    is_valid_timestamp(start_time) && is_valid_timestamp(end_time) && start_time >= end_time
}

fn midnight(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
}

fn ymd(year: i32, month: u32, day: u32) -> Option<i64> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || !(1970..=2050).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day).and_then(midnight)
}

/// Parses a date string to midnight UTC of that day. `MM/DD/YYYY` is tried
/// before `YYYY/MM/DD`; RFC 3339 and a bare ISO date are accepted last.
pub fn convert_date_to_unix_timestamp(date: &str) -> Option<i64> {
    let clean = date.trim();
    if clean.is_empty() {
        return None;
    }

    if let Some(caps) = MM_DD_YYYY.captures(clean) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        if let Some(ts) = ymd(year, month, day) {
            return Some(ts);
        }
    }

    if let Some(caps) = YYYY_MM_DD.captures(clean) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        if let Some(ts) = ymd(year, month, day) {
            return Some(ts);
        }
    }

    let fallback = DateTime::parse_from_rfc3339(clean)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(clean, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
        })?;
    if (1970..=2050).contains(&fallback.year()) {
        Some(fallback.timestamp())
    } else {
        None
    }
}

fn go_back(now: DateTime<Utc>, amount: i64, unit: &str) -> Option<DateTime<Utc>> {
    let months = |n: i64| u32::try_from(n).ok().map(Months::new);
    match unit {
        "day" | "days" => now.checked_sub_signed(Duration::try_days(amount)?),
        "week" | "weeks" => now.checked_sub_signed(Duration::try_weeks(amount)?),
        "month" | "months" => now.checked_sub_months(months(amount)?),
        "year" | "years" => now.checked_sub_months(months(amount.checked_mul(12)?)?),
        _ => None,
    }
}

fn relative(text: &str, pattern: &Regex, now: DateTime<Utc>) -> Option<TimePeriod> {
    let caps = pattern.captures(text)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = caps[2].to_lowercase();
    let past = go_back(now, amount, &unit)?;
    Some(TimePeriod {
        start_time: now.timestamp(),
        end_time: past.timestamp(),
    })
}

/// Relative periods such as "last 7 days", "since yesterday" or "this month",
/// evaluated against `now`.
pub fn calculate_time_period_at(text: &str, now: DateTime<Utc>) -> Option<TimePeriod> {
    if text.is_empty() {
        return None;
    }
    if let Some(period) = relative(text, &LAST_PERIOD, now) {
        return Some(period);
    }
    if let Some(period) = relative(text, &PAST_PERIOD, now) {
        return Some(period);
    }

    let today = now.date_naive();
    let since = if text.contains("since yesterday") {
        today.pred_opt()
    } else if text.contains("since last week") {
        today.checked_sub_signed(Duration::days(7))
    } else if text.contains("since last month") {
        today
            .checked_sub_months(Months::new(1))
            .and_then(|d| d.with_day(1))
    } else if text.contains("this week") {
        let back = i64::from(today.weekday().num_days_from_sunday());
        today.checked_sub_signed(Duration::days(back))
    } else if text.contains("this month") {
        today.with_day(1)
    } else if text.contains("this year") {
        NaiveDate::from_ymd_opt(today.year(), 1, 1)
    } else {
        None
    }?;

    Some(TimePeriod {
        start_time: now.timestamp(),
        end_time: midnight(since)?,
    })
}

pub fn calculate_time_period_from_text(text: &str) -> Option<TimePeriod> {
    calculate_time_period_at(text, Utc::now())
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolves a period from explicit timestamps, explicit dates, a
/// "from X to Y" range, or finally a relative expression.
pub fn extract_time_period_at(text: &str, now: DateTime<Utc>) -> Option<TimePeriod> {
    if text.is_empty() {
        return None;
    }

    if let (Some(start), Some(end)) = (first_capture(&START_TIME[..], text), first_capture(&END_TIME[..], text)) {
        if let (Some(start_time), Some(end_time)) = (parse_timestamp(&start), parse_timestamp(&end)) {
            if is_valid_timestamp(start_time) && is_valid_timestamp(end_time) {
                return Some(TimePeriod { start_time, end_time });
            }
        }
    }

    if let (Some(start), Some(end)) = (first_capture(&START_DATE[..], text), first_capture(&END_DATE[..], text)) {
        if let (Some(start_time), Some(end_time)) =
            (convert_date_to_unix_timestamp(&start), convert_date_to_unix_timestamp(&end))
        {
            return Some(TimePeriod { start_time, end_time });
        }
    }

    if let Some(caps) = FROM_TO.captures(text) {
        if let (Some(from), Some(to)) = (
            convert_date_to_unix_timestamp(&caps[1]),
            convert_date_to_unix_timestamp(&caps[2]),
        ) {
            return Some(TimePeriod {
                start_time: from.max(to),
                end_time: from.min(to),
            });
        }
    }

    calculate_time_period_at(text, now)
}

pub fn extract_time_period_from_text(text: &str) -> Option<TimePeriod> {
    extract_time_period_at(text, Utc::now())
}
