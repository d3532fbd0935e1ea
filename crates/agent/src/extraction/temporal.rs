//! Date and time-of-day resolution for free text.
//!
//! Relative expressions are anchored on a caller-supplied "today" and are
//! biased toward the future: a weekday or a month/day without a year always
//! resolves to the next upcoming occurrence.

use std::ops::Range;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};
use regex::Captures;

use crate::extraction::patterns::Patterns;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DateMatch {
    pub date: NaiveDate,
    pub span: Range<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        let (start, end) = match self {
            Self::Morning => (9, 12),
            Self::Afternoon => (12, 17),
            Self::Evening => (17, 20),
        };
        (hour(start), hour(end))
    }

    fn is_after_noon(&self) -> bool {
        matches!(self, Self::Afternoon | Self::Evening)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RangeScan {
    Found { start: NaiveTime, end: NaiveTime },
    /// A range was written but could not be ordered start-before-end.
    Inverted,
    Absent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

const COUNT_UNITS: [&str; 14] = [
    "day", "days", "week", "weeks", "hour", "hours", "minute", "minutes", "min", "mins",
    "people", "persons", "guests", "times",
];

pub(crate) fn resolve_date(text: &str, today: NaiveDate, patterns: &Patterns) -> Option<DateMatch> {
    explicit_iso(text, patterns)
        .or_else(|| slash_date(text, today, patterns))
        .or_else(|| month_name_date(text, today, patterns))
        .or_else(|| relative_day(text, today, patterns))
        .or_else(|| in_offset(text, today, patterns))
        .or_else(|| next_week(text, today, patterns))
        .or_else(|| weekday(text, today, patterns))
}

pub(crate) fn detect_period(text: &str, patterns: &Patterns) -> Option<DayPeriod> {
    let captures = patterns.period.captures(text)?;
    match captures.get(1)?.as_str() {
        "morning" => Some(DayPeriod::Morning),
        "afternoon" => Some(DayPeriod::Afternoon),
        _ => Some(DayPeriod::Evening),
    }
}

pub(crate) fn detect_range(text: &str, patterns: &Patterns) -> RangeScan {
    for captures in patterns.time_range.captures_iter(text) {
        let start_meridiem = meridiem(captures.get(3).map(|m| m.as_str()));
        let end_meridiem = meridiem(captures.get(6).map(|m| m.as_str()));
        let start_minute = captures.get(2).map(|m| m.as_str());
        let end_minute = captures.get(5).map(|m| m.as_str());

        let bare = start_meridiem.is_none()
            && end_meridiem.is_none()
            && start_minute.is_none()
            && end_minute.is_none();
        if bare {
            let consumed = captures.get(0).map(|m| m.end()).unwrap_or(text.len());
            if followed_by_count_unit(&text[consumed..]) {
                continue;
            }
        }

        let (Some(start_hour), Some(end_hour)) = (captures.get(1), captures.get(4)) else {
            continue;
        };

        let shared_start = start_meridiem.or(end_meridiem);
        let shared_end = end_meridiem.or(start_meridiem);
        let start = clock(start_hour.as_str(), start_minute, shared_start);
        let end = clock(end_hour.as_str(), end_minute, shared_end);
        let (Some(mut start), Some(mut end)) = (start, end) else {
            continue;
        };

        if start >= end && start_meridiem.is_none() && shared_start == Some(Meridiem::Pm) {
            if let Some(morning) = clock(start_hour.as_str(), start_minute, Some(Meridiem::Am)) {
                if morning.hour() >= 7 && morning < end {
                    start = morning;
                }
            }
        }

        // No meridiem anywhere: "12-1" and "11-2" end in the afternoon.
        if start >= end && shared_start.is_none() {
            if let Some(afternoon) = clock(end_hour.as_str(), end_minute, Some(Meridiem::Pm)) {
                if start.hour() >= 7 && start < afternoon && afternoon.hour() <= 18 {
                    end = afternoon;
                }
            }
        }

        if start >= end {
            return RangeScan::Inverted;
        }
        return RangeScan::Found { start, end };
    }
    RangeScan::Absent
}

/// A single time of day; `period` supplies the am/pm reading for bare hours.
pub(crate) fn detect_single_time(
    text: &str,
    period: Option<DayPeriod>,
    patterns: &Patterns,
) -> Option<NaiveTime> {
    if let Some(captures) = patterns.meridiem_time.captures(text) {
        if let Some(time) = clock_from(&captures, 1, 2, meridiem(captures.get(3).map(|m| m.as_str())))
        {
            return Some(time);
        }
    }

    if let Some(captures) = patterns.clock_time.captures(text) {
        if let Some(time) = clock_from(&captures, 1, 2, None) {
            return Some(apply_period_hint(time, period));
        }
    }

    if let Some(captures) = patterns.at_hour.captures(text) {
        if let Some(time) = clock_from(&captures, 1, 99, None) {
            return Some(apply_period_hint(time, period));
        }
    }

    let captures = patterns.named_time.captures(text)?;
    match captures.get(1)?.as_str() {
        "midnight" => Some(NaiveTime::MIN),
        _ => Some(hour(12)),
    }
}

/// Blanks out `span` so later scans cannot re-read a date as a time.
pub(crate) fn mask(text: &str, span: Option<&Range<usize>>) -> String {
    let mut masked = text.to_string();
    if let Some(span) = span {
        if text.is_char_boundary(span.start) && text.is_char_boundary(span.end) {
            masked.replace_range(span.clone(), &" ".repeat(span.len()));
        }
    }
    masked
}

fn explicit_iso(text: &str, patterns: &Patterns) -> Option<DateMatch> {
    patterns.iso_date.captures_iter(text).find_map(|captures| {
        let year = captures.get(1)?.as_str().parse().ok()?;
        let month = captures.get(2)?.as_str().parse().ok()?;
        let day = captures.get(3)?.as_str().parse().ok()?;
        Some(DateMatch { date: NaiveDate::from_ymd_opt(year, month, day)?, span: span(&captures) })
    })
}

fn slash_date(text: &str, today: NaiveDate, patterns: &Patterns) -> Option<DateMatch> {
    patterns.slash_date.captures_iter(text).find_map(|captures| {
        let month = captures.get(1)?.as_str().parse().ok()?;
        let day = captures.get(2)?.as_str().parse().ok()?;
        let year = match captures.get(3) {
            Some(raw) if raw.as_str().len() == 2 => Some(2000 + raw.as_str().parse::<i32>().ok()?),
            Some(raw) => Some(raw.as_str().parse().ok()?),
            None => None,
        };
        let date = calendar_date(today, year, month, day)?;
        Some(DateMatch { date, span: span(&captures) })
    })
}

fn month_name_date(text: &str, today: NaiveDate, patterns: &Patterns) -> Option<DateMatch> {
    let month_first = patterns.month_day.captures_iter(text).find_map(|captures| {
        let month = month_number(captures.get(1)?.as_str())?;
        let day = captures.get(2)?.as_str().parse().ok()?;
        let year = captures.get(3).and_then(|raw| raw.as_str().parse().ok());
        Some(DateMatch { date: calendar_date(today, year, month, day)?, span: span(&captures) })
    });
    month_first.or_else(|| {
        patterns.day_month.captures_iter(text).find_map(|captures| {
            let day = captures.get(1)?.as_str().parse().ok()?;
            let month = month_number(captures.get(2)?.as_str())?;
            let year = captures.get(3).and_then(|raw| raw.as_str().parse().ok());
            Some(DateMatch { date: calendar_date(today, year, month, day)?, span: span(&captures) })
        })
    })
}

fn relative_day(text: &str, today: NaiveDate, patterns: &Patterns) -> Option<DateMatch> {
    let captures = patterns.relative_day.captures(text)?;
    let offset = match captures.get(1)?.as_str() {
        "day after tomorrow" => 2,
        "tomorrow" | "tmrw" => 1,
        _ => 0,
    };
    Some(DateMatch { date: today + Duration::days(offset), span: span(&captures) })
}

fn in_offset(text: &str, today: NaiveDate, patterns: &Patterns) -> Option<DateMatch> {
    let captures = patterns.in_offset.captures(text)?;
    let count = match captures.get(1)?.as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        digits => digits.parse::<i64>().ok()?,
    };
    let days = if captures.get(2)?.as_str().starts_with("week") { count * 7 } else { count };
    Some(DateMatch { date: today + Duration::days(days), span: span(&captures) })
}

fn next_week(text: &str, today: NaiveDate, patterns: &Patterns) -> Option<DateMatch> {
    let captures = patterns.next_week.captures(text)?;
    Some(DateMatch { date: today + Duration::days(7), span: span(&captures) })
}

fn weekday(text: &str, today: NaiveDate, patterns: &Patterns) -> Option<DateMatch> {
    let captures = patterns.weekday.captures(text)?;
    let target = weekday_from_name(captures.get(2)?.as_str())?;
    let current = i64::from(today.weekday().num_days_from_monday());
    let wanted = i64::from(target.num_days_from_monday());
    let mut ahead = (wanted - current).rem_euclid(7);
    let this_week = captures.get(1).is_some_and(|qualifier| qualifier.as_str() == "this");
    if ahead == 0 && !this_week {
        ahead = 7;
    }
    Some(DateMatch { date: today + Duration::days(ahead), span: span(&captures) })
}

/// Month/day without a year that already passed this year rolls to next year.
fn calendar_date(today: NaiveDate, year: Option<i32>, month: u32, day: u32) -> Option<NaiveDate> {
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
            match this_year {
                Some(date) if date >= today => Some(date),
                _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            }
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn meridiem(raw: Option<&str>) -> Option<Meridiem> {
    match raw? {
        "am" => Some(Meridiem::Am),
        "pm" => Some(Meridiem::Pm),
        _ => None,
    }
}

fn clock_from(
    captures: &Captures<'_>,
    hour_group: usize,
    minute_group: usize,
    meridiem: Option<Meridiem>,
) -> Option<NaiveTime> {
    let hour = captures.get(hour_group)?.as_str();
    let minute = captures.get(minute_group).map(|m| m.as_str());
    clock(hour, minute, meridiem)
}

fn clock(hour: &str, minute: Option<&str>, meridiem: Option<Meridiem>) -> Option<NaiveTime> {
    let hour = hour.parse::<u32>().ok()?;
    let minute = match minute {
        Some(raw) => raw.parse::<u32>().ok()?,
        None => 0,
    };
    let hour = match meridiem {
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(Meridiem::Am) => hour % 12,
        Some(Meridiem::Pm) => hour % 12 + 12,
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn apply_period_hint(time: NaiveTime, period: Option<DayPeriod>) -> NaiveTime {
    match period {
        Some(period) if period.is_after_noon() && (1..12).contains(&time.hour()) => {
            time.overflowing_add_signed(Duration::hours(12)).0
        }
        _ => time,
    }
}

fn followed_by_count_unit(rest: &str) -> bool {
    rest.split_whitespace().next().is_some_and(|word| {
        let word = word.trim_matches(|ch: char| !ch.is_ascii_alphanumeric());
        COUNT_UNITS.contains(&word)
    })
}

fn span(captures: &Captures<'_>) -> Range<usize> {
    captures.get(0).map(|m| m.range()).unwrap_or(0..0)
}

fn hour(value: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(value, 0, 0).unwrap_or(NaiveTime::MIN)
}
