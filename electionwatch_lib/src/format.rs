//! Display formatting for results: percentages, vote counts, AP-style
//! datelines, and the election-day test-data check.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};

/// Newsroom clock: fixed Central Standard Time, matching the dashboard's
/// date stamps. November elections always fall outside daylight saving.
const CENTRAL: FixedOffset = match FixedOffset::west_opt(6 * 60 * 60) {
    Some(offset) => offset,
    None => unreachable!(),
};

/// Hour (Central) on election day when the state stops serving test data.
const TEST_DATA_CUTOVER_HOUR: u32 = 15;

/// Formats a vote share to one decimal place, e.g. `52.3%`.
pub fn format_percent(share: f64) -> String {
    format!("{:.1}%", share)
}

/// Formats a vote count with thousands separators, e.g. `1,056,514`.
pub fn format_votes(votes: i64) -> String {
    let raw = votes.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, digit) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if votes < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Precincts-reporting line, e.g. `19 of 24 precincts (79%)`.
pub fn format_reporting(reporting: i64, total: i64) -> String {
    if total <= 0 {
        return format!("{} of {} precincts", reporting.max(0), total.max(0));
    }
    let share = reporting as f64 / total as f64 * 100.0;
    format!("{} of {} precincts ({:.0}%)", reporting, total, share)
}

fn ap_month(month: u32) -> &'static str {
    // AP style spells out March through July.
    match month {
        1 => "Jan.",
        2 => "Feb.",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "Aug.",
        9 => "Sept.",
        10 => "Oct.",
        11 => "Nov.",
        12 => "Dec.",
        _ => "",
    }
}

/// AP-style date in Central time, e.g. `Nov. 9, 2022`.
pub fn ap_date(when: DateTime<Utc>) -> String {
    let local = when.with_timezone(&CENTRAL);
    format!(
        "{} {}, {}",
        ap_month(local.month()),
        local.day(),
        local.year()
    )
}

/// AP-style clock time in Central time, e.g. `9:32 a.m.`.
pub fn ap_time(when: DateTime<Utc>) -> String {
    let local = when.with_timezone(&CENTRAL);
    let (is_pm, hour) = local.hour12();
    let meridiem = if is_pm { "p.m." } else { "a.m." };
    format!("{}:{:02} {}", hour, local.minute(), meridiem)
}

/// AP-style dateline, e.g. `Nov. 9, 2022, 9:32 a.m.`.
pub fn ap_date_time(when: DateTime<Utc>) -> String {
    format!("{}, {}", ap_date(when), ap_time(when))
}

/// Scraper `updated` stamp (unix seconds) as a UTC instant. Out-of-range
/// stamps come back as `None`.
pub fn updated_at(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

/// Whether results for the given election date are still the state's test
/// feed. The Secretary of State publishes dry-run data until mid-afternoon
/// Central on election day; anything fetched before then is not live.
///
/// `election_date` is the `YYYY-MM-DD` string from the election record.
/// Unparseable dates are treated as live rather than hiding real results.
pub fn is_test_election(election_date: &str, now: DateTime<Utc>) -> bool {
    let Ok(date) = NaiveDate::parse_from_str(election_date.trim(), "%Y-%m-%d") else {
        return false;
    };
    date.and_hms_opt(TEST_DATA_CUTOVER_HOUR, 0, 0)
        .and_then(|naive| naive.and_local_timezone(CENTRAL).single())
        .map_or(false, |cutover| now < cutover)
}
