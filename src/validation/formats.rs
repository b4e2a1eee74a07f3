//! String formats recognised by the validator.

use crate::schema::StringFormat;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+]?[0-9\s\-().]{7,20}$").unwrap());
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d(:[0-5]\d)?$").unwrap());
static DATETIME_LOCAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2})?$").unwrap());
static MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap());
static WEEK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-W(0[1-9]|[1-4]\d|5[0-3])$").unwrap());
static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

/// Pattern source for a format, `None` for plain strings. Also used by the
/// TypeScript generator so client and server agree.
pub fn pattern(format: StringFormat) -> Option<&'static Regex> {
    let re: &'static Lazy<Regex> = match format {
        StringFormat::Plain => return None,
        StringFormat::Email => &EMAIL,
        StringFormat::Url => &URL,
        StringFormat::Phone => &PHONE,
        StringFormat::Date => &DATE,
        StringFormat::Time => &TIME,
        StringFormat::DateTimeLocal => &DATETIME_LOCAL,
        StringFormat::Month => &MONTH,
        StringFormat::Week => &WEEK,
        StringFormat::HexColor => &HEX_COLOR,
    };
    Some(Lazy::force(re))
}

pub fn is_valid(format: StringFormat, value: &str) -> bool {
    let Some(re) = pattern(format) else {
        return true;
    };
    if !re.is_match(value) {
        return false;
    }
    // Shape alone admits 2023-02-30.
    match format {
        StringFormat::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        StringFormat::DateTimeLocal => {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
                || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
        }
        _ => true,
    }
}

pub fn message(format: StringFormat) -> &'static str {
    match format {
        StringFormat::Plain => "Expected string",
        StringFormat::Email => "Invalid email address",
        StringFormat::Url => "Invalid url",
        StringFormat::Phone => "Invalid phone number",
        StringFormat::Date => "Invalid date (expected YYYY-MM-DD)",
        StringFormat::Time => "Invalid time (expected HH:MM)",
        StringFormat::DateTimeLocal => "Invalid date and time (expected YYYY-MM-DDTHH:MM)",
        StringFormat::Month => "Invalid month (expected YYYY-MM)",
        StringFormat::Week => "Invalid week (expected YYYY-Www)",
        StringFormat::HexColor => "Invalid color (expected #RRGGBB)",
    }
}
