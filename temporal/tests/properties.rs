//! Quantified laws from the arithmetic and calendar modules that are
//! naturally property-based rather than example-based: normalisation
//! idempotence, string round-tripping, and the day-count/calendar-date
//! bijection.

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use solid_temporal::calendar::{days_since_epoch, is_leap_year, local_date_from_days, LocalDate};
use solid_temporal::BigDecimal;
use std::str::FromStr;

fn decimal_from_parts(mantissa: i64, scale: i8) -> BigDecimal {
    BigDecimal::from_str(&format!("{}e{}", mantissa, -(scale as i32))).expect("constructible decimal")
}

#[quickcheck]
fn test_normalized_is_idempotent(mantissa: i64, scale: i8) -> bool {
    let value = decimal_from_parts(mantissa, scale);
    let once = value.normalized();
    let twice = once.normalized();
    once == twice
}

#[quickcheck]
fn test_normalized_preserves_value(mantissa: i64, scale: i8) -> bool {
    let value = decimal_from_parts(mantissa, scale);
    value == value.normalized()
}

#[quickcheck]
fn test_display_parse_round_trip(mantissa: i64, scale: i8) -> bool {
    let value = decimal_from_parts(mantissa, scale);
    let text = value.to_string();
    let reparsed = BigDecimal::from_str(&text).expect("display output reparses");
    reparsed == value
}

#[quickcheck]
fn test_add_is_commutative(a_mantissa: i64, a_scale: i8, b_mantissa: i64, b_scale: i8) -> bool {
    let a = decimal_from_parts(a_mantissa, a_scale);
    let b = decimal_from_parts(b_mantissa, b_scale);
    a.add(&b) == b.add(&a)
}

// Years are clamped well inside i64 range so `days_since_epoch` never
// overflows while still exercising both leap and common years, and both
// sides of the epoch.
fn clamp_year(year: i32) -> i64 {
    (year % 8000) as i64
}

fn clamp_month(month: u8) -> u32 {
    (month % 12) as u32 + 1
}

fn clamp_day(year: i64, month: u32, day: u8) -> u32 {
    let max = solid_temporal::calendar::days_in_month(year, month);
    (day as u32 % max) + 1
}

#[quickcheck]
fn test_days_since_epoch_round_trips_through_local_date(year: i32, month: u8, day: u8) -> bool {
    let year = clamp_year(year);
    let month = clamp_month(month);
    let day = clamp_day(year, month, day);

    let days = days_since_epoch(year, month, day);
    let (ry, rm, rd) = local_date_from_days(days);
    (ry, rm, rd) == (year, month, day)
}

#[quickcheck]
fn test_local_date_new_matches_day_count_round_trip(year: i32, month: u8, day: u8) -> bool {
    let year = clamp_year(year);
    let month = clamp_month(month);
    let day = clamp_day(year, month, day);

    let date = LocalDate::new(year, month, day).expect("clamped date is valid");
    let via_days = LocalDate::from_days_since_epoch(date.days_since_epoch());
    date == via_days
}

#[quickcheck]
fn test_leap_year_implies_february_has_29_days(year: i32) -> bool {
    let year = clamp_year(year);
    let days = solid_temporal::calendar::days_in_month(year, 2);
    is_leap_year(year) == (days == 29)
}
