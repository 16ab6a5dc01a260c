//! Civil calendar helpers shared by the expander and the resolvers.

use jiff::civil::{Date, Time, Weekday};
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Span, Zoned};

/// Weekday index with Monday = 0.
pub(crate) fn weekday_index(wd: Weekday) -> usize {
    wd.to_monday_zero_offset() as usize
}

/// Weekday index of a zoned datetime in its own zone.
pub(crate) fn day_of(zdt: &Zoned) -> usize {
    weekday_index(zdt.weekday())
}

/// Single-bit mask for a Monday-zero weekday index.
pub(crate) fn day_bit(day: usize) -> u8 {
    1 << (day % 7)
}

/// Set the time on a date in a timezone. `None` only at the edges of the
/// supported range.
pub(crate) fn at_time_on_date(date: Date, time: Time, tz: &TimeZone) -> Option<Zoned> {
    date.to_datetime(time).to_zoned(tz.clone()).ok()
}

/// First instant of a civil day.
pub(crate) fn start_of_day(date: Date, tz: &TimeZone) -> Option<Zoned> {
    date.to_zoned(tz.clone()).ok()
}

/// Last whole second of the civil day containing `zdt`.
pub(crate) fn end_of_day(zdt: &Zoned) -> Option<Zoned> {
    let tomorrow = zdt.date().tomorrow().ok()?;
    start_of_day(tomorrow, zdt.time_zone())?
        .checked_sub(SignedDuration::from_secs(1))
        .ok()
}

/// Shift a date by whole days.
pub(crate) fn add_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(Span::new().days(days)).ok()
}

/// Count days between two dates (signed).
pub(crate) fn days_between(a: Date, b: Date) -> i64 {
    a.until(b).map(|s| s.get_days() as i64).unwrap_or(0)
}

/// Monday of the ISO week containing `date`.
pub(crate) fn monday_of(date: Date) -> Option<Date> {
    add_days(date, -(weekday_index(date.weekday()) as i64))
}

/// Count months between two dates (year*12+month arithmetic).
pub(crate) fn months_between_ym(a: Date, b: Date) -> i64 {
    (b.year() as i64 * 12 + b.month() as i64) - (a.year() as i64 * 12 + a.month() as i64)
}

/// First day of the month `months` after the month of `date`.
pub(crate) fn month_start_after(date: Date, months: i64) -> Option<Date> {
    let index = date.year() as i64 * 12 + (date.month() as i64 - 1) + months;
    let year = i16::try_from(index.div_euclid(12)).ok()?;
    let month = (index.rem_euclid(12) + 1) as i8;
    Date::new(year, month, 1).ok()
}

/// Resolve a day-of-month number within the month starting at `first`.
/// Positive days count from the 1st, negative days from the last day
/// (-1 = last day). Returns `None` if the day does not exist in that month.
pub(crate) fn day_in_month(first: Date, day: i8) -> Option<Date> {
    let len = first.days_in_month();
    let resolved = match day {
        d if d > 0 && d <= len => d,
        d if d < 0 && -d <= len => len + d + 1,
        _ => return None,
    };
    Date::new(first.year(), first.month(), resolved).ok()
}

/// Dates in the month starting at `first` that match a weekday position.
/// Ordinal 0 yields every such weekday in the month.
pub(crate) fn weekday_positions_in_month(first: Date, weekday: Weekday, ordinal: i8) -> Vec<Date> {
    if ordinal == 0 {
        return (1..=5)
            .filter_map(|n| first.nth_weekday_of_month(n, weekday).ok())
            .collect();
    }
    first
        .nth_weekday_of_month(ordinal, weekday)
        .ok()
        .into_iter()
        .collect()
}

/// Whole seconds from `a` to `b`.
pub(crate) fn seconds_between(a: &Zoned, b: &Zoned) -> i64 {
    b.timestamp().as_second() - a.timestamp().as_second()
}
