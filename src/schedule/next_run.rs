//! Pure `nextRun` computation for each [`ScheduleFrequency`]. No I/O, no
//! clock reads beyond the `from` parameter — entirely testable by construction.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Timelike, Utc};

use crate::model::{ScheduleFrequency, TimeConfig};

pub fn next_run(frequency: ScheduleFrequency, time_config: &TimeConfig, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match frequency {
        ScheduleFrequency::Hourly => Some(next_hourly(time_config.minute.unwrap_or(0), from)),
        ScheduleFrequency::Daily => Some(next_daily(time_config.hour.unwrap_or(0), time_config.minute.unwrap_or(0), from)),
        ScheduleFrequency::Weekly => Some(next_weekly(
            time_config.day_of_week.unwrap_or(0),
            time_config.hour.unwrap_or(0),
            time_config.minute.unwrap_or(0),
            from,
        )),
        ScheduleFrequency::Monthly => Some(next_monthly(
            time_config.day_of_month.unwrap_or(1),
            time_config.hour.unwrap_or(0),
            time_config.minute.unwrap_or(0),
            from,
        )),
        ScheduleFrequency::Cron => time_config.cron_expression.as_deref().and_then(|expr| next_cron(expr, from)),
    }
}

fn next_hourly(minute: u32, from: DateTime<Utc>) -> DateTime<Utc> {
    let minute = minute.min(59);
    let candidate = from.with_minute(minute).and_then(|d| d.with_second(0)).and_then(|d| d.with_nanosecond(0)).unwrap_or(from);
    if candidate > from {
        candidate
    } else {
        candidate + ChronoDuration::hours(1)
    }
}

fn next_daily(hour: u32, minute: u32, from: DateTime<Utc>) -> DateTime<Utc> {
    let candidate = at_time(from, hour, minute);
    if candidate > from {
        candidate
    } else {
        at_time(from + ChronoDuration::days(1), hour, minute)
    }
}

fn next_weekly(day_of_week: u32, hour: u32, minute: u32, from: DateTime<Utc>) -> DateTime<Utc> {
    let target_weekday = day_of_week.min(6);
    let current_weekday = from.weekday().num_days_from_sunday();
    let mut days_ahead = (target_weekday as i64 - current_weekday as i64).rem_euclid(7);
    let mut candidate = at_time(from + ChronoDuration::days(days_ahead), hour, minute);
    if candidate <= from {
        days_ahead += 7;
        candidate = at_time(from + ChronoDuration::days(days_ahead), hour, minute);
    }
    candidate
}

fn next_monthly(day_of_month: u32, hour: u32, minute: u32, from: DateTime<Utc>) -> DateTime<Utc> {
    let candidate = at_day_of_month(from.year(), from.month(), day_of_month, hour, minute);
    if candidate > from {
        return candidate;
    }
    let (next_year, next_month) = if from.month() == 12 { (from.year() + 1, 1) } else { (from.year(), from.month() + 1) };
    at_day_of_month(next_year, next_month, day_of_month, hour, minute)
}

/// Clamps `day_of_month` to the last valid day of the target month, per the
/// documented clamp-to-month-end rule.
fn at_day_of_month(year: i32, month: u32, day_of_month: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    let last_day = days_in_month(year, month);
    let day = day_of_month.clamp(1, last_day);
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid for month");
    let naive = date.and_hms_opt(hour.min(23), minute.min(59), 0).expect("valid time components");
    Utc.from_utc_datetime(&naive)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid first-of-month")
        .pred_opt()
        .expect("valid predecessor")
        .day()
}

fn at_time(on: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    on.with_hour(hour.min(23))
        .and_then(|d| d.with_minute(minute.min(59)))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(on)
}

/// Standard 5-field cron (`minute hour day-of-month month day-of-week`)
/// evaluation. No cron crate is present in this crate's dependency stack, so
/// this implements the field-matching algorithm directly against `chrono`,
/// searching forward minute-by-minute up to four years ahead.
fn next_cron(expr: &str, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    let minute_set = parse_field(fields[0], 0, 59)?;
    let hour_set = parse_field(fields[1], 0, 23)?;
    let dom_set = parse_field(fields[2], 1, 31)?;
    let month_set = parse_field(fields[3], 1, 12)?;
    let dow_set = parse_field(fields[4], 0, 6)?;

    let mut candidate = (from + ChronoDuration::minutes(1)).with_second(0)?.with_nanosecond(0)?;
    let limit = from + ChronoDuration::days(366 * 4);

    while candidate <= limit {
        let dom_wild = fields[2] == "*";
        let dow_wild = fields[4] == "*";
        let dom_matches = dom_set.contains(&candidate.day());
        let dow_matches = dow_set.contains(&candidate.weekday().num_days_from_sunday());
        let day_matches = if dom_wild || dow_wild { dom_matches && dow_matches } else { dom_matches || dow_matches };

        if month_set.contains(&candidate.month())
            && day_matches
            && hour_set.contains(&candidate.hour())
            && minute_set.contains(&candidate.minute())
        {
            return Some(candidate);
        }
        candidate += ChronoDuration::minutes(1);
    }
    None
}

fn parse_field(field: &str, min: u32, max: u32) -> Option<std::collections::HashSet<u32>> {
    if field == "*" {
        return Some((min..=max).collect());
    }
    let mut set = std::collections::HashSet::new();
    for part in field.split(',') {
        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start.parse().ok()?;
            let end: u32 = end.parse().ok()?;
            for v in start..=end {
                set.insert(v);
            }
        } else {
            set.insert(part.parse().ok()?);
        }
    }
    Some(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn hourly_rolls_to_next_hour_when_minute_passed() {
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 10, 45, 0).unwrap();
        let next = next_run(ScheduleFrequency::Hourly, &TimeConfig { minute: Some(30), ..Default::default() }, from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 11, 30, 0).unwrap());
    }

    #[test]
    fn monthly_clamps_to_last_day() {
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let config = TimeConfig { day_of_month: Some(31), hour: Some(9), minute: Some(0), ..Default::default() };
        let next = next_run(ScheduleFrequency::Monthly, &config, from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap());

        let from_feb = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let next_feb = next_run(ScheduleFrequency::Monthly, &config, from_feb).unwrap();
        assert_eq!(next_feb, Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap());
    }

    #[test]
    fn cron_matches_documented_five_field_form() {
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let next = next_run(ScheduleFrequency::Cron, &TimeConfig { cron_expression: Some("0 9 * * *".to_string()), ..Default::default() }, from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
    }
}
