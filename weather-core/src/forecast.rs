use chrono::{NaiveDate, TimeZone};

use crate::model::{DailySummary, ForecastEntry};

pub const HOURLY_LIMIT: usize = 8;
pub const DAILY_LIMIT: usize = 5;

/// Group 3-hourly entries by calendar day in `tz`, keeping the warmest
/// entry of each day. Days appear in order of first occurrence.
pub fn group_daily<Tz: TimeZone>(entries: &[ForecastEntry], tz: &Tz, limit: usize) -> Vec<DailySummary> {
    let mut days: Vec<DailySummary> = Vec::new();

    for entry in entries {
        let date: NaiveDate = entry.time.with_timezone(tz).date_naive();

        match days.iter_mut().find(|d| d.date == date) {
            Some(day) if entry.temperature_c > day.entry.temperature_c => day.entry = entry.clone(),
            Some(_) => {}
            None => days.push(DailySummary { date, entry: entry.clone() }),
        }
    }

    days.truncate(limit);
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    fn entry(hours_from_start: i64, temp: f64) -> ForecastEntry {
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap();
        ForecastEntry {
            time: start + Duration::hours(hours_from_start),
            temperature_c: temp,
            temp_min_c: temp - 1.0,
            temp_max_c: temp + 1.0,
            condition: "Clouds".into(),
            description: "scattered clouds".into(),
            precipitation_probability: 0.0,
        }
    }

    #[test]
    fn six_days_collapse_to_five_warmest_entries() {
        // 6 days x 8 entries, warmest at 12:00 with temp = 10 + day
        let entries: Vec<_> = (0..48)
            .map(|i| {
                let day = i / 8;
                let hour = (i % 8) * 3;
                let temp = if hour == 12 { 10.0 + day as f64 } else { day as f64 };
                entry(i * 3, temp)
            })
            .collect();

        let days = group_daily(&entries, &Utc, DAILY_LIMIT);

        assert_eq!(days.len(), 5);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.date, NaiveDate::from_ymd_opt(2026, 10, 14 + i as u32).unwrap());
            assert_eq!(day.entry.temperature_c, 10.0 + i as f64);
            assert_eq!(day.entry.time.format("%H").to_string(), "12");
        }
    }

    #[test]
    fn ties_keep_the_first_entry() {
        let entries = vec![entry(0, 5.0), entry(3, 5.0)];
        let days = group_daily(&entries, &Utc, DAILY_LIMIT);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].entry, entries[0]);
    }

    #[test]
    fn grouping_follows_the_given_time_zone() {
        // 22:00 UTC on the 14th is the 15th in UTC+3
        let entries = vec![entry(18, 1.0), entry(22, 2.0)];
        assert_eq!(group_daily(&entries, &Utc, DAILY_LIMIT).len(), 1);

        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(group_daily(&entries, &plus_three, DAILY_LIMIT).len(), 2);
    }

    #[test]
    fn empty_input_yields_no_days() {
        assert!(group_daily(&[], &Utc, DAILY_LIMIT).is_empty());
    }
}
