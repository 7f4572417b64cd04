use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// When a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every day at the given hour and minute (UTC).
    Daily { hour: u8, minute: u8 },
}

/// Compute the next UTC execution time for `schedule` strictly after `from`.
pub fn compute_next_run(schedule: &Schedule, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule {
        Schedule::Daily { hour, minute } => {
            // Build today's candidate at HH:MM:00 UTC.
            let candidate = Utc
                .with_ymd_and_hms(
                    from.year(),
                    from.month(),
                    from.day(),
                    *hour as u32,
                    *minute as u32,
                    0,
                )
                .single()?;
            if candidate > from {
                Some(candidate)
            } else {
                // Today's window has passed — advance to tomorrow.
                Some(candidate + Duration::days(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, h, m, s).single().expect("valid")
    }

    #[test]
    fn daily_before_fire_time_is_today() {
        let next = compute_next_run(&Schedule::Daily { hour: 8, minute: 30 }, at(6, 0, 0))
            .expect("some");
        assert_eq!(next, at(8, 30, 0));
    }

    #[test]
    fn daily_after_fire_time_rolls_to_tomorrow() {
        let next = compute_next_run(&Schedule::Daily { hour: 8, minute: 30 }, at(9, 0, 0))
            .expect("some");
        assert_eq!(next, at(8, 30, 0) + Duration::days(1));
    }

    #[test]
    fn daily_exactly_at_fire_time_rolls_over() {
        // Strictly after: firing at 08:30:00 schedules tomorrow's 08:30.
        let next = compute_next_run(&Schedule::Daily { hour: 8, minute: 30 }, at(8, 30, 0))
            .expect("some");
        assert_eq!(next, at(8, 30, 0) + Duration::days(1));
    }
}
