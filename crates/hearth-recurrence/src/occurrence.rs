//! Pure occurrence calculator: which dates of a given week does a template
//! fall on. No I/O; deterministic in (rule, anchor, monday).

use chrono::{Datelike, Days, NaiveDate};
use hearth_core::types::RecurrenceRule;
use hearth_core::week::is_last_day_of_month;

/// Dates in `[monday, monday + 6]` at which an instance of the template
/// must exist, in ascending order. Dates before `anchor` (the template's
/// own due date) are never produced.
pub fn week_occurrences(
    rule: RecurrenceRule,
    anchor: NaiveDate,
    monday: NaiveDate,
) -> Vec<NaiveDate> {
    match rule {
        RecurrenceRule::Daily => week_days(monday).filter(|d| *d >= anchor).collect(),

        RecurrenceRule::Weekly => {
            // Same weekday as the anchor (0 = Monday .. 6 = Sunday).
            let offset = anchor.weekday().num_days_from_monday() as u64;
            let target = monday + Days::new(offset);
            if target >= anchor {
                vec![target]
            } else {
                Vec::new()
            }
        }

        RecurrenceRule::Monthly => {
            // Same day-of-month as the anchor, clamped to the last day of
            // shorter months (anchor day 31 -> Feb 28/29, never Mar 3).
            let target_day = anchor.day();
            week_days(monday)
                .filter(|d| {
                    let clamped_hit =
                        d.day() == target_day || (d.day() < target_day && is_last_day_of_month(*d));
                    clamped_hit && *d >= anchor
                })
                .collect()
        }
    }
}

fn week_days(monday: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..7).map(move |i| monday + Days::new(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    fn occ(rule: RecurrenceRule, anchor: &str, monday: &str) -> Vec<NaiveDate> {
        week_occurrences(rule, d(anchor), d(monday))
    }

    #[test]
    fn daily_skips_days_before_anchor() {
        // Anchor Wed 2026-03-04, week of Mon 2026-03-02: Mon/Tue excluded.
        let dates = occ(RecurrenceRule::Daily, "2026-03-04", "2026-03-02");
        let expected: Vec<NaiveDate> = [
            "2026-03-04",
            "2026-03-05",
            "2026-03-06",
            "2026-03-07",
            "2026-03-08",
        ]
        .iter()
        .map(|s| d(s))
        .collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn daily_full_week_once_past_anchor() {
        let dates = occ(RecurrenceRule::Daily, "2026-03-04", "2026-03-09");
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], d("2026-03-09"));
        assert_eq!(dates[6], d("2026-03-15"));
    }

    #[test]
    fn weekly_matches_anchor_weekday() {
        // Anchor is a Wednesday; the occurrence in any later week is its Wednesday.
        let dates = occ(RecurrenceRule::Weekly, "2026-03-04", "2026-03-09");
        assert_eq!(dates, vec![d("2026-03-11")]);
    }

    #[test]
    fn weekly_none_before_anchor_week_exactly_one_from_anchor_week() {
        // Week strictly before the anchor: nothing.
        assert!(occ(RecurrenceRule::Weekly, "2026-03-04", "2026-02-23").is_empty());
        // The anchor's own week: exactly the anchor date.
        assert_eq!(
            occ(RecurrenceRule::Weekly, "2026-03-04", "2026-03-02"),
            vec![d("2026-03-04")]
        );
    }

    #[test]
    fn monthly_plain_day_match() {
        // Anchor on the 15th; week containing Apr 15.
        let dates = occ(RecurrenceRule::Monthly, "2026-01-15", "2026-04-13");
        assert_eq!(dates, vec![d("2026-04-15")]);
    }

    #[test]
    fn monthly_clamps_to_short_february() {
        // Anchor on the 31st; Feb 2026 has 28 days; week of 2026-02-23.
        let dates = occ(RecurrenceRule::Monthly, "2026-01-31", "2026-02-23");
        assert_eq!(dates, vec![d("2026-02-28")]);
    }

    #[test]
    fn monthly_clamps_to_leap_february() {
        // 2024 is a leap year: the clamp lands on Feb 29, not Feb 28.
        let dates = occ(RecurrenceRule::Monthly, "2024-01-31", "2024-02-26");
        assert_eq!(dates, vec![d("2024-02-29")]);
    }

    #[test]
    fn monthly_no_false_hit_midmonth() {
        // Week with no matching day-of-month at all.
        assert!(occ(RecurrenceRule::Monthly, "2026-01-31", "2026-03-09").is_empty());
    }

    #[test]
    fn monthly_week_spanning_month_boundary_can_hit_both() {
        // Anchor day 1; week Mon 2026-06-29 .. Sun 2026-07-05 contains Jul 1.
        let dates = occ(RecurrenceRule::Monthly, "2026-01-01", "2026-06-29");
        assert_eq!(dates, vec![d("2026-07-01")]);
    }

    #[test]
    fn future_anchor_yields_nothing_for_earlier_weeks() {
        for rule in [
            RecurrenceRule::Daily,
            RecurrenceRule::Weekly,
            RecurrenceRule::Monthly,
        ] {
            assert!(occ(rule, "2027-01-06", "2026-03-02").is_empty());
        }
    }
}
