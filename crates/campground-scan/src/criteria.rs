//! Criteria matching: turns raw per-night availability into bookable windows.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Days, NaiveDate};

use crate::scan_types::{MatchCriteria, QualifyingStay, SiteAvailability};

/// Open nights of a single site
struct SiteNights<'a> {
    sub_campground: Option<&'a str>,
    open: BTreeSet<NaiveDate>,
}

/// Reduce raw availability to the stays matching `criteria`.
///
/// Every window has exactly `min_nights` nights on one site, so a run of `K` open
/// nights yields `K - min_nights + 1` overlapping windows. Results are ordered by
/// site id, then start date.
pub fn filter_to_criteria(
    records: &[SiteAvailability],
    criteria: &MatchCriteria,
) -> Vec<QualifyingStay> {
    let nights = criteria.min_nights.max(1);
    let mut sites: BTreeMap<&str, SiteNights<'_>> = BTreeMap::new();

    for record in records {
        if criteria.ignored_site_ids.contains(&record.site_id) {
            continue;
        }
        let site = sites.entry(record.site_id.as_str()).or_insert_with(|| SiteNights {
            sub_campground: record.sub_campground.as_deref(),
            open: BTreeSet::new(),
        });
        if record.available {
            site.open.insert(record.date);
        }
    }

    let mut stays = Vec::new();

    for (site_id, site) in sites {
        if !sub_campground_allowed(criteria, site.sub_campground) {
            continue;
        }

        for run in consecutive_runs(&site.open) {
            if run.len() < nights as usize {
                continue;
            }
            for start in &run[..=run.len() - nights as usize] {
                if dates_allowed(criteria, *start, nights) {
                    stays.push(QualifyingStay {
                        site_id: site_id.to_string(),
                        start_date: *start,
                        nights,
                        sub_campground: site.sub_campground.map(str::to_string),
                    });
                }
            }
        }
    }

    stays
}

/// Split sorted dates into maximal runs of consecutive calendar days.
fn consecutive_runs(dates: &BTreeSet<NaiveDate>) -> Vec<Vec<NaiveDate>> {
    let mut runs: Vec<Vec<NaiveDate>> = Vec::new();

    for &date in dates {
        match runs.last_mut() {
            Some(run) if run.last().and_then(|d| d.succ_opt()) == Some(date) => run.push(date),
            _ => runs.push(vec![date]),
        }
    }

    runs
}

fn sub_campground_allowed(criteria: &MatchCriteria, sub_campground: Option<&str>) -> bool {
    if criteria.target_sub_campgrounds.is_empty() {
        return true;
    }
    sub_campground.is_some_and(|s| criteria.target_sub_campgrounds.contains(s))
}

// With both target dates and weekdays set, either one is enough.
fn dates_allowed(criteria: &MatchCriteria, start: NaiveDate, nights: u32) -> bool {
    let covers_target = || {
        (0..u64::from(nights)).any(|offset| {
            start
                .checked_add_days(Days::new(offset))
                .is_some_and(|night| criteria.target_dates.contains(&night))
        })
    };
    let weekday_allowed = || criteria.allowed_weekdays.contains(&start.weekday());

    match (
        criteria.target_dates.is_empty(),
        criteria.allowed_weekdays.is_empty(),
    ) {
        (true, true) => true,
        (false, true) => covers_target(),
        (true, false) => weekday_allowed(),
        (false, false) => covers_target() || weekday_allowed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn night(site: &str, day: NaiveDate, available: bool) -> SiteAvailability {
        SiteAvailability {
            site_id: site.to_string(),
            sub_campground: Some("Loop A".to_string()),
            date: day,
            available,
        }
    }

    /// `count` open nights on `site` starting at `start`
    fn open_run(site: &str, start: NaiveDate, count: u64) -> Vec<SiteAvailability> {
        (0..count)
            .map(|i| night(site, start + Days::new(i), true))
            .collect()
    }

    fn criteria(nights: u32) -> MatchCriteria {
        MatchCriteria {
            min_nights: nights,
            require_same_site: true,
            ..MatchCriteria::default()
        }
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(filter_to_criteria(&[], &criteria(1)).is_empty());
    }

    #[test]
    fn test_no_open_nights_yields_nothing() {
        let start = date(2025, 6, 2);
        let records: Vec<_> = (0..5)
            .map(|i| night("7", start + Days::new(i), false))
            .collect();

        assert!(filter_to_criteria(&records, &criteria(1)).is_empty());
    }

    #[test]
    fn test_run_of_k_nights_yields_k_minus_n_plus_one_windows() {
        let start = date(2025, 6, 2);
        let records = open_run("7", start, 5);

        for n in 1..=5u32 {
            let stays = filter_to_criteria(&records, &criteria(n));
            assert_eq!(stays.len(), (5 - n + 1) as usize, "nights = {}", n);
            assert!(stays.iter().all(|s| s.nights == n && s.site_id == "7"));
        }
        assert!(filter_to_criteria(&records, &criteria(6)).is_empty());
    }

    #[test]
    fn test_runs_break_on_gaps_and_closed_nights() {
        let start = date(2025, 6, 2);
        let mut records = open_run("7", start, 2);
        records.push(night("7", start + Days::new(2), false));
        records.extend(open_run("7", start + Days::new(3), 2));
        // a gap with no record at all
        records.extend(open_run("7", start + Days::new(6), 2));

        let stays = filter_to_criteria(&records, &criteria(2));
        let starts: Vec<_> = stays.iter().map(|s| s.start_date).collect();
        assert_eq!(
            starts,
            vec![start, start + Days::new(3), start + Days::new(6)]
        );
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_site_then_date() {
        let start = date(2025, 6, 2);
        let mut records = open_run("9", start, 2);
        records.extend(open_run("10", start, 2));
        records.reverse();

        let stays = filter_to_criteria(&records, &criteria(1));
        let keys: Vec<_> = stays
            .iter()
            .map(|s| (s.site_id.as_str(), s.start_date))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("10", start),
                ("10", start + Days::new(1)),
                ("9", start),
                ("9", start + Days::new(1)),
            ]
        );
    }

    #[test]
    fn test_ignored_sites_never_appear() {
        let start = date(2025, 6, 2);
        let mut records = open_run("7", start, 3);
        records.extend(open_run("8", start, 3));

        let mut c = criteria(1);
        c.ignored_site_ids.insert("7".to_string());

        let stays = filter_to_criteria(&records, &c);
        assert_eq!(stays.len(), 3);
        assert!(stays.iter().all(|s| s.site_id == "8"));
    }

    #[test]
    fn test_sub_campground_filter() {
        let start = date(2025, 6, 2);
        let mut records = open_run("7", start, 2);
        records.extend(open_run("8", start, 2).into_iter().map(|mut r| {
            r.sub_campground = Some("Loop B".to_string());
            r
        }));
        records.extend(open_run("9", start, 2).into_iter().map(|mut r| {
            r.sub_campground = None;
            r
        }));

        let mut c = criteria(2);
        c.target_sub_campgrounds.insert("Loop B".to_string());

        let stays = filter_to_criteria(&records, &c);
        assert_eq!(stays.len(), 1);
        assert_eq!(stays[0].site_id, "8");
        assert_eq!(stays[0].sub_campground.as_deref(), Some("Loop B"));
    }

    #[test]
    fn test_target_dates_must_be_covered() {
        let start = date(2025, 7, 1);
        let records = open_run("7", start, 6);
        let target = date(2025, 7, 4);

        let mut c = criteria(2);
        c.target_dates.insert(target);

        let stays = filter_to_criteria(&records, &c);
        let starts: Vec<_> = stays.iter().map(|s| s.start_date).collect();
        assert_eq!(starts, vec![date(2025, 7, 3), date(2025, 7, 4)]);
        for stay in &stays {
            let end = stay.start_date + Days::new(u64::from(stay.nights));
            assert!(stay.start_date <= target && target < end);
        }
    }

    #[test]
    fn test_weekday_filter_checks_start_date() {
        // 2025-06-02 is a Monday
        let start = date(2025, 6, 2);
        let records = open_run("7", start, 7);

        let mut c = criteria(2);
        c.allowed_weekdays.insert(Weekday::Fri);

        let stays = filter_to_criteria(&records, &c);
        assert_eq!(stays.len(), 1);
        assert_eq!(stays[0].start_date.weekday(), Weekday::Fri);
    }

    #[test]
    fn test_weekday_or_target_date_when_both_set() {
        let start = date(2025, 6, 2);
        let records = open_run("7", start, 7);

        let mut c = criteria(1);
        c.allowed_weekdays.insert(Weekday::Fri);
        c.target_dates.insert(date(2025, 6, 3));

        let starts: Vec<_> = filter_to_criteria(&records, &c)
            .into_iter()
            .map(|s| s.start_date)
            .collect();
        assert_eq!(starts, vec![date(2025, 6, 3), date(2025, 6, 6)]);
    }

    #[test]
    fn test_same_site_flag_never_stitches_sites() {
        let start = date(2025, 6, 2);
        // site 7 open the first night, site 8 the second
        let records = vec![
            night("7", start, true),
            night("8", start + Days::new(1), true),
        ];

        let mut c = criteria(2);
        c.require_same_site = false;
        assert!(filter_to_criteria(&records, &c).is_empty());
    }
}
