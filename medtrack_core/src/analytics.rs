//! Adherence analytics over a profile's dose history.
//!
//! All computations are pure functions over the dose list; the store
//! exposes a convenience wrapper restricted to the current profile.
//! Windows (streak lookback, trend length) come from [`AnalyticsConfig`].

use crate::config::AnalyticsConfig;
use crate::{Analytics, MedicationDose, MedicationStore, TrendPoint};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// How many side effects the "common side effects" list reports
const TOP_SIDE_EFFECTS: usize = 5;

/// Compute adherence analytics for a set of dose records.
///
/// `today` anchors the streak walk and the trend window; doses are expected
/// to already be restricted to one profile.
pub fn compute_analytics(
    doses: &[&MedicationDose],
    today: NaiveDate,
    config: &AnalyticsConfig,
) -> Analytics {
    let total = doses.len();
    let taken: Vec<&&MedicationDose> = doses.iter().filter(|d| d.taken).collect();

    let compliance_rate = if total > 0 {
        ((taken.len() as f64 / total as f64) * 100.0).round() as u8
    } else {
        0
    };

    Analytics {
        compliance_rate,
        streak_days: streak_days(doses, today, config.streak_lookback_days),
        total_doses_taken: taken.len(),
        total_doses_missed: total - taken.len(),
        average_effectiveness: average_effectiveness(&taken),
        common_side_effects: common_side_effects(&taken),
        trend: trend_series(doses, today, config.trend_window_days),
    }
}

/// Consecutive fully-compliant calendar days, scanned backward from today.
///
/// Days with nothing scheduled are skipped without breaking the streak.
/// Today only participates once fully compliant: an in-progress day with
/// untaken doses neither counts nor halts the walk. The scan is capped at
/// `lookback_days`; longer streaks are not observable.
fn streak_days(doses: &[&MedicationDose], today: NaiveDate, lookback_days: u32) -> u32 {
    let mut streak = 0;
    for offset in 0..lookback_days {
        let date = today - Duration::days(i64::from(offset));
        let day_doses: Vec<_> = doses.iter().filter(|d| d.date == date).collect();
        if day_doses.is_empty() {
            continue;
        }

        let all_taken = day_doses.iter().all(|d| d.taken);
        if all_taken {
            streak += 1;
        } else if offset == 0 {
            // Today is still in progress
            continue;
        } else {
            break;
        }
    }
    streak
}

/// Mean effectiveness over rated taken doses, rounded to one decimal
fn average_effectiveness(taken: &[&&MedicationDose]) -> f64 {
    let rated: Vec<u8> = taken.iter().filter_map(|d| d.effectiveness).collect();
    if rated.is_empty() {
        return 0.0;
    }
    let mean = rated.iter().map(|&e| f64::from(e)).sum::<f64>() / rated.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Most frequently reported side effects across taken doses, descending by
/// count, ties broken by first appearance in the dose log.
fn common_side_effects(taken: &[&&MedicationDose]) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut next_seen = 0usize;
    for dose in taken {
        for effect in &dose.side_effects {
            let entry = counts.entry(effect.as_str()).or_insert_with(|| {
                let order = next_seen;
                next_seen += 1;
                (0, order)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(effect, (count, first_seen))| (effect, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(TOP_SIDE_EFFECTS)
        .map(|(effect, _, _)| effect.to_string())
        .collect()
}

/// Per-day taken/missed counts over the trailing window, oldest first
fn trend_series(doses: &[&MedicationDose], today: NaiveDate, window_days: u32) -> Vec<TrendPoint> {
    let mut series = Vec::with_capacity(window_days as usize);
    for offset in (0..window_days).rev() {
        let date = today - Duration::days(i64::from(offset));
        let day_doses: Vec<_> = doses.iter().filter(|d| d.date == date).collect();
        let taken = day_doses.iter().filter(|d| d.taken).count();
        series.push(TrendPoint {
            date,
            taken,
            missed: day_doses.len() - taken,
            total: day_doses.len(),
        });
    }
    series
}

impl MedicationStore {
    /// Adherence analytics for the current profile
    pub fn analytics(&self, today: NaiveDate, config: &AnalyticsConfig) -> Analytics {
        compute_analytics(&self.profile_doses(), today, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DoseKey, MedicationDose};
    use chrono::NaiveTime;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn dose(med: Uuid, date: NaiveDate, hour: u32, taken: bool) -> MedicationDose {
        let mut dose = MedicationDose::untaken(DoseKey {
            medication_id: med,
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            date,
        });
        if taken {
            dose.taken = true;
            dose.taken_time = Some(NaiveTime::from_hms_opt(hour, 5, 0).unwrap());
        }
        dose
    }

    fn config() -> AnalyticsConfig {
        AnalyticsConfig::default()
    }

    #[test]
    fn test_compliance_zero_when_empty() {
        let analytics = compute_analytics(&[], day(10), &config());
        assert_eq!(analytics.compliance_rate, 0);
        assert_eq!(analytics.streak_days, 0);
        assert_eq!(analytics.average_effectiveness, 0.0);
        assert!(analytics.common_side_effects.is_empty());
    }

    #[test]
    fn test_compliance_rate_rounds() {
        let med = Uuid::new_v4();
        let doses = vec![
            dose(med, day(8), 8, true),
            dose(med, day(8), 20, true),
            dose(med, day(9), 8, true),
            dose(med, day(9), 20, false),
        ];
        let refs: Vec<&MedicationDose> = doses.iter().collect();
        let analytics = compute_analytics(&refs, day(10), &config());

        assert_eq!(analytics.compliance_rate, 75);
        assert_eq!(analytics.total_doses_taken, 3);
        assert_eq!(analytics.total_doses_missed, 1);
    }

    #[test]
    fn test_streak_skips_empty_days_and_breaks_on_partial() {
        let med = Uuid::new_v4();
        // day 5 and 7 fully compliant, day 6 empty, day 4 partial
        let doses = vec![
            dose(med, day(4), 8, true),
            dose(med, day(4), 20, false),
            dose(med, day(5), 8, true),
            dose(med, day(7), 8, true),
        ];
        let refs: Vec<&MedicationDose> = doses.iter().collect();
        let analytics = compute_analytics(&refs, day(8), &config());

        // Walking back from day 8: empty(8) skip, taken(7), empty(6) skip,
        // taken(5), partial(4) halts.
        assert_eq!(analytics.streak_days, 2);
    }

    #[test]
    fn test_streak_ignores_in_progress_today() {
        let med = Uuid::new_v4();
        let doses = vec![
            dose(med, day(9), 8, true),
            dose(med, day(10), 8, true),
            dose(med, day(10), 20, false), // tonight's dose not yet taken
        ];
        let refs: Vec<&MedicationDose> = doses.iter().collect();
        let analytics = compute_analytics(&refs, day(10), &config());

        assert_eq!(analytics.streak_days, 1);
    }

    #[test]
    fn test_streak_counts_completed_today() {
        let med = Uuid::new_v4();
        let doses = vec![dose(med, day(9), 8, true), dose(med, day(10), 8, true)];
        let refs: Vec<&MedicationDose> = doses.iter().collect();
        let analytics = compute_analytics(&refs, day(10), &config());

        assert_eq!(analytics.streak_days, 2);
    }

    #[test]
    fn test_streak_capped_at_lookback_window() {
        let med = Uuid::new_v4();
        let doses: Vec<MedicationDose> = (0..90)
            .map(|offset| dose(med, day(30) - Duration::days(offset), 8, true))
            .collect();
        let refs: Vec<&MedicationDose> = doses.iter().collect();

        let mut cfg = config();
        cfg.streak_lookback_days = 60;
        let analytics = compute_analytics(&refs, day(30), &cfg);
        assert_eq!(analytics.streak_days, 60);
    }

    #[test]
    fn test_average_effectiveness_one_decimal() {
        let med = Uuid::new_v4();
        let mut d1 = dose(med, day(1), 8, true);
        d1.effectiveness = Some(4);
        let mut d2 = dose(med, day(2), 8, true);
        d2.effectiveness = Some(5);
        let mut d3 = dose(med, day(3), 8, true);
        d3.effectiveness = Some(4);
        let unrated = dose(med, day(4), 8, true);

        let doses = vec![d1, d2, d3, unrated];
        let refs: Vec<&MedicationDose> = doses.iter().collect();
        let analytics = compute_analytics(&refs, day(5), &config());

        // (4 + 5 + 4) / 3 = 4.333... -> 4.3
        assert_eq!(analytics.average_effectiveness, 4.3);
    }

    #[test]
    fn test_common_side_effects_top_five() {
        let med = Uuid::new_v4();
        let mut doses = Vec::new();
        let effects = [
            ("Nausea", 4),
            ("Headache", 3),
            ("Dizziness", 2),
            ("Fatigue", 2),
            ("Dry mouth", 1),
            ("Tremors", 1),
        ];
        let mut hour = 0;
        for (effect, count) in effects {
            for _ in 0..count {
                let mut d = dose(med, day(1 + hour % 20), (hour % 24) as u32, true);
                d.side_effects = vec![effect.to_string()];
                doses.push(d);
                hour += 1;
            }
        }
        let refs: Vec<&MedicationDose> = doses.iter().collect();
        let analytics = compute_analytics(&refs, day(25), &config());

        assert_eq!(analytics.common_side_effects.len(), 5);
        assert_eq!(analytics.common_side_effects[0], "Nausea");
        assert_eq!(analytics.common_side_effects[1], "Headache");
        // Tied counts keep first-seen order
        assert_eq!(analytics.common_side_effects[2], "Dizziness");
        assert_eq!(analytics.common_side_effects[3], "Fatigue");
        assert_eq!(analytics.common_side_effects[4], "Dry mouth");
    }

    #[test]
    fn test_untaken_dose_side_effects_not_counted() {
        let med = Uuid::new_v4();
        let mut missed = dose(med, day(1), 8, false);
        missed.side_effects = vec!["Nausea".into()];
        let doses = vec![missed];
        let refs: Vec<&MedicationDose> = doses.iter().collect();

        let analytics = compute_analytics(&refs, day(2), &config());
        assert!(analytics.common_side_effects.is_empty());
    }

    #[test]
    fn test_trend_series_oldest_to_newest() {
        let med = Uuid::new_v4();
        let doses = vec![
            dose(med, day(29), 8, true),
            dose(med, day(30), 8, false),
        ];
        let refs: Vec<&MedicationDose> = doses.iter().collect();
        let analytics = compute_analytics(&refs, day(30), &config());

        assert_eq!(analytics.trend.len(), 30);
        assert_eq!(analytics.trend[0].date, day(1));
        assert_eq!(analytics.trend[29].date, day(30));
        assert_eq!(analytics.trend[28].taken, 1);
        assert_eq!(analytics.trend[29].missed, 1);
        assert_eq!(analytics.trend[0].total, 0);
    }
}
