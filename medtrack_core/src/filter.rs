//! Searching, filtering and sorting of the medication list.
//!
//! Filters are transient view state, applied on demand against the live
//! collection. The free function is pure so UI layers can run it against
//! any slice; the store method wires it to the current profile.

use crate::{Medication, MedicationStore, SearchFilters, SortKey, SortOrder, StatusFilter};
use std::cmp::Ordering;

/// Apply `filters` to a medication list and return the surviving entries
/// in sort order.
///
/// The text query matches name, dosage, doctor, pharmacy, notes and
/// prescription number, case-insensitively. Category filters (kinds,
/// frequencies, doctors,
/// pharmacies) are disjunctive within a filter and conjunctive across
/// filters; an empty filter list means "no restriction".
pub fn filter_and_sort<'a>(
    medications: &[&'a Medication],
    filters: &SearchFilters,
) -> Vec<&'a Medication> {
    let query = filters.query.trim().to_lowercase();

    let mut matched: Vec<&Medication> = medications
        .iter()
        .filter(|m| matches_query(m, &query))
        .filter(|m| filters.kinds.is_empty() || filters.kinds.contains(&m.kind))
        .filter(|m| filters.frequencies.is_empty() || filters.frequencies.contains(&m.frequency))
        .filter(|m| filters.doctors.is_empty() || filters.doctors.contains(&m.doctor))
        .filter(|m| filters.pharmacies.is_empty() || filters.pharmacies.contains(&m.pharmacy))
        .filter(|m| match filters.status {
            StatusFilter::All => true,
            StatusFilter::Active => m.is_active,
            StatusFilter::Inactive => !m.is_active,
        })
        .copied()
        .collect();

    matched.sort_by(|a, b| {
        let ordering = compare(a, b, filters.sort_by);
        match filters.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    matched
}

fn matches_query(med: &Medication, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    med.name.to_lowercase().contains(query)
        || med.dosage.to_lowercase().contains(query)
        || med.doctor.to_lowercase().contains(query)
        || med.pharmacy.to_lowercase().contains(query)
        || med
            .notes
            .as_ref()
            .is_some_and(|n| n.to_lowercase().contains(query))
        || med
            .prescription_number
            .as_ref()
            .is_some_and(|n| n.to_lowercase().contains(query))
}

fn compare(a: &Medication, b: &Medication, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => cmp_str(&a.name, &b.name),
        // Unscheduled (as-needed) medications sort last
        SortKey::Time => match (a.times.first(), b.times.first()) {
            (Some(ta), Some(tb)) => ta.cmp(tb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Doctor => cmp_str(&a.doctor, &b.doctor),
        SortKey::Pharmacy => cmp_str(&a.pharmacy, &b.pharmacy),
        // Unrated medications sort below any rating
        SortKey::Effectiveness => a
            .effectiveness
            .unwrap_or(0)
            .cmp(&b.effectiveness.unwrap_or(0)),
    }
}

fn cmp_str(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl MedicationStore {
    /// The current profile's medications, filtered and sorted
    pub fn search_medications(&self, filters: &SearchFilters) -> Vec<&Medication> {
        filter_and_sort(&self.profile_medications(), filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frequency, MedicationKind};
    use chrono::{NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    fn med(name: &str, doctor: &str, pharmacy: &str, times: &[(u32, u32)]) -> Medication {
        let now = Utc::now();
        Medication {
            id: Uuid::new_v4(),
            profile_id: Uuid::nil(),
            name: name.into(),
            dosage: "10mg".into(),
            kind: MedicationKind::Pill,
            frequency: Frequency::Daily,
            times: times
                .iter()
                .map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
                .collect(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            refill_date: None,
            quantity: 30,
            doctor: doctor.into(),
            pharmacy: pharmacy.into(),
            prescription_number: None,
            color: None,
            notes: None,
            side_effects: Vec::new(),
            effectiveness: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_query_matches_across_fields() {
        let a = med("Lisinopril", "Dr. Chen", "CVS", &[(8, 0)]);
        let b = med("Metformin", "Dr. Patel", "Walgreens", &[(7, 0)]);
        let meds = vec![&a, &b];

        let by_name = filter_and_sort(
            &meds,
            &SearchFilters {
                query: "lisino".into(),
                ..Default::default()
            },
        );
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Lisinopril");

        let by_doctor = filter_and_sort(
            &meds,
            &SearchFilters {
                query: "PATEL".into(),
                ..Default::default()
            },
        );
        assert_eq!(by_doctor.len(), 1);
        assert_eq!(by_doctor[0].name, "Metformin");
    }

    #[test]
    fn test_query_matches_dosage_and_prescription_number() {
        let mut a = med("Lisinopril", "Dr. Chen", "CVS", &[(8, 0)]);
        a.dosage = "20mg".into();
        a.prescription_number = Some("RX-44812".into());
        let b = med("Metformin", "Dr. Chen", "CVS", &[(8, 0)]);
        let meds = vec![&a, &b];

        let by_dosage = filter_and_sort(
            &meds,
            &SearchFilters {
                query: "20mg".into(),
                ..Default::default()
            },
        );
        assert_eq!(by_dosage.len(), 1);

        let by_rx = filter_and_sort(
            &meds,
            &SearchFilters {
                query: "rx-44812".into(),
                ..Default::default()
            },
        );
        assert_eq!(by_rx.len(), 1);
        assert_eq!(by_rx[0].name, "Lisinopril");
    }

    #[test]
    fn test_empty_filters_pass_everything() {
        let a = med("A", "Dr. X", "CVS", &[(8, 0)]);
        let b = med("B", "Dr. Y", "CVS", &[(9, 0)]);
        let meds = vec![&a, &b];

        let result = filter_and_sort(&meds, &SearchFilters::default());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_status_filter() {
        let active = med("Active", "Dr. X", "CVS", &[(8, 0)]);
        let mut inactive = med("Inactive", "Dr. X", "CVS", &[(8, 0)]);
        inactive.is_active = false;
        let meds = vec![&active, &inactive];

        let only_active = filter_and_sort(
            &meds,
            &SearchFilters {
                status: StatusFilter::Active,
                ..Default::default()
            },
        );
        assert_eq!(only_active.len(), 1);
        assert_eq!(only_active[0].name, "Active");

        let only_inactive = filter_and_sort(
            &meds,
            &SearchFilters {
                status: StatusFilter::Inactive,
                ..Default::default()
            },
        );
        assert_eq!(only_inactive.len(), 1);
        assert_eq!(only_inactive[0].name, "Inactive");
    }

    #[test]
    fn test_category_filters_combine_conjunctively() {
        let a = med("A", "Dr. Chen", "CVS", &[(8, 0)]);
        let b = med("B", "Dr. Chen", "Walgreens", &[(8, 0)]);
        let c = med("C", "Dr. Patel", "CVS", &[(8, 0)]);
        let meds = vec![&a, &b, &c];

        let result = filter_and_sort(
            &meds,
            &SearchFilters {
                doctors: vec!["Dr. Chen".into()],
                pharmacies: vec!["CVS".into()],
                ..Default::default()
            },
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "A");
    }

    #[test]
    fn test_kind_and_frequency_facets() {
        let pill = med("Lisinopril", "Dr. Chen", "CVS", &[(8, 0)]);
        let mut injection = med("Insulin", "Dr. Chen", "CVS", &[(22, 0)]);
        injection.kind = MedicationKind::Injection;
        let mut prn = med("Ibuprofen", "Dr. Chen", "CVS", &[]);
        prn.frequency = Frequency::AsNeeded;
        let meds = vec![&pill, &injection, &prn];

        let by_kind = filter_and_sort(
            &meds,
            &SearchFilters {
                kinds: vec![MedicationKind::Injection],
                ..Default::default()
            },
        );
        assert_eq!(by_kind.len(), 1);
        assert_eq!(by_kind[0].name, "Insulin");

        // OR within the facet
        let either_kind = filter_and_sort(
            &meds,
            &SearchFilters {
                kinds: vec![MedicationKind::Pill, MedicationKind::Injection],
                ..Default::default()
            },
        );
        assert_eq!(either_kind.len(), 3);

        let by_frequency = filter_and_sort(
            &meds,
            &SearchFilters {
                frequencies: vec![Frequency::AsNeeded],
                ..Default::default()
            },
        );
        assert_eq!(by_frequency.len(), 1);
        assert_eq!(by_frequency[0].name, "Ibuprofen");

        // AND across facets: as-needed pills only
        let combined = filter_and_sort(
            &meds,
            &SearchFilters {
                kinds: vec![MedicationKind::Pill],
                frequencies: vec![Frequency::AsNeeded],
                ..Default::default()
            },
        );
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].name, "Ibuprofen");
    }

    #[test]
    fn test_sort_by_time_uses_first_scheduled() {
        let early = med("Evening first in vec", "Dr. X", "CVS", &[(6, 30), (22, 0)]);
        let late = med("Later", "Dr. X", "CVS", &[(9, 0)]);
        let unscheduled = med("PRN", "Dr. X", "CVS", &[]);
        let meds = vec![&late, &unscheduled, &early];

        let result = filter_and_sort(
            &meds,
            &SearchFilters {
                sort_by: SortKey::Time,
                ..Default::default()
            },
        );
        assert_eq!(result[0].name, "Evening first in vec");
        assert_eq!(result[1].name, "Later");
        assert_eq!(result[2].name, "PRN");
    }

    #[test]
    fn test_sort_descending_by_effectiveness() {
        let mut a = med("A", "Dr. X", "CVS", &[(8, 0)]);
        a.effectiveness = Some(3);
        let mut b = med("B", "Dr. X", "CVS", &[(8, 0)]);
        b.effectiveness = Some(5);
        let unrated = med("C", "Dr. X", "CVS", &[(8, 0)]);
        let meds = vec![&a, &b, &unrated];

        let result = filter_and_sort(
            &meds,
            &SearchFilters {
                sort_by: SortKey::Effectiveness,
                sort_order: SortOrder::Desc,
                ..Default::default()
            },
        );
        assert_eq!(result[0].name, "B");
        assert_eq!(result[1].name, "A");
        assert_eq!(result[2].name, "C");
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let a = med("aspirin", "Dr. X", "CVS", &[(8, 0)]);
        let b = med("Benadryl", "Dr. X", "CVS", &[(8, 0)]);
        let c = med("Atorvastatin", "Dr. X", "CVS", &[(8, 0)]);
        let meds = vec![&b, &a, &c];

        let result = filter_and_sort(&meds, &SearchFilters::default());
        let names: Vec<&str> = result.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["aspirin", "Atorvastatin", "Benadryl"]);
    }

    #[test]
    fn test_store_search_scoped_to_current_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = crate::testutil::store_in(&dir);
        let mine = store.current_profile().id;
        let other = store
            .add_profile(crate::NewProfile {
                name: "Sam".into(),
                relationship: "Spouse".into(),
                ..Default::default()
            })
            .unwrap();

        store
            .add_medication(crate::testutil::sample_medication(mine, "Mine", &["08:00"]))
            .unwrap();
        store
            .add_medication(crate::testutil::sample_medication(other, "Theirs", &["08:00"]))
            .unwrap();

        let result = store.search_medications(&SearchFilters::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Mine");
    }
}
