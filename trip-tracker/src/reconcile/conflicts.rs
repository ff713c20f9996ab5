//! Double-booking detection within one ingestion batch.

use std::collections::HashMap;

use crate::domain::{Passenger, PickupTime};

/// Error recorded on records that book one traveller twice at once.
pub const CONFLICT_ERROR: &str = "Conflict, passenger can't have multiple trips at one time";

/// Flag records that put the same traveller on two trips at one time.
///
/// Every record whose (first name, surname, pickup time) is shared with at
/// least one other record in `records` is marked invalid with
/// [`CONFLICT_ERROR`]. No winner is chosen. Records without a pickup time
/// are never flagged. Order is preserved.
pub fn flag_conflicts(mut records: Vec<Passenger>) -> Vec<Passenger> {
    let mut seen: HashMap<(&str, &str, PickupTime), usize> = HashMap::new();
    for record in &records {
        if let Some(time) = record.pickup_time {
            *seen
                .entry((record.first_name.as_str(), record.surname.as_str(), time))
                .or_default() += 1;
        }
    }

    let conflicting: Vec<bool> = records
        .iter()
        .map(|r| {
            r.pickup_time.is_some_and(|time| {
                seen.get(&(r.first_name.as_str(), r.surname.as_str(), time))
                    .is_some_and(|&count| count > 1)
            })
        })
        .collect();

    for (record, conflict) in records.iter_mut().zip(conflicting) {
        if conflict {
            record.invalidate(CONFLICT_ERROR);
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(first: &str, surname: &str, time: &str, to: &str) -> Passenger {
        Passenger::new(first, surname).with_route(PickupTime::parse(time).unwrap(), "Pier A", to)
    }

    #[test]
    fn same_traveller_same_time_is_flagged() {
        let flagged = flag_conflicts(vec![
            at("Bob", "Lee", "2024-06-01 10:00", "Downtown"),
            at("Bob", "Lee", "2024-06-01 10:00", "Airport"),
            at("Carol", "King", "2024-06-01 10:00", "Downtown"),
        ]);

        assert!(!flagged[0].valid);
        assert!(!flagged[1].valid);
        assert_eq!(flagged[0].error.as_deref(), Some(CONFLICT_ERROR));
        assert!(flagged[2].valid);
        assert_eq!(flagged[2].error, None);
    }

    #[test]
    fn same_traveller_different_times_pass() {
        let flagged = flag_conflicts(vec![
            at("Bob", "Lee", "2024-06-01 10:00", "Downtown"),
            at("Bob", "Lee", "2024-06-01 18:00", "Pier A"),
        ]);
        assert!(flagged.iter().all(|p| p.valid));
    }

    #[test]
    fn missing_pickup_time_is_never_flagged() {
        let flagged = flag_conflicts(vec![Passenger::new("Bob", "Lee"), Passenger::new("Bob", "Lee")]);
        assert!(flagged.iter().all(|p| p.valid));
    }

    #[test]
    fn three_way_conflict_flags_all() {
        let flagged = flag_conflicts(vec![
            at("Bob", "Lee", "2024-06-01 10:00", "A"),
            at("Bob", "Lee", "2024-06-01 10:00", "B"),
            at("Bob", "Lee", "2024-06-01 10:00", "C"),
        ]);
        assert!(flagged.iter().all(|p| !p.valid));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn record() -> impl Strategy<Value = Passenger> {
        (0..3usize, 0..3usize, 0..4u32, 0..2usize).prop_map(|(first, surname, hour, dest)| {
            let time = PickupTime::parse(&format!("2024-06-01 {:02}:00", 8 + hour)).unwrap();
            Passenger::new(["Ann", "Bob", "Cy"][first], ["Lee", "Ng", "Ode"][surname])
                .with_route(time, "Pier A", ["Downtown", "Airport"][dest])
        })
    }

    proptest! {
        #[test]
        fn flagged_exactly_when_key_is_shared(batch in prop::collection::vec(record(), 0..12)) {
            let flagged = flag_conflicts(batch.clone());
            prop_assert_eq!(flagged.len(), batch.len());

            for (i, original) in batch.iter().enumerate() {
                let shared = batch.iter().enumerate().any(|(j, other)| {
                    i != j
                        && other.same_traveller(original)
                        && other.pickup_time == original.pickup_time
                });
                prop_assert_eq!(!flagged[i].valid, shared);
                if shared {
                    prop_assert_eq!(flagged[i].error.as_deref(), Some(CONFLICT_ERROR));
                }
            }
        }
    }
}
