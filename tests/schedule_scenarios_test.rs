mod helpers;

use chrono::{Timelike, Utc};
use helpers::{at, ist, medicine, record};
use medcare::schedule::adherence::slot_status;
use medcare::schedule::{
    aggregate_day, classify, project, resolve_today, AdherenceLog, DayStatus, DoseSlot, LoggedStatus, SlotStatus,
};
use std::collections::BTreeSet;

fn statuses(cards: &[medcare::schedule::SlotCard]) -> Vec<(DoseSlot, SlotStatus)> {
    cards.iter().map(|c| (c.slot, c.status)).collect()
}

#[test]
fn three_times_codes_in_any_casing_map_to_every_slot() {
    let all: BTreeSet<DoseSlot> = DoseSlot::ALL.into_iter().collect();
    for code in ["1-1-1", "TDS", "tds", "Tid", " 1 - 1 - 1 ", "T D S"] {
        assert_eq!(classify(code), all, "code {code:?}");
    }
}

#[test]
fn unrecognised_codes_fall_back_to_morning() {
    for code in ["SOS", "as needed", "", "weekly", "2-2-2"] {
        assert_eq!(classify(code), BTreeSet::from([DoseSlot::Morning]), "code {code:?}");
    }
}

#[test]
fn scenario_before_any_dose_everything_is_locked() {
    let records = vec![record("rx", "Apollo", "2024-01-01", vec![medicine("Dolo", "650mg", "1-0-1")])];
    let cards = resolve_today(&records, &at(2024, 1, 1, 7, 0), &AdherenceLog::new());
    assert_eq!(
        statuses(&cards),
        vec![(DoseSlot::Morning, SlotStatus::Locked), (DoseSlot::Night, SlotStatus::Locked)]
    );
}

#[test]
fn scenario_morning_due_night_locked() {
    let records = vec![record("rx", "Apollo", "2024-01-01", vec![medicine("Dolo", "650mg", "1-0-1")])];
    let cards = resolve_today(&records, &at(2024, 1, 1, 9, 0), &AdherenceLog::new());
    assert_eq!(
        statuses(&cards),
        vec![(DoseSlot::Morning, SlotStatus::Pending), (DoseSlot::Night, SlotStatus::Locked)]
    );
    assert_eq!(cards[0].medicines, vec!["Dolo".to_string()]);
}

#[test]
fn persisted_value_wins_regardless_of_time() {
    let records = vec![record("rx", "Apollo", "2024-01-01", vec![medicine("Dolo", "650mg", "0-0-1")])];
    let log = AdherenceLog::from([(DoseSlot::Night, LoggedStatus::Taken)]);
    // Logged before the slot time is even reached.
    let cards = resolve_today(&records, &at(2024, 1, 1, 6, 0), &log);
    assert_eq!(statuses(&cards), vec![(DoseSlot::Night, SlotStatus::Taken)]);
}

#[test]
fn slot_at_exact_target_is_pending() {
    let target = at(2024, 1, 1, 8, 0).with_timezone(&Utc);
    assert_eq!(slot_status(None, target, target), SlotStatus::Pending);
    assert_eq!(
        slot_status(None, target, target - chrono::Duration::seconds(1)),
        SlotStatus::Locked
    );
}

#[test]
fn union_across_prescriptions_groups_medicines_by_slot() {
    let records = vec![
        record("a", "Apollo", "2024-01-01", vec![medicine("Dolo", "650mg", "BD")]),
        record("b", "City", "2024-01-02", vec![medicine("Pan", "40mg", "OD"), medicine("Zinc", "", "night")]),
    ];
    let cards = resolve_today(&records, &at(2024, 1, 2, 12, 0), &AdherenceLog::new());
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].medicines, vec!["Dolo", "Pan"]);
    assert_eq!(cards[1].medicines, vec!["Dolo", "Zinc"]);
}

#[test]
fn scenario_two_day_projection_from_seven_thirty() {
    let rec = record("rx", "Apollo", "2024-01-01", vec![medicine("Dolo", "650mg", "1-0-1")]);
    let alarms = project(&rec, &at(2024, 1, 1, 7, 30), 2);

    let local: Vec<(u32, u32, u32)> = alarms
        .iter()
        .map(|a| {
            let t = a.at.with_timezone(&ist());
            (chrono::Datelike::day(&t), t.hour(), t.minute())
        })
        .collect();
    assert_eq!(local, vec![(1, 8, 0), (1, 21, 0), (2, 8, 0), (2, 21, 0)]);
    assert_eq!(alarms[0].title, "Morning Medicines");
    assert_eq!(alarms[0].body, "Take: Dolo (650mg)");
    assert_eq!(alarms[1].extra.slot_label, "Night");
}

#[test]
fn projection_never_includes_past_or_present_instants() {
    let rec = record("rx", "Apollo", "2024-01-01", vec![medicine("Dolo", "650mg", "TDS")]);
    for (h, m) in [(0, 0), (8, 0), (13, 30), (21, 0), (23, 59)] {
        let start = at(2024, 1, 1, h, m);
        let alarms = project(&rec, &start, 7);
        assert!(alarms.iter().all(|a| a.at > start.with_timezone(&Utc)));
        assert!(alarms.len() <= 21);
    }
    assert_eq!(project(&rec, &at(2024, 1, 1, 7, 59), 7).len(), 21);
}

#[test]
fn projection_ids_are_distinct() {
    let rec = record("rx", "Apollo", "2024-01-01", vec![medicine("Dolo", "650mg", "TDS")]);
    let alarms = project(&rec, &at(2024, 1, 1, 0, 0), 7);
    let ids: BTreeSet<i64> = alarms.iter().map(|a| a.id).collect();
    assert_eq!(ids.len(), alarms.len());
}

#[test]
fn day_aggregation_rules() {
    use SlotStatus::*;
    assert_eq!(aggregate_day([Taken, Taken], DayStatus::Today), DayStatus::Perfect);
    assert_eq!(aggregate_day([Taken, Locked], DayStatus::Today), DayStatus::Partial);
    assert_eq!(aggregate_day([Missed, Pending], DayStatus::Today), DayStatus::Partial);
    assert_eq!(aggregate_day([Locked, Pending], DayStatus::Today), DayStatus::Today);
    assert_eq!(aggregate_day([Missed, Missed], DayStatus::Today), DayStatus::Partial);
}
