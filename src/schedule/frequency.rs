//! Frequency interpreter: maps free-text frequency codes to dose slots.
//!
//! [`classify`] handles a single code. [`SlotPlan`] applies it across every
//! medicine of one or more prescriptions and keeps, per slot, the ordered list of
//! medicine labels that fall into it.

use std::collections::{BTreeMap, BTreeSet};

use super::types::{DoseSlot, Medicine, PatientRecord};

const THREE_TIMES: &[&str] = &["1-1-1", "tds", "tid"];
const TWICE: &[&str] = &["1-0-1", "bd", "bid"];
const MORNING_ONLY: &[&str] = &["1-0-0", "od"];
const NIGHT_ONLY: &[&str] = &["0-0-1"];

/// Classify a frequency code into the set of dose slots it covers.
///
/// Matching ignores case and all whitespace. Patterns are tried in priority order
/// (three-times, twice, morning-only, night-only) and the first match wins. Anything
/// unrecognised maps to Morning so that an unparsed code never drops a reminder.
pub fn classify(code: &str) -> BTreeSet<DoseSlot> {
    let normalized: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| normalized.contains(p));

    if contains_any(THREE_TIMES) {
        BTreeSet::from([DoseSlot::Morning, DoseSlot::Afternoon, DoseSlot::Night])
    } else if contains_any(TWICE) {
        BTreeSet::from([DoseSlot::Morning, DoseSlot::Night])
    } else if contains_any(MORNING_ONLY) || normalized == "morning" {
        BTreeSet::from([DoseSlot::Morning])
    } else if contains_any(NIGHT_ONLY) || normalized == "night" {
        BTreeSet::from([DoseSlot::Night])
    } else {
        tracing::debug!(code = %code, "unrecognised frequency code, defaulting to morning");
        BTreeSet::from([DoseSlot::Morning])
    }
}

/// Per-slot medicine labels for a set of medicines.
///
/// A slot is present only if at least one medicine maps to it. Labels are kept in
/// medicine order and duplicates are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotPlan {
    slots: BTreeMap<DoseSlot, Vec<String>>,
}

impl SlotPlan {
    /// Build a plan, rendering each medicine with `label`.
    pub fn build<'a, I, F>(medicines: I, label: F) -> Self
    where
        I: IntoIterator<Item = &'a Medicine>,
        F: Fn(&Medicine) -> String,
    {
        let mut slots: BTreeMap<DoseSlot, Vec<String>> = BTreeMap::new();
        for med in medicines {
            let rendered = label(med);
            for slot in classify(&med.frequency) {
                slots.entry(slot).or_default().push(rendered.clone());
            }
        }
        Self { slots }
    }

    /// Plan for a single prescription, labelled the way alarm bodies show them.
    pub fn for_record(record: &PatientRecord) -> Self {
        Self::build(&record.medicines, Medicine::alarm_label)
    }

    /// Union plan across all active prescriptions, labelled by medicine name.
    pub fn for_records(records: &[PatientRecord]) -> Self {
        Self::build(
            records.iter().flat_map(|r| r.medicines.iter()),
            |m| m.name.clone(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: DoseSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Labels for a slot, empty if the slot is absent.
    pub fn medicines(&self, slot: DoseSlot) -> &[String] {
        self.slots.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Present slots in clock order with their labels.
    pub fn iter(&self) -> impl Iterator<Item = (DoseSlot, &[String])> {
        self.slots.iter().map(|(slot, meds)| (*slot, meds.as_slice()))
    }
}
