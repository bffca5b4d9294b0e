//! CLI schedule commands: `today`, `week`, `mark`, `action` and `classify`.

use anyhow::Result;

use crate::app::MedCare;
use crate::notify::ActionEvent;
use crate::schedule::alarms::AlarmExtra;
use crate::schedule::frequency::classify as classify_code;
use crate::schedule::types::{DoseSlot, LoggedStatus, SlotStatus};

/// Print today's dose slots.
pub async fn today(app: &MedCare, user: &str) -> Result<()> {
    let view = app.today(user, &chrono::Local::now()).await?;

    println!("Today {}  ({})", view.date, view.day_status);
    println!("{}", "=".repeat(40));
    if view.slots.is_empty() {
        println!("No doses scheduled.");
        return Ok(());
    }
    for card in &view.slots {
        println!("{:<10} {:>8}  {}", card.label, card.time, slot_word(card.status));
        for med in &card.medicines {
            println!("    {med}");
        }
    }
    Ok(())
}

/// Print the seven-day strip.
pub async fn week(app: &MedCare, user: &str) -> Result<()> {
    let days = app.week(user, &chrono::Local::now()).await?;
    for day in &days {
        println!("{} {}  {}", day.day_label, day.date, day.status);
    }
    Ok(())
}

/// Mark a due slot from the terminal.
pub async fn mark(app: &MedCare, user: &str, slot: DoseSlot, status: LoggedStatus) -> Result<()> {
    let log = app.mark_dose(user, slot, status, &chrono::Local::now()).await?;
    println!("{} marked {}.", slot.label(), status.as_str());
    for (slot, status) in &log {
        println!("  {:<10} {}", slot.label(), status.as_str());
    }
    Ok(())
}

/// Replay a notification action as if the OS had delivered it.
pub async fn action(app: &MedCare, action_id: &str, prescription_id: &str, slot_label: &str) -> Result<()> {
    let event = ActionEvent {
        action_id: action_id.to_string(),
        extra: AlarmExtra {
            prescription_id: prescription_id.to_string(),
            slot_label: slot_label.to_string(),
        },
    };
    match app.handle_action(&event, &chrono::Local::now()).await {
        Some(log) => {
            println!("Action applied.");
            for (slot, status) in &log {
                println!("  {:<10} {}", slot.label(), status.as_str());
            }
        }
        None => println!("Action ignored."),
    }
    Ok(())
}

/// Show which slots a frequency code maps to.
pub fn classify(code: &str) {
    let slots: Vec<&str> = classify_code(code).iter().map(|s| s.label()).collect();
    println!("{code}: {}", slots.join(", "));
}

fn slot_word(status: SlotStatus) -> &'static str {
    match status {
        SlotStatus::Locked => "locked",
        SlotStatus::Pending => "due",
        SlotStatus::Taken => "taken",
        SlotStatus::Missed => "missed",
    }
}
