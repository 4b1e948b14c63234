use notify_rust::Notification;

use crate::breath::breath::Pattern;

pub fn cycle_message(cycles: u64, pattern: &Pattern) -> String {
    format!(
        "Cycle {} complete ({} seconds of breathing).",
        cycles,
        cycles * u64::from(pattern.cycle_seconds())
    )
}

pub fn send_notification(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .summary("Zen Breath")
        .body(message)
        .timeout(4000)
        .show()?;
    Ok(())
}
