use stockmate_core::domain::notification::NotificationEvent;
use stockmate_core::notify::NotificationSink;

/// Prints alerts to stdout. Urgent ones ring the terminal bell.
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn deliver(&self, event: &NotificationEvent) {
        println!("{}", format_event(event));
    }
}

fn format_event(event: &NotificationEvent) -> String {
    if event.urgent {
        format!("\x07[!] {}: {}", event.title, event.body)
    } else {
        format!("[i] {}: {}", event.title, event.body)
    }
}
