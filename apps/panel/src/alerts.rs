use client_core::AlertSink;

/// Prints alerts to stderr so they stay out of rendered panel output.
pub struct PrintAlertSink;

impl AlertSink for PrintAlertSink {
    fn alert(&self, title: &str, message: &str) {
        eprintln!("{}", format_alert(title, message));
    }
}

pub fn format_alert(title: &str, message: &str) -> String {
    format!("[{title}] {message}")
}
