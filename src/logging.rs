
/// Print one simulator event as `[component][subject][event] message`.
///
/// `subject` is whatever the event is about: a generation, a treatment, a file.
pub fn log_event(component: &str, subject: &str, event: &str, message: &str) {
    println!("[{}][{}][{}] {}", component, subject, event, message);
}

/// Warnings always go to stderr, verbose or not.
pub fn log_warning(component: &str, subject: &str, message: &str) {
    eprintln!("[{}][{}][warning] {}", component, subject, message);
}
