// src/utils/log.rs

//! Multi-line report helpers on top of the `log` facade.
//!
//! Headers, indented items and summaries keep bulk-run output readable
//! whichever logger the binary installs.

/// Width of header borders and separators.
const RULE_WIDTH: usize = 60;

/// Log a header framed by borders.
pub fn header(title: &str) {
    let border = "═".repeat(RULE_WIDTH);
    log::info!("{border}");
    log::info!("  {title}");
    log::info!("{border}");
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {message}");
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {step_num}/{total}] {message}");
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {title}");
    for (key, value) in items {
        log::info!("    {key}: {value}");
    }
}
