//! Built-in macro variables.
//!
//! Macros are reserved underscore-prefixed names resolved only when the
//! user map does not already provide them. Time-valued macros share a
//! single `now` captured once per compile; counter macros take snapshot
//! reads through the [`CounterStore`] collaborator and are committed only
//! by the print path.

use chrono::{DateTime, FixedOffset, Local};
use rand::Rng;
use std::collections::HashMap;
use uuid::Uuid;

/// Read/commit access to the scoped print counters.
///
/// The compiler only ever calls [`peek`](CounterStore::peek); the print
/// path calls [`commit`](CounterStore::commit) exactly once per
/// successful submission. Keys embed the scope and, for daily scopes,
/// the local date: `global`, `global:2026-08-02`, `printer:p1`,
/// `template:asset-label:2026-08-02`.
pub trait CounterStore: Send + Sync {
    fn peek(&self, key: &str) -> u64;
    fn commit(&self, key: &str) -> u64;
}

/// Context the macro resolver draws on.
pub struct MacroContext<'a> {
    pub template_name: Option<&'a str>,
    pub printer_id: Option<&'a str>,
    pub draft_id: Option<&'a str>,
    /// Captured once per compile, in the configured timezone.
    pub now: DateTime<FixedOffset>,
    pub counters: Option<&'a dyn CounterStore>,
}

impl<'a> MacroContext<'a> {
    /// Context with only a template name, using the local timezone.
    pub fn for_template(template_name: &'a str) -> Self {
        Self {
            template_name: Some(template_name),
            printer_id: None,
            draft_id: None,
            now: now_with_offset(None),
            counters: None,
        }
    }
}

/// Current time in the given fixed offset (local offset when `None`).
pub fn now_with_offset(offset: Option<FixedOffset>) -> DateTime<FixedOffset> {
    let local = Local::now();
    match offset {
        Some(offset) => local.with_timezone(&offset),
        None => local.fixed_offset(),
    }
}

/// Parse a `+HH:MM` / `-HH:MM` timezone offset string.
pub fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => (1, s),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// 8 base-32 characters encoding a random 40-bit value.
fn short_id() -> String {
    let value: u64 = rand::thread_rng().gen_range(0..(1u64 << 40));
    (0..8)
        .rev()
        .map(|i| BASE32_ALPHABET[((value >> (i * 5)) & 0x1F) as usize] as char)
        .collect()
}

/// Scope keys for the counter macros available in this context.
fn counter_scopes(ctx: &MacroContext<'_>) -> Vec<(&'static str, String)> {
    let today = ctx.now.format("%Y-%m-%d").to_string();
    let mut scopes = vec![
        ("_counter_global", "global".to_string()),
        ("_counter_daily", format!("global:{}", today)),
    ];
    if let Some(printer) = ctx.printer_id {
        scopes.push(("_counter_printer", format!("printer:{}", printer)));
        scopes.push(("_counter_printer_daily", format!("printer:{}:{}", printer, today)));
    }
    if let Some(template) = ctx.template_name {
        scopes.push(("_counter_template", format!("template:{}", template)));
        scopes.push(("_counter_template_daily", format!("template:{}:{}", template, today)));
    }
    scopes
}

/// Compute values for every recognised macro name in `used` that the user
/// map does not already provide.
pub fn builtin_macros(
    used: &[String],
    existing: &HashMap<String, String>,
    ctx: &MacroContext<'_>,
) -> HashMap<String, String> {
    let mut macros = HashMap::new();
    let wanted =
        |name: &str| used.iter().any(|n| n == name) && !existing.contains_key(name);

    let mut add_if = |name: &'static str, value: String| {
        if wanted(name) {
            macros.insert(name.to_string(), value);
        }
    };

    let now = ctx.now;
    add_if("_now_iso", now.to_rfc3339());
    add_if("_date_yyyy_mm_dd", now.format("%Y-%m-%d").to_string());
    add_if("_date_dd_mm_yyyy", now.format("%d.%m.%Y").to_string());
    add_if("_time_hh_mm", now.format("%H:%M").to_string());
    add_if("_time_hh_mm_ss", now.format("%H:%M:%S").to_string());
    add_if("_timestamp_ms", now.timestamp_millis().to_string());
    add_if("_uuid", Uuid::new_v4().to_string());
    add_if("_short_id", short_id());
    add_if("_draft_id", ctx.draft_id.unwrap_or("").to_string());
    add_if("_printer_id", ctx.printer_id.unwrap_or("").to_string());
    add_if("_template_name", ctx.template_name.unwrap_or("").to_string());

    for (name, key) in counter_scopes(ctx) {
        if wanted(name) {
            let value = ctx.counters.map(|store| store.peek(&key)).unwrap_or(0);
            macros.insert(name.to_string(), value.to_string());
        }
    }

    macros
}

/// Commit every counter macro the template actually used. Called by the
/// print path after a successful submission; the render path never
/// commits.
pub fn commit_used_counters(used: &[String], ctx: &MacroContext<'_>) {
    let Some(store) = ctx.counters else { return };
    for (name, key) in counter_scopes(ctx) {
        if used.iter().any(|n| n == name) {
            store.commit(&key);
        }
    }
}
