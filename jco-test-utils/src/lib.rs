//! Deterministic NDJSON corpus generators shared by tests and benches.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

/// Base timestamp for generated log corpora.
fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Log-shaped records: ISO timestamps, a small level enum, a service name,
/// a message, and a sequential id.
pub fn log_records(count: usize) -> String {
    let levels = ["info", "info", "info", "warn", "error"];
    let messages = ["start", "ok", "slow", "retry", "done"];
    let mut out = String::new();
    for i in 0..count {
        let ts = (base_time() + Duration::seconds(i as i64))
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let record = json!({
            "ts": ts,
            "level": levels[i % levels.len()],
            "service": "api",
            "message": messages[i % messages.len()],
            "id": i + 1,
        });
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}

/// Two shapes back to back: `count_ab` records with keys `{a,b}` followed
/// by `count_ac` records with keys `{a,c}`.
pub fn drifting_schema(count_ab: usize, count_ac: usize) -> String {
    let mut out = String::new();
    for i in 0..count_ab {
        out.push_str(&json!({ "a": i, "b": i * 2 }).to_string());
        out.push('\n');
    }
    for i in 0..count_ac {
        let i = i + count_ab;
        out.push_str(&json!({ "a": i, "c": format!("v{i}") }).to_string());
        out.push('\n');
    }
    out
}

/// Records whose `mixed` column alternates between strings and integers,
/// forcing the RAW_JSON fallback.
pub fn mixed_type_records(count: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        let record = if i % 2 == 0 {
            json!({ "mixed": format!("text-{i}"), "id": i })
        } else {
            json!({ "mixed": i, "id": i })
        };
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}

/// Insert a blank line (alternating empty and whitespace-only) after every
/// `every`-th line of `text`.
pub fn with_blank_lines(text: &str, every: usize) -> String {
    let mut out = String::new();
    let mut blank_toggle = false;
    for (i, line) in text.lines().enumerate() {
        out.push_str(line);
        out.push('\n');
        if every > 0 && (i + 1) % every == 0 {
            out.push_str(if blank_toggle { "   \n" } else { "\n" });
            blank_toggle = !blank_toggle;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_records_are_valid_ndjson() {
        let corpus = log_records(10);
        assert_eq!(corpus.lines().count(), 10);
        for line in corpus.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("ts").is_some());
            assert!(value.get("id").is_some());
        }
    }

    #[test]
    fn drifting_schema_switches_keys() {
        let corpus = drifting_schema(2, 2);
        let lines: Vec<&str> = corpus.lines().collect();
        assert!(lines[0].contains("\"b\""));
        assert!(lines[3].contains("\"c\""));
    }

    #[test]
    fn blank_insertion_keeps_content_lines() {
        let corpus = with_blank_lines(&log_records(4), 2);
        let blank = corpus
            .lines()
            .filter(|line| line.trim().is_empty())
            .count();
        assert_eq!(blank, 2);
    }

    #[test]
    fn generators_are_deterministic() {
        assert_eq!(log_records(50), log_records(50));
        assert_eq!(mixed_type_records(50), mixed_type_records(50));
    }
}
