//! Heuristic cleanup of raw inference-service completions.
//!
//! The model echoes its instruction template and sometimes hallucinates
//! extra conversational turns. [`clean_completion`] strips the known
//! artifacts with literal substring operations. This is lossy, best-effort
//! cleanup of non-deterministic output — not a parser with a grammar —
//! and it is deliberately kept as plain pattern matching for output
//! compatibility with the deployed service.

use std::sync::OnceLock;

use regex::Regex;

/// Matches runs of three or more newlines.
fn newline_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

/// Remove `[INST]...[/INST]` blocks, including the echoed content between
/// the delimiters. Unpaired delimiters are removed bare.
fn strip_instruction_blocks(raw: &str) -> String {
    let mut out = raw.to_string();
    while let Some(start) = out.find("[INST]") {
        match out[start..].find("[/INST]") {
            Some(rel) => out.replace_range(start..start + rel + "[/INST]".len(), ""),
            None => out.replace_range(start..start + "[INST]".len(), ""),
        }
    }
    // Orphan closing delimiters with no opener.
    out.replace("[/INST]", "")
}

/// Clean a raw completion into assistant-visible text.
///
/// Applied in order:
///
/// 1. remove `[INST]...[/INST]` blocks and orphan delimiters,
/// 2. strip every `Assistant:` label,
/// 3. truncate at the first `User:` turn marker (everything after it is a
///    hallucinated continuation),
/// 4. truncate after the `.` of a `.:` degenerate turn boundary,
/// 5. collapse a newline immediately before a period into a bare period,
/// 6. collapse 3+ consecutive newlines into exactly 2,
/// 7. trim.
///
/// Idempotent: `clean_completion(&clean_completion(x)) == clean_completion(x)`.
pub fn clean_completion(raw: &str) -> String {
    let mut text = strip_instruction_blocks(raw);

    text = text.replace("Assistant:", "");

    if let Some(idx) = text.find("User:") {
        text.truncate(idx);
    }

    // ".:" marks a degenerate turn boundary; keep the sentence-ending dot.
    if let Some(idx) = text.find(".:") {
        text.truncate(idx + 1);
    }

    // Loop: a single pass over "\n\n." leaves "\n." behind.
    while text.contains("\n.") {
        text = text.replace("\n.", ".");
    }

    text = newline_run().replace_all(&text, "\n\n").into_owned();

    text.trim().to_string()
}

/// Extract the assistant's reply for a specific user message.
///
/// Searches the completion for the literal echo `User: {message}` followed
/// by an `Assistant:` marker and cleans only the text between that marker
/// and the end; falls back to [`clean_completion`] on the whole string when
/// either marker is absent.
pub fn extract_assistant_reply(raw: &str, user_message: &str) -> String {
    let needle = format!("User: {}", user_message.trim());
    if let Some(pos) = raw.find(&needle) {
        let after = &raw[pos + needle.len()..];
        if let Some(marker) = after.find("Assistant:") {
            let reply = &after[marker + "Assistant:".len()..];
            return clean_completion(reply);
        }
    }
    clean_completion(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_echoed_instruction_block() {
        let raw = "[INST]Hello[/INST]\nHi there!\nUser: bye";
        assert_eq!(clean_completion(raw), "Hi there!");
    }

    #[test]
    fn removes_orphan_delimiters() {
        assert_eq!(clean_completion("a [/INST] b [INST] c"), "a  b  c");
    }

    #[test]
    fn never_contains_delimiters() {
        for raw in [
            "[INST][INST]x[/INST]y[/INST]",
            "[/INST][INST]",
            "plain text",
        ] {
            let cleaned = clean_completion(raw);
            assert!(!cleaned.contains("[INST]"), "input: {raw:?}");
            assert!(!cleaned.contains("[/INST]"), "input: {raw:?}");
        }
    }

    #[test]
    fn strips_assistant_labels() {
        assert_eq!(clean_completion("Assistant: Hi Assistant: there"), "Hi  there");
    }

    #[test]
    fn truncates_at_user_marker() {
        assert_eq!(clean_completion("answer\nUser: next question"), "answer");
    }

    #[test]
    fn truncates_after_degenerate_boundary() {
        assert_eq!(clean_completion("Done.: trailing junk"), "Done.");
    }

    #[test]
    fn collapses_newline_before_period() {
        assert_eq!(clean_completion("end\n. next"), "end. next");
        // Two newlines before a period collapse all the way down.
        assert_eq!(clean_completion("end\n\n. next"), "end. next");
    }

    #[test]
    fn collapses_newline_runs_to_two() {
        assert_eq!(clean_completion("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_completion("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "[INST]Hello[/INST]\nHi there!\nUser: bye",
            "Assistant: ok\n\n\n\nmore.: junk",
            "end\n\n. next",
            "  padded  ",
            "",
        ];
        for raw in inputs {
            let once = clean_completion(raw);
            assert_eq!(clean_completion(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn extract_slices_between_markers() {
        let raw = "noise User: what is a LUT? Assistant: A lookup table.\nUser: bye";
        assert_eq!(
            extract_assistant_reply(raw, "what is a LUT?"),
            "A lookup table."
        );
    }

    #[test]
    fn extract_falls_back_without_markers() {
        let raw = "[INST]q[/INST] plain answer";
        assert_eq!(extract_assistant_reply(raw, "q"), "plain answer");
    }

    #[test]
    fn extract_falls_back_when_assistant_marker_missing() {
        let raw = "User: q but no reply marker here";
        // Falls back to plain cleanup, which truncates at the User: marker.
        assert_eq!(extract_assistant_reply(raw, "unrelated"), "");
    }
}
