//! Instruction-template prompt formatting.
//!
//! The inference service expects prompts wrapped in `[INST] ... [/INST]`
//! delimiters and is sensitive to the whitespace around them, so the two
//! historical call-site variants are kept as separate functions rather
//! than merged:
//!
//! - [`format_prompt`] — tight delimiters, newline between system prompt
//!   and user message. Used when building `/generate` prompts.
//! - [`format_prompt_spaced`] — spaced delimiters, space-joined segments.
//!   Used when formatting a `label_context` for `/train_lut`.

/// Format a prompt with tight delimiters: `[INST]{system}\n{message}[/INST]`.
///
/// Both inputs are trimmed. An empty (or whitespace-only) system prompt
/// produces `[INST]{message}[/INST]` with no stray newline.
///
/// # Examples
///
/// ```
/// use lutspace_core::prompt::format_prompt;
///
/// assert_eq!(format_prompt("", "Hello"), "[INST]Hello[/INST]");
/// assert_eq!(format_prompt("Be brief.", " Hello "), "[INST]Be brief.\nHello[/INST]");
/// ```
pub fn format_prompt(system_prompt: &str, user_message: &str) -> String {
    let system = system_prompt.trim();
    let message = user_message.trim();

    if system.is_empty() {
        format!("[INST]{message}[/INST]")
    } else {
        format!("[INST]{system}\n{message}[/INST]")
    }
}

/// Format a prompt with spaced delimiters: `[INST] {system} {message} [/INST]`.
///
/// Both inputs are trimmed. An empty system prompt produces
/// `[INST] {message} [/INST]`.
pub fn format_prompt_spaced(system_prompt: &str, user_message: &str) -> String {
    let system = system_prompt.trim();
    let message = user_message.trim();

    if system.is_empty() {
        format!("[INST] {message} [/INST]")
    } else {
        format!("[INST] {system} {message} [/INST]")
    }
}
