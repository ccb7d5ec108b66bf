//! Name and token generation.
//!
//! - [`lut_name_for_space`] derives the external inference tenant key for a
//!   newly created space. The key is generated once and never changes; it
//!   is the join point between backend rows and the inference service's
//!   per-tenant memory.
//! - [`license_token`] generates the short-lived license-exchange token.

use rand::Rng;

/// Characters appended to a derived lut name to make it globally unique.
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random lut-name suffix.
const SUFFIX_LEN: usize = 6;

/// Human-readable token alphabet. Ambiguous glyphs (0/O, 1/I/L) excluded.
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Maximum length of the slug portion of a lut name.
const SLUG_MAX_LEN: usize = 24;

/// Derive a fresh `lut_name` for a space.
///
/// Convention: `{slug}-{suffix}` where the slug is the lowercased space
/// name with every non-alphanumeric run replaced by a single `-` (capped
/// at 24 chars, `"space"` when nothing survives) and the suffix is 6
/// random lowercase alphanumerics.
///
/// # Examples
///
/// ```
/// use lutspace_core::naming::lut_name_for_space;
///
/// let name = lut_name_for_space("Acme Support!");
/// assert!(name.starts_with("acme-support-"));
/// assert_eq!(name.len(), "acme-support-".len() + 6);
/// ```
pub fn lut_name_for_space(space_name: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for ch in space_name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "space" } else { slug };

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{slug}-{suffix}")
}

/// Generate a short human-readable license token, e.g. `K7QM-2XWP`.
pub fn license_token() -> String {
    let mut rng = rand::rng();
    let mut pick = |n: usize| -> String {
        (0..n)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    };
    let left = pick(4);
    let right = pick(4);
    format!("{left}-{right}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_plain_name() {
        let name = lut_name_for_space("Acme Support");
        assert!(name.starts_with("acme-support-"));
    }

    #[test]
    fn collapses_symbol_runs() {
        let name = lut_name_for_space("R&D -- Team");
        assert!(name.starts_with("r-d-team-"), "got {name}");
    }

    #[test]
    fn empty_name_falls_back() {
        let name = lut_name_for_space("!!!");
        assert!(name.starts_with("space-"));
    }

    #[test]
    fn slug_is_capped() {
        let name = lut_name_for_space(&"x".repeat(100));
        // slug (≤ 24) + "-" + 6-char suffix
        assert!(name.len() <= SLUG_MAX_LEN + 1 + SUFFIX_LEN);
    }

    #[test]
    fn names_are_unique_across_calls() {
        let a = lut_name_for_space("team");
        let b = lut_name_for_space("team");
        assert_ne!(a, b);
    }

    #[test]
    fn token_shape() {
        let token = license_token();
        assert_eq!(token.len(), 9);
        assert_eq!(&token[4..5], "-");
        for ch in token.chars().filter(|c| *c != '-') {
            assert!(TOKEN_ALPHABET.contains(&(ch as u8)), "bad char {ch}");
        }
    }

    #[test]
    fn token_avoids_ambiguous_glyphs() {
        for _ in 0..50 {
            let token = license_token();
            for bad in ['0', 'O', '1', 'I', 'L'] {
                assert!(!token.contains(bad));
            }
        }
    }
}
