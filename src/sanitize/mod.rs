//! Client-filename sanitization.
//!
//! Uploaded filenames are attacker-controlled; everything written to disk goes
//! through [`sanitize`] first. The function is total: any input maps to a
//! non-empty name that is safe to join onto the staging directory.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Maximum length of a sanitized filename, extension included.
pub const MAX_FILENAME_LEN: usize = 200;

/// Maps an arbitrary client-supplied filename to a safe on-disk name.
///
/// The output never contains `/`, `\`, or a `..` sequence. Empty or
/// degenerate inputs yield a synthesized unique name instead of failing.
/// Already-sanitized names pass through unchanged.
pub fn sanitize(name: &str) -> String {
    if name.is_empty() {
        return format!("file_{}.dat", Uuid::new_v4());
    }

    let normalized: String = name.nfkd().collect();
    let trimmed = normalized.trim().trim_matches('.');

    // Anything outside [A-Za-z0-9_.-] becomes '_', so from here on the name
    // is pure ASCII and byte slicing is safe.
    let mut replaced = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            replaced.push(c);
        } else {
            replaced.push('_');
        }
    }

    let mut collapsed = String::with_capacity(replaced.len());
    let mut prev: Option<char> = None;
    for c in replaced.chars() {
        if matches!(c, '_' | '-' | '.') && prev == Some(c) {
            continue;
        }
        collapsed.push(c);
        prev = Some(c);
    }

    // Collapsing already reduced ".." runs to a single '.', but the traversal
    // invariant is load-bearing, so guard it explicitly.
    let mut detraversed = collapsed;
    while detraversed.contains("..") {
        detraversed = detraversed.replace("..", "_");
    }

    let stripped = detraversed.trim_matches(|c| matches!(c, '-' | '_' | '.'));

    let mut out = stripped.to_string();
    if out.len() > MAX_FILENAME_LEN {
        out = truncate_preserving_extension(&out, MAX_FILENAME_LEN);
    }

    if out.is_empty() || out == "." || out == ".." {
        return format!("secure_file_{}.dat", Uuid::new_v4());
    }

    out
}

fn truncate_preserving_extension(name: &str, max_len: usize) -> String {
    let ext = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx..],
        _ => "",
    };
    if ext.len() >= max_len {
        return name[..max_len].to_string();
    }
    let stem_len = max_len - ext.len();
    format!("{}{}", &name[..stem_len], ext)
}
