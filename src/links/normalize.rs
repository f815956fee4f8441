// src/links/normalize.rs
// =============================================================================
// This module turns a link found in a page into an archive path.
//
// Archive paths never start with '/', and a page at "a/b/c.html" resolves
// relative links against its directory "a/b/". Browsers do the same thing,
// but they also percent-decode and drop query strings and fragments, so we
// must too or we would report links that work fine as broken.
//
// Rust concepts:
// - Byte slices: We walk the input as &[u8] because decoded %XX bytes are
//   raw bytes, not necessarily complete UTF-8 characters
// - String::from_utf8_lossy: Turns the bytes back into a String
// =============================================================================

/// Resolves `target` against the directory `base` into an archive path.
///
/// - A target starting with `/` is archive-absolute: `base` is ignored.
/// - `../` pops one directory off the output (never past the start).
/// - `./` is skipped.
/// - `%XX` decodes to the byte it encodes.
/// - `#` or `?` ends the path.
/// - The output never starts with `/`.
pub fn normalize_link(target: &str, base: &str) -> String {
    let input = target.as_bytes();
    let mut output: Vec<u8> = Vec::with_capacity(base.len() + input.len() + 1);
    let mut p = 0;

    if input.first() == Some(&b'/') {
        p = 1;
    } else {
        output.extend_from_slice(base.as_bytes());
        if !output.is_empty() && output.last() != Some(&b'/') {
            output.push(b'/');
        }
    }

    // Dot segments are only recognised at the start of a path segment
    let mut at_segment_start = true;

    while p < input.len() {
        let rest = &input[p..];

        if at_segment_start {
            if rest.starts_with(b"../") {
                // Drop the trailing '/', then the last component
                output.pop();
                let cut = output.iter().rposition(|&b| b == b'/').unwrap_or(0);
                output.truncate(cut);
                // Stop on the '/' so it is re-added below
                p += 2;
                at_segment_start = false;
                continue;
            }
            if rest.starts_with(b"./") {
                p += 2;
                continue;
            }
        }

        match input[p] {
            b'#' | b'?' => break,
            b'%' => {
                if let Some(byte) = decode_hex_pair(&input[p + 1..]) {
                    output.push(byte);
                    p += 3;
                } else {
                    output.push(b'%');
                    p += 1;
                }
                at_segment_start = false;
            }
            b'/' => {
                at_segment_start = true;
                if !output.is_empty() {
                    output.push(b'/');
                }
                p += 1;
            }
            byte => {
                output.push(byte);
                at_segment_start = false;
                p += 1;
            }
        }
    }

    String::from_utf8_lossy(&output).into_owned()
}

fn decode_hex_pair(bytes: &[u8]) -> Option<u8> {
    let high = (*bytes.first()? as char).to_digit(16)?;
    let low = (*bytes.get(1)? as char).to_digit(16)?;
    Some((high * 16 + low) as u8)
}

/// Tells whether following `target` from the directory `base` climbs above
/// the archive root.
///
/// This is a structural count, not a resolution: every `../` in the target
/// counts as one step up, and the link is out of bounds once the steps reach
/// (1 for a base without a leading '/') + (number of '/' in base, with a
/// trailing '/' added when missing).
pub fn is_out_of_bounds(target: &str, base: &str) -> bool {
    if target.is_empty() {
        return false;
    }

    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    let relative_prefix = if base.starts_with('/') { 0 } else { 1 };
    let threshold = relative_prefix + base.matches('/').count();
    let steps_up = target.matches("../").count();

    steps_up >= threshold
}

/// Directory part of an entry path, including the trailing '/'.
///
/// `"a/b/c.html"` -> `"a/b/"`, `"index.html"` -> `""`.
pub fn base_directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(slash) => &path[..=slash],
        None => "",
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why build a Vec<u8> instead of a String?
//    - %XX escapes may decode to single bytes of a multi-byte character
//    - A String must always hold valid UTF-8, a Vec<u8> can hold anything
//    - String::from_utf8_lossy turns the bytes back into text at the end
//
// 2. What does b"../" mean?
//    - A byte string literal, of type &[u8; 3]
//    - It compares directly against slices of input.as_bytes()
//
// 3. Why does base_directory return &str and not String?
//    - The directory is just the front part of the path we were given
//    - Returning a slice borrows it, no allocation needed
// -----------------------------------------------------------------------------
