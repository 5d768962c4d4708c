//! Filename ordering and URI slugs.
//!
//! Collections and slides are ordered the way a human reads filenames, not
//! the way bytes compare: embedded digit runs are compared as numbers, so
//! `IMG-9` sorts before `IMG-10` and `2-intro` before `10-closing`. The same
//! comparator is applied to collection directory names and to media files
//! within a collection, which keeps page ordering stable across runs.
//!
//! [`slugify`] turns a collection title into the URI-safe directory name used
//! under `collections/` in the output tree.

use std::cmp::Ordering;

/// Compare two names in natural (human) order.
///
/// Digit runs are compared numerically, everything else byte-wise:
/// - `IMG-9` < `IMG-10`
/// - `a2b` < `a10b`
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let run_a = take_digit_run(&mut ca);
                    let run_b = take_digit_run(&mut cb);
                    match compare_digit_runs(&run_a, &run_b) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                } else {
                    match x.cmp(&y) {
                        Ordering::Equal => {
                            ca.next();
                            cb.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }

    // All runs compared equal; differing zero-padding still needs a stable
    // tiebreak so that distinct names never compare equal.
    a.cmp(b)
}

fn take_digit_run(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare two digit runs as numbers without parsing into a fixed-width
/// integer, so arbitrarily long runs cannot overflow.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    match a_trim.len().cmp(&b_trim.len()) {
        Ordering::Equal => a_trim.cmp(b_trim),
        other => other,
    }
}

/// Derive a URI-safe slug from a collection title.
///
/// Lowercases, keeps ASCII alphanumerics, and collapses every other run of
/// characters into a single `-`:
/// - `"Summer in Chamonix"` → `"summer-in-chamonix"`
/// - `"Été 2019!"` → `"t-2019"` (non-ASCII is dropped)
///
/// An explicit `uri_title` in the collection metadata bypasses this entirely.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
