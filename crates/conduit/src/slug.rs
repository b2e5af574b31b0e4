//! Article slugs.

/// Slug used when a title has no alphanumeric characters.
pub const FALLBACK_SLUG: &str = "article";

/// Turns a title into a lowercase, dash-separated slug.
///
/// Runs of anything other than letters and digits collapse into a single
/// dash; leading and trailing separators are dropped.
///
/// ```
/// assert_eq!(conduit::slugify("How to train your dragon"), "how-to-train-your-dragon");
/// assert_eq!(conduit::slugify("  Rust -- 2024!  "), "rust-2024");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut gap = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.extend(c.to_lowercase());
        } else {
            gap = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// The `n`th candidate for `base`: `base`, `base-2`, `base-3`, ...
pub(crate) fn candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}
