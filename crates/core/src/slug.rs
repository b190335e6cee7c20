//! URL slug generation for products and shops.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Timelike, Utc};

static SLUG_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Turn a display name into a URL-safe slug.
///
/// Lowercases, folds common accented Latin letters to ASCII, turns runs of
/// whitespace, `-` and `_` into a single `-`, and drops everything else.
///
/// ```
/// use dealshop_core::slug::slugify;
///
/// assert_eq!(slugify("Attiéké Poisson"), "attieke-poisson");
/// assert_eq!(slugify("  Menu Spécial VIP!  "), "menu-special-vip");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = !slug.is_empty();
            continue;
        }
        let folded = fold_accent(c);
        if folded.is_empty() {
            continue;
        }
        if pending_dash {
            slug.push('-');
            pending_dash = false;
        }
        slug.push_str(&folded);
    }

    slug
}

/// A slug that is unique even for identical names created back to back.
///
/// The suffix combines the microsecond part of `now` with a process-wide
/// counter.
#[must_use]
pub fn unique_slug(name: &str, now: DateTime<Utc>) -> String {
    let micros = u64::from(now.nanosecond() / 1_000);
    let seq = SLUG_COUNTER.fetch_add(1, Ordering::Relaxed);
    let base = slugify(name);
    let suffix = format!("{micros:06}{seq}");
    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}

/// Keep a supplied slug verbatim, otherwise generate one from `name`.
#[must_use]
pub fn resolve_slug(supplied: Option<&str>, name: &str, now: DateTime<Utc>) -> String {
    match supplied {
        Some(slug) if !slug.trim().is_empty() => slug.to_owned(),
        _ => unique_slug(name, now),
    }
}

fn fold_accent(c: char) -> String {
    let folded = match c {
        'a'..='z' | '0'..='9' => return c.to_string(),
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => "",
    };
    folded.to_owned()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Placali Sauce"), "placali-sauce");
        assert_eq!(slugify("Riz   Sauce"), "riz-sauce");
        assert_eq!(slugify("Restaurant le Délice"), "restaurant-le-delice");
        assert_eq!(slugify("Crème brûlée & œufs"), "creme-brulee-oeufs");
        assert_eq!(slugify("--Déjà_vu--"), "deja-vu");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_unique_slug_for_identical_names() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().unwrap_or_default();
        let first = unique_slug("Attiéké Poisson", now);
        let second = unique_slug("Attiéké Poisson", now);
        assert_ne!(first, second);
        assert!(first.starts_with("attieke-poisson-"));
        assert!(second.starts_with("attieke-poisson-"));
    }

    #[test]
    fn test_resolve_slug_keeps_supplied() {
        let now = Utc::now();
        assert_eq!(resolve_slug(Some("my-slug"), "Ignored", now), "my-slug");
        assert!(resolve_slug(None, "Riz Sauce", now).starts_with("riz-sauce-"));
        assert!(resolve_slug(Some("  "), "Riz Sauce", now).starts_with("riz-sauce-"));
    }
}
