//! URL slugs derived from document titles.

const FALLBACK: &str = "untitled";

/// Lowercases `title`, drops punctuation, and joins words with hyphens.
/// Letters and digits of any script are kept.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    let slug = cleaned
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        FALLBACK.to_string()
    } else {
        slug
    }
}

/// The slug tried on the given attempt: `base`, then `base-1`, `base-2`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    match attempt {
        0 => base.to_string(),
        n => format!("{base}-{n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_hyphenates() {
        assert_eq!(slugify("The Nakba: Remembering 1948!"), "the-nakba-remembering-1948");
        assert_eq!(slugify("  Return -- to   Deir Yassin "), "return-to-deir-yassin");
    }

    #[test]
    fn blank_titles_fall_back() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("   \t"), "untitled");
        assert_eq!(slugify("?!"), "untitled");
    }

    #[test]
    fn keeps_non_latin_letters() {
        assert_eq!(slugify("النكبة 1948"), "النكبة-1948");
    }

    #[test]
    fn candidates_append_attempt_number() {
        assert_eq!(slug_candidate("jaffa", 0), "jaffa");
        assert_eq!(slug_candidate("jaffa", 2), "jaffa-2");
    }
}
