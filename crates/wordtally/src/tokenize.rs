//! Word counting over markup-bearing text.
//!
//! Text is normalized by stripping tags (script and style bodies included),
//! decoding HTML entities and trimming. A word is then a maximal run of
//! letters (any script) or ASCII digits; everything else separates words.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Longest entity body considered when decoding (`&` and `;` excluded).
const MAX_ENTITY_LEN: usize = 32;

pub fn strip_tags(text: &str) -> Cow<'_, str> {
    let without_code = SCRIPT_STYLE.replace_all(text, "");
    match without_code {
        Cow::Borrowed(s) => TAG.replace_all(s, ""),
        Cow::Owned(s) => Cow::Owned(TAG.replace_all(&s, "").into_owned()),
    }
}

/// Decodes named (HTML5) and numeric character references. Anything that
/// does not resolve is left as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .bytes()
            .take(MAX_ENTITY_LEN + 1)
            .position(|b| b == b';')
            .filter(|&semi| semi > 0)
            .and_then(|semi| resolve_entity(&after[..semi]).map(|d| (d, semi)));

        match decoded {
            Some((replacement, semi)) => {
                out.push_str(&replacement);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

fn resolve_entity(body: &str) -> Option<String> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    if !body.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    quick_xml::escape::resolve_html5_entity(body).map(str::to_string)
}

/// Strips markup, decodes entities and trims surrounding whitespace.
pub fn normalize(text: &str) -> String {
    let stripped = strip_tags(text);
    let decoded = decode_entities(&stripped);
    decoded.trim().to_string()
}

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit()
}

/// Counts words in already-normalized text.
pub fn count_normalized(text: &str) -> u64 {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if is_word_char(c) {
            if !in_word {
                count += 1;
                in_word = true;
            }
        } else {
            in_word = false;
        }
    }

    count
}

/// Counts words in raw text that may contain markup and entities.
pub fn count_words(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    count_normalized(&normalize(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t "), 0);
    }

    #[test]
    fn test_alphanumeric_runs() {
        assert_eq!(count_words("a1 b2  c3"), 3);
        assert_eq!(count_words("2024 was 1 year"), 4);
    }

    #[test]
    fn test_markup_and_entities() {
        assert_eq!(count_words("<b>Hello</b> &amp; World"), 2);
        assert_eq!(count_words("<p>One</p> <p>Two</p>"), 2);
        assert_eq!(count_words("caf&eacute; au&nbsp;lait"), 3);
    }

    #[test]
    fn test_tags_do_not_separate_words() {
        // Tags are removed without a replacement, so adjacent runs join.
        assert_eq!(count_words("<p>One</p><p>Two</p>"), 1);
        assert_eq!(count_words("<b>Hel</b>lo"), 1);
    }

    #[test]
    fn test_ampersand_dense_input_decodes_linearly() {
        let text = "& ".repeat(200_000);
        let started = std::time::Instant::now();

        assert_eq!(decode_entities(&text).len(), text.len());
        assert_eq!(count_words(&format!("{}end&amp;", text)), 1);
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_punctuation_and_underscores_separate() {
        assert_eq!(count_words("don't stop-now snake_case"), 6);
        assert_eq!(count_words("end. start, next!"), 3);
    }

    #[test]
    fn test_unicode_letters() {
        assert_eq!(count_words("naïve Ünïcödé 東京"), 3);
    }

    #[test]
    fn test_script_and_style_bodies_removed() {
        let html = "<style>p { color: red }</style><p>Visible text</p><script>var x = 1;</script>";
        assert_eq!(count_words(html), 2);
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entities("&#72;&#x69;"), "Hi");
        assert_eq!(decode_entities("&#039;quoted&#039;"), "'quoted'");
    }

    #[test]
    fn test_decode_leaves_unknown_entities() {
        assert_eq!(decode_entities("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&bogus; &#xZZ;"), "&bogus; &#xZZ;");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn test_decode_is_single_pass() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_strip_then_decode_keeps_escaped_markup_as_text() {
        assert_eq!(normalize("&lt;b&gt;bold&lt;/b&gt;"), "<b>bold</b>");
        assert_eq!(count_words("&lt;b&gt;bold&lt;/b&gt;"), 3);
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize("  <i>x</i>  "), "x");
    }
}
