use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}\.?",
        r"|localhost",
        r"|[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}",
        r"|\[[0-9a-f:.]+\])",
        r"(?::[0-9]{1,5})?",
        r"(?:/?|[/?#]\S+)$",
    ))
    .expect("valid url regex")
});

const TEXT_KEY_PREFIX: &str = "text:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Url,
    Text,
}

/// The regex settles the shape; `Url::parse` then rejects hosts that only look
/// right, such as `[:]`, out-of-range IPv4 octets or ports above 65535.
pub fn classify(input: &str) -> ContentKind {
    let candidate = input.trim();
    if URL_REGEX.is_match(candidate) && Url::parse(candidate).is_ok() {
        ContentKind::Url
    } else {
        ContentKind::Text
    }
}

/// Memoization key for an analysis. URL keys are the URL itself and always
/// start with an http(s) scheme; text keys start with `text:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_url(url: &str) -> Self {
        CacheKey(url.trim().to_string())
    }

    pub fn for_text(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        CacheKey(format!("{TEXT_KEY_PREFIX}{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input after classification: which path to take, what to feed it, and the
/// key chosen before any extraction happens.
#[derive(Debug, Clone)]
pub struct ClassifiedContent<'a> {
    pub kind: ContentKind,
    pub target: &'a str,
    pub key: CacheKey,
}

pub fn classify_content(content: &str) -> ClassifiedContent<'_> {
    match classify(content) {
        ContentKind::Url => {
            let target = content.trim();
            ClassifiedContent {
                kind: ContentKind::Url,
                target,
                key: CacheKey::for_url(target),
            }
        }
        ContentKind::Text => ClassifiedContent {
            kind: ContentKind::Text,
            target: content,
            key: CacheKey::for_text(content),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_urls() {
        for input in [
            "https://example.com/a",
            "http://example.com",
            "HTTPS://News.Example.co.uk/path?x=1&y=2",
            "  https://example.com/article  \n",
            "http://localhost:8000/health",
            "http://192.168.1.10:8080/",
            "https://[::1]:8443/status",
            "https://example.com/page#section",
        ] {
            assert_eq!(classify(input), ContentKind::Url, "{input}");
        }
    }

    #[test]
    fn everything_else_is_text() {
        for input in [
            "hello world",
            "ftp://x.com",
            "example.com",
            "https://",
            "https://example",
            "https://example.com/a b",
            "check https://example.com now",
            "https://[:]/",
            "https://[...]",
            "http://256.1.1.1/",
            "https://example.com:99999/",
            "",
        ] {
            assert_eq!(classify(input), ContentKind::Text, "{input}");
        }
    }

    #[test]
    fn text_keys_are_stable_and_distinct() {
        let a = CacheKey::for_text("Experts agree: drink bleach");
        let b = CacheKey::for_text("Experts agree: drink bleach");
        let c = CacheKey::for_text("Experts agree: drink water");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_str().starts_with(TEXT_KEY_PREFIX));
        assert_eq!(a.as_str().len(), TEXT_KEY_PREFIX.len() + 64);
    }

    #[test]
    fn text_key_is_reproducible_across_processes() {
        assert_eq!(
            CacheKey::for_text("abc").as_str(),
            "text:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn url_key_is_the_trimmed_url() {
        let classified = classify_content("  https://example.com/a  ");
        assert_eq!(classified.kind, ContentKind::Url);
        assert_eq!(classified.target, "https://example.com/a");
        assert_eq!(classified.key.as_str(), "https://example.com/a");
    }

    #[test]
    fn text_content_is_keyed_on_exact_body() {
        let classified = classify_content("some claim ");
        assert_eq!(classified.kind, ContentKind::Text);
        assert_eq!(classified.target, "some claim ");
        assert_ne!(classified.key, CacheKey::for_text("some claim"));
    }
}
