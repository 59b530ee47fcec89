//! Input sanitization for free-text fields.
//!
//! Dangerous constructs are stripped first, then the remaining text is
//! HTML-escaped with `html-escape`. This is a denylist filter and only suitable
//! for text that will be rendered as HTML element content.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:javascript|data|vbscript)\s*:").expect("valid regex"));

static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("valid regex"));

/// Bound on strip passes; nested payloads like `javajavascript:script:` need more than one.
const MAX_STRIP_PASSES: usize = 8;

/// Strip scripts, dangerous URL schemes and inline handlers, then escape
/// `& < > " ' /`.
///
/// Not idempotent: a second pass escapes the entities produced by the first.
pub fn sanitize(input: &str) -> String {
    let mut text: Cow<'_, str> = Cow::Borrowed(input);

    for _ in 0..MAX_STRIP_PASSES {
        let stripped = strip_once(&text);
        if stripped == text {
            break;
        }
        text = Cow::Owned(stripped);
    }

    html_escape::encode_safe(&text).into_owned()
}

/// Sanitize a JSON value; anything other than a string becomes empty.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        _ => String::new(),
    }
}

fn strip_once(input: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(input, "");
    let text = URL_SCHEME.replace_all(&text, "");
    EVENT_HANDLER.replace_all(&text, "").into_owned()
}
