//! Charset handling for exported pages.
//!
//! SIGAA pages are often saved as ISO-8859-1 while declaring it in a `<meta>`
//! tag. The caller decodes the bytes as UTF-8 first, then asks
//! [`redecode_charset`] whether the declared charset calls for a second pass.

use std::{borrow::Cow, sync::LazyLock};

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*?charset\s*=\s*["']?\s*([a-z0-9_.:\-]+)"#)
        .expect("valid meta charset pattern")
});

/// Charset label declared by the first `<meta charset>` or
/// `<meta http-equiv="Content-Type" content="...; charset=...">` tag
pub fn declared_charset(decoded: &str) -> Option<&str> {
    META_CHARSET
        .captures(decoded)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Name of the encoding the document must be decoded with again, or `None`
/// when the first UTF-8 pass already gives the right text.
///
/// Bytes that are valid UTF-8 are kept as UTF-8 whatever the page declares.
pub fn redecode_charset(raw: &[u8], first_pass: &str) -> Option<&'static str> {
    if Encoding::for_bom(raw).is_some() || std::str::from_utf8(raw).is_ok() {
        return None;
    }

    let label = declared_charset(first_pass)?;
    let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
        tracing::warn!("Unknown declared charset: {}", label);
        return None;
    };

    // UTF-16 and replacement labels in <meta> mean UTF-8
    let encoding = encoding.output_encoding();
    if encoding == UTF_8 {
        return None;
    }

    Some(encoding.name())
}

/// Decode raw page bytes, honouring a BOM or a declared charset.
pub fn decode_document(raw: &[u8]) -> Cow<'_, str> {
    let (first_pass, used, _) = UTF_8.decode(raw);
    if used != UTF_8 {
        return first_pass;
    }

    let Some(name) = redecode_charset(raw, &first_pass) else {
        return first_pass;
    };

    match Encoding::for_label(name.as_bytes()) {
        Some(encoding) => {
            tracing::debug!("Re-decoding document as {}", name);
            let (text, _, had_errors) = encoding.decode(raw);
            if had_errors {
                tracing::warn!("Document has bytes invalid in {}", name);
            }
            text
        }
        None => first_pass,
    }
}
