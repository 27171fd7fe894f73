//! Merchant-label cleanup applied before a description is sent for classification.
//!
//! Contactless and in-app purchases are printed as e.g. `NFC - (AP-PAY)-DUBAI MALL`;
//! only the trailing merchant name carries meaning.

use regex::Regex;
use std::sync::OnceLock;

fn wallet_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:NFC|IAP)\s*-\s*\([^)]+\)\s*-\s*").expect("valid wallet prefix regex")
    })
}

fn strip_once(desc: &str) -> &str {
    let mut desc = desc.trim();
    if let Some(rest) = desc.strip_prefix("- ") {
        desc = rest.trim();
    }
    if let Some(m) = wallet_prefix_re().find(desc) {
        desc = &desc[m.end()..];
    }
    desc.trim()
}

/// Clean a raw statement description into a merchant label.
///
/// Repeats until nothing more is stripped, so `normalize(normalize(x)) == normalize(x)`.
pub fn normalize_description(raw: &str) -> String {
    let mut desc = raw.trim();
    loop {
        let next = strip_once(desc);
        if next == desc {
            break;
        }
        desc = next;
    }
    desc.to_string()
}
