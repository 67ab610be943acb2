//! Authoritative carrier table and tracking-number detection
//!
//! Single source of truth for the carriers the portal recognizes: the
//! human-readable name, the tracking provider's numeric carrier code, and
//! the URL domains staff paste links from. Both detection and registration
//! consult this table.
//!
//! Detection never errors: an unrecognized URL or number simply yields
//! `None` and the provider is left to auto-detect the carrier.

use once_cell::sync::Lazy;
use regex::Regex;

/// A known shipping carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carrier {
    /// Human-readable name stored on the delivery record
    pub name: &'static str,
    /// Tracking provider's numeric carrier code
    pub code: i64,
    /// URL substrings that identify this carrier's tracking pages
    pub domains: &'static [&'static str],
}

/// Fixed table of known carriers
pub const CARRIERS: &[Carrier] = &[
    Carrier { name: "UPS", code: 100002, domains: &["ups.com"] },
    Carrier { name: "USPS", code: 21051, domains: &["usps.com", "tools.usps.com"] },
    Carrier { name: "FedEx", code: 100003, domains: &["fedex.com"] },
    Carrier { name: "DHL", code: 7041, domains: &["dhl.com", "dhl.de"] },
    Carrier { name: "Amazon", code: 190271, domains: &["amazon.com", "swiship.com"] },
    Carrier { name: "OnTrac", code: 100049, domains: &["ontrac.com"] },
    Carrier { name: "LaserShip", code: 100052, domains: &["lasership.com"] },
    Carrier { name: "Purolator", code: 100015, domains: &["purolator.com"] },
    Carrier { name: "Canada Post", code: 3041, domains: &["canadapost.ca", "canadapost-postescanada.ca"] },
];

/// Ordered tracking-number extraction patterns
///
/// Per-carrier query-parameter conventions first, then generic
/// `tracking=`/`track=` forms, finally a bare alphanumeric path segment of
/// length 10-30. Order matters: the first match wins.
static EXTRACTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // UPS: ?tracknum=1Z...
        r"(?i)[?&]tracknum=([A-Za-z0-9]+)",
        // UPS legacy: ?InquiryNumber1=...
        r"(?i)[?&]InquiryNumber1=([A-Za-z0-9]+)",
        // FedEx: ?trknbr=...
        r"(?i)[?&]trknbr=([A-Za-z0-9]+)",
        // FedEx list form: ?tracknumbers=...
        r"(?i)[?&]tracknumbers=([A-Za-z0-9]+)",
        // USPS: ?tLabels=...
        r"(?i)[?&]tLabels=([A-Za-z0-9]+)",
        // DHL: ?tracking-id=...
        r"(?i)[?&]tracking-id=([A-Za-z0-9-]+)",
        // Generic query parameter forms
        r"(?i)[?&](?:tracking_number|trackingnumber|tracking|track)=([A-Za-z0-9]+)",
        // Generic path form: /track/<number> or /tracking/<number>
        r"(?i)/(?:tracking|track)/([A-Za-z0-9]{8,30})(?:[/?#]|$)",
        // Last resort: bare alphanumeric path segment
        r"/([A-Za-z0-9]{10,30})(?:[/?#]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid extraction pattern"))
    .collect()
});

/// Infer the carrier from a tracking URL and/or a bare tracking number.
///
/// URL domain match takes priority over number-format heuristics.
pub fn detect(tracking_url: Option<&str>, tracking_number: Option<&str>) -> Option<&'static Carrier> {
    if let Some(url) = tracking_url {
        if let Some(carrier) = detect_from_url(url) {
            return Some(carrier);
        }
    }
    tracking_number.and_then(detect_from_number)
}

/// Infer the carrier by URL substring match against known domains
pub fn detect_from_url(url: &str) -> Option<&'static Carrier> {
    let lower = url.to_ascii_lowercase();
    CARRIERS
        .iter()
        .find(|c| c.domains.iter().any(|d| lower.contains(d)))
}

/// Infer the carrier from tracking-number format heuristics
///
/// Length/prefix patterns per carrier; ambiguous formats return the most
/// common holder of that format in practice.
pub fn detect_from_number(number: &str) -> Option<&'static Carrier> {
    let n = number.trim();
    if n.is_empty() {
        return None;
    }
    let upper = n.to_ascii_uppercase();
    let all_digits = n.chars().all(|c| c.is_ascii_digit());

    if upper.starts_with("1Z") {
        return by_name("UPS");
    }
    if upper.starts_with("TBA") {
        return by_name("Amazon");
    }
    if upper.starts_with("1LS") {
        return by_name("LaserShip");
    }
    if upper.starts_with('C') && n.len() == 15 && n[1..].chars().all(|c| c.is_ascii_digit()) {
        return by_name("OnTrac");
    }
    // USPS international: two letters + 9 digits + "US"
    if n.len() == 13 && upper.ends_with("US") && upper.chars().take(2).all(|c| c.is_ascii_alphabetic()) {
        return by_name("USPS");
    }
    if all_digits {
        return match n.len() {
            20..=22 if n.starts_with('9') => by_name("USPS"),
            12 | 15 => by_name("FedEx"),
            10 => by_name("DHL"),
            16 => by_name("Canada Post"),
            _ => None,
        };
    }
    None
}

/// Look up a carrier by its human-readable name (case-insensitive)
pub fn by_name(name: &str) -> Option<&'static Carrier> {
    CARRIERS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Extract a bare tracking number from a carrier tracking URL
///
/// Tries the ordered pattern list; returns `None` when nothing matches.
pub fn extract_tracking_number(url: &str) -> Option<String> {
    for pattern in EXTRACTION_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}
