//! `DD-MMM-YY` card statement parser (text)
//!
//! Expected extracted-text rows:
//!   08-Oct-24 NFC - (AP-PAY)-DUBAI MALL AED 150.00
//!   09-Oct-24 CARREFOUR 45.50
//!   10-Oct-24 REFUND AED 20.00 CR
//!
//! Rows are found with two regex passes over the whole text. When neither finds
//! anything (some renderings put the date on its own line, or pad columns oddly)
//! a line-by-line scan runs instead.

use regex::Regex;
use spendlens_core::{Transaction, TransactionKey};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Header, footer and summary rows that look like transactions.
const SKIP_KEYWORDS: &[&str] = &[
    "opening balance",
    "closing balance",
    "total outstanding",
    "transaction date",
    "posting date",
    "transaction details",
    "original amount",
    "total amount",
    "important:",
    "warning",
    "page",
    "statement",
    "account",
];

const DATE_PATTERN: &str = r"\d{1,2}-[A-Za-z]{3}-\d{2}";

struct Patterns {
    /// date, description, optional AED marker, amount with optional decimals
    row: Regex,
    /// date, description, amount with exactly two decimals
    row_two_decimals: Regex,
    date_prefix: Regex,
    line_amount: Regex,
    credit_marker: Regex,
    trailing_credit: Regex,
    non_amount_chars: Regex,
    trailing_currency: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        row: Regex::new(&format!(
            r"(?mi)(?P<date>{DATE_PATTERN})\s+(?P<desc>.+?)\s+(?:AED\s+)?(?P<amount>[\d,]+\.?\d*)\s*(?:\n|$)"
        ))
        .expect("valid row regex"),
        row_two_decimals: Regex::new(&format!(
            r"(?mi)(?P<date>{DATE_PATTERN})\s+(?P<desc>.+?)\s+(?P<amount>[\d,]+\.?\d{{2}})\s*$"
        ))
        .expect("valid two-decimal row regex"),
        date_prefix: Regex::new(&format!(r"^({DATE_PATTERN})")).expect("valid date regex"),
        line_amount: Regex::new(r"[\d,]+\.\d{2}").expect("valid amount regex"),
        credit_marker: Regex::new(r"(?i)(?:\bCR\b|\dCR\b)").expect("valid credit regex"),
        trailing_credit: Regex::new(r"(?i)\bCR$").expect("valid trailing credit regex"),
        non_amount_chars: Regex::new(r"[^\d.,-]").expect("valid amount-cleanup regex"),
        trailing_currency: Regex::new(r"(?i)\s+AED$").expect("valid currency regex"),
    })
}

/// Raw (date, description, amount) text captured by a row pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowMatch {
    date: String,
    desc: String,
    amount: String,
}

// The two-decimal pattern has no currency slot, so `AED` lands at the end of the
// description; drop it there so both patterns agree on the same row.
fn collect_rows(re: &Regex, text: &str) -> Vec<RowMatch> {
    let trailing = &patterns().trailing_currency;
    re.captures_iter(text)
        .map(|caps| RowMatch {
            date: caps["date"].trim().to_string(),
            desc: trailing.replace(caps["desc"].trim(), "").into_owned(),
            amount: caps["amount"].trim().to_string(),
        })
        .collect()
}

fn has_credit_marker(s: &str) -> bool {
    patterns().credit_marker.is_match(s)
}

fn is_boilerplate(desc: &str) -> bool {
    let lower = desc.to_lowercase();
    SKIP_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = patterns().non_amount_chars.replace_all(raw, "");
    let cleaned = cleaned.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|a| a.is_finite())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tracks keys already emitted so repeated rows collapse to one.
#[derive(Default)]
struct Dedup {
    seen: HashSet<TransactionKey>,
}

impl Dedup {
    fn admit(&mut self, txn: &Transaction) -> bool {
        self.seen.insert(txn.key())
    }
}

/// Filters one candidate row into a transaction, or `None` when it must be dropped.
fn accept_row(row: &RowMatch) -> Option<Transaction> {
    if row.date.is_empty() || row.desc.is_empty() || row.amount.is_empty() {
        return None;
    }
    if is_boilerplate(&row.desc) {
        return None;
    }
    // `REFUND CR AED 20.00` puts the marker before the amount
    if has_credit_marker(&row.amount) || patterns().trailing_credit.is_match(row.desc.trim()) {
        return None;
    }
    if !patterns().date_prefix.is_match(&row.date) {
        return None;
    }

    let amount = parse_amount(&row.amount)?;
    if amount <= 0.0 {
        return None;
    }

    let description = collapse_whitespace(&row.desc);
    if description.chars().count() < 3 {
        return None;
    }

    Some(Transaction::new(row.date.clone(), description, amount))
}

fn scan_patterns(text: &str) -> Vec<Transaction> {
    let p = patterns();
    let mut rows = collect_rows(&p.row, text);
    let primary = rows.len();
    let extra: Vec<RowMatch> = collect_rows(&p.row_two_decimals, text)
        .into_iter()
        .filter(|m| !rows[..primary].contains(m))
        .collect();
    debug!("Pattern scan: {} primary rows, {} extra two-decimal rows", primary, extra.len());
    rows.extend(extra);

    let mut dedup = Dedup::default();
    rows.iter()
        .filter_map(accept_row)
        .filter(|t| dedup.admit(t))
        .collect()
}

fn scan_lines(text: &str) -> Vec<Transaction> {
    let p = patterns();
    let mut dedup = Dedup::default();
    let mut out = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(date) = p.date_prefix.find(line) else {
            continue;
        };

        let rest = &line[date.end()..];
        let Some(amount) = p.line_amount.find(rest) else {
            continue;
        };

        let desc = collapse_whitespace(&rest[..amount.start()]);
        if desc.chars().count() <= 3 || has_credit_marker(line) {
            continue;
        }
        let Some(value) = parse_amount(amount.as_str()).filter(|a| *a > 0.0) else {
            continue;
        };

        let txn = Transaction::new(date.as_str(), desc, value);
        if dedup.admit(&txn) {
            out.push(txn);
        }
    }

    out
}

/// Parse extracted statement text into debit transactions, in order of appearance.
///
/// Credits (`CR`), non-positive amounts and header/footer rows are dropped.
/// Empty text yields no transactions.
pub fn parse_statement_text(text: &str) -> Vec<Transaction> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let txns = scan_patterns(text);
    if !txns.is_empty() {
        info!("Extracted {} transactions", txns.len());
        return txns;
    }

    let txns = scan_lines(text);
    info!("Pattern scan found nothing; line scan extracted {} transactions", txns.len());
    txns
}
