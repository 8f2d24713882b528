//! Classify transport error text as transient or terminal.
//!
//! The transport surfaces failures as free-form strings, so classification
//! is an explicit signature list over the lowercased message rather than a
//! structured error code. A structured error channel would supersede this
//! without touching the orchestrator.

/// One transient-error signature. Matching is case-insensitive.
#[derive(Debug, Clone, Copy)]
enum Signature {
    /// The needle appears anywhere in the message.
    Contains(&'static str),
    /// The needles appear in order, with anything in between.
    InOrder(&'static [&'static str]),
    /// A three-digit 5xx status code appears anywhere in the message.
    ServerStatus,
}

/// Transient signatures, checked in order: timeouts, generic network and
/// server errors, embedded 5xx status codes, connection failures, DNS
/// resolution failures, and the raw OS error codes the upstream stacks leak
/// into message text.
const RETRYABLE: &[Signature] = &[
    Signature::Contains("timeout"),
    Signature::InOrder(&["network", "error"]),
    Signature::InOrder(&["server", "error"]),
    Signature::ServerStatus,
    Signature::InOrder(&["connection", "failed"]),
    Signature::InOrder(&["getaddrinfo", "fail"]),
    Signature::Contains("etimedout"),
    Signature::Contains("econnreset"),
    Signature::Contains("enotfound"),
];

/// True when the error text matches a transient signature; everything else
/// is terminal.
pub fn is_retryable(message: &str) -> bool {
    let text = message.to_ascii_lowercase();
    RETRYABLE.iter().any(|sig| sig.matches(&text))
}

impl Signature {
    fn matches(&self, text: &str) -> bool {
        match self {
            Signature::Contains(needle) => text.contains(needle),
            Signature::InOrder(needles) => contains_in_order(text, needles),
            Signature::ServerStatus => contains_5xx(text),
        }
    }
}

fn contains_in_order(text: &str, needles: &[&str]) -> bool {
    let mut rest = text;
    for needle in needles {
        match rest.find(needle) {
            Some(at) => rest = &rest[at + needle.len()..],
            None => return false,
        }
    }
    true
}

/// Any '5' followed by two ASCII digits, wherever it sits in the text.
/// Upstream services embed raw status codes mid-sentence, so no word
/// boundaries are required.
fn contains_5xx(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.windows(3).any(|w| {
        w[0] == b'5' && w[1].is_ascii_digit() && w[2].is_ascii_digit()
    })
}
