//! Id coercion at store boundaries: ids are opaque strings, but numeric-looking
//! ones are treated as integers for comparison and for subprocess payloads.

/// A job id as observed at a store boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobId {
    Numeric(i64),
    Token(String),
}

impl JobId {
    pub fn as_str_repr(&self) -> String {
        match self {
            JobId::Numeric(n) => n.to_string(),
            JobId::Token(s) => s.clone(),
        }
    }
}

/// Normalises a raw string id: purely numeric strings become `Numeric`,
/// everything else passes through as a `Token`.
pub fn coerce_job_id(raw: &str) -> JobId {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<i64>() {
            return JobId::Numeric(n);
        }
    }
    JobId::Token(raw.to_string())
}

/// The trailing run of ASCII digits in `id`, parsed as an integer, or `None`
/// if the id does not end in a digit. Used by enqueue-time id generation
/// (max trailing suffix + 1) and by chunk id decoding (`<doc_id>-<index>`).
pub fn trailing_numeric_suffix(id: &str) -> Option<i64> {
    let digit_count = id.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digit_count == 0 {
        return None;
    }
    let start = id.len() - digit_count;
    id[start..].parse::<i64>().ok()
}
