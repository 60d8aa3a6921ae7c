//! Path classification.
//!
//! Strips the leading service-selector segment and decides whether the
//! remainder lies in the protected zone. Pure; no I/O.

use percent_encoding::percent_decode_str;

use crate::http::chain::Rejection;

/// Result of classifying one inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Path with the first segment removed. Always starts with `/`.
    pub rewritten_path: String,
    /// Whether the rewritten path requires a token.
    pub is_protected: bool,
}

#[derive(Debug, Clone)]
pub struct PathClassifier {
    marker: String,
}

impl PathClassifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Classify `raw_path`.
    ///
    /// Protection is plain substring containment on the rewritten path, not
    /// segment matching: `/x/my-private-api-v2` is protected for marker
    /// `private-api`. The check also runs on the percent-decoded path, since
    /// backends decode `%2D` and friends before routing.
    pub fn classify(&self, raw_path: &str) -> Result<Classification, Rejection> {
        let rewritten = strip_routing_segment(raw_path)?;
        let decoded = percent_decode_str(rewritten).decode_utf8_lossy();
        let marker = self.marker.as_str();
        Ok(Classification {
            is_protected: rewritten.contains(marker) || decoded.contains(marker),
            rewritten_path: rewritten.to_string(),
        })
    }
}

/// Remove the first path segment. `/svc` alone yields `/`.
pub fn strip_routing_segment(raw_path: &str) -> Result<&str, Rejection> {
    let rest = raw_path.strip_prefix('/').ok_or(Rejection::MalformedPath)?;
    match rest.find('/') {
        Some(0) => Err(Rejection::MalformedPath),
        Some(idx) => Ok(&raw_path[idx + 1..]),
        None if rest.is_empty() => Err(Rejection::MalformedPath),
        None => Ok("/"),
    }
}
