//! Tweet reference resolution.
//!
//! Tools accept a tweet either as its numeric ID or as a status URL copied
//! from a browser or share sheet, e.g.
//! `https://x.com/danifesto/status/2006814700802363810?s=46&t=abc`.
//! [`resolve`] reduces both forms to the canonical digit string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TwitterError, TwitterResult};

/// Path segment that precedes the tweet ID in status URLs.
const STATUS_MARKER: &str = "status";

/// Canonical, all-digit tweet identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TweetId(String);

impl TweetId {
    /// Borrow the digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the digit string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TweetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TweetId {
    type Err = TwitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

/// Resolve a bare ID or a status URL to a [`TweetId`].
///
/// The query string is discarded, the host is ignored, and any path in which
/// a `status` segment is immediately followed by a segment starting with
/// digits is accepted. Nothing is fetched: the ID is not checked for
/// existence.
pub fn resolve(input: &str) -> TwitterResult<TweetId> {
    let without_query = input
        .trim()
        .split_once('?')
        .map_or(input.trim(), |(head, _)| head);

    if is_digits(without_query) {
        return Ok(TweetId(without_query.to_string()));
    }

    let segments: Vec<&str> = without_query.split('/').collect();
    segments
        .windows(2)
        .filter(|pair| pair[0] == STATUS_MARKER)
        .map(|pair| leading_digits(pair[1]))
        .find(|digits| !digits.is_empty())
        .map(|digits| TweetId(digits.to_string()))
        .ok_or_else(|| TwitterError::InvalidReference {
            input: input.to_string(),
        })
}

/// Strip a leading `@` and surrounding whitespace from a handle.
///
/// Fails when nothing is left.
pub fn normalize_username(input: &str) -> TwitterResult<&str> {
    let handle = input.trim().trim_start_matches('@').trim();
    if handle.is_empty() {
        return Err(TwitterError::invalid_argument(
            "username",
            format!("'{input}' is not a handle"),
        ));
    }
    Ok(handle)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn leading_digits(s: &str) -> &str {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    &s[..end]
}
