//! Canonicalization and hashing of identity fields for the server channel.

use sha2::{Digest, Sha256};

use crate::types::{HashedUserData, UserData};

const COUNTRY_CODE: &str = "964";
const LOCAL_TRUNK_PREFIX: &str = "07";

/// Converts a typed phone number to international digits.
///
/// Keeps digits only, swaps a local `07…` trunk prefix for `9647…`, and
/// prepends `964` to anything that does not already carry it. Assumes Iraqi
/// numbering; foreign numbers get the same prefix and are not validated.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.starts_with(LOCAL_TRUNK_PREFIX) {
        return format!("{COUNTRY_CODE}{}", &digits[1..]);
    }
    if digits.starts_with(COUNTRY_CODE) {
        return digits;
    }
    format!("{COUNTRY_CODE}{digits}")
}

/// SHA-256 hex digest of the trimmed, lower-cased value.
///
/// Blank input yields an empty string rather than the digest of `""`;
/// callers drop such fields instead of sending them.
#[must_use]
pub fn hash_identity(value: &str) -> String {
    let canonical = value.trim().to_lowercase();
    if canonical.is_empty() {
        return String::new();
    }
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Normalizes and hashes every populated identity field.
#[must_use]
pub fn hash_user_data(user: &UserData) -> HashedUserData {
    HashedUserData {
        ph: hashed(
            user.phone
                .as_deref()
                .filter(|p| p.chars().any(|c| c.is_ascii_digit()))
                .map(normalize_phone)
                .as_deref(),
        ),
        em: hashed(user.email.as_deref()),
        first_name: hashed(user.first_name.as_deref()),
        ln: hashed(user.last_name.as_deref()),
        ct: hashed(user.city.as_deref()),
        country: hashed(user.country.as_deref()),
        external_id: hashed(user.external_id.as_deref()),
    }
}

fn hashed(value: Option<&str>) -> Vec<String> {
    value
        .map(hash_identity)
        .filter(|h| !h.is_empty())
        .into_iter()
        .collect()
}

/// Splits a full name on whitespace: first token, then the rest re-joined.
#[must_use]
pub fn split_full_name(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.split_whitespace();
    let first = parts.next().map(str::to_owned);
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, Some(rest).filter(|r| !r.is_empty()))
}
