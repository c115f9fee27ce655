//! UTC time helpers.
//!
//! Entity timestamps are `DateTime<Utc>`; the Unix epoch (what
//! [`Default`] yields) means "unset" and is replaced by the repository on
//! create. Stored timestamps carry microsecond precision; generated
//! timestamps are truncated up front and caller-set ones are truncated by the
//! repository before insert, so a row survives a storage round-trip unchanged.

use chrono::{DateTime, SubsecRound, Utc};

/// Sub-second digits kept for persisted timestamps.
pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// Current wall-clock time in UTC, truncated to stored precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(STORED_SUBSEC_DIGITS)
}

/// Whether a timestamp is the unset (epoch) value.
pub fn is_unset(ts: &DateTime<Utc>) -> bool {
    *ts == DateTime::<Utc>::default()
}

/// Cut a timestamp down to stored precision in place.
pub fn truncate_to_stored(ts: &mut DateTime<Utc>) {
    *ts = ts.trunc_subsecs(STORED_SUBSEC_DIGITS);
}

/// Replace an unset timestamp with `value`.
pub fn default_to(ts: &mut DateTime<Utc>, value: DateTime<Utc>) {
    if is_unset(ts) {
        *ts = value;
    }
}
