//! Pure expiry rules. Every function takes `now` from the caller.

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::{AppError, Result},
    models::paste::Paste,
};

/// True once `now` has reached the paste's `expires_at`.
///
/// The boundary instant itself counts as expired.
pub fn is_time_expired(paste: &Paste, now: DateTime<Utc>) -> bool {
    paste.expires_at.is_some_and(|expires_at| now >= expires_at)
}

/// True when a view-limited paste has no views left.
pub fn is_view_exhausted(paste: &Paste) -> bool {
    paste.remaining_views.is_some_and(|remaining| remaining <= 0)
}

/// Whether the paste may currently be served.
pub fn is_accessible(paste: &Paste, now: DateTime<Utc>) -> bool {
    !is_time_expired(paste, now) && !is_view_exhausted(paste)
}

/// Derives the absolute expiry of a paste created at `created_at`.
///
/// # Arguments
///
/// * `created_at` - The creation instant.
/// * `ttl_seconds` - The requested time-to-live, if any.
///
/// # Returns
///
/// `None` for pastes without a time limit, or a validation error when the
/// TTL cannot be represented as a timestamp.
pub fn expires_at(
    created_at: DateTime<Utc>,
    ttl_seconds: Option<i64>,
) -> Result<Option<DateTime<Utc>>> {
    let Some(ttl) = ttl_seconds else {
        return Ok(None);
    };

    Duration::try_seconds(ttl)
        .and_then(|ttl| created_at.checked_add_signed(ttl))
        .map(Some)
        .ok_or_else(|| AppError::Validation("ttl_seconds is too large".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn paste(ttl_seconds: Option<i64>, remaining_views: Option<i32>) -> Paste {
        Paste {
            id: "aB3dE6gH".to_string(),
            content: "hello".to_string(),
            created_at: t0(),
            ttl_seconds,
            expires_at: expires_at(t0(), ttl_seconds).unwrap(),
            max_views: remaining_views,
            remaining_views,
        }
    }

    #[test]
    fn unlimited_paste_never_expires() {
        let p = paste(None, None);
        assert!(is_accessible(&p, t0() + Duration::days(365 * 100)));
    }

    #[test]
    fn ttl_boundary_is_exclusive() {
        let p = paste(Some(60), None);
        assert!(is_accessible(&p, t0()));
        assert!(is_accessible(&p, t0() + Duration::seconds(59)));
        assert!(is_accessible(&p, t0() + Duration::milliseconds(59_999)));
        assert!(is_time_expired(&p, t0() + Duration::seconds(60)));
        assert!(!is_accessible(&p, t0() + Duration::seconds(60)));
        assert!(!is_accessible(&p, t0() + Duration::seconds(61)));
    }

    #[test]
    fn zero_remaining_views_is_exhausted() {
        assert!(!is_view_exhausted(&paste(None, Some(1))));
        assert!(is_view_exhausted(&paste(None, Some(0))));
        assert!(is_view_exhausted(&paste(None, Some(-1))));
        assert!(!is_view_exhausted(&paste(None, None)));
    }

    #[test]
    fn exhaustion_wins_over_remaining_time() {
        let p = paste(Some(3_600), Some(0));
        assert!(!is_time_expired(&p, t0()));
        assert!(!is_accessible(&p, t0()));
    }

    #[test]
    fn time_expiry_wins_over_remaining_views() {
        let p = paste(Some(10), Some(5));
        assert!(!is_accessible(&p, t0() + Duration::seconds(10)));
    }

    #[test]
    fn accessibility_is_pure() {
        let p = paste(Some(30), Some(2));
        let now = t0() + Duration::seconds(29);
        let first = is_accessible(&p, now);
        for _ in 0..10 {
            assert_eq!(is_accessible(&p, now), first);
        }
    }

    #[test]
    fn expiry_is_created_at_plus_ttl() {
        assert_eq!(expires_at(t0(), None).unwrap(), None);
        assert_eq!(
            expires_at(t0(), Some(60)).unwrap(),
            Some(t0() + Duration::seconds(60))
        );
    }

    #[test]
    fn unrepresentable_ttl_is_a_validation_error() {
        let err = expires_at(t0(), Some(i64::MAX)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
