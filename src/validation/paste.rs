use sonic_rs::{JsonValueTrait, Value};

use crate::{
    error::{AppError, Result},
    models::paste::PasteDraft,
};

const CONTENT_MESSAGE: &str = "Content is required and must be a non-empty string";
const TTL_MESSAGE: &str = "ttl_seconds must be an integer >= 1";
const MAX_VIEWS_MESSAGE: &str = "max_views must be an integer >= 1";

/// Validates the raw fields of a create request.
///
/// Fields are checked in order (`content`, `ttl_seconds`, `max_views`) and
/// the first failure is reported.
///
/// # Arguments
///
/// * `content` - The `content` field, if present.
/// * `ttl_seconds` - The `ttl_seconds` field, if present and not null.
/// * `max_views` - The `max_views` field, if present and not null.
///
/// # Returns
///
/// A `Result` containing the typed `PasteDraft`.
pub fn validate_create_fields(
    content: Option<&Value>,
    ttl_seconds: Option<&Value>,
    max_views: Option<&Value>,
) -> Result<PasteDraft> {
    let content = content
        .and_then(|value| value.as_str())
        .ok_or_else(|| AppError::Validation(CONTENT_MESSAGE.to_string()))?;
    validate_content(content)?;

    let ttl_seconds = ttl_seconds
        .map(|value| whole_number(value).ok_or_else(|| AppError::Validation(TTL_MESSAGE.to_string())))
        .transpose()?;
    if let Some(ttl) = ttl_seconds {
        validate_ttl(ttl)?;
    }

    let max_views = max_views
        .map(|value| {
            whole_number(value).ok_or_else(|| AppError::Validation(MAX_VIEWS_MESSAGE.to_string()))
        })
        .transpose()?
        .map(|views| {
            if views < 1 {
                return Err(AppError::Validation(MAX_VIEWS_MESSAGE.to_string()));
            }
            i32::try_from(views).map_err(|_| {
                AppError::Validation(format!("max_views must be at most {}", i32::MAX))
            })
        })
        .transpose()?;

    Ok(PasteDraft {
        content: content.to_string(),
        ttl_seconds,
        max_views,
    })
}

/// Validates an already-typed draft.
pub fn validate_draft(draft: &PasteDraft) -> Result<()> {
    validate_content(&draft.content)?;
    if let Some(ttl) = draft.ttl_seconds {
        validate_ttl(ttl)?;
    }
    if draft.max_views.is_some_and(|views| views < 1) {
        return Err(AppError::Validation(MAX_VIEWS_MESSAGE.to_string()));
    }
    Ok(())
}

/// Blank means nothing but whitespace or byte-order marks.
fn is_blank(content: &str) -> bool {
    content
        .chars()
        .all(|c| c.is_whitespace() || c == '\u{feff}')
}

fn validate_content(content: &str) -> Result<()> {
    if is_blank(content) {
        return Err(AppError::Validation(CONTENT_MESSAGE.to_string()));
    }
    Ok(())
}

fn validate_ttl(ttl_seconds: i64) -> Result<()> {
    if ttl_seconds < 1 {
        return Err(AppError::Validation(TTL_MESSAGE.to_string()));
    }
    Ok(())
}

/// Reads a JSON number with no fractional part, so `5` and `5.0` both pass.
fn whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if value.as_u64().is_some() {
        // Larger than i64::MAX.
        return Some(i64::MAX);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(json: &str) -> Result<PasteDraft> {
        let body: Value = sonic_rs::from_str(json).unwrap();
        validate_create_fields(
            body.get("content").filter(|v| !v.is_null()),
            body.get("ttl_seconds").filter(|v| !v.is_null()),
            body.get("max_views").filter(|v| !v.is_null()),
        )
    }

    fn message(result: Result<PasteDraft>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_minimal_paste() {
        let draft = validate(r#"{"content":"hello"}"#).unwrap();
        assert_eq!(draft.content, "hello");
        assert_eq!(draft.ttl_seconds, None);
        assert_eq!(draft.max_views, None);
    }

    #[test]
    fn keeps_content_untrimmed() {
        let draft = validate(r#"{"content":"  indented\n"}"#).unwrap();
        assert_eq!(draft.content, "  indented\n");
    }

    #[test]
    fn rejects_missing_blank_or_non_string_content() {
        for body in [
            r#"{}"#,
            r#"{"content":""}"#,
            r#"{"content":"   \n\t"}"#,
            r#"{"content":"\ufeff"}"#,
            r#"{"content":" \ufeff\u00a0\u2028 "}"#,
            r#"{"content":42}"#,
            r#"{"content":null}"#,
        ] {
            assert_eq!(message(validate(body)), CONTENT_MESSAGE, "body: {}", body);
        }
    }

    #[test]
    fn rejects_bad_ttl() {
        for body in [
            r#"{"content":"x","ttl_seconds":0}"#,
            r#"{"content":"x","ttl_seconds":-5}"#,
            r#"{"content":"x","ttl_seconds":1.5}"#,
            r#"{"content":"x","ttl_seconds":"60"}"#,
        ] {
            assert_eq!(message(validate(body)), TTL_MESSAGE, "body: {}", body);
        }
    }

    #[test]
    fn accepts_whole_float_ttl() {
        let draft = validate(r#"{"content":"x","ttl_seconds":60.0}"#).unwrap();
        assert_eq!(draft.ttl_seconds, Some(60));
    }

    #[test]
    fn rejects_bad_max_views() {
        for body in [
            r#"{"content":"x","max_views":0}"#,
            r#"{"content":"x","max_views":2.5}"#,
            r#"{"content":"x","max_views":true}"#,
        ] {
            assert_eq!(message(validate(body)), MAX_VIEWS_MESSAGE, "body: {}", body);
        }
        assert!(message(validate(r#"{"content":"x","max_views":3000000000}"#)).contains("at most"));
    }

    #[test]
    fn reports_fields_in_order() {
        assert_eq!(
            message(validate(r#"{"content":"","ttl_seconds":"abc","max_views":0}"#)),
            CONTENT_MESSAGE
        );
        assert_eq!(
            message(validate(r#"{"content":"x","ttl_seconds":0,"max_views":"abc"}"#)),
            TTL_MESSAGE
        );
    }

    #[test]
    fn null_limits_mean_unlimited() {
        let draft = validate(r#"{"content":"x","ttl_seconds":null,"max_views":null}"#).unwrap();
        assert_eq!(draft.ttl_seconds, None);
        assert_eq!(draft.max_views, None);
    }

    #[test]
    fn draft_validation_matches_field_validation() {
        let draft = PasteDraft {
            content: "x".to_string(),
            ttl_seconds: Some(0),
            max_views: None,
        };
        assert_eq!(message(validate_draft(&draft).map(|_| draft.clone())), TTL_MESSAGE);

        let draft = PasteDraft {
            content: " ".to_string(),
            ttl_seconds: None,
            max_views: Some(0),
        };
        assert_eq!(message(validate_draft(&draft).map(|_| draft.clone())), CONTENT_MESSAGE);
    }
}
