//! JSON rendering of command results and failures.

use learning::{ErrorKind, LearningError};
use serde::Serialize;
use serde_json::{json, Value};

pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::BadRequest => "bad_request",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Forbidden => "forbidden",
        ErrorKind::Internal => "internal",
    }
}

/// Error body reported at the boundary. Validation failures carry a
/// `fields` object mapping field names to messages.
pub fn error_body(err: &LearningError) -> Value {
    let mut body = json!({
        "status": err.status_code(),
        "error": kind_name(err.kind()),
        "message": err.to_string(),
    });
    if let Some(fields) = err.field_errors() {
        body["fields"] = json!(fields.fields());
    }
    body
}

#[cfg(test)]
mod tests {
    use learning::ValidationErrors;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn validation_errors_list_every_field() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "must be a valid email address");
        errors.add("name", "must not be blank");

        let body = error_body(&LearningError::Validation(errors));

        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["fields"]["name"], "must not be blank");
        assert_eq!(body["fields"].as_object().map(|f| f.len()), Some(2));
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (LearningError::not_found("course", "c1"), 404),
            (LearningError::bad_request("rating 9"), 400),
            (LearningError::forbidden("not enrolled"), 403),
            (LearningError::conflict("duplicate"), 409),
            (LearningError::internal("disk full"), 500),
        ];
        for (err, status) in cases {
            let body = error_body(&err);
            assert_eq!(body["status"], status);
            assert!(body.get("fields").is_none());
        }
    }
}
