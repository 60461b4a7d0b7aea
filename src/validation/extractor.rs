use crate::error::TallywardError;
use axum::{Json, extract::Request};
use serde::Deserialize;
use validator::Validate;

/// Wrapper for validated JSON request bodies.
///
/// Deserialization failures map to 400, rule violations to 422 with one
/// `field: message` pair per failed rule.
pub struct ValidatedJson<T>(pub T);

impl<T, S> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: for<'de> Deserialize<'de> + Validate + Send,
    S: Send + Sync,
{
    type Rejection = TallywardError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| TallywardError::bad_request(format!("Invalid JSON: {e}")))?;

        json.0.validate().map_err(|errors| {
            let error_messages: Vec<String> = errors
                .field_errors()
                .iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        let msg = error
                            .message
                            .as_ref()
                            .map(|m| m.as_ref())
                            .unwrap_or_else(|| error.code.as_ref());
                        format!("{field}: {msg}")
                    })
                })
                .collect();

            TallywardError::validation(error_messages.join(", "))
        })?;

        Ok(ValidatedJson(json.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{StatusCode, header};

    #[derive(Deserialize, Validate)]
    struct TestRequest {
        #[validate(email)]
        email: String,
        #[validate(length(min = 8))]
        password: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let req = json_request(r#"{"email":"ana@exemplo.com.br","password":"correta-e-longa"}"#);

        let ValidatedJson(parsed) = ValidatedJson::<TestRequest>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(parsed.email, "ana@exemplo.com.br");
    }

    #[tokio::test]
    async fn test_rule_violations_map_to_unprocessable() {
        let req = json_request(r#"{"email":"not-an-address","password":"curta"}"#);

        let err = ValidatedJson::<TestRequest>::from_request(req, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let message = err.to_string();
        assert!(message.contains("email"));
        assert!(message.contains("password"));
    }

    #[tokio::test]
    async fn test_malformed_json_maps_to_bad_request() {
        let req = json_request("{not json");

        let err = ValidatedJson::<TestRequest>::from_request(req, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
