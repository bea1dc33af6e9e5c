//! Form extractors accepting multipart, urlencoded and JSON bodies.
//!
//! Every body is flattened into one field map so a single `Validate` type
//! covers browsers posting forms and clients posting JSON. Text values are
//! trimmed and empty strings become `null`, so a blank required field fails
//! validation the same way a missing one does.

use crate::errors::AppError;
use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{Method, header},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors};

/// Form field that carries an overriding HTTP method, e.g. `_method=PUT`
pub const METHOD_FIELD: &str = "_method";

pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// File part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Non-empty, named, and declared as `image/*`
    pub fn is_image(&self) -> bool {
        !self.file_name.is_empty()
            && !self.bytes.is_empty()
            && self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("image/"))
    }

    /// Lower-cased extension of the client file name, if it has one
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
    }
}

/// Unvalidated form body.
///
/// Use this directly when a handler must inspect the method override before
/// validation runs; otherwise prefer [`ValidatedForm`].
#[derive(Debug, Default)]
pub struct FormPayload {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
    pub method_override: Option<Method>,
}

impl FormPayload {
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    /// Deserialize the fields into `T` and run its validation rules.
    pub fn validate<T>(self) -> Result<ValidatedForm<T>, AppError>
    where
        T: DeserializeOwned + Validate,
    {
        let data: T = serde_json::from_value(Value::Object(self.fields)).map_err(|e| {
            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("invalid_type");
            error.message = Some(e.to_string().into());
            errors.add("body", error);
            AppError::ValidationError(errors)
        })?;

        data.validate()?;

        Ok(ValidatedForm {
            data,
            files: self.files,
        })
    }

    async fn read_multipart<S: Send + Sync>(req: Request, state: &S) -> Result<Self, AppError> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut payload = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field.bytes().await?;
                    payload.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let text = field.text().await?;
                    payload.fields.insert(name, Value::String(text));
                }
            }
        }

        Ok(payload)
    }

    async fn read_urlencoded<S: Send + Sync>(req: Request, state: &S) -> Result<Self, AppError> {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state).await?;

        Ok(Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
            ..Self::default()
        })
    }

    async fn read_json<S: Send + Sync>(req: Request, state: &S) -> Result<Self, AppError> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;

        match value {
            Value::Object(fields) => Ok(Self {
                fields,
                ..Self::default()
            }),
            _ => Err(AppError::BadRequest("Expected a JSON object".to_string())),
        }
    }

    fn normalize(mut self, header_override: Option<Method>) -> Self {
        for value in self.fields.values_mut() {
            if let Value::String(text) = value {
                let trimmed = text.trim();
                *value = if trimmed.is_empty() {
                    Value::Null
                } else {
                    Value::String(trimmed.to_string())
                };
            }
        }

        let field_override = self
            .fields
            .remove(METHOD_FIELD)
            .and_then(|v| v.as_str().and_then(parse_method));
        self.method_override = header_override.or(field_override);
        self
    }
}

fn parse_method(raw: &str) -> Option<Method> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes()).ok()
}

impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let header_override = req
            .headers()
            .get(METHOD_OVERRIDE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_method);

        let mime = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());

        let payload = match mime.as_deref() {
            Some("multipart/form-data") => Self::read_multipart(req, state).await?,
            Some("application/x-www-form-urlencoded") => Self::read_urlencoded(req, state).await?,
            Some(m) if m == "application/json" || m.ends_with("+json") => {
                Self::read_json(req, state).await?
            }
            // No body declared, every field is missing
            None => Self::default(),
            Some(other) => {
                return Err(AppError::UnsupportedMediaType(format!(
                    "Unsupported content type: {}",
                    other
                )));
            }
        };

        Ok(payload.normalize(header_override))
    }
}

/// Validated form body plus any uploaded files.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateThing {
///     #[validate(required)]
///     name: Option<String>,
/// }
///
/// async fn create(form: ValidatedForm<CreateThing>) -> StatusCode {
///     let image = form.file("image");
///     StatusCode::CREATED
/// }
/// ```
#[derive(Debug)]
pub struct ValidatedForm<T> {
    pub data: T,
    pub files: Vec<UploadedFile>,
}

impl<T> ValidatedForm<T> {
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }
}

impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        FormPayload::from_request(req, state).await?.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(required)]
        name: Option<String>,
    }

    fn request(content_type: &str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_urlencoded_fields_are_trimmed_and_override_extracted() {
        let req = request(
            "application/x-www-form-urlencoded",
            "name=+Widget+&description=&_method=put",
        );
        let payload = FormPayload::from_request(req, &()).await.unwrap();

        assert_eq!(payload.fields["name"], "Widget");
        assert_eq!(payload.fields["description"], Value::Null);
        assert!(!payload.fields.contains_key(METHOD_FIELD));
        assert_eq!(payload.method_override, Some(Method::PUT));
    }

    #[tokio::test]
    async fn test_header_override_wins() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .header(METHOD_OVERRIDE_HEADER, "PATCH")
            .body(Body::from(r#"{"_method":"PUT"}"#))
            .unwrap();
        let payload = FormPayload::from_request(req, &()).await.unwrap();

        assert_eq!(payload.method_override, Some(Method::PATCH));
    }

    #[tokio::test]
    async fn test_multipart_splits_text_and_files() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"name\"\r\n\r\n",
            "Widget\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"image\"; filename=\"Photo.PNG\"\r\n",
            "Content-Type: image/png\r\n\r\n",
            "PNGDATA\r\n",
            "--XBOUNDARY--\r\n",
        );
        let req = request("multipart/form-data; boundary=XBOUNDARY", body);
        let payload = FormPayload::from_request(req, &()).await.unwrap();

        assert_eq!(payload.fields["name"], "Widget");
        let image = payload.file("image").unwrap();
        assert_eq!(image.file_name, "Photo.PNG");
        assert_eq!(image.bytes.as_ref(), b"PNGDATA");
        assert!(image.is_image());
        assert_eq!(image.extension().as_deref(), Some("png"));
    }

    #[tokio::test]
    async fn test_validated_form_rejects_blank_required_field() {
        let req = request("application/json", r#"{"name":"   "}"#);
        let err = ValidatedForm::<Named>::from_request(req, &()).await.unwrap_err();

        assert!(matches!(err, AppError::ValidationError(ref e) if e.field_errors().contains_key("name")));
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let req = request("text/plain", "name=Widget");
        let err = FormPayload::from_request(req, &()).await.unwrap_err();

        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_is_image_requires_image_content_type_and_bytes() {
        let mut file = UploadedFile {
            field: "image".into(),
            file_name: "notes.txt".into(),
            content_type: Some("text/plain".into()),
            bytes: Bytes::from_static(b"hello"),
        };
        assert!(!file.is_image());

        file.content_type = Some("image/jpeg".into());
        assert!(file.is_image());

        file.bytes = Bytes::new();
        assert!(!file.is_image());
    }
}
