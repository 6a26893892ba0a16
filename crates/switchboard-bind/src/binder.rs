//! The bind algorithm: one typed value out of one request.

use bytes::Bytes;
use serde_json::Value;
use switchboard_core::RequestParts;

use crate::descriptor::{Bind, BindingPlan};
use crate::multipart::{collect_parts, PartMap};
use crate::BindError;

/// How the structured body is decoded, chosen by Content-Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Multipart,
}

fn classify(content_type: Option<&str>) -> Result<BodyKind, BindError> {
    let Some(content_type) = content_type else {
        // No declared type: the original wire format, JSON.
        return Ok(BodyKind::Json);
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "" | "application/json" => Ok(BodyKind::Json),
        "application/x-www-form-urlencoded" => Ok(BodyKind::Form),
        "multipart/form-data" => Ok(BodyKind::Multipart),
        other => Err(BindError::unsupported_media_type(other)),
    }
}

/// Binds a typed value from a request using a compiled plan.
///
/// The sequence is fixed: decode the structured body into the value's
/// `serde` fields, then apply each header binding, then resolve each file
/// binding against the multipart parts. The request is not retained after
/// return.
///
/// # Errors
///
/// Returns a [`BindError`] for an unparsable body, an undecodable content
/// type, a missing required header or file part, a failed header
/// conversion, or a file part over its declared size limit.
pub async fn bind<T: Bind>(plan: &BindingPlan<T>, parts: &RequestParts) -> Result<T, BindError> {
    let kind = classify(parts.content_type())?;

    let (mut value, mut part_map) = match kind {
        BodyKind::Json => (decode_json::<T>(parts.body())?, None),
        BodyKind::Form => (decode_form::<T>(parts.body())?, None),
        BodyKind::Multipart => {
            let map = collect_parts(parts.headers(), parts.body().clone()).await?;
            let value = decode_text_parts::<T>(&map)?;
            (value, Some(map))
        }
    };

    for header in &plan.headers {
        match parts.header(&header.name) {
            Some(raw) => (header.apply)(&mut value, raw)
                .map_err(|details| BindError::invalid_header(&header.name, details))?,
            None if header.required => return Err(BindError::missing_header(&header.name)),
            None => {}
        }
    }

    for binding in &plan.files {
        let file = part_map
            .as_mut()
            .and_then(|map: &mut PartMap| map.take_file(&binding.part));

        match file {
            Some(file) => {
                if let Some(limit) = binding.limit {
                    if file.len() > limit {
                        return Err(BindError::part_too_large(&binding.part, limit, file.len()));
                    }
                }
                (binding.apply)(&mut value, file);
            }
            None if binding.required => return Err(BindError::missing_part(&binding.part)),
            None => {}
        }
    }

    Ok(value)
}

fn decode_json<T: Bind>(body: &Bytes) -> Result<T, BindError> {
    if body.is_empty() {
        return Err(BindError::malformed_body("empty request body"));
    }
    serde_json::from_slice(body).map_err(|e| BindError::malformed_body(e.to_string()))
}

fn decode_form<T: Bind>(body: &Bytes) -> Result<T, BindError> {
    serde_urlencoded::from_bytes(body).map_err(|e| BindError::malformed_body(e.to_string()))
}

/// Body-tagged fields of a multipart request come from its text parts,
/// assembled into a JSON object so one struct can mix body and file
/// fields in a single upload form.
fn decode_text_parts<T: Bind>(parts: &PartMap) -> Result<T, BindError> {
    let object: serde_json::Map<String, Value> = parts
        .texts()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();

    serde_json::from_value(Value::Object(object)).map_err(|e| BindError::malformed_body(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{parse_scalar, BindingDescriptor};
    use crate::multipart::UploadedFile;
    use http::Method;
    use serde::Deserialize;

    #[derive(Deserialize, Default, Debug)]
    struct Submission {
        #[serde(default)]
        title: String,
        #[serde(skip)]
        priority: u32,
        #[serde(skip)]
        trace_id: Option<String>,
        #[serde(skip)]
        attachment: Option<UploadedFile>,
    }

    impl Bind for Submission {
        fn descriptor() -> BindingDescriptor<Self> {
            BindingDescriptor::new()
                .header("x-priority", |s: &mut Self, v| {
                    s.priority = parse_scalar(v)?;
                    Ok(())
                })
                .header("x-trace-id", |s, v| {
                    s.trace_id = Some(v.to_string());
                    Ok(())
                })
                .file("attachment", Some("1024"), |s, f| s.attachment = Some(f))
        }
    }

    #[derive(Deserialize, Debug)]
    struct StrictHeaders {
        #[serde(default)]
        _ignored: Option<String>,
        #[serde(skip)]
        api_key: String,
    }

    impl Bind for StrictHeaders {
        fn descriptor() -> BindingDescriptor<Self> {
            BindingDescriptor::new().required_header("x-api-key", |s: &mut Self, v| {
                s.api_key = v.to_string();
                Ok(())
            })
        }
    }

    fn plan<T: Bind>() -> BindingPlan<T> {
        T::descriptor().compile().unwrap()
    }

    fn json_request(body: &str) -> RequestParts {
        RequestParts::builder()
            .method(Method::POST)
            .uri("/submissions")
            .header("content-type", "application/json")
            .body(body.to_string())
            .build()
    }

    fn multipart_request(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> RequestParts {
        let body = crate::multipart::tests::multipart_body(boundary, parts);
        RequestParts::builder()
            .method(Method::POST)
            .uri("/submissions")
            .header(
                "content-type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)
            .build()
    }

    #[tokio::test]
    async fn test_bind_json_body() {
        let parts = json_request(r#"{"title": "hello"}"#);
        let bound: Submission = bind(&plan(), &parts).await.unwrap();

        assert_eq!(bound.title, "hello");
        assert_eq!(bound.priority, 0);
        assert!(bound.attachment.is_none());
    }

    #[tokio::test]
    async fn test_bind_malformed_json() {
        let parts = json_request(r#"{"title": unterminated"#);
        let err = bind::<Submission>(&plan(), &parts).await.unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_BODY");
    }

    #[tokio::test]
    async fn test_bind_empty_body() {
        let parts = json_request("");
        let err = bind::<Submission>(&plan(), &parts).await.unwrap_err();
        assert!(err.to_string().contains("empty request body"));
    }

    #[tokio::test]
    async fn test_bind_form_encoded_body() {
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/submissions")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("title=from+a+form")
            .build();

        let bound: Submission = bind(&plan(), &parts).await.unwrap();
        assert_eq!(bound.title, "from a form");
    }

    #[tokio::test]
    async fn test_bind_unsupported_media_type() {
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/submissions")
            .header("content-type", "text/csv")
            .body("a,b,c")
            .build();

        let err = bind::<Submission>(&plan(), &parts).await.unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_optional_header_missing_keeps_default() {
        let parts = json_request(r#"{"title": "x"}"#);
        let bound: Submission = bind(&plan(), &parts).await.unwrap();

        assert_eq!(bound.priority, 0);
        assert!(bound.trace_id.is_none());
    }

    #[tokio::test]
    async fn test_optional_header_present_is_converted() {
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/submissions")
            .header("content-type", "application/json")
            .header("x-priority", "7")
            .header("x-trace-id", "trace-1")
            .body(r#"{"title": "x"}"#)
            .build();

        let bound: Submission = bind(&plan(), &parts).await.unwrap();
        assert_eq!(bound.priority, 7);
        assert_eq!(bound.trace_id.as_deref(), Some("trace-1"));
    }

    #[tokio::test]
    async fn test_header_conversion_failure() {
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/submissions")
            .header("content-type", "application/json")
            .header("x-priority", "urgent")
            .body(r#"{"title": "x"}"#)
            .build();

        let err = bind::<Submission>(&plan(), &parts).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_HEADER");
        assert!(err.to_string().contains("x-priority"));
    }

    #[tokio::test]
    async fn test_required_header_missing() {
        let parts = json_request(r#"{}"#);
        let err = bind::<StrictHeaders>(&plan(), &parts).await.unwrap_err();
        assert_eq!(err.error_code(), "MISSING_HEADER");
        assert!(err.to_string().contains("x-api-key"));
    }

    #[tokio::test]
    async fn test_required_header_present() {
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/submissions")
            .header("content-type", "application/json")
            .header("x-api-key", "secret")
            .body(r#"{}"#)
            .build();

        let bound: StrictHeaders = bind(&plan(), &parts).await.unwrap();
        assert_eq!(bound.api_key, "secret");
    }

    #[tokio::test]
    async fn test_file_at_exact_limit_succeeds() {
        let data = vec![0u8; 1024];
        let parts = multipart_request(
            "----b",
            &[("title", None, b"x"), ("attachment", Some("a.bin"), &data)],
        );

        let bound: Submission = bind(&plan(), &parts).await.unwrap();
        let file = bound.attachment.unwrap();
        assert_eq!(file.len(), 1024);
        assert_eq!(bound.title, "x");
    }

    #[tokio::test]
    async fn test_file_over_limit_names_limit() {
        let data = vec![0u8; 1025];
        let parts = multipart_request(
            "----b",
            &[("title", None, b"x"), ("attachment", Some("a.bin"), &data)],
        );

        let err = bind::<Submission>(&plan(), &parts).await.unwrap_err();
        assert_eq!(err.error_code(), "FILE_PART_TOO_LARGE");
        assert!(err.to_string().contains("max 1024 bytes"));
        assert!(err.to_string().contains("1025"));
    }

    #[tokio::test]
    async fn test_optional_file_omitted_is_skipped() {
        let parts = multipart_request("----b", &[("title", None, b"no attachment")]);

        let bound: Submission = bind(&plan(), &parts).await.unwrap();
        assert!(bound.attachment.is_none());
        assert_eq!(bound.title, "no attachment");
    }

    #[tokio::test]
    async fn test_required_file_missing() {
        #[derive(Deserialize, Default, Debug)]
        struct NeedsFile {
            #[serde(skip)]
            doc: Option<UploadedFile>,
        }
        impl Bind for NeedsFile {
            fn descriptor() -> BindingDescriptor<Self> {
                BindingDescriptor::new().required_file("doc", None, |n: &mut Self, f| n.doc = Some(f))
            }
        }

        let parts = multipart_request("----b", &[("other", None, b"x")]);
        let err = bind::<NeedsFile>(&plan(), &parts).await.unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FILE_PART");
    }

    #[tokio::test]
    async fn test_multipart_text_parts_fill_body_fields() {
        let parts = multipart_request(
            "----b",
            &[
                ("title", None, b"from multipart"),
                ("attachment", Some("a.txt"), b"data"),
            ],
        );

        let bound: Submission = bind(&plan(), &parts).await.unwrap();
        assert_eq!(bound.title, "from multipart");
        assert!(bound.attachment.is_some());
    }

    #[test]
    fn test_classify_content_types() {
        assert_eq!(classify(None).unwrap(), BodyKind::Json);
        assert_eq!(
            classify(Some("application/json; charset=utf-8")).unwrap(),
            BodyKind::Json
        );
        assert_eq!(
            classify(Some("application/x-www-form-urlencoded")).unwrap(),
            BodyKind::Form
        );
        assert_eq!(
            classify(Some("multipart/form-data; boundary=x")).unwrap(),
            BodyKind::Multipart
        );
        assert!(classify(Some("text/plain")).is_err());
    }
}
