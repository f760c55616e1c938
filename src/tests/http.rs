//! The client and workflow driven against a local HTTP server.

use mime::IMAGE_PNG;
use serde_json::json;
use std::path::Path;

use super::stub::{Reply, StubServer};
use crate::{
    config::{Config, API_KEY_VAR, BASE_URL_VAR},
    service::{Error as ServiceError, GenerativeService},
    summary, ClientError, Gemini, Model,
};

const JETPACK_PNG: &[u8] = include_bytes!("../../tests/fixtures/jetpack.png");
const SESSION: &str = "upload/v1beta/files?upload_id=jetpack-session&upload_protocol=resumable";

fn gemini(server: &StubServer, base: &str) -> Gemini {
    Gemini::with_model_and_base_url("test-key", Model::default(), server.url(base)).unwrap()
}

fn uploaded_file(uri: &str) -> serde_json::Value {
    json!({
        "file": {
            "name": "files/jetpack-123",
            "displayName": "Jetpack drawing",
            "mimeType": "image/png",
            "sizeBytes": "18",
            "uri": uri,
            "state": "ACTIVE"
        }
    })
}

fn summary_response(texts: &[&str]) -> serde_json::Value {
    let candidates: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(index, text)| {
            json!({
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP",
                "index": index
            })
        })
        .collect();
    json!({ "candidates": candidates })
}

#[tokio::test]
async fn upload_opens_a_session_then_finalizes_it() {
    let server = StubServer::bind().await;
    let gemini = gemini(&server, "proxy/v1beta/");
    let session = server.url(&format!("proxy/{SESSION}"));
    let stub = server.serve(vec![
        Reply::json(200, json!({})).with_header("X-Goog-Upload-URL", session.as_str()),
        Reply::json(200, uploaded_file("https://example.test/v1beta/files/jetpack-123")),
    ]);

    let file = gemini
        .create_file(JETPACK_PNG)
        .display_name("Jetpack drawing")
        .with_mime_type(IMAGE_PNG)
        .upload()
        .await
        .unwrap();

    assert_eq!(file.name, "files/jetpack-123");
    assert_eq!(
        file.uri.unwrap().as_str(),
        "https://example.test/v1beta/files/jetpack-123"
    );

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);

    let start = &requests[0];
    assert_eq!(start.method, "POST");
    assert_eq!(start.target, "/proxy/upload/v1beta/files");
    assert_eq!(start.header("x-goog-api-key"), Some("test-key"));
    assert_eq!(start.header("x-goog-upload-protocol"), Some("resumable"));
    assert_eq!(start.header("x-goog-upload-command"), Some("start"));
    assert_eq!(start.header("x-goog-upload-header-content-length"), Some("18"));
    assert_eq!(start.header("x-goog-upload-header-content-type"), Some("image/png"));
    assert_eq!(start.json(), json!({ "file": { "displayName": "Jetpack drawing" } }));

    let finalize = &requests[1];
    assert_eq!(finalize.method, "POST");
    assert_eq!(finalize.target, format!("/proxy/{SESSION}"));
    assert_eq!(finalize.header("x-goog-api-key"), Some("test-key"));
    assert_eq!(finalize.header("x-goog-upload-command"), Some("upload, finalize"));
    assert_eq!(finalize.header("x-goog-upload-offset"), Some("0"));
    assert_eq!(finalize.body, JETPACK_PNG);
}

#[tokio::test]
async fn upload_without_session_header_stops_after_start() {
    let server = StubServer::bind().await;
    let gemini = gemini(&server, "v1beta/");
    let stub = server.serve(vec![Reply::json(200, json!({}))]);

    let err = gemini.create_file(JETPACK_PNG).upload().await.unwrap_err();

    match err {
        ClientError::MissingResponseHeader { header } => assert_eq!(header, "x-goog-upload-url"),
        other => panic!("expected a missing header error, got {other:?}"),
    }

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, "/upload/v1beta/files");
    assert_eq!(
        requests[0].header("x-goog-upload-header-content-type"),
        Some("application/octet-stream")
    );
    assert_eq!(requests[0].json(), json!({ "file": {} }));
}

#[tokio::test]
async fn rejected_request_becomes_bad_response() {
    let server = StubServer::bind().await;
    let gemini = gemini(&server, "v1beta/");
    let stub = server.serve(vec![Reply::json(
        403,
        json!({
            "error": {
                "code": 403,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "PERMISSION_DENIED"
            }
        }),
    )]);

    let err = gemini
        .create_file(JETPACK_PNG)
        .with_mime_type(IMAGE_PNG)
        .upload()
        .await
        .unwrap_err();

    match err {
        ClientError::BadResponse { code, description } => {
            assert_eq!(code, 403);
            assert!(description.unwrap().contains("API key not valid"));
        }
        other => panic!("expected a bad response, got {other:?}"),
    }
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn generate_posts_file_and_prompt_to_the_model_endpoint() {
    let server = StubServer::bind().await;
    let gemini = gemini(&server, "v1beta/");
    let stub = server.serve(vec![
        Reply::json(200, summary_response(&["A person flying with a jetpack."])),
        Reply::json(200, summary_response(&[])),
    ]);
    let file_uri = "https://example.test/v1beta/files/jetpack-123";

    let response = gemini
        .generate_content()
        .with_file_and_text(file_uri, "image/png", "Produce a summary of this image.")
        .execute()
        .await
        .unwrap();
    assert_eq!(
        response.candidates[0].text().as_deref(),
        Some("A person flying with a jetpack.")
    );

    let response = gemini
        .generate_content()
        .with_model("gemini-2.5-flash")
        .with_file_and_text(file_uri, "image/png", "Produce a summary of this image.")
        .execute()
        .await
        .unwrap();
    assert!(response.candidates.is_empty());

    let requests = stub.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(
        requests[0].target,
        "/v1beta/models/gemini-1.5-pro:generateContent"
    );
    assert_eq!(requests[0].header("x-goog-api-key"), Some("test-key"));
    assert_eq!(
        requests[0].json(),
        json!({
            "contents": [{
                "parts": [
                    { "fileData": { "mimeType": "image/png", "fileUri": file_uri } },
                    { "text": "Produce a summary of this image." }
                ],
                "role": "user"
            }]
        })
    );
    assert_eq!(
        requests[1].target,
        "/v1beta/models/gemini-2.5-flash:generateContent"
    );
}

#[tokio::test]
async fn service_upload_without_uri_is_unreferenceable() {
    let server = StubServer::bind().await;
    let gemini = gemini(&server, "v1beta/");
    let session = server.url(SESSION);
    let stub = server.serve(vec![
        Reply::json(200, json!({})).with_header("x-goog-upload-url", session.as_str()),
        Reply::json(200, json!({ "file": { "name": "files/jetpack-123" } })),
    ]);

    let err = GenerativeService::upload(&gemini, JETPACK_PNG.to_vec(), "Jetpack drawing", IMAGE_PNG)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Unreferenceable { .. }));
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn service_upload_then_generate() {
    let server = StubServer::bind().await;
    let gemini = gemini(&server, "v1beta/");
    let session = server.url(SESSION);
    let file_uri = "https://example.test/v1beta/files/jetpack-123";
    let stub = server.serve(vec![
        Reply::json(200, json!({})).with_header("x-goog-upload-url", session.as_str()),
        Reply::json(200, json!({ "file": { "name": "files/jetpack-123", "uri": file_uri } })),
        Reply::json(200, summary_response(&["A jetpack sketch."])),
    ]);

    let file = gemini
        .upload(JETPACK_PNG.to_vec(), "Jetpack drawing", IMAGE_PNG)
        .await
        .unwrap();
    assert_eq!(file.uri.as_str(), file_uri);
    assert_eq!(file.display_name, "Jetpack drawing");
    assert_eq!(file.mime_type, IMAGE_PNG);

    let candidates = gemini
        .generate(&file, "Produce a summary of this image.", &Model::Gemini25Pro)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);

    let requests = stub.requests();
    assert_eq!(
        requests[2].target,
        "/v1beta/models/gemini-2.5-pro:generateContent"
    );
    assert_eq!(
        requests[2].json()["contents"][0]["parts"][0]["fileData"]["fileUri"],
        file_uri
    );
}

#[tokio::test]
async fn service_generate_failure_is_a_client_error() {
    let server = StubServer::bind().await;
    let gemini = gemini(&server, "v1beta/");
    let stub = server.serve(vec![Reply::json(
        503,
        json!({ "error": { "code": 503, "message": "The model is overloaded." } }),
    )]);
    let file = crate::UploadedFile {
        uri: "https://example.test/v1beta/files/jetpack-123".parse().unwrap(),
        display_name: "Jetpack drawing".into(),
        mime_type: IMAGE_PNG,
    };

    let err = gemini
        .generate(&file, "Produce a summary of this image.", &Model::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Client {
            source: ClientError::BadResponse { code: 503, .. }
        }
    ));
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn execute_prints_summaries_from_a_prefixed_base_url() {
    let server = StubServer::bind().await;
    let base_url = server.url("gemini/v1beta").to_string();
    let session = server.url(&format!("gemini/{SESSION}"));
    let file_uri = "https://example.test/v1beta/files/jetpack-123";
    let stub = server.serve(vec![
        Reply::json(200, json!({})).with_header("x-goog-upload-url", session.as_str()),
        Reply::json(200, uploaded_file(file_uri)),
        Reply::json(
            200,
            summary_response(&["A person flying with a jetpack.", "A sketch."]),
        ),
    ]);
    let config = Config::from_lookup(|var| match var {
        API_KEY_VAR => Some("test-key".to_string()),
        BASE_URL_VAR => Some(base_url.clone()),
        _ => None,
    })
    .unwrap()
    .with_image_path(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/jetpack.png"));
    let mut out = Vec::new();

    summary::execute(&config, &mut out).await.unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!(
            "File Jetpack drawing uploaded successfully: \"{file_uri}\"\n\
             Image summary: A person flying with a jetpack.\n\
             Image summary: A sketch.\n"
        )
    );
    let targets: Vec<_> = stub.requests().into_iter().map(|r| r.target).collect();
    assert_eq!(
        targets,
        vec![
            "/gemini/upload/v1beta/files".to_string(),
            format!("/gemini/{SESSION}"),
            "/gemini/v1beta/models/gemini-1.5-pro:generateContent".to_string(),
        ]
    );
}
