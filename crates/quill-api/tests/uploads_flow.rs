mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};

use common::TestApp;

const BOUNDARY: &str = "quill-test-boundary";

fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn uploaded_image_is_stored_and_served() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request("image", "cat.PNG", b"not really a png"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let path = body["path"].as_str().unwrap().to_string();
    assert!(path.starts_with("/uploads/"));
    assert!(path.ends_with(".png"));

    let stored = app.uploads.path().join(path.trim_start_matches("/uploads/"));
    assert_eq!(std::fs::read(&stored).unwrap(), b"not really a png");

    let response_body = {
        use http_body_util::BodyExt;
        use tower::ServiceExt;

        let request = Request::builder().uri(&path).body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.into_body().collect().await.unwrap().to_bytes()
    };
    assert_eq!(&response_body[..], b"not really a png");
}

#[tokio::test]
async fn client_file_name_never_becomes_a_path() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request("image", "../../escape.sh/x", b"data"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let path = body["path"].as_str().unwrap();
    assert!(!path.contains(".."));
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn wrong_field_or_empty_file_is_rejected() {
    let app = TestApp::new();

    let (status, _) = app.send(multipart_request("file", "a.png", b"data")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(multipart_request("image", "a.png", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Uploaded file is empty");
}

#[tokio::test]
async fn non_multipart_body_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .request(Method::POST, "/upload", None, Some(serde_json::json!({ "x": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_upload_is_a_json_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/uploads/missing.png", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found - /uploads/missing.png");
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_413() {
    let app = TestApp::with_config(|config| config.max_upload_bytes = 64);

    let (status, body) = app
        .send(multipart_request("image", "big.png", &[7u8; 1024]))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["message"].is_string());
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}
