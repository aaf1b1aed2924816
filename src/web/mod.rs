pub mod handlers;
pub mod pages;
mod request_tracing;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::error::Result;
use crate::models::HEADER;
use crate::notifier::Notifier;
use crate::settings::Settings;
use crate::store;

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub fn new(settings: Settings, notifier: Notifier) -> Self {
        Self {
            settings: Arc::new(settings),
            notifier: Arc::new(notifier),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    Router::new()
        .route(
            "/",
            get(handlers::form_handler).post(handlers::submit_handler),
        )
        .route("/thanks", get(handlers::thanks_handler))
        .route("/upload_excel", post(handlers::upload_handler))
        .route("/view_excel", get(handlers::preview_handler))
        .layer(sessions)
        .layer(from_fn(request_tracing::request_tracing_middleware))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Create the default store if needed, then serve the form until the process is stopped.
pub async fn serve(settings: Settings) -> Result<()> {
    let store_path = settings.default_store_path();
    if store::create(&store_path, &HEADER)? {
        tracing::info!(path = %store_path.display(), "created default store");
    }

    let notifier = Notifier::from_settings(&settings);
    let listener = TcpListener::bind(&settings.bind).await?;
    tracing::info!(
        addr = %settings.bind,
        uploads = %settings.upload_dir().display(),
        notifier = notifier.channel_name(),
        "feebook server starting"
    );
    println!("Serving on http://{}", settings.bind);

    axum::serve(listener, build_router(AppState::new(settings, notifier))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sample_fields, FORM_FIELDS};
    use crate::notifier::OutgoingMessage;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "feebook-test-boundary";

    struct Harness {
        _dir: tempfile::TempDir,
        settings: Settings,
        router: Router,
        sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    }

    fn harness() -> Harness {
        harness_with(Notifier::recording)
    }

    fn harness_with(
        make_notifier: impl FnOnce(&Settings) -> (Notifier, Arc<Mutex<Vec<OutgoingMessage>>>),
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: dir.path().join("uploaded_excels").to_string_lossy().to_string(),
            ..Settings::default()
        };
        let (notifier, sent) = make_notifier(&settings);
        let router = build_router(AppState::new(settings.clone(), notifier));
        Harness {
            _dir: dir,
            settings,
            router,
            sent,
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        let raw = response.headers()[header::SET_COOKIE].to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    fn multipart_request(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::post("/upload_excel")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        request
    }

    fn preview_request(cookie: &str) -> Request<Body> {
        Request::get("/view_excel")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    fn submission(cookie: Option<&str>) -> Request<Body> {
        let encoded: Vec<String> = FORM_FIELDS
            .iter()
            .zip(sample_fields())
            .map(|(k, v)| format!("{k}={}", v.replace('@', "%40").replace(' ', "+")))
            .collect();
        let mut builder = Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(encoded.join("&"))).unwrap()
    }

    fn template_store(h: &Harness) -> Vec<u8> {
        let path = h.settings.upload_dir().join("template.xlsx");
        store::create(&path, &HEADER).unwrap();
        std::fs::read(&path).unwrap()
    }

    #[tokio::test]
    async fn test_form_page_lists_fields() {
        let h = harness();
        let response = h
            .router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("name=\"student_id\""));
        assert!(body.contains("Kunjeer Public School"));
    }

    #[tokio::test]
    async fn test_submit_without_upload_is_rejected() {
        let h = harness();
        let response = h.router.clone().oneshot(submission(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Please upload an Excel file first"));
        assert!(h.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_without_upload() {
        let h = harness();
        let response = h
            .router
            .oneshot(Request::get("/view_excel").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, handlers::NO_FILE_MESSAGE);
    }

    #[tokio::test]
    async fn test_upload_requires_file_field() {
        let h = harness();
        let response = h
            .router
            .clone()
            .oneshot(multipart_request("other", "fees.xlsx", b"x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "No file part in the request");

        let response = h
            .router
            .oneshot(multipart_request("excel_file", "", b"x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "No selected file");
    }

    #[tokio::test]
    async fn test_upload_submit_and_preview() {
        let h = harness();
        let data = template_store(&h);

        let response = h
            .router
            .clone()
            .oneshot(multipart_request("excel_file", "../fees.xlsx", &data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert!(body_text(response).await.contains("File uploaded successfully"));

        let response = h
            .router
            .clone()
            .oneshot(submission(Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/thanks");

        let response = h
            .router
            .clone()
            .oneshot(
                Request::get("/view_excel")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_text(response).await;
        assert!(body.contains("<th>Student ID</th>"));
        assert!(body.contains("<td>Asha Rao</td>"));
        assert!(body.contains("<td>p@x.com</td>"));

        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "whatsapp:+919876543210");
    }

    #[tokio::test]
    async fn test_submit_after_store_removed() {
        let h = harness();
        let data = template_store(&h);
        let response = h
            .router
            .clone()
            .oneshot(multipart_request("excel_file", "fees.xlsx", &data))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        for entry in std::fs::read_dir(h.settings.upload_dir()).unwrap() {
            let path = entry.unwrap().path();
            if path.file_name().unwrap().to_string_lossy().starts_with("fees-") {
                std::fs::remove_file(path).unwrap();
            }
        }

        let response = h
            .router
            .oneshot(submission(Some(&cookie)))
            .await
            .unwrap();
        assert!(body_text(response).await.contains("Please upload an Excel file first"));
        assert!(h.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_reports_unreadable_store() {
        let h = harness();
        let response = h
            .router
            .clone()
            .oneshot(multipart_request("excel_file", "notes.xlsx", b"not a workbook"))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let response = h
            .router
            .clone()
            .oneshot(
                Request::get("/view_excel")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Error reading Excel file"));

        let response = h
            .router
            .oneshot(submission(Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upload_rejects_other_spreadsheet_formats() {
        let h = harness();
        let data = template_store(&h);
        let response = h
            .router
            .clone()
            .oneshot(multipart_request("excel_file", "fees.xlsx", &data))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        for name in ["fees.ods", "fees.xls"] {
            let response = h
                .router
                .clone()
                .oneshot(with_cookie(multipart_request("excel_file", name, b"PK"), &cookie))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(body_text(response).await.contains("Unsupported file type"));
        }

        // The session still points at the xlsx upload and keeps accepting appends.
        for _ in 0..2 {
            let response = h
                .router
                .clone()
                .oneshot(submission(Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }
        let response = h.router.clone().oneshot(preview_request(&cookie)).await.unwrap();
        let body = body_text(response).await;
        assert_eq!(body.matches("<td>Asha Rao</td>").count(), 2);

        let stored: Vec<String> = std::fs::read_dir(h.settings.upload_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(stored.iter().all(|name| name.ends_with(".xlsx")));
    }

    #[tokio::test]
    async fn test_malformed_multipart_is_bad_request() {
        let h = harness();
        let request = Request::post("/upload_excel")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from("this body has no boundary at all"))
            .unwrap();
        let response = h.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_ne!(body_text(response).await, "No file part in the request");
    }

    #[tokio::test]
    async fn test_failed_notification_still_redirects() {
        let h = harness_with(|settings| {
            (
                Notifier::failing(settings, "gateway down"),
                Arc::new(Mutex::new(Vec::new())),
            )
        });
        let data = template_store(&h);
        let response = h
            .router
            .clone()
            .oneshot(multipart_request("excel_file", "fees.xlsx", &data))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let response = h
            .router
            .clone()
            .oneshot(submission(Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/thanks");

        let response = h.router.oneshot(preview_request(&cookie)).await.unwrap();
        assert!(body_text(response).await.contains("<td>Asha Rao</td>"));
    }
}
