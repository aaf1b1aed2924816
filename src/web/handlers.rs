use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use tower_sessions::Session;

use crate::error::{FeeError, Result};
use crate::models::FeeRecord;
use crate::session::WorkbookBinding;
use crate::uploads::{is_accepted, save_upload, ACCEPTED_EXTENSIONS};
use crate::web::{pages, AppState};

pub const NO_FILE_MESSAGE: &str = "\u{274c} No Excel file uploaded yet.";
const UPLOAD_FIELD: &str = "excel_file";

impl IntoResponse for FeeError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingStore => format!("\u{274c} {self}").into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response()
            }
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FeeError::Other(format!("worker task failed: {e}")))?
}

pub(crate) async fn form_handler(State(state): State<AppState>) -> Html<String> {
    Html(pages::form_page(&state.settings.school_name))
}

pub(crate) async fn thanks_handler() -> Html<&'static str> {
    Html(pages::THANKS_PAGE)
}

pub(crate) async fn submit_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Redirect> {
    let binding = WorkbookBinding::load(&session).await?;
    let record = FeeRecord::from_form(&form);
    let notifier = Arc::clone(&state.notifier);
    blocking(move || binding.append_record(&record, &notifier)).await?;
    Ok(Redirect::to("/thanks"))
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Ok((StatusCode::BAD_REQUEST, e.body_text()).into_response()),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return Ok((StatusCode::BAD_REQUEST, e.body_text()).into_response()),
        };
        upload = Some((file_name, data));
        break;
    }

    let Some((file_name, data)) = upload else {
        return Ok((StatusCode::BAD_REQUEST, "No file part in the request").into_response());
    };
    if file_name.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "No selected file").into_response());
    }
    if !is_accepted(&file_name) {
        let message = format!(
            "Unsupported file type. Upload one of: .{}",
            ACCEPTED_EXTENSIONS.join(", .")
        );
        return Ok((StatusCode::BAD_REQUEST, message).into_response());
    }

    let upload_dir = state.settings.upload_dir();
    let path = blocking(move || save_upload(&upload_dir, &file_name, &data)).await?;

    let mut binding = WorkbookBinding::load(&session).await?;
    binding.bind_workbook(path);
    binding.save(&session).await?;
    if let Some(path) = binding.path() {
        tracing::info!(store = %path.display(), "session bound to upload");
    }
    Ok(Html(pages::UPLOAD_OK).into_response())
}

pub(crate) async fn preview_handler(session: Session) -> Result<Response> {
    let binding = WorkbookBinding::load(&session).await?;
    let rows = blocking(move || binding.read_all()).await;
    Ok(match rows {
        Ok(rows) => Html(pages::preview(&rows)).into_response(),
        Err(FeeError::MissingStore) => NO_FILE_MESSAGE.into_response(),
        Err(e) => format!("\u{26a0}\u{fe0f} Error reading Excel file: {e}").into_response(),
    })
}
