use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use saldo_extract::PipelineError;
use saldo_oracle::{OracleError, VisionOracle};
use saldo_pdf::{PdfError, PdfToolkit};

use crate::state::AppState;

// User-facing messages, verbatim from the product copy.
const NO_FILE: &str = "No llegó archivo PDF.";
const NOT_PDF: &str = "Solo se permite PDF";
const NEEDS_PASSWORD: &str = "Este PDF está protegido. Escribe el password para procesarlo.";
const BAD_PASSWORD: &str = "Password incorrecto o no se pudo desencriptar.";
const NO_API_KEY: &str = "Falta OPENAI_API_KEY en .env";

/// `POST /api/upload`: multipart form with a `pdf` file and an optional
/// `password` text field. The uploaded bytes live in a guard-deleted temp
/// file for exactly the duration of the request.
pub async fn upload<P, O>(
    State(state): State<AppState<P, O>>,
    mut multipart: Multipart,
) -> Response
where
    P: PdfToolkit + 'static,
    O: VisionOracle + 'static,
{
    let mut pdf_bytes = None;
    let mut file_name = None;
    let mut content_type = None;
    let mut password = String::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name() {
                Some("pdf") => {
                    file_name = field.file_name().map(str::to_string);
                    content_type = field.content_type().map(str::to_string);
                    match field.bytes().await {
                        Ok(bytes) => pdf_bytes = Some(bytes),
                        Err(_) => return reject(StatusCode::BAD_REQUEST, NO_FILE),
                    }
                }
                Some("password") => password = field.text().await.unwrap_or_default(),
                _ => {}
            },
            Ok(None) => break,
            Err(_) => return reject(StatusCode::BAD_REQUEST, NO_FILE),
        }
    }

    let Some(bytes) = pdf_bytes else {
        return reject(StatusCode::BAD_REQUEST, NO_FILE);
    };
    if !is_pdf(content_type.as_deref(), file_name.as_deref()) {
        return reject(StatusCode::BAD_REQUEST, NOT_PDF);
    }

    let upload = match tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile_in(&state.uploads_dir)
    {
        Ok(file) => file,
        Err(e) => return reject(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };
    if let Err(e) = tokio::fs::write(upload.path(), &bytes).await {
        return reject(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }
    tracing::info!(
        "upload {:?} ({} bytes)",
        file_name.as_deref().unwrap_or("?"),
        bytes.len(),
    );

    let password = password.trim();
    let password = (!password.is_empty()).then_some(password);

    match state.pipeline.process(upload.path(), password).await {
        Ok(report) => {
            tracing::info!(
                "{} movements from pages {:?} (scanned={})",
                report.movements.len(),
                report.pages,
                report.scanned,
            );
            Json(json!({
                "ok": true,
                "modo": if report.scanned { "vision_scanned" } else { "vision" },
                "encrypted": report.encrypted,
                "pages_detected": report.pages,
                "movimientos": report.movements,
            }))
            .into_response()
        }
        Err(err) => {
            let (status, message) = status_for(&err);
            tracing::warn!("upload rejected ({status}): {err}");
            reject(status, &message)
        }
    }
}

fn is_pdf(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|n| n.to_lowercase().ends_with(".pdf"))
}

fn status_for(err: &PipelineError) -> (StatusCode, String) {
    match err {
        PipelineError::PasswordRequired => {
            (StatusCode::UNAUTHORIZED, NEEDS_PASSWORD.to_string())
        }
        PipelineError::Pdf(PdfError::WrongPassword) => {
            (StatusCode::UNAUTHORIZED, BAD_PASSWORD.to_string())
        }
        PipelineError::Oracle(OracleError::MissingApiKey) => {
            (StatusCode::SERVICE_UNAVAILABLE, NO_API_KEY.to_string())
        }
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": message }))).into_response()
}
