use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use saldo_oracle::VisionOracle;
use saldo_pdf::PdfToolkit;

use crate::state::AppState;
use crate::upload;

/// Hard cap on upload size.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Create the router with all routes and layers.
pub fn create_router<P, O>(state: AppState<P, O>) -> Router
where
    P: PdfToolkit + 'static,
    O: VisionOracle + 'static,
{
    Router::new()
        .route("/api/upload", post(upload::upload::<P, O>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use saldo_core::{RawAmount, RawMovement, Tuning};
    use saldo_extract::StatementPipeline;
    use saldo_oracle::{MockOracle, OracleError};
    use saldo_pdf::StubToolkit;

    const BOUNDARY: &str = "saldo-test-boundary";

    fn file_field(name: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut field = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        field.extend_from_slice(data);
        field.extend_from_slice(b"\r\n");
        field
    }

    fn text_field(name: &str, value: &str) -> Vec<u8> {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .into_bytes()
    }

    fn request(fields: Vec<Vec<u8>>) -> Request<Body> {
        let mut body = Vec::new();
        for field in fields {
            body.extend_from_slice(&field);
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn pdf_field() -> Vec<u8> {
        file_field("pdf", "estado.pdf", "application/pdf", b"%PDF-1.7 test")
    }

    struct TestApp {
        router: Router,
        oracle: Arc<MockOracle>,
        stub: Arc<StubToolkit>,
        dir: tempfile::TempDir,
    }

    fn test_app(stub: StubToolkit, oracle: MockOracle) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let scratch = dir.path().join("tmp");
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::create_dir_all(&scratch).unwrap();

        let stub = Arc::new(stub);
        let oracle = Arc::new(oracle);
        let pipeline =
            StatementPipeline::new(stub.clone(), oracle.clone(), Tuning::default(), scratch);
        let router = create_router(AppState::new(pipeline, uploads));
        TestApp {
            router,
            oracle,
            stub,
            dir,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn raw(fecha: &str, concepto: &str, retiros: f64, depositos: f64, saldo: f64) -> RawMovement {
        RawMovement {
            fecha: Some(fecha.to_string()),
            concepto: Some(concepto.to_string()),
            retiros: Some(RawAmount::Number(retiros)),
            depositos: Some(RawAmount::Number(depositos)),
            saldo: Some(RawAmount::Number(saldo)),
        }
    }

    #[tokio::test]
    async fn missing_file_is_a_400() {
        let app = test_app(StubToolkit::plain(1, ""), MockOracle::new());

        let response = app
            .router
            .oneshot(request(vec![text_field("password", "x")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "No llegó archivo PDF.");
    }

    #[tokio::test]
    async fn non_pdf_upload_is_a_400() {
        let app = test_app(StubToolkit::plain(1, ""), MockOracle::new());

        let response = app
            .router
            .oneshot(request(vec![file_field(
                "pdf",
                "notas.txt",
                "text/plain",
                b"not a pdf",
            )]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Solo se permite PDF");
        assert!(app.oracle.calls().is_empty());
    }

    #[tokio::test]
    async fn pdf_extension_alone_is_enough() {
        let oracle = MockOracle::new().script_pages(vec![1]).script_movements(vec![]);
        let app = test_app(StubToolkit::plain(1, ""), oracle);

        let response = app
            .router
            .oneshot(request(vec![file_field(
                "pdf",
                "ESTADO.PDF",
                "application/octet-stream",
                b"%PDF",
            )]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn encrypted_without_password_is_a_401_and_no_oracle_call() {
        let app = test_app(StubToolkit::encrypted(3, "", "hunter2"), MockOracle::new());

        let response = app.router.oneshot(request(vec![pdf_field()])).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "Este PDF está protegido. Escribe el password para procesarlo."
        );
        assert!(app.oracle.calls().is_empty());
        assert!(app.stub.rendered().is_empty());
    }

    #[tokio::test]
    async fn blank_password_counts_as_missing() {
        let app = test_app(StubToolkit::encrypted(3, "", "hunter2"), MockOracle::new());

        let response = app
            .router
            .oneshot(request(vec![pdf_field(), text_field("password", "   ")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_a_401() {
        let app = test_app(StubToolkit::encrypted(3, "", "hunter2"), MockOracle::new());

        let response = app
            .router
            .oneshot(request(vec![pdf_field(), text_field("password", "nope")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Password incorrecto o no se pudo desencriptar.");
        assert!(app.oracle.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_503() {
        // No key: the relevance batch fails softly, then extraction fails
        // hard with the same error.
        let oracle = MockOracle::new()
            .script_pages_error(OracleError::MissingApiKey)
            .script_movements_error(OracleError::MissingApiKey);
        let app = test_app(StubToolkit::plain(1, ""), oracle);

        let response = app.router.oneshot(request(vec![pdf_field()])).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Falta OPENAI_API_KEY en .env");
    }

    #[tokio::test]
    async fn pipeline_failures_are_a_500_with_the_message() {
        let oracle = MockOracle::new()
            .script_pages(vec![1])
            .script_movements_error(OracleError::Decode {
                detail: "not json".to_string(),
                raw: "garbage".to_string(),
            });
        let app = test_app(StubToolkit::plain(1, ""), oracle);

        let response = app.router.oneshot(request(vec![pdf_field()])).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert!(json["error"].as_str().unwrap().contains("not json"));
    }

    #[tokio::test]
    async fn successful_upload_reports_rows_with_spanish_keys() {
        let oracle = MockOracle::new().script_pages(vec![2]).script_movements(vec![
            raw("2024-05-01", "DEPOSITO NOMINA", 0.0, 1500.0, 1500.0),
            raw("2024-05-02", "PAGO SERVICIOS", 300.0, 0.0, 1200.0),
        ]);
        let app = test_app(StubToolkit::plain(3, ""), oracle);

        let response = app.router.oneshot(request(vec![pdf_field()])).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["modo"], "vision_scanned");
        assert_eq!(json["encrypted"], false);
        assert_eq!(json["pages_detected"], serde_json::json!([2]));
        let rows = json["movimientos"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["fecha"], "2024-05-01");
        assert_eq!(rows[0]["concepto"], "DEPOSITO NOMINA");
        assert_eq!(rows[1]["retiros"], 300.0);
        assert_eq!(rows[1]["saldo"], 1200.0);

        // The upload temp file is gone once the response is out.
        let uploads = app.dir.path().join("uploads");
        assert_eq!(std::fs::read_dir(uploads).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn decrypted_upload_reports_encrypted_true() {
        let oracle = MockOracle::new().script_pages(vec![1]).script_movements(vec![]);
        let app = test_app(StubToolkit::encrypted(1, "", "hunter2"), oracle);

        let response = app
            .router
            .oneshot(request(vec![pdf_field(), text_field("password", "hunter2")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["encrypted"], true);
        assert_eq!(json["movimientos"], serde_json::json!([]));
    }
}
