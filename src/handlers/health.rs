use actix_web::{HttpResponse, web};
use chrono::Utc;

use crate::models::HealthResponse;
use crate::services::{OcrProvider, Tutor};

pub async fn health(tutor: web::Data<Tutor>, ocr: web::Data<dyn OcrProvider>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        service: "mathtutor",
        time: Utc::now(),
        model: tutor.model_name(),
        ocr: ocr.provider_id(),
    })
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::services_with_ocr;
    use crate::services::UnconfiguredOcr;
    use actix_web::{App, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn reports_status_and_collaborators() {
        let services = services_with_ocr(Arc::new(UnconfiguredOcr));
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "stub");
        assert_eq!(body["ocr"], "none");
    }
}
