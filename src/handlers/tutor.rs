use actix_web::{HttpResponse, web};

use crate::error::{AppError, AppResult};
use crate::models::{AnalyzeRequest, HintRequest, HintResponse};
use crate::services::Tutor;

fn require_problem_text(problem_text: Option<&str>) -> AppResult<&str> {
    problem_text
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AppError::BadRequest("Câmpul \"problemText\" este obligatoriu.".to_string()))
}

/// `POST /api/gemini/analyze`
pub async fn analyze_problem(
    payload: web::Json<AnalyzeRequest>,
    tutor: web::Data<Tutor>,
) -> AppResult<HttpResponse> {
    let problem_text = require_problem_text(payload.problem_text.as_deref())?;
    log::info!("🧮 Analyzing problem ({} chars) with {}", problem_text.len(), tutor.model_name());

    let analysis = tutor.analyze(problem_text).await?;
    Ok(HttpResponse::Ok().json(analysis))
}

/// `POST /api/gemini/hint`: one hint for one step, no session kept server-side.
pub async fn next_hint(
    payload: web::Json<HintRequest>,
    tutor: web::Data<Tutor>,
) -> AppResult<HttpResponse> {
    let problem_text = require_problem_text(payload.problem_text.as_deref())?;

    let reply = tutor
        .hint_provider()
        .generate_hint(problem_text, payload.step_index)
        .await?;
    Ok(HttpResponse::Ok().json(HintResponse {
        step_index: payload.step_index,
        content: reply.content,
        is_final: reply.is_final.unwrap_or(false),
    }))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::services_with_ocr;
    use crate::services::UnconfiguredOcr;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn analyze_returns_stub_analysis() {
        let services = services_with_ocr(Arc::new(UnconfiguredOcr));
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/gemini/analyze")
            .set_json(serde_json::json!({ "problemText": "x^2 - 5x + 6 = 0" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["problemText"], "x^2 - 5x + 6 = 0");
        assert_eq!(body["steps"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["steps"][0]["title"], "Identifică datele");
        assert!(body["caveats"][0].as_str().is_some());
    }

    #[actix_web::test]
    async fn analyze_requires_problem_text() {
        let services = services_with_ocr(Arc::new(UnconfiguredOcr));
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        for payload in [serde_json::json!({}), serde_json::json!({ "problemText": "   " })] {
            let req = test::TestRequest::post()
                .uri("/api/gemini/analyze")
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn hint_endpoint_serves_one_step() {
        let services = services_with_ocr(Arc::new(UnconfiguredOcr));
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/gemini/hint")
            .set_json(serde_json::json!({ "problemText": "2x = 4", "stepIndex": 2 }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["stepIndex"], 2);
        assert_eq!(body["isFinal"], true);
        assert!(!body["content"].as_str().unwrap_or_default().is_empty());
    }
}
