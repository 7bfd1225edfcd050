use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, web};
use log::info;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::AppResult;
use crate::handlers;
use crate::services::{OcrProvider, SymbolTable, Tutor, ocr_provider_from_config};

/// Shared, read-only services handed to every worker.
#[derive(Clone)]
pub struct AppServices {
    config: web::Data<Config>,
    tutor: web::Data<Tutor>,
    ocr: web::Data<dyn OcrProvider>,
    symbols: web::Data<SymbolTable>,
}

impl AppServices {
    pub fn new(
        config: Config,
        tutor: Tutor,
        ocr: Arc<dyn OcrProvider>,
        symbols: SymbolTable,
    ) -> Self {
        Self {
            config: web::Data::new(config),
            tutor: web::Data::new(tutor),
            ocr: web::Data::from(ocr),
            symbols: web::Data::new(symbols),
        }
    }

    pub fn from_config(config: Config) -> AppResult<Self> {
        let tutor = Tutor::from_config(&config)?;
        let ocr = ocr_provider_from_config(&config)?;
        Ok(Self::new(config, tutor, ocr, SymbolTable::romanian_math()))
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.tutor.clone())
            .app_data(self.ocr.clone())
            .app_data(self.symbols.clone())
            .app_data(web::PayloadConfig::new(self.config.max_upload_bytes))
            .app_data(web::JsonConfig::default().limit(1024 * 1024))
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/api")
                    .route("/ocr/upload", web::post().to(handlers::upload_image))
                    .route("/gemini/analyze", web::post().to(handlers::analyze_problem))
                    .route("/gemini/hint", web::post().to(handlers::next_hint)),
            )
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(serde_json::json!({ "error": "Not Found" }))
            }));
    }
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let bind_address = config.bind_address();
    let services = AppServices::from_config(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    print_banner(&bind_address);
    info!("Server running at http://{}/", bind_address);
    let startup_time = Instant::now();

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| services.configure(cfg))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("Server stopped. Uptime: {:?}", startup_time.elapsed());
    Ok(())
}

fn print_banner(bind_address: &str) {
    let banner = r#"
  __  __       _   _     _____      _
 |  \/  | __ _| |_| |__ |_   _|   _| |_ ___  _ __
 | |\/| |/ _` | __| '_ \  | || | | | __/ _ \| '__|
 | |  | | (_| | |_| | | | | || |_| | || (_) | |
 |_|  |_|\__,_|\__|_| |_| |_| \__,_|\__\___/|_|
"#;
    println!("{}", banner);
    println!("         MathTutor server started at: http://{}\n", bind_address);
}
