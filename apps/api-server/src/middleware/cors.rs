//! CORS policy.

use actix_cors::Cors;
use actix_web::http::Uri;

use crate::config::CorsConfig;

/// Permissive in development, otherwise limited to the portal origins plus
/// whatever `API_ALLOW_ORIGINS` adds.
///
/// A `*` entry opens the policy to any origin. Entries that are not valid
/// origins are logged and skipped so a bad setting cannot stop the server.
pub fn cors_middleware(config: &CorsConfig) -> Cors {
    if config.allow_any {
        return Cors::permissive();
    }

    let base = if config.origins.iter().any(|o| o.trim() == "*") {
        Cors::default().allow_any_origin()
    } else {
        config
            .origins
            .iter()
            .map(|o| o.trim())
            .filter(|origin| match origin.parse::<Uri>() {
                Ok(_) if !origin.is_empty() => true,
                _ => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    false
                }
            })
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    base.allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use actix_web::http::header;
    use actix_web::{App, HttpResponse, test, web};

    use super::*;

    fn origins(list: &[&str]) -> CorsConfig {
        CorsConfig {
            allow_any: false,
            origins: list.iter().map(|o| o.to_string()).collect(),
        }
    }

    async fn allowed_origin(config: CorsConfig, origin: &str) -> Option<String> {
        let app = test::init_service(
            App::new()
                .wrap(cors_middleware(&config))
                .route("/health", web::get().to(HttpResponse::Ok)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, origin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[actix_web::test]
    async fn wildcard_entry_allows_any_origin() {
        let config = origins(&["https://portal.example", "*"]);
        assert_eq!(
            allowed_origin(config, "https://elsewhere.example").await.as_deref(),
            Some("https://elsewhere.example")
        );
    }

    #[actix_web::test]
    async fn invalid_entries_are_skipped() {
        let config = origins(&["not a uri", "", "https://portal.example"]);
        assert_eq!(
            allowed_origin(config.clone(), "https://portal.example").await.as_deref(),
            Some("https://portal.example")
        );
        assert_eq!(allowed_origin(config, "https://elsewhere.example").await, None);
    }
}
