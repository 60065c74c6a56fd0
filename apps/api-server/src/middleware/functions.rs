//! Azure Functions custom-handler adapter.
//!
//! The function host forwards requests with the function route prefix still
//! on the path (`/api/posts`). This middleware strips it before routing so
//! the same routes serve both the standalone and the serverless host.

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Uri,
    http::uri::PathAndQuery,
};
use std::future::{Ready, ready};
use std::rc::Rc;

/// Prefix removed from the current request, as `/api`. Handlers use it to
/// build `Location` headers the caller can follow.
#[derive(Debug, Clone)]
pub struct RoutePrefix(pub String);

/// Middleware that removes a fixed route prefix.
#[derive(Clone)]
pub struct FunctionsPrefix {
    prefix: Option<Rc<str>>,
}

impl FunctionsPrefix {
    pub fn new(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix
                .map(|p| p.trim_matches('/'))
                .filter(|p| !p.is_empty())
                .map(|p| Rc::from(format!("/{p}"))),
        }
    }
}

/// The path with `prefix` removed, or `None` if it does not start with it.
fn strip<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    match path.strip_prefix(prefix)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

impl<S, B> Transform<S, ServiceRequest> for FunctionsPrefix
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = FunctionsPrefixService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(FunctionsPrefixService {
            service,
            prefix: self.prefix.clone(),
        }))
    }
}

pub struct FunctionsPrefixService<S> {
    service: S,
    prefix: Option<Rc<str>>,
}

impl<S, B> Service<ServiceRequest> for FunctionsPrefixService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        if let Some(prefix) = &self.prefix {
            let uri = &req.head().uri;
            if let Some(path) = strip(uri.path(), prefix) {
                let rewritten = match uri.query() {
                    Some(query) => format!("{path}?{query}"),
                    None => path.to_string(),
                };

                let mut parts = uri.clone().into_parts();
                parts.path_and_query = PathAndQuery::from_maybe_shared(rewritten).ok();
                match Uri::from_parts(parts) {
                    Ok(uri) => {
                        req.match_info_mut().get_mut().update(&uri);
                        req.head_mut().uri = uri;
                        req.extensions_mut().insert(RoutePrefix(prefix.to_string()));
                    }
                    Err(e) => tracing::warn!(error = %e, "Could not strip route prefix"),
                }
            }
        }

        self.service.call(req)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpRequest, HttpResponse, test, web};

    use super::*;

    #[::core::prelude::v1::test]
    fn strips_only_whole_segments() {
        assert_eq!(strip("/api/posts", "/api"), Some("/posts"));
        assert_eq!(strip("/api", "/api"), Some("/"));
        assert_eq!(strip("/apiary", "/api"), None);
        assert_eq!(strip("/posts", "/api"), None);
    }

    #[actix_web::test]
    async fn prefixed_and_bare_paths_reach_the_same_route() {
        let app = test::init_service(
            App::new()
                .wrap(FunctionsPrefix::new(Some("api")))
                .route(
                    "/posts",
                    web::get().to(|req: HttpRequest| async move {
                        let prefix = req
                            .extensions()
                            .get::<RoutePrefix>()
                            .map(|p| p.0.clone())
                            .unwrap_or_default();
                        HttpResponse::Ok().body(format!("{prefix}|{}", req.query_string()))
                    }),
                ),
        )
        .await;

        let prefixed = test::call_and_read_body(
            &app,
            test::TestRequest::get().uri("/api/posts?top=2").to_request(),
        )
        .await;
        assert_eq!(prefixed, "/api|top=2");

        let bare =
            test::call_and_read_body(&app, test::TestRequest::get().uri("/posts").to_request())
                .await;
        assert_eq!(bare, "|");
    }
}
