//! API document generation and mounting.

use axum::{routing::get, Json, Router};
use utoipa::{
    openapi::{
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
        server::Server,
        ComponentsBuilder, Info, OpenApi,
    },
    Modify,
};

/// Name the bearer scheme is registered under.
pub const SECURITY_SCHEME: &str = "header";

pub const DOCUMENT_VERSION: &str = "1.0";

/// Stamps title, version, server path and the bearer scheme onto a document.
pub struct DocumentAddon<'a> {
    pub title: &'a str,
    pub prefix: &'a str,
}

impl Modify for DocumentAddon<'_> {
    fn modify(&self, openapi: &mut OpenApi) {
        let description = openapi.info.description.take();
        openapi.info = Info::new(self.title, DOCUMENT_VERSION);
        openapi.info.description = description;

        let base = if self.prefix.is_empty() { "/" } else { self.prefix };
        openapi.servers = Some(vec![Server::new(base)]);

        openapi
            .components
            .get_or_insert_with(|| ComponentsBuilder::new().build())
            .add_security_scheme(
                SECURITY_SCHEME,
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
    }
}

/// Build the served document from a service's base document.
pub fn build_document(mut base: OpenApi, title: &str, prefix: &str) -> OpenApi {
    DocumentAddon { title, prefix }.modify(&mut base);
    base
}

/// Strip trailing slashes; `""` and `"/"` both mean root.
pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_string()
}

/// Mount `routes` under `prefix`, with the document at the prefix itself
/// and at `{prefix}-json`.
pub fn mount(routes: Router, prefix: &str, document: OpenApi) -> Router {
    let document = Json(document);
    let serve = move || {
        let document = document.clone();
        async move { document }
    };

    if prefix.is_empty() {
        return routes.route("/", get(serve));
    }

    let alias = format!("{prefix}-json");
    Router::new()
        .nest(prefix, routes.route("/", get(serve.clone())))
        .route(&alias, get(serve))
}
