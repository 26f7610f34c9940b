use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

fn api_headers() -> [(HeaderName, &'static str); 6] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "DENY"),
        (header::CONTENT_SECURITY_POLICY, "default-src 'none'; frame-ancestors 'none'"),
        (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
        // Ticket codes are bearer credentials; keep them out of shared caches.
        (header::CACHE_CONTROL, "no-store"),
        (
            HeaderName::from_static("permissions-policy"),
            "geolocation=(), microphone=(), camera=()",
        ),
    ]
}

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Adds the API security headers to every response. HSTS only makes
/// sense behind HTTPS, so it is limited to production.
pub fn with_security_headers(router: Router, include_hsts: bool) -> Router {
    if include_hsts {
        tracing::info!("Security: HSTS header enabled (production mode)");
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
    }

    let mut router = api_headers().into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ))
    });

    if include_hsts {
        router = router.layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        ));
    }
    router
}
