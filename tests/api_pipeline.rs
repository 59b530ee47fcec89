//! Router-level tests of the request pipeline.

mod common;

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::{json_body, manual_state, peer, request, test_config};
use dfd_api::http::build_router;
use dfd_api::security::headers::SECURITY_HEADERS;

fn json(value: serde_json::Value) -> Body {
    Body::from(value.to_string())
}

#[tokio::test]
async fn test_health_reports_clock_time() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    let response = router
        .oneshot(request(Method::GET, "/api/health", peer(1), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "DFD API is running");
    assert_eq!(body["timestamp"], "2026-01-15T12:00:00.000Z");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    for (method, uri) in [
        (Method::GET, "/api/health"),
        (Method::GET, "/api/missing"),
        (Method::DELETE, "/api/contact"),
    ] {
        let response = router
            .clone()
            .oneshot(request(method, uri, peer(1), Body::empty()))
            .await
            .unwrap();
        for (name, value) in SECURITY_HEADERS {
            assert_eq!(response.headers()[name], value, "{} on {}", name, uri);
        }
        assert!(response.headers().contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn test_wrong_method_is_405_json() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    let response = router
        .oneshot(request(Method::GET, "/api/contact", peer(1), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(response).await, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn test_unknown_route_is_404_json() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    let response = router
        .oneshot(request(Method::GET, "/api/nope", peer(1), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_contact_missing_email_is_padded_400() {
    let config = test_config();
    let target = Duration::from_millis(config.latency.target_ms);
    let (state, _clock) = manual_state(config);
    let router = build_router(state);

    let started = Instant::now();
    let response = router
        .oneshot(request(
            Method::POST,
            "/api/contact",
            peer(1),
            json(json!({"name": "Ana", "message": "Olá"})),
        ))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Request failed"}));
    assert!(elapsed >= target, "answered after {:?}", elapsed);
    assert!(elapsed < target + Duration::from_secs(2));
}

#[tokio::test]
async fn test_padded_routes_pad_every_branch() {
    let mut config = test_config();
    config.rate_limit.max_requests = 1;
    let target = Duration::from_millis(config.latency.target_ms);
    let (state, _clock) = manual_state(config);
    let router = build_router(state);
    let valid = || json(json!({"name": "Ana", "email": "ana@b.co", "message": "Oi"}));

    // Spend the budget of the client used for the 429 case.
    let response = router
        .clone()
        .oneshot(request(Method::POST, "/api/contact", peer(30), valid()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cases = [
        ("contact ok", request(Method::POST, "/api/contact", peer(31), valid()), StatusCode::OK),
        ("probe ok", request(Method::GET, "/api/rate-limit", peer(32), Body::empty()), StatusCode::OK),
        (
            "invalid body",
            request(Method::POST, "/api/contact", peer(33), json(json!({"name": "Ana"}))),
            StatusCode::BAD_REQUEST,
        ),
        (
            "missing csrf",
            request(Method::POST, "/api/improve-text", peer(34), json(json!({"text": "oi"}))),
            StatusCode::FORBIDDEN,
        ),
        (
            "wrong method",
            request(Method::GET, "/api/contact", peer(35), Body::empty()),
            StatusCode::METHOD_NOT_ALLOWED,
        ),
        (
            "rate limited",
            request(Method::POST, "/api/contact", peer(30), valid()),
            StatusCode::TOO_MANY_REQUESTS,
        ),
    ];

    for (name, req, expected) in cases {
        let started = Instant::now();
        let response = router.clone().oneshot(req).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(response.status(), expected, "{}", name);
        assert!(elapsed >= target, "{} answered after {:?}", name, elapsed);
    }
}

#[tokio::test]
async fn test_contact_success() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    let response = router
        .oneshot(request(
            Method::POST,
            "/api/contact",
            peer(1),
            json(json!({
                "name": "Ana Souza",
                "email": "ana@prefeitura.gov.br",
                "message": "Preciso de ajuda com o DFD."
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    let response = router
        .oneshot(request(Method::POST, "/api/contact", peer(1), Body::from("{not json")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_400() {
    let mut config = test_config();
    config.security.max_body_size = 128;
    let (state, _clock) = manual_state(config);
    let router = build_router(state);

    let response = router
        .oneshot(request(
            Method::POST,
            "/api/contact",
            peer(1),
            json(json!({"name": "a", "email": "a@b.co", "message": "x".repeat(500)})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Request failed"}));
}

#[tokio::test]
async fn test_sixth_probe_reports_exhausted_window() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    let mut bodies = Vec::new();
    for _ in 0..6 {
        let response = router
            .clone()
            .oneshot(request(Method::GET, "/api/rate-limit", peer(7), Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(json_body(response).await);
    }

    assert_eq!(bodies[0]["remainingRequests"], 4);
    assert_eq!(bodies[0]["maxRequests"], 5);
    assert_eq!(bodies[0]["windowMs"], 60_000);
    assert_eq!(bodies[4]["remainingRequests"], 0);
    assert_eq!(bodies[4]["success"], true);
    assert_eq!(bodies[5]["remainingRequests"], 0);
    assert_eq!(bodies[5]["success"], false);
}

#[tokio::test]
async fn test_contact_rate_limited_until_window_elapses() {
    let (state, clock) = manual_state(test_config());
    let router = build_router(state);
    let contact = || {
        request(
            Method::POST,
            "/api/contact",
            peer(9),
            json(json!({"name": "Ana", "email": "ana@b.co", "message": "Oi"})),
        )
    };

    for _ in 0..5 {
        let response = router.clone().oneshot(contact()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router.clone().oneshot(contact()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Too many requests, please try again later"})
    );

    // Other clients keep their own budget.
    let other = request(Method::GET, "/api/rate-limit", peer(10), Body::empty());
    let body = json_body(router.clone().oneshot(other).await.unwrap()).await;
    assert_eq!(body["remainingRequests"], 4);

    clock.advance(60_001);
    let response = router.oneshot(contact()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_header_ignored_unless_trusted() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    for i in 0..6u8 {
        let mut req = request(Method::GET, "/api/rate-limit", peer(20), Body::empty());
        req.headers_mut()
            .insert("x-forwarded-for", format!("192.0.2.{}", i).parse().unwrap());
        let body = json_body(router.clone().oneshot(req).await.unwrap()).await;
        if i == 5 {
            assert_eq!(body["success"], false);
        }
    }

    let mut config = test_config();
    config.security.trust_forwarded_headers = true;
    let (state, _clock) = manual_state(config);
    let router = build_router(state);

    for i in 0..6u8 {
        let mut req = request(Method::GET, "/api/rate-limit", peer(20), Body::empty());
        req.headers_mut()
            .insert("x-forwarded-for", format!("192.0.2.{}, 10.0.0.1", i).parse().unwrap());
        let body = json_body(router.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["remainingRequests"], 4);
    }
}

#[tokio::test]
async fn test_csrf_token_endpoint_sets_cookie() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);

    for uri in ["/api/csrf-token", "/api/csrf"] {
        let response = router
            .clone()
            .oneshot(request(Method::GET, uri, peer(1), Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(cookie.starts_with("csrf_token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=3600"));

        let body = json_body(response).await;
        let token = body["token"].as_str().unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(cookie.contains(token));
        assert_eq!(body["expires"], common::START_MILLIS + 3_600_000);
    }
}

async fn fetch_token(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(request(Method::GET, "/api/csrf-token", peer(1), Body::empty()))
        .await
        .unwrap();
    json_body(response).await["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_improve_text_requires_valid_csrf() {
    let (state, clock) = manual_state(test_config());
    let router = build_router(state);
    let improve = |token: Option<&str>| {
        let mut req = request(
            Method::POST,
            "/api/improve-text",
            peer(3),
            json(json!({"text": "o dfd   precisa de revisão.  a equipe de ti aprova."})),
        );
        if let Some(token) = token {
            req.headers_mut().insert("x-csrf-token", token.parse().unwrap());
        }
        req
    };

    let response = router.clone().oneshot(improve(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await, json!({"error": "Request failed"}));

    let token = fetch_token(&router).await;
    let response = router.clone().oneshot(improve(Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["improvedText"],
        "O DFD precisa de revisão. A equipe de TI aprova."
    );

    clock.advance(3_600_001);
    let response = router.oneshot(improve(Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_improve_text_blank_context_ignored() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);
    let token = fetch_token(&router).await;

    for context in [json!(""), json!("   "), json!(null)] {
        let mut req = request(
            Method::POST,
            "/api/improve-text",
            peer(6),
            json(json!({"text": "o etp está pronto.", "context": context})),
        );
        req.headers_mut().insert("x-csrf-token", token.parse().unwrap());
        let response = router.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "context {}", context);
        assert_eq!(json_body(response).await["improvedText"], "O ETP está pronto.");
    }
}

#[tokio::test]
async fn test_contact_rejects_bad_token_when_present() {
    let (state, _clock) = manual_state(test_config());
    let router = build_router(state);
    let token = fetch_token(&router).await;

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == '0' { '1' } else { '0' });

    let mut req = request(
        Method::POST,
        "/api/contact",
        peer(4),
        json(json!({"name": "Ana", "email": "ana@b.co", "message": "Oi"})),
    );
    req.headers_mut().insert("x-csrf-token", tampered.parse().unwrap());
    let response = router.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut req = request(
        Method::POST,
        "/api/contact",
        peer(4),
        json(json!({"name": "Ana", "email": "ana@b.co", "message": "Oi"})),
    );
    req.headers_mut().insert("x-csrf-token", token.parse().unwrap());
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_contact_requires_token_when_configured() {
    let mut config = test_config();
    config.csrf.require_for_contact = true;
    let (state, _clock) = manual_state(config);
    let router = build_router(state);

    let response = router
        .oneshot(request(
            Method::POST,
            "/api/contact",
            peer(5),
            json(json!({"name": "Ana", "email": "ana@b.co", "message": "Oi"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
