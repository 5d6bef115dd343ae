//! End-to-end lookups through a running relay and a mock portal.

use std::time::Duration;

use serde_json::{json, Value};

mod common;

const JANE: &str = r#"{"email_address":"jane.doe@dlsl.edu.ph","name":"Jane Doe"}"#;

#[tokio::test]
async fn test_found_student_is_relayed_verbatim() {
    let portal = common::start_mock_portal(|_| (200, JANE.to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    let res = common::client()
        .get(relay.url("/api/student?id=12345"))
        .send()
        .await
        .expect("Relay unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(res.text().await.unwrap(), JANE);

    let calls = portal.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].fields,
        vec![
            ("action".to_string(), "registration_tapregister".to_string()),
            ("regKey".to_string(), "test-reg-key".to_string()),
            ("card_tag".to_string(), "12345".to_string()),
        ]
    );
    assert_eq!(
        calls[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_card_tag_without_email_is_not_found() {
    let portal = common::start_mock_portal(|_| (200, "{}".to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    let res = common::client()
        .get(relay.url("/api/student?id=ABC123"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"error": "Student not found"})
    );
    // Tags and numeric IDs travel the same way.
    assert_eq!(portal.calls()[0].field("card_tag"), Some("ABC123"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_unusable_payloads_are_not_found() {
    let payloads = [
        r#"{"email_address":""}"#,
        r#"{"email_address":null}"#,
        r#"{"email_address":7}"#,
        r#"{"name":"No Email"}"#,
        "null",
        "[]",
        r#""jane.doe@dlsl.edu.ph""#,
    ];

    for payload in payloads {
        let portal = common::start_mock_portal(move |_| (200, payload.to_string())).await;
        let relay = common::start_relay(common::relay_config(portal.url())).await;

        let res = common::client()
            .get(relay.url("/api/student?id=2019000001"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 404, "payload {payload}");
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({"error": "Student not found"})
        );

        relay.shutdown.trigger();
    }
}

#[tokio::test]
async fn test_missing_id_never_reaches_portal() {
    let portal = common::start_mock_portal(|_| (200, JANE.to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;
    let client = common::client();

    for path in ["/api/student", "/api/student?id="] {
        let res = client.get(relay.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({"error": "Missing id parameter"})
        );
    }

    assert_eq!(portal.call_count(), 0);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_non_json_reply_is_internal_error() {
    let portal = common::start_mock_portal(|_| {
        (502, "<html><body>Bad Gateway</body></html>".to_string())
    })
    .await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    let res = common::client()
        .get(relay.url("/api/student?id=12345"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert_eq!(body, r#"{"error":"Internal server error"}"#);
    assert!(!body.contains("Bad Gateway"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_portal_status_is_not_inspected() {
    // A JSON body with an email wins even on a 500 from the portal.
    let portal = common::start_mock_portal(|_| (500, JANE.to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    let res = common::client()
        .get(relay.url("/api/student?id=12345"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), JANE);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_lookups_are_identical() {
    let portal = common::start_mock_portal(|tag| {
        if tag == "12345" {
            (200, JANE.to_string())
        } else {
            (200, "{}".to_string())
        }
    })
    .await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;
    let client = common::client();

    let mut seen = Vec::new();
    for _ in 0..3 {
        let res = client
            .get(relay.url("/api/student?id=12345"))
            .send()
            .await
            .unwrap();
        seen.push((res.status().as_u16(), res.text().await.unwrap()));
    }

    assert!(seen.iter().all(|r| r == &seen[0]));
    assert_eq!(seen[0], (200, JANE.to_string()));
    // One portal call per lookup, nothing cached.
    assert_eq!(portal.call_count(), 3);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_identifier_is_forwarded_untouched() {
    let portal = common::start_mock_portal(|_| (200, "{}".to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    let raw = "04:A1 B2&x=1";
    let res = common::client()
        .get(relay.url("/api/student"))
        .query(&[("id", raw)])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(portal.calls()[0].field("card_tag"), Some(raw));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_id_values_are_joined() {
    let portal = common::start_mock_portal(|_| (200, "{}".to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    let res = common::client()
        .get(relay.url("/api/student?id=1&id=&id=2"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(portal.call_count(), 1);
    assert_eq!(portal.calls()[0].field("card_tag"), Some("1,2"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_trailing_slash_and_path_case_are_normalized() {
    let portal = common::start_mock_portal(|_| (200, JANE.to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;
    let client = common::client();

    for path in ["/api/student/?id=1", "/API/Student?id=1"] {
        let res = client.get(relay.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 200, "{path}");
        assert_eq!(res.text().await.unwrap(), JANE);
    }

    // The query string keeps its case.
    let res = client
        .get(relay.url("/Api/Student/?id=AbC123"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let calls = portal.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].field("card_tag"), Some("1"));
    assert_eq!(calls[1].field("card_tag"), Some("1"));
    assert_eq!(calls[2].field("card_tag"), Some("AbC123"));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_missing_reg_key_is_sent_empty() {
    let portal = common::start_mock_portal(|_| (200, "{}".to_string())).await;
    let mut config = common::relay_config(portal.url());
    config.upstream.reg_key = String::new();
    let relay = common::start_relay(config).await;

    let res = common::client()
        .get(relay.url("/api/student?id=12345"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(portal.calls()[0].field("regKey"), Some(""));

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_configured_timeout_fails_slow_portal() {
    let portal =
        common::start_slow_mock_portal(Duration::from_secs(5), |_| (200, JANE.to_string())).await;
    let mut config = common::relay_config(portal.url());
    config.upstream.timeout_secs = Some(1);
    let relay = common::start_relay(config).await;

    let res = common::client()
        .get(relay.url("/api/student?id=12345"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"error": "Internal server error"})
    );

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let portal = common::start_mock_portal(|_| (200, JANE.to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    let res = common::client()
        .get(relay.url("/unknown-path"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"error": "Not found"})
    );
    assert_eq!(portal.call_count(), 0);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let portal = common::start_mock_portal(|_| (200, JANE.to_string())).await;
    let relay = common::start_relay(common::relay_config(portal.url())).await;

    relay.shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), relay.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
