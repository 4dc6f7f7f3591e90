//! End-to-end relay flow against stubbed IAM, completion and Bot API servers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use gptbot_auth::{Credential, IamExchanger, ServiceAccountKey};
use gptbot_bot::{Relay, TelegramTransport};
use gptbot_llm::{Authorization, CompletionClient};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOT_TOKEN: &str = "123456:flow-test";
const KEY_FILE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../gptbot-auth/testdata/service_account_key.json"
);

fn completion(text: &str) -> serde_json::Value {
    serde_json::json!({
        "result": {
            "alternatives": [
                {"message": {"role": "assistant", "text": text}, "status": "ALTERNATIVE_STATUS_FINAL"}
            ]
        }
    })
}

fn update(update_id: i64, message_id: i64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": message_id,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private"},
            "from": {"id": 42, "is_bot": false, "first_name": "Alice", "username": "alice"},
            "text": text
        }
    })
}

async fn mount_stubs(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/iam/v1/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "iamToken": "t1.flow",
            "expiresAt": (Utc::now() + TimeDelta::hours(12)).to_rfc3339(),
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/foundationModels/v1/completion"))
        .and(body_partial_json(serde_json::json!({
            "messages": [{"role": "user", "text": "boom"}]
        })))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/foundationModels/v1/completion"))
        .and(header("authorization", "Bearer t1.flow"))
        .and(body_partial_json(serde_json::json!({
            "modelUri": "gpt://b1gcatalog/yandexgpt-lite"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello, Alice!")))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{BOT_TOKEN}/getUpdates")))
        .and(body_partial_json(serde_json::json!({"offset": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": [update(100, 1, "hi"), update(101, 2, "boom")]
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{BOT_TOKEN}/getUpdates")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": true, "result": []}))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{BOT_TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {"message_id": 999}
        })))
        .mount(server)
        .await;
}

async fn sent_messages(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path().ends_with("/sendMessage"))
        .map(|req| serde_json::from_slice(&req.body).unwrap())
        .collect()
}

#[tokio::test]
async fn service_account_relay_end_to_end() {
    let server = MockServer::start().await;
    mount_stubs(&server).await;

    let key = ServiceAccountKey::from_file(KEY_FILE).unwrap();
    let exchanger = IamExchanger::new()
        .unwrap()
        .with_endpoint(format!("{}/iam/v1/tokens", server.uri()));
    let authorization =
        Authorization::from_credential(Credential::ServiceAccount(key), Arc::new(exchanger))
            .unwrap();
    let client = CompletionClient::new(authorization, "b1gcatalog")
        .unwrap()
        .with_endpoint(format!("{}/foundationModels/v1/completion", server.uri()));

    let transport = TelegramTransport::with_poll_timeout(SecretString::from(BOT_TOKEN), 1)
        .unwrap()
        .with_base_url(server.uri());

    let relay = Relay::new(
        Arc::new(transport),
        Arc::new(client),
        "Sorry, something went wrong. Your message:",
    );

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { relay.run(shutdown).await }
    });

    let mut sent = Vec::new();
    for _ in 0..200 {
        sent = sent_messages(&server).await;
        if sent.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["chat_id"], 42);
    assert_eq!(sent[0]["text"], "Hello, Alice!");
    assert_eq!(sent[0]["reply_parameters"]["message_id"], 1);
    assert_eq!(
        sent[1]["text"],
        "Sorry, something went wrong. Your message: boom"
    );
    assert_eq!(sent[1]["reply_parameters"]["message_id"], 2);
}
