pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ingest::handlers as ingest;
use crate::moderation::handlers as moderation;
use crate::state::AppState;
use crate::translation::handlers as translation;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Online moderation
        .route("/api/v1/moderate", post(moderation::handle_moderate))
        // Translation
        .route("/api/v1/translate", post(translation::handle_translate))
        .route(
            "/api/v1/translate/objects",
            post(translation::handle_translate_objects),
        )
        // Ingestion jobs
        .route("/api/v1/ingest/objects", post(ingest::handle_ingest_objects))
        .route(
            "/api/v1/terminology/objects",
            post(ingest::handle_terminology_objects),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::testing::{
        test_state, InMemoryBlobStore, InMemoryRecordStore, InMemoryTermStore, ScriptedInvoker,
    };

    fn router_with(
        store: InMemoryRecordStore,
        llm: ScriptedInvoker,
        blobs: InMemoryBlobStore,
    ) -> Router {
        build_router(test_state(
            Arc::new(store),
            Arc::new(llm),
            Arc::new(blobs),
            Arc::new(InMemoryTermStore::new()),
        ))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = router_with(
            InMemoryRecordStore::new(),
            ScriptedInvoker::new(),
            InMemoryBlobStore::new(),
        );

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "terminus-api");
    }

    #[tokio::test]
    async fn test_moderate_returns_flat_decision() {
        let store = InMemoryRecordStore::new().with_document(json!({
            "content": "I hate weapons",
            "category": "Verbal Abuse",
            "reason": "Hostile statement",
            "assessment": "Blacklist",
            "content_type": "motto"
        }));
        let llm = ScriptedInvoker::new().reply(
            "Venting.</explanation><result>review</result>\
             <category>Verbal Abuse</category><confidence>3</confidence>",
        );
        let app = router_with(store, llm, InMemoryBlobStore::new());

        let (status, body) = post_json(
            app,
            "/api/v1/moderate",
            json!({"text": "I hate this weapon skin", "type": "motto"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "review");
        assert_eq!(body["explanation"], "Venting.");
        assert_eq!(body["white_response_cnt"], 0);
        assert_eq!(body["black_response_cnt"], 1);
    }

    #[tokio::test]
    async fn test_moderate_rejects_empty_text() {
        let app = router_with(
            InMemoryRecordStore::new(),
            ScriptedInvoker::new(),
            InMemoryBlobStore::new(),
        );

        let (status, body) =
            post_json(app, "/api/v1/moderate", json!({"text": "  ", "type": "motto"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_moderate_maps_retrieval_failure_to_bad_gateway() {
        let app = router_with(
            InMemoryRecordStore::new().failing(),
            ScriptedInvoker::new(),
            InMemoryBlobStore::new(),
        );

        let (status, body) =
            post_json(app, "/api/v1/moderate", json!({"text": "hi", "type": "motto"})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "RETRIEVAL_ERROR");
    }

    #[tokio::test]
    async fn test_translate_batch() {
        let app = router_with(
            InMemoryRecordStore::new(),
            ScriptedInvoker::new().reply("你好").reply("世界"),
            InMemoryBlobStore::new(),
        );

        let (status, body) = post_json(
            app,
            "/api/v1/translate",
            json!({"src_lang": "EN", "dest_lang": "CHS", "src_content": ["hello", "world"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dest_content"], json!(["你好", "世界"]));
        assert!(body.get("model_id").is_none());
    }

    #[tokio::test]
    async fn test_object_keys_are_handled_independently() {
        let blobs = InMemoryBlobStore::new().with_object(
            "jobs/day 1.json",
            r#"{"src_lang":"EN","dest_lang":"CHS","src_content":["hello"]}"#,
        );
        let app = router_with(
            InMemoryRecordStore::new(),
            ScriptedInvoker::new().reply("你好"),
            blobs,
        );

        let (status, body) = post_json(
            app,
            "/api/v1/translate/objects",
            json!({"object_keys": "jobs/notes.txt,jobs/day+1.json"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["key"], "jobs/notes.txt");
        assert!(body[0]["error"].is_string());
        assert_eq!(body[1]["key"], "jobs/day 1.json");
        assert_eq!(body[1]["result"]["output_key"], "jobs/translation/day 1.json");
    }

    #[tokio::test]
    async fn test_undecodable_key_fails_alone() {
        let blobs = InMemoryBlobStore::new()
            .with_object(
                "jobs/good.json",
                r#"{"src_lang":"EN","dest_lang":"CHS","src_content":["hello"]}"#,
            )
            .with_object(
                "jobs/other.json",
                r#"{"src_lang":"EN","dest_lang":"CHS","src_content":["world"]}"#,
            );
        let app = router_with(
            InMemoryRecordStore::new(),
            ScriptedInvoker::new().reply("你好").reply("世界"),
            blobs,
        );

        let (status, body) = post_json(
            app,
            "/api/v1/translate/objects",
            json!({"object_keys": "jobs/good.json,bad%FF.json,jobs/other.json"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["result"]["output_key"], "jobs/translation/good.json");
        assert_eq!(body[1]["key"], "bad\u{FFFD}.json");
        assert!(body[1]["error"].is_string());
        assert_eq!(body[2]["result"]["output_key"], "jobs/translation/other.json");
    }

    #[tokio::test]
    async fn test_terminology_objects() {
        let blobs = InMemoryBlobStore::new().with_object(
            "terms/glossary.json",
            r#"{"type":"multilingual_terminology","data":[{"entity_type":"Character","mapping":{"EN":"Paimon","CHS":"派蒙"}}]}"#,
        );
        let terms = Arc::new(InMemoryTermStore::new());
        let app = build_router(test_state(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(ScriptedInvoker::new()),
            Arc::new(blobs),
            terms.clone(),
        ));

        let (status, body) = post_json(
            app,
            "/api/v1/terminology/objects",
            json!({"object_keys": "terms%2Fglossary.json"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["result"]["rows"], 2);
        assert_eq!(terms.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_objects_requires_keys() {
        let app = router_with(
            InMemoryRecordStore::new(),
            ScriptedInvoker::new(),
            InMemoryBlobStore::new(),
        );

        let (status, _) = post_json(app, "/api/v1/ingest/objects", json!({"object_keys": ","})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
