//! # Peer Failure Handling
//!
//! Absent, unreachable and untrusted peers all surface as typed outcomes
//! with a reason; none of them reaches a scene.

#[cfg(test)]
mod tests {
    use super::super::harness::*;
    use axum::http::StatusCode;
    use ir_03_local_dispatch::{RegionScene, SceneCall};
    use shared_types::{
        AgentCircuit, AgentData, DispatchOutcome, DispatchResult, OutcomeExt, RegionHandle, RideAlong, SceneObject, Vector3,
    };
    use uuid::Uuid;

    fn object() -> SceneObject {
        SceneObject::new(Uuid::new_v4(), "kite", Uuid::new_v4(), Vector3::new(10.0, 10.0, 30.0))
    }

    fn assert_failed<T: std::fmt::Debug>(outcome: DispatchOutcome<T>, kind: DispatchResult) {
        let err = outcome.unwrap_err();
        assert_eq!(err.kind, kind);
        assert!(!err.reason.is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_handle_is_not_found_everywhere() {
        let host = TestHost::spawn().await;
        let d = &host.dispatcher;
        let nowhere = RegionHandle::from_grid(4000, 4000);
        let agent_id = Uuid::new_v4();
        let data = AgentData::new(agent_id, Uuid::new_v4(), nowhere);

        assert_failed(
            d.create_child_agent(nowhere, &AgentCircuit::child(agent_id, "A", "B", 1), true).await,
            DispatchResult::NotFound,
        );
        assert_failed(d.child_agent_update(nowhere, &data).await, DispatchResult::NotFound);
        assert_failed(d.child_agent_update2(nowhere, &data).await, DispatchResult::NotFound);
        assert_failed(d.retrieve_root_agent(nowhere, agent_id).await, DispatchResult::NotFound);
        assert_failed(d.release_agent(nowhere, agent_id).await, DispatchResult::NotFound);
        assert_failed(d.close_agent(nowhere, agent_id).await, DispatchResult::NotFound);
        assert_failed(
            d.create_object(nowhere, &object(), None, &RideAlong::Count(0)).await,
            DispatchResult::NotFound,
        );
        assert_failed(d.delete_object(nowhere, Uuid::new_v4()).await, DispatchResult::NotFound);
        assert_failed(d.update_estate_info(Uuid::new_v4()).await, DispatchResult::NotFound);
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_error() {
        let host = TestHost::spawn().await;
        let handle = RegionHandle::from_grid(1003, 1000);
        host.directory.insert(dead_endpoint(handle).await);
        let agent_id = Uuid::new_v4();

        assert_failed(
            host.dispatcher
                .create_object(handle, &object(), None, &RideAlong::Count(0))
                .await,
            DispatchResult::Error,
        );
        assert_failed(
            host.dispatcher
                .child_agent_update2(handle, &AgentData::new(agent_id, Uuid::new_v4(), handle))
                .await,
            DispatchResult::Error,
        );
        assert_failed(host.dispatcher.close_agent(handle, agent_id).await, DispatchResult::Error);
    }

    #[tokio::test]
    async fn test_untrusted_host_cannot_reach_scene() {
        let rogue = TestHost::spawn_with_key("not-the-grid-key").await;
        let target = TestHost::spawn().await;
        let scene = target.host_region(1000, 1001);
        rogue.learn(&target, &scene);
        let obj = object();

        assert_failed(
            rogue
                .dispatcher
                .create_object(scene.region_handle(), &obj, None, &RideAlong::Count(0))
                .await,
            DispatchResult::Error,
        );
        assert_failed(
            rogue
                .dispatcher
                .create_child_agent(scene.region_handle(), &AgentCircuit::child(Uuid::new_v4(), "A", "B", 1), false)
                .await,
            DispatchResult::Error,
        );

        assert_eq!(scene.call_count(), 0);
        // The compensating delete was rejected too.
        assert!(target.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_rejected_with_401() {
        let host = TestHost::spawn().await;
        let scene = host.host_region(1000, 1000);
        let http = reqwest::Client::new();
        let path = format!("/agent/{}/{}/release/", Uuid::new_v4(), scene.region_handle());

        let response = http.delete(host.url(&path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));

        let response = http
            .delete(host.url(&path))
            .header("authorization", "Basic Zm9vOmJhcg==")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(scene.call_count(), 0);

        let health = http.get(host.url("/health")).send().await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_paths_parsed_on_the_wire() {
        let host = TestHost::spawn().await;
        let scene = host.host_region(1000, 1000);
        let http = reqwest::Client::new();
        let agent_id = Uuid::new_v4();

        let release = format!("/agent/{agent_id}/{}/release", scene.region_handle());
        let response = http
            .delete(host.url(&release))
            .header("authorization", basic_auth())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(scene.calls().contains(&SceneCall::ReleaseAgent(agent_id)));

        let before = scene.call_count();
        let bad_id = format!("/object2/not-a-uuid/{}/", scene.region_handle());
        let response = http
            .delete(host.url(&bad_id))
            .header("authorization", basic_auth())
            .header("x-nonce-id", "5")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(scene.call_count(), before);
        assert!(host.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_peer_health_probe() {
        let p = pair().await;
        let client = client();
        assert!(client.is_reachable(&p.endpoint_b()).await);
        assert!(!client.is_reachable(&dead_endpoint(p.handle_b()).await).await);
    }
}
