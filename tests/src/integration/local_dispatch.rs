//! # Local Short-Circuit
//!
//! A co-hosted target is handled in-process: nothing reaches the network,
//! even when the directory would also resolve the handle, and the outcome
//! is exactly the scene's.

#[cfg(test)]
mod tests {
    use super::super::harness::*;
    use axum::http::StatusCode;
    use ir_03_local_dispatch::{Crossing, RegionScene, SceneCall};
    use shared_types::{AgentCircuit, DispatchResult, OutcomeExt, RideAlong, SceneObject, Vector3};
    use uuid::Uuid;

    /// Host with two co-hosted regions whose handles also resolve to a
    /// recording stub.
    async fn shadowed_host() -> (TestHost, StubPeer, std::sync::Arc<ir_03_local_dispatch::RecordingScene>) {
        let host = TestHost::spawn().await;
        let _origin = host.host_region(1000, 1000);
        let neighbour = host.host_region(1001, 1000);
        let stub = StubPeer::spawn(|_, _| (StatusCode::OK, "True")).await;
        host.directory.insert(stub.endpoint(neighbour.region_handle()));
        (host, stub, neighbour)
    }

    #[tokio::test]
    async fn test_local_crossing_never_uses_network() {
        let (host, stub, neighbour) = shadowed_host().await;
        let mut obj = SceneObject::new(Uuid::new_v4(), "boat", Uuid::new_v4(), Vector3::new(255.0, 80.0, 20.0));
        obj.velocity = Vector3::new(3.0, 0.0, 0.0);

        host.dispatcher
            .create_object(neighbour.region_handle(), &obj, Some(Vector3::new(1.0, 80.0, 20.0)), &RideAlong::Count(2))
            .await
            .unwrap();

        assert!(stub.seen().is_empty());
        let arrived = &neighbour.objects()[0];
        assert_eq!(arrived.position, Vector3::new(1.0, 80.0, 20.0));
        assert_eq!(arrived.avatars_to_expect, 2);
        // No nonce is involved in-process.
        assert_eq!(arrived.nonce, None);
        assert!(host.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_local_outcome_matches_scene() {
        let (host, stub, neighbour) = shadowed_host().await;
        neighbour.deny_objects(true);
        let obj = SceneObject::new(Uuid::new_v4(), "boat", Uuid::new_v4(), Vector3::ZERO);

        let via_dispatcher = host
            .dispatcher
            .create_object(neighbour.region_handle(), &obj, None, &RideAlong::Count(0))
            .await;
        let direct = host
            .local
            .region(neighbour.region_handle())
            .unwrap()
            .create_object(obj.clone(), &RideAlong::Count(0), Crossing::Local { position_in_destination: obj.position })
            .await;
        assert_eq!(via_dispatcher.result(), DispatchResult::AccessDenied);
        assert_eq!(via_dispatcher, direct);
        assert!(stub.seen().is_empty());
    }

    #[tokio::test]
    async fn test_local_agent_operations() {
        let (host, stub, neighbour) = shadowed_host().await;
        let agent_id = Uuid::new_v4();
        let d = &host.dispatcher;

        d.create_child_agent(neighbour.region_handle(), &AgentCircuit::child(agent_id, "Lin", "Lo", 9), true)
            .await
            .unwrap();
        d.close_agent(neighbour.region_handle(), agent_id).await.unwrap();
        assert_eq!(
            d.close_agent(neighbour.region_handle(), agent_id).await.result(),
            DispatchResult::NotFound
        );
        d.update_estate_info(neighbour.region_id()).await.unwrap();

        assert!(stub.seen().is_empty());
        assert_eq!(
            neighbour.calls(),
            vec![
                SceneCall::AuthorizeUser(agent_id),
                SceneCall::NewUserConnection(agent_id),
                SceneCall::CloseAgent(agent_id),
                SceneCall::CloseAgent(agent_id),
                SceneCall::ReloadEstateSettings,
            ]
        );
    }
}
