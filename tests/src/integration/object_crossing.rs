//! # Object Crossing Flows
//!
//! One crossing attempt is one nonce. The receiver suppresses a create whose
//! nonce it has already seen in a delete, for the retention window only.
//!
//! ## Flows Tested:
//!
//! 1. **Happy path**: snapshot, override position and riders arrive intact
//! 2. **Delete before create**: late create is answered 204 and dropped
//! 3. **Distinct nonces**: suppression is keyed on the nonce, not the object
//! 4. **Retention expiry**: an expired delete no longer suppresses
//! 5. **Compensating delete**: a failed create is followed by a delete with
//!    the same nonce; a refused one is not
//! 6. **Late create**: a create the sender gave up on lands after its
//!    compensating delete and is dropped

#[cfg(test)]
mod tests {
    use super::super::harness::*;
    use axum::http::{Method, StatusCode};
    use ir_02_nonce_ledger::DEFAULT_RETENTION;
    use ir_03_local_dispatch::{RegionScene, SceneCall};
    use ir_04_transport::PeerTimeouts;
    use shared_types::{
        BincodeObjectCodec, CrossingNonce, DispatchResult, ObjectCodec, OutcomeExt, RideAlong, SceneObject, Vector3,
    };
    use std::time::Duration;
    use uuid::Uuid;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn object() -> SceneObject {
        let mut obj = SceneObject::new(Uuid::new_v4(), "cart", Uuid::new_v4(), Vector3::new(250.0, 40.0, 22.0));
        obj.geometry = vec![7; 64];
        obj.script_bytecode = vec![1, 2, 3];
        obj
    }

    fn snapshot(obj: &SceneObject) -> shared_types::ObjectSnapshot {
        BincodeObjectCodec.encode(obj).unwrap()
    }

    // =============================================================================
    // CROSSING
    // =============================================================================

    #[tokio::test]
    async fn test_object_crosses_to_peer_region() {
        let p = pair().await;
        let obj = object();
        let rider = Uuid::new_v4();

        let outcome = p
            .a
            .dispatcher
            .create_object(p.handle_b(), &obj, Some(Vector3::new(2.0, 40.0, 22.0)), &RideAlong::Avatars(vec![rider]))
            .await;
        assert!(outcome.is_ok(), "{outcome:?}");

        let arrived = p.scene_b.objects();
        assert_eq!(arrived.len(), 1);
        let arrived = &arrived[0];
        assert_eq!(arrived.id, obj.id);
        assert_eq!(arrived.geometry, obj.geometry);
        assert_eq!(arrived.position, Vector3::new(2.0, 40.0, 22.0));
        assert_eq!(arrived.original_entering_position, Some(obj.position));
        assert_eq!(arrived.avatars_to_expect, 1);
        assert!(arrived.time_received.is_some());
        assert!(arrived.nonce.is_some());
        assert!(p.b.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_override_position_clamped_into_region() {
        let p = pair().await;
        let obj = object();
        p.a
            .dispatcher
            .create_object(p.handle_b(), &obj, Some(Vector3::new(300.0, -5.0, 22.0)), &RideAlong::Count(0))
            .await
            .unwrap();

        let arrived = &p.scene_b.objects()[0];
        assert!(arrived.position.x < 256.0);
        assert_eq!(arrived.position.y, 0.0);
    }

    #[tokio::test]
    async fn test_delete_before_create_is_suppressed() {
        let p = pair().await;
        let client = client();
        let obj = object();
        let nonce = CrossingNonce(0xC0FFEE);

        // Object is not there yet, but the nonce is remembered regardless.
        let deleted = client.delete_object2(&p.endpoint_b(), obj.id, nonce).await;
        assert_eq!(deleted.result(), DispatchResult::NotFound);
        assert_eq!(p.b.ledger.len(), 1);

        // 204 is not a successful create for the sender.
        let created = client
            .create_object2(&p.endpoint_b(), obj.id, &snapshot(&obj), None, &RideAlong::Count(0), nonce)
            .await;
        assert_eq!(created.result(), DispatchResult::Error);
        assert_eq!(p.scene_b.object_count(obj.id), 0);
        assert!(!p.scene_b.calls().contains(&SceneCall::CreateObject(obj.id)));

        // Suppression consumed the entry.
        assert!(p.b.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_suppressed_create_answers_no_content() {
        let p = pair().await;
        let obj = object();
        let http = reqwest::Client::new();
        let url = p.b.url(&format!("/object2/{}/{}/", obj.id, p.handle_b()));

        let deleted = http
            .delete(&url)
            .header("authorization", basic_auth())
            .header("x-nonce-id", "77")
            .send()
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NOT_FOUND);

        let frame = shared_types::wire::binary::encode_frame(&shared_types::wire::binary::ObjectPostMessage::new(
            &snapshot(&obj),
            None,
            &RideAlong::Count(0),
        ))
        .unwrap();
        let created = http
            .post(&url)
            .header("authorization", basic_auth())
            .header("x-nonce-id", "77")
            .body(frame)
            .send()
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::NO_CONTENT);
        assert_eq!(p.scene_b.object_count(obj.id), 0);
    }

    #[tokio::test]
    async fn test_distinct_nonces_evaluated_independently() {
        let p = pair().await;
        let client = client();
        let obj = object();
        let cancelled = CrossingNonce(1);
        let fresh = CrossingNonce(2);

        client.delete_object2(&p.endpoint_b(), obj.id, cancelled).await.ok();

        let second_attempt = client
            .create_object2(&p.endpoint_b(), obj.id, &snapshot(&obj), None, &RideAlong::Count(0), fresh)
            .await;
        assert!(second_attempt.is_ok());

        let late_first = client
            .create_object2(&p.endpoint_b(), obj.id, &snapshot(&obj), None, &RideAlong::Count(0), cancelled)
            .await;
        assert_eq!(late_first.result(), DispatchResult::Error);
        assert_eq!(p.scene_b.object_count(obj.id), 1);
    }

    #[tokio::test]
    async fn test_expired_delete_no_longer_suppresses() {
        let p = pair().await;
        let client = client();
        let obj = object();
        let nonce = CrossingNonce(99);

        client.delete_object2(&p.endpoint_b(), obj.id, nonce).await.ok();
        p.b.clock.advance(DEFAULT_RETENTION + Duration::from_secs(1));

        let late = client
            .create_object2(&p.endpoint_b(), obj.id, &snapshot(&obj), None, &RideAlong::Count(0), nonce)
            .await;
        assert!(late.is_ok());
        assert_eq!(p.scene_b.object_count(obj.id), 1);
        assert!(p.b.ledger.is_empty());
    }

    // =============================================================================
    // COMPENSATING DELETE
    // =============================================================================

    #[tokio::test]
    async fn test_failed_create_followed_by_delete_with_same_nonce() {
        let a = TestHost::spawn().await;
        let stub = StubPeer::spawn(|method, _| {
            if method == Method::POST {
                (StatusCode::INTERNAL_SERVER_ERROR, "rez failed")
            } else {
                (StatusCode::OK, "")
            }
        })
        .await;
        let handle = shared_types::RegionHandle::from_grid(1002, 1000);
        a.directory.insert(stub.endpoint(handle));
        let obj = object();

        let outcome = a.dispatcher.create_object(handle, &obj, None, &RideAlong::Count(0)).await;
        assert_eq!(outcome.result(), DispatchResult::Error);

        let seen = stub.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[1].method, Method::DELETE);
        assert_eq!(seen[0].path, seen[1].path);
        assert!(seen[0].path.starts_with(&format!("/object2/{}/", obj.id)));
        assert!(seen[0].nonce.is_some());
        assert_eq!(seen[0].nonce, seen[1].nonce);
        assert_eq!(seen[1].body_len, 0);
    }

    #[tokio::test]
    async fn test_create_landing_after_sender_timeout_is_suppressed() {
        let sender = TestHost::spawn_with(HostOptions {
            timeouts: PeerTimeouts {
                create_object: Duration::from_millis(200),
                ..PeerTimeouts::default()
            },
            ..HostOptions::default()
        })
        .await;
        let receiver = TestHost::spawn_with(HostOptions {
            late_object_posts: Some(Duration::from_millis(800)),
            ..HostOptions::default()
        })
        .await;
        sender.host_region(1000, 1000);
        let scene = receiver.host_region(1001, 1000);
        sender.learn(&receiver, &scene);
        let obj = object();

        let outcome = sender
            .dispatcher
            .create_object(scene.region_handle(), &obj, None, &RideAlong::Count(0))
            .await;
        let err = outcome.unwrap_err();
        assert_eq!(err.kind, DispatchResult::Error);
        assert!(err.reason.contains("timed out"), "{}", err.reason);

        // The compensating delete got there first.
        assert_eq!(receiver.ledger.len(), 1);
        assert!(scene.calls().contains(&SceneCall::DeleteObject(obj.id)));

        // Wait for the held create to be handled.
        for _ in 0..60 {
            if receiver.ledger.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(receiver.ledger.is_empty());
        assert_eq!(scene.object_count(obj.id), 0);
        assert!(!scene.calls().contains(&SceneCall::CreateObject(obj.id)));
    }

    #[tokio::test]
    async fn test_scene_failure_leaves_nonce_at_receiver() {
        let p = pair().await;
        p.scene_b.fail_objects(true);
        let obj = object();

        let outcome = p.a.dispatcher.create_object(p.handle_b(), &obj, None, &RideAlong::Count(0)).await;
        assert_eq!(outcome.result(), DispatchResult::Error);
        assert_eq!(p.scene_b.object_count(obj.id), 0);
        // The compensating delete reached the receiver.
        assert_eq!(p.b.ledger.len(), 1);
        assert!(p.scene_b.calls().contains(&SceneCall::DeleteObject(obj.id)));
    }

    #[tokio::test]
    async fn test_refused_create_not_compensated() {
        let p = pair().await;
        p.scene_b.deny_objects(true);
        let obj = object();

        let outcome = p.a.dispatcher.create_object(p.handle_b(), &obj, None, &RideAlong::Count(0)).await;
        let err = outcome.unwrap_err();
        assert_eq!(err.kind, DispatchResult::AccessDenied);
        assert!(!err.reason.is_empty());
        assert!(p.b.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_successive_crossings_use_fresh_nonces() {
        let p = pair().await;
        let obj = object();
        for _ in 0..3 {
            p.a.dispatcher
                .create_object(p.handle_b(), &obj, None, &RideAlong::Count(0))
                .await
                .unwrap();
        }
        let mut nonces: Vec<_> = p.scene_b.objects().iter().filter_map(|o| o.nonce).collect();
        nonces.dedup();
        assert_eq!(nonces.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_crossings_are_independent() {
        let p = pair().await;
        let objects: Vec<SceneObject> = (0..16).map(|_| object()).collect();
        let ride_along = RideAlong::Count(0);

        let outcomes = futures::future::join_all(
            objects
                .iter()
                .map(|obj| p.a.dispatcher.create_object(p.handle_b(), obj, None, &ride_along)),
        )
        .await;
        assert!(outcomes.iter().all(|o| o.is_ok()));
        for obj in &objects {
            assert_eq!(p.scene_b.object_count(obj.id), 1);
        }
    }

    // =============================================================================
    // DELETE AND BY-REFERENCE
    // =============================================================================

    #[tokio::test]
    async fn test_remote_delete_removes_object() {
        let p = pair().await;
        let obj = object();
        p.a.dispatcher
            .create_object(p.handle_b(), &obj, None, &RideAlong::Count(0))
            .await
            .unwrap();

        p.a.dispatcher.delete_object(p.handle_b(), obj.id).await.unwrap();
        assert_eq!(p.scene_b.object_count(obj.id), 0);

        let again = p.a.dispatcher.delete_object(p.handle_b(), obj.id).await;
        assert_eq!(again.result(), DispatchResult::NotFound);
    }

    #[tokio::test]
    async fn test_create_from_shared_item() {
        let p = pair().await;
        let (user_id, item_id) = (Uuid::new_v4(), Uuid::new_v4());
        p.a.dispatcher
            .create_object_from_item(p.handle_b(), user_id, item_id)
            .await
            .unwrap();
        assert!(p
            .scene_b
            .calls()
            .contains(&SceneCall::CreateObjectFromItem { user_id, item_id }));
    }
}
