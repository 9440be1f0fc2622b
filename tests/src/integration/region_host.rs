//! # Region Host Containers
//!
//! Two `RegionHost` containers built from configuration, each hosting one
//! standalone region and listing the other as a neighbour.

#[cfg(test)]
mod tests {
    use ir_03_local_dispatch::RegionScene;
    use node_runtime::container::config::{NeighbourConfig, RegionConfig};
    use node_runtime::{HostConfig, RegionHost, StandaloneScene};
    use shared_types::{AgentCircuit, AgentData, DispatchResult, OutcomeExt, RegionHandle, RideAlong, SceneObject, Vector3};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use uuid::Uuid;

    struct Running {
        host: Arc<RegionHost>,
        scene: Arc<StandaloneScene>,
        server: JoinHandle<()>,
    }

    fn config(name: &str, region_id: Uuid, grid_x: u32, neighbour: (Uuid, u32, u16)) -> HostConfig {
        let mut config = HostConfig::from_toml(
            r#"
            [communications]
            interregion = "rest"
            grid_send_key = "container-grid-key"
            "#,
        )
        .unwrap();
        config.regions.push(RegionConfig {
            name: name.to_string(),
            region_id,
            grid_x,
            grid_y: 1000,
        });
        config.neighbours.push(NeighbourConfig {
            region_id: neighbour.0,
            grid_x: neighbour.1,
            grid_y: 1000,
            host: "127.0.0.1".to_string(),
            http_port: neighbour.2,
        });
        config
    }

    fn start(config: HostConfig, listener: TcpListener) -> Running {
        let host = Arc::new(RegionHost::new(config).unwrap());
        let scene = host.register_standalone_regions().unwrap().remove(0);
        let server = {
            let host = host.clone();
            tokio::spawn(async move { host.serve(listener).await.unwrap() })
        };
        Running { host, scene, server }
    }

    async fn two_hosts() -> (Running, Running) {
        let l1 = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let l2 = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (p1, p2) = (l1.local_addr().unwrap().port(), l2.local_addr().unwrap().port());
        let (id1, id2) = (Uuid::new_v4(), Uuid::new_v4());

        let one = start(config("Quay", id1, 1000, (id2, 1001, p2)), l1);
        let two = start(config("Dunes", id2, 1001, (id1, 1000, p1)), l2);
        (one, two)
    }

    #[tokio::test]
    async fn test_object_crosses_between_containers() {
        let (one, two) = two_hosts().await;
        let obj = SceneObject::new(Uuid::new_v4(), "crate", Uuid::new_v4(), Vector3::new(255.5, 10.0, 21.0));

        one.host
            .dispatcher()
            .create_object(RegionHandle::from_grid(1001, 1000), &obj, Some(Vector3::new(0.5, 10.0, 21.0)), &RideAlong::Count(0))
            .await
            .unwrap();

        let arrived = two.scene.object(obj.id).unwrap();
        assert_eq!(arrived.position, Vector3::new(0.5, 10.0, 21.0));
        assert_eq!(one.scene.object_count(), 0);

        one.host
            .dispatcher()
            .delete_object(RegionHandle::from_grid(1001, 1000), obj.id)
            .await
            .unwrap();
        assert_eq!(two.scene.object_count(), 0);
        assert_eq!(two.host.ledger().len(), 1);

        one.host.shutdown();
        two.host.shutdown();
        one.server.await.unwrap();
        two.server.await.unwrap();
    }

    #[tokio::test]
    async fn test_teleport_handshake_between_containers() {
        let (one, two) = two_hosts().await;
        let target = RegionHandle::from_grid(1001, 1000);
        let agent_id = Uuid::new_v4();
        let d = one.host.dispatcher();

        d.create_child_agent(target, &AgentCircuit::child(agent_id, "Ines", "Rowe", 77), true)
            .await
            .unwrap();
        assert!(two.scene.has_child_agent(agent_id));

        let data = AgentData::new(agent_id, Uuid::new_v4(), RegionHandle::from_grid(1000, 1000));
        d.push_agent_state(target, &data).await.unwrap();
        d.wait_scene_presence(target, agent_id).await.unwrap();

        let pulled = d.retrieve_root_agent(target, agent_id).await.unwrap();
        assert_eq!(pulled.agent_id, agent_id);
        assert!(pulled.created_on.is_some());

        d.release_agent(target, agent_id).await.unwrap();
        assert!(two.scene.root_agent(agent_id).is_none());

        one.host.shutdown();
        two.host.shutdown();
    }

    #[tokio::test]
    async fn test_estate_sync_by_region_id() {
        let (one, two) = two_hosts().await;
        let region_id = two.scene.region_id();
        one.host.dispatcher().update_estate_info(region_id).await.unwrap();

        assert_eq!(
            one.host.dispatcher().update_estate_info(Uuid::new_v4()).await.result(),
            DispatchResult::NotFound
        );
        one.host.shutdown();
        two.host.shutdown();
    }
}
