//! Composition of the kubemover init container and its merge into a Pod.
use k8s_openapi::api::core::v1::Container;

use crate::{
    builder::container::{ContainerBuilder, FieldPathEnvVar},
    config::PluginConfig,
    constants::{ENV_CLUSTER_ID, ENV_POD_NAME, ENV_POD_NAMESPACE, KUBEMOVER_BINARY},
    restore::volume::VolumeBinding,
};

/// Builds the kubemover init container for the Pod `pod_name`.
///
/// The container mounts every bound claim volume and passes the mount paths to kubemover in the
/// same order.
pub fn build_kubemover_container(
    config: &PluginConfig,
    pod_name: &str,
    bindings: &[VolumeBinding],
) -> Container {
    let mut args = vec![
        KUBEMOVER_BINARY.to_owned(),
        "--server_addr".to_owned(),
        config.server_addr.clone(),
        "--tls".to_owned(),
        config.use_tls.clone(),
    ];
    args.extend(bindings.iter().map(|binding| binding.mount_path.clone()));

    ContainerBuilder::new(format!("{}{pod_name}", config.pod_name_prefix))
        .image(&config.image)
        .add_env_var(ENV_CLUSTER_ID, &config.cluster_id)
        .add_env_var_from_field_path(ENV_POD_NAMESPACE, FieldPathEnvVar::Namespace)
        .add_env_var_from_field_path(ENV_POD_NAME, FieldPathEnvVar::Name)
        .args(args)
        .add_volume_mounts(bindings.iter().map(VolumeBinding::volume_mount))
        .resources(config.resources().clone())
        .security_context(config.security_context().clone())
        .build()
}

/// Puts `container` at the front of `init_containers`.
///
/// If the first init container already has the same name it is replaced, so merging the same
/// container twice yields the same list as merging it once.
pub fn merge_init_container(
    init_containers: Option<Vec<Container>>,
    container: Container,
) -> Vec<Container> {
    let mut init_containers = init_containers.unwrap_or_default();

    match init_containers.first_mut() {
        Some(first) if first.name == container.name => *first = container,
        _ => init_containers.insert(0, container),
    }

    init_containers
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;

    use super::*;

    fn config() -> PluginConfig {
        PluginConfig::from_data(&BTreeMap::from(
            [
                ("clusterID", "c-42"),
                ("kubeMoverPodNamePrefix", "kubemover-"),
                ("kubeMoverImage", "registry.example.com/kubemover:2.1"),
                ("serverAddr", "mover.example.com:443"),
                ("useTLS", "true"),
                ("runAsRoot", "0"),
            ]
            .map(|(k, v)| (k.to_owned(), v.to_owned())),
        ))
        .expect("test config must be valid")
    }

    fn container(name: &str) -> Container {
        Container {
            name: name.to_owned(),
            ..Container::default()
        }
    }

    fn names(containers: &[Container]) -> Vec<&str> {
        containers.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn builds_container_from_config() {
        let bindings = [
            VolumeBinding::new("data", "v1"),
            VolumeBinding::new("logs", "v2"),
        ];

        let container = build_kubemover_container(&config(), "web-0", &bindings);

        assert_eq!(container.name, "kubemover-web-0");
        assert_eq!(
            container.image.as_deref(),
            Some("registry.example.com/kubemover:2.1")
        );
        assert_eq!(
            container.args.as_deref(),
            Some(
                &[
                    "/usr/local/bin/kubemover",
                    "--server_addr",
                    "mover.example.com:443",
                    "--tls",
                    "true",
                    "/data",
                    "/logs",
                ]
                .map(str::to_owned)[..]
            )
        );

        let env = container.env.expect("env must be set");
        let env_names: Vec<_> = env.iter().map(|var| var.name.as_str()).collect();
        assert_eq!(env_names, ["AMDS_CLUSTER_ID", "POD_NAMESPACE", "POD_NAME"]);
        assert_eq!(env[0].value.as_deref(), Some("c-42"));
        let field_paths: Vec<_> = env[1..]
            .iter()
            .filter_map(|var| var.value_from.as_ref()?.field_ref.as_ref())
            .map(|field_ref| field_ref.field_path.as_str())
            .collect();
        assert_eq!(field_paths, ["metadata.namespace", "metadata.name"]);

        let mounts = container.volume_mounts.expect("mounts must be set");
        let mounts: Vec<_> = mounts
            .iter()
            .map(|mount| (mount.name.as_str(), mount.mount_path.as_str()))
            .collect();
        assert_eq!(mounts, [("v1", "/data"), ("v2", "/logs")]);

        let resources = container.resources.expect("resources must be set");
        assert_eq!(
            resources.requests.and_then(|r| r.get("cpu").cloned()),
            Some(K8sQuantity("100m".to_owned()))
        );
        assert_eq!(
            container.security_context.and_then(|sc| sc.run_as_user),
            Some(0)
        );
    }

    #[test]
    fn no_claims_means_no_trailing_args() {
        let container = build_kubemover_container(&config(), "web-0", &[]);

        assert_eq!(container.args.map(|args| args.len()), Some(5));
        assert_eq!(container.volume_mounts, Some(Vec::new()));
    }

    #[test]
    fn merge_into_nothing() {
        assert_eq!(
            names(&merge_init_container(None, container("kubemover-web-0"))),
            ["kubemover-web-0"]
        );
        assert_eq!(
            names(&merge_init_container(Some(Vec::new()), container("kubemover-web-0"))),
            ["kubemover-web-0"]
        );
    }

    #[test]
    fn merge_prepends_before_existing() {
        let merged = merge_init_container(
            Some(vec![container("migrate"), container("warmup")]),
            container("kubemover-web-0"),
        );

        assert_eq!(names(&merged), ["kubemover-web-0", "migrate", "warmup"]);
    }

    #[test]
    fn merge_replaces_matching_first() {
        let mut updated = container("kubemover-web-0");
        updated.image = Some("kubemover:2".to_owned());

        let merged = merge_init_container(
            Some(vec![container("kubemover-web-0"), container("migrate")]),
            updated.clone(),
        );

        assert_eq!(merged, [updated, container("migrate")]);
    }

    #[test]
    fn merge_only_looks_at_the_first_position() {
        let merged = merge_init_container(
            Some(vec![container("migrate"), container("kubemover-web-0")]),
            container("kubemover-web-0"),
        );

        assert_eq!(
            names(&merged),
            ["kubemover-web-0", "migrate", "kubemover-web-0"]
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let kubemover = build_kubemover_container(
            &config(),
            "web-0",
            &[VolumeBinding::new("data", "v1")],
        );
        let existing = Some(vec![container("migrate")]);

        let once = merge_init_container(existing, kubemover.clone());
        let twice = merge_init_container(Some(once.clone()), kubemover);

        assert_eq!(once, twice);
    }
}
