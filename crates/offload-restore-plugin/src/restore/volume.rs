use k8s_openapi::api::core::v1::{Volume, VolumeMount};

/// A PVC-backed Pod volume and where kubemover mounts it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeBinding {
    pub claim_name: String,
    pub volume_name: String,

    /// Always `/` followed by the claim name.
    pub mount_path: String,
}

impl VolumeBinding {
    pub fn new(claim_name: impl Into<String>, volume_name: impl Into<String>) -> Self {
        let claim_name = claim_name.into();
        Self {
            mount_path: format!("/{claim_name}"),
            claim_name,
            volume_name: volume_name.into(),
        }
    }

    pub fn volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.volume_name.clone(),
            mount_path: self.mount_path.clone(),
            ..VolumeMount::default()
        }
    }
}

/// Returns a binding for every volume backed by a PersistentVolumeClaim, in declaration order.
/// Other volume types are skipped.
pub fn bind_claim_volumes(volumes: Option<&[Volume]>) -> Vec<VolumeBinding> {
    volumes
        .unwrap_or_default()
        .iter()
        .filter_map(|volume| {
            let claim = volume.persistent_volume_claim.as_ref()?;
            Some(VolumeBinding::new(&claim.claim_name, &volume.name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{
        ConfigMapVolumeSource, EmptyDirVolumeSource, PersistentVolumeClaimVolumeSource,
    };

    use super::*;

    fn claim_volume(name: &str, claim_name: &str) -> Volume {
        Volume {
            name: name.to_owned(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: claim_name.to_owned(),
                ..PersistentVolumeClaimVolumeSource::default()
            }),
            ..Volume::default()
        }
    }

    #[test]
    fn binds_claims_in_declaration_order() {
        let volumes = [
            Volume {
                name: "config".to_owned(),
                config_map: Some(ConfigMapVolumeSource {
                    name: "web-config".to_owned(),
                    ..ConfigMapVolumeSource::default()
                }),
                ..Volume::default()
            },
            claim_volume("v1", "data"),
            Volume {
                name: "scratch".to_owned(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Volume::default()
            },
            claim_volume("v2", "logs"),
        ];

        let bindings = bind_claim_volumes(Some(&volumes));

        assert_eq!(
            bindings,
            [
                VolumeBinding {
                    claim_name: "data".to_owned(),
                    volume_name: "v1".to_owned(),
                    mount_path: "/data".to_owned(),
                },
                VolumeBinding {
                    claim_name: "logs".to_owned(),
                    volume_name: "v2".to_owned(),
                    mount_path: "/logs".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn no_volumes_no_bindings() {
        assert!(bind_claim_volumes(None).is_empty());
        assert!(bind_claim_volumes(Some(&[])).is_empty());
    }

    #[test]
    fn mount_uses_volume_name_and_claim_path() {
        let mount = VolumeBinding::new("web-data", "data").volume_mount();

        assert_eq!(mount.name, "data");
        assert_eq!(mount.mount_path, "/web-data");
        assert_eq!(mount.read_only, None);
    }
}
