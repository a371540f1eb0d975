//! Translation policy constants.
//!
//! Every default the translators apply lives here as a named, testable
//! value. The ratios and defaults are compatibility constants: emitted
//! manifests must not drift between releases, so deployments that need
//! different values override them through configuration rather than by
//! editing call sites.

use crate::model::{AccessMode, Protocol, PullPolicy, ServiceType, VolumeMode};

/// Policy knobs consumed by the per-kind translators.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatePolicy {
    /// Workload resource request as a fraction of the limit.
    pub workload_request_ratio: f64,
    /// Middleware resource request as a fraction of the limit.
    pub middleware_request_ratio: f64,
    pub default_protocol: Protocol,
    pub default_pull_policy: PullPolicy,
    pub default_access_mode: AccessMode,
    pub default_volume_mode: VolumeMode,
    pub default_service_type: ServiceType,
    /// Ingress class routes are bound to.
    pub ingress_class: String,
    /// Storage provisioner recorded on claim annotations.
    pub storage_provisioner: String,
    /// StatefulSet termination grace period. Never zero: middleware needs
    /// time to flush before the kill signal.
    pub termination_grace_seconds: i64,
}

impl Default for TranslatePolicy {
    fn default() -> Self {
        TranslatePolicy {
            workload_request_ratio: 0.25,
            middleware_request_ratio: 0.5,
            default_protocol: Protocol::Tcp,
            default_pull_policy: PullPolicy::Always,
            default_access_mode: AccessMode::ReadWriteOnce,
            default_volume_mode: VolumeMode::Filesystem,
            default_service_type: ServiceType::ClusterIp,
            ingress_class: "nginx".to_string(),
            storage_provisioner: "rbd.csi.ceph.com".to_string(),
            termination_grace_seconds: 10,
        }
    }
}

impl TranslatePolicy {
    /// Normalize a protocol string; anything unrecognized becomes the
    /// policy default.
    pub fn protocol(&self, value: &str) -> Protocol {
        match value {
            "TCP" => Protocol::Tcp,
            "UDP" => Protocol::Udp,
            "SCTP" => Protocol::Sctp,
            _ => self.default_protocol,
        }
    }

    pub fn pull_policy(&self, value: &str) -> PullPolicy {
        match value {
            "Always" => PullPolicy::Always,
            "Never" => PullPolicy::Never,
            "IfNotPresent" => PullPolicy::IfNotPresent,
            _ => self.default_pull_policy,
        }
    }

    pub fn access_mode(&self, value: &str) -> AccessMode {
        match value {
            "ReadWriteOnce" => AccessMode::ReadWriteOnce,
            "ReadOnlyMany" => AccessMode::ReadOnlyMany,
            "ReadWriteMany" => AccessMode::ReadWriteMany,
            "ReadWriteOncePod" => AccessMode::ReadWriteOncePod,
            _ => self.default_access_mode,
        }
    }

    pub fn volume_mode(&self, value: &str) -> VolumeMode {
        match value {
            "Filesystem" => VolumeMode::Filesystem,
            "Block" => VolumeMode::Block,
            _ => self.default_volume_mode,
        }
    }

    pub fn service_type(&self, value: &str) -> ServiceType {
        match value {
            "ClusterIP" => ServiceType::ClusterIp,
            "NodePort" => ServiceType::NodePort,
            "LoadBalancer" => ServiceType::LoadBalancer,
            "ExternalName" => ServiceType::ExternalName,
            _ => self.default_service_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ratios() {
        let policy = TranslatePolicy::default();
        assert_eq!(policy.workload_request_ratio, 0.25);
        assert_eq!(policy.middleware_request_ratio, 0.5);
    }

    #[test]
    fn unrecognized_values_normalize_to_defaults() {
        let policy = TranslatePolicy::default();
        assert_eq!(policy.protocol("http"), Protocol::Tcp);
        assert_eq!(policy.protocol(""), Protocol::Tcp);
        assert_eq!(policy.pull_policy("always"), PullPolicy::Always);
        assert_eq!(policy.access_mode("RWX"), AccessMode::ReadWriteOnce);
        assert_eq!(policy.volume_mode("block"), VolumeMode::Filesystem);
        assert_eq!(policy.service_type("clusterip"), ServiceType::ClusterIp);
    }

    #[test]
    fn recognized_values_pass_through() {
        let policy = TranslatePolicy::default();
        assert_eq!(policy.protocol("UDP"), Protocol::Udp);
        assert_eq!(policy.pull_policy("IfNotPresent"), PullPolicy::IfNotPresent);
        assert_eq!(policy.access_mode("ReadOnlyMany"), AccessMode::ReadOnlyMany);
        assert_eq!(policy.volume_mode("Block"), VolumeMode::Block);
        assert_eq!(policy.service_type("NodePort"), ServiceType::NodePort);
    }
}
