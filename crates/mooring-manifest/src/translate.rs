//! Per-kind translators.
//!
//! Each function maps one descriptor to one manifest. The selector and
//! the template labels always carry the same single `app-name` label, so
//! a generated controller and its pod template can never disagree.

use std::collections::BTreeMap;

use mooring_core::{Middleware, NetworkService, Route, Volume, Workload};

use crate::model::*;
use crate::policy::TranslatePolicy;

const MANAGED_BY_KEY: &str = "app.kubernetes.io/managed-by";
const MANAGED_BY_VALUE: &str = "mooring";

/// The single matching label shared by controllers and their templates.
fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app-name".to_string(), name.to_string())])
}

fn managed_annotations() -> BTreeMap<String, String> {
    BTreeMap::from([(MANAGED_BY_KEY.to_string(), MANAGED_BY_VALUE.to_string())])
}

fn claim_annotations(policy: &TranslatePolicy) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_BY_KEY.to_string(), MANAGED_BY_VALUE.to_string()),
        (
            "pv.kubernetes.io/bound-by-controller".to_string(),
            "yes".to_string(),
        ),
        (
            "volume.beta.kubernetes.io/storage-provisioner".to_string(),
            policy.storage_provisioner.clone(),
        ),
    ])
}

fn env_entries(env: &[mooring_core::EnvVar]) -> Vec<EnvVarEntry> {
    env.iter()
        .map(|e| EnvVarEntry {
            name: e.key.clone(),
            value: e.value.clone(),
        })
        .collect()
}

/// Limits straight from the descriptor, requests derived by ratio.
fn quota(cpu_max: f64, memory_max: f64, ratio: f64) -> ResourceRequirements {
    ResourceRequirements {
        limits: BTreeMap::from([
            ("cpu".to_string(), Quantity::fixed(cpu_max)),
            ("memory".to_string(), Quantity::fixed(memory_max)),
        ]),
        requests: BTreeMap::from([
            ("cpu".to_string(), Quantity::fixed(cpu_max * ratio)),
            ("memory".to_string(), Quantity::fixed(memory_max * ratio)),
        ]),
    }
}

// ── Workload → Deployment ─────────────────────────────────────────

pub fn workload_manifest(workload: &Workload, policy: &TranslatePolicy) -> Deployment {
    let labels = app_labels(&workload.name);

    let ports = workload
        .ports
        .iter()
        .map(|p| ContainerPort {
            name: format!("port-{}", p.container_port),
            container_port: p.container_port,
            protocol: policy.protocol(&p.protocol),
        })
        .collect();

    Deployment {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        metadata: ObjectMeta {
            name: workload.name.clone(),
            namespace: workload.namespace.clone(),
            labels: labels.clone(),
            annotations: managed_annotations(),
        },
        spec: DeploymentSpec {
            replicas: workload.replicas,
            selector: LabelSelector {
                match_labels: labels.clone(),
            },
            template: PodTemplateSpec {
                metadata: TemplateMeta { labels },
                spec: PodSpec {
                    containers: vec![Container {
                        name: workload.name.clone(),
                        image: workload.image.clone(),
                        ports,
                        env: env_entries(&workload.env),
                        resources: quota(
                            workload.cpu_max,
                            workload.memory_max,
                            policy.workload_request_ratio,
                        ),
                        image_pull_policy: Some(policy.pull_policy(&workload.pull_policy)),
                        volume_mounts: vec![],
                    }],
                    termination_grace_period_seconds: None,
                },
            },
        },
    }
}

// ── Middleware → StatefulSet ──────────────────────────────────────

pub fn middleware_manifest(middleware: &Middleware, policy: &TranslatePolicy) -> StatefulSet {
    let labels = app_labels(&middleware.name);

    let ports = middleware
        .ports
        .iter()
        .map(|p| ContainerPort {
            name: format!("port-{}", p.port),
            container_port: p.port,
            protocol: policy.protocol(&p.protocol),
        })
        .collect();

    let volume_mounts = middleware
        .storage
        .iter()
        .map(|s| VolumeMount {
            name: s.name.clone(),
            mount_path: s.mount_path.clone(),
        })
        .collect();

    let volume_claim_templates = middleware
        .storage
        .iter()
        .map(|s| PersistentVolumeClaim {
            api_version: "v1".to_string(),
            kind: "PersistentVolumeClaim".to_string(),
            metadata: ObjectMeta {
                name: s.name.clone(),
                namespace: middleware.namespace.clone(),
                labels: BTreeMap::new(),
                annotations: claim_annotations(policy),
            },
            spec: PersistentVolumeClaimSpec {
                access_modes: vec![policy.access_mode(&s.access_mode)],
                resources: ResourceRequirements {
                    limits: BTreeMap::new(),
                    requests: BTreeMap::from([(
                        "storage".to_string(),
                        Quantity::gibibytes(s.size_gi),
                    )]),
                },
                storage_class_name: s.storage_class.clone(),
                volume_mode: None,
                volume_name: Some(s.name.clone()),
            },
        })
        .collect();

    StatefulSet {
        api_version: "apps/v1".to_string(),
        kind: "StatefulSet".to_string(),
        metadata: ObjectMeta {
            name: middleware.name.clone(),
            namespace: middleware.namespace.clone(),
            labels: labels.clone(),
            annotations: managed_annotations(),
        },
        spec: StatefulSetSpec {
            replicas: middleware.replicas,
            selector: LabelSelector {
                match_labels: labels.clone(),
            },
            service_name: middleware.name.clone(),
            template: PodTemplateSpec {
                metadata: TemplateMeta { labels },
                spec: PodSpec {
                    containers: vec![Container {
                        name: middleware.name.clone(),
                        image: middleware.image.clone(),
                        ports,
                        env: env_entries(&middleware.env),
                        resources: quota(
                            middleware.cpu,
                            middleware.memory,
                            policy.middleware_request_ratio,
                        ),
                        image_pull_policy: None,
                        volume_mounts,
                    }],
                    termination_grace_period_seconds: Some(policy.termination_grace_seconds),
                },
            },
            volume_claim_templates,
        },
    }
}

// ── NetworkService → Service ──────────────────────────────────────

pub fn service_manifest(service: &NetworkService, policy: &TranslatePolicy) -> Service {
    let service_type = policy.service_type(&service.service_type);

    let ports = service
        .ports
        .iter()
        .map(|p| ServicePortEntry {
            name: format!("port-{}", p.port),
            port: p.port,
            target_port: p.target_port,
            node_port: (service_type == ServiceType::NodePort && p.node_port > 0)
                .then_some(p.node_port),
            protocol: policy.protocol(&p.protocol),
        })
        .collect();

    let external_name = (service_type == ServiceType::ExternalName
        && !service.external_name.is_empty())
    .then(|| service.external_name.clone());

    Service {
        api_version: "v1".to_string(),
        kind: "Service".to_string(),
        metadata: ObjectMeta {
            name: service.name.clone(),
            namespace: service.namespace.clone(),
            // The service is addressed by its own name but selects the
            // workload it fronts.
            labels: app_labels(&service.workload_name),
            annotations: managed_annotations(),
        },
        spec: ServiceSpec {
            service_type,
            selector: app_labels(&service.workload_name),
            ports,
            external_name,
        },
    }
}

// ── Route → Ingress ───────────────────────────────────────────────

pub fn route_manifest(route: &Route, policy: &TranslatePolicy) -> Ingress {
    let paths = route
        .paths
        .iter()
        .map(|p| HttpIngressPath {
            path: p.path.clone(),
            path_type: "Prefix".to_string(),
            backend: IngressBackend {
                service: IngressServiceBackend {
                    name: p.backend_service.clone(),
                    port: ServiceBackendPort {
                        number: p.backend_port,
                    },
                },
            },
        })
        .collect();

    Ingress {
        api_version: "networking.k8s.io/v1".to_string(),
        kind: "Ingress".to_string(),
        metadata: ObjectMeta {
            name: route.name.clone(),
            namespace: route.namespace.clone(),
            labels: app_labels(&route.name),
            annotations: managed_annotations(),
        },
        spec: IngressSpec {
            ingress_class_name: policy.ingress_class.clone(),
            rules: vec![IngressRule {
                host: route.host.clone(),
                http: HttpIngressRuleValue { paths },
            }],
        },
    }
}

// ── Volume → PersistentVolumeClaim ────────────────────────────────

pub fn volume_manifest(volume: &Volume, policy: &TranslatePolicy) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        api_version: "v1".to_string(),
        kind: "PersistentVolumeClaim".to_string(),
        metadata: ObjectMeta {
            name: volume.name.clone(),
            namespace: volume.namespace.clone(),
            labels: BTreeMap::new(),
            annotations: claim_annotations(policy),
        },
        spec: PersistentVolumeClaimSpec {
            access_modes: vec![policy.access_mode(&volume.access_mode)],
            resources: ResourceRequirements {
                limits: BTreeMap::new(),
                requests: BTreeMap::from([(
                    "storage".to_string(),
                    Quantity::gibibytes(volume.request_size_gi),
                )]),
            },
            storage_class_name: volume.storage_class.clone(),
            volume_mode: Some(policy.volume_mode(&volume.volume_mode)),
            volume_name: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_core::{
        EnvVar, MiddlewarePort, MiddlewareStorage, RoutePath, ServicePort, WorkloadPort,
    };

    fn test_workload() -> Workload {
        Workload {
            id: 0,
            name: "api".to_string(),
            namespace: "prod".to_string(),
            team_id: 1,
            image: "registry.local/api:2.1".to_string(),
            replicas: 3,
            cpu_max: 4.0,
            memory_max: 8.0,
            pull_policy: "IfNotPresent".to_string(),
            restart_policy: String::new(),
            ports: vec![
                WorkloadPort {
                    container_port: 8080,
                    protocol: "TCP".to_string(),
                },
                WorkloadPort {
                    container_port: 9090,
                    protocol: "http".to_string(),
                },
            ],
            env: vec![EnvVar {
                key: "MODE".to_string(),
                value: "prod".to_string(),
            }],
        }
    }

    fn test_middleware() -> Middleware {
        Middleware {
            id: 0,
            name: "mysql-a".to_string(),
            namespace: "infra".to_string(),
            type_id: 1,
            version_id: 2,
            image: "mysql:8.0".to_string(),
            replicas: 1,
            cpu: 2.0,
            memory: 8.0,
            ports: vec![MiddlewarePort {
                port: 3306,
                protocol: "TCP".to_string(),
            }],
            env: vec![],
            storage: vec![MiddlewareStorage {
                name: "data".to_string(),
                size_gi: 20.0,
                mount_path: "/var/lib/mysql".to_string(),
                storage_class: "rbd".to_string(),
                access_mode: "ReadWriteOnce".to_string(),
            }],
            config: None,
        }
    }

    #[test]
    fn workload_selector_matches_template_labels() {
        let manifest = workload_manifest(&test_workload(), &TranslatePolicy::default());
        assert_eq!(
            manifest.spec.selector.match_labels,
            manifest.spec.template.metadata.labels
        );
        assert_eq!(
            manifest.spec.selector.match_labels.get("app-name"),
            Some(&"api".to_string())
        );
    }

    #[test]
    fn workload_quarter_rule() {
        let manifest = workload_manifest(&test_workload(), &TranslatePolicy::default());
        let resources = &manifest.spec.template.spec.containers[0].resources;
        assert_eq!(resources.limits["cpu"].0, "4.000000");
        assert_eq!(resources.requests["cpu"].0, "1.000000");
        assert_eq!(resources.limits["memory"].0, "8.000000");
        assert_eq!(resources.requests["memory"].0, "2.000000");
    }

    #[test]
    fn workload_unknown_protocol_defaults_to_tcp() {
        let manifest = workload_manifest(&test_workload(), &TranslatePolicy::default());
        let ports = &manifest.spec.template.spec.containers[0].ports;
        assert_eq!(ports[0].protocol, Protocol::Tcp);
        assert_eq!(ports[1].protocol, Protocol::Tcp); // "http" normalized
        assert_eq!(ports[0].name, "port-8080");
    }

    #[test]
    fn workload_unknown_pull_policy_defaults_to_always() {
        let mut workload = test_workload();
        workload.pull_policy = "sometimes".to_string();
        let manifest = workload_manifest(&workload, &TranslatePolicy::default());
        assert_eq!(
            manifest.spec.template.spec.containers[0].image_pull_policy,
            Some(PullPolicy::Always)
        );
    }

    #[test]
    fn middleware_half_rule() {
        let manifest = middleware_manifest(&test_middleware(), &TranslatePolicy::default());
        let resources = &manifest.spec.template.spec.containers[0].resources;
        assert_eq!(resources.limits["memory"].0, "8.000000");
        assert_eq!(resources.requests["memory"].0, "4.000000");
        assert_eq!(resources.requests["cpu"].0, "1.000000");
    }

    #[test]
    fn middleware_claim_template_per_storage_entry() {
        let manifest = middleware_manifest(&test_middleware(), &TranslatePolicy::default());
        assert_eq!(manifest.spec.volume_claim_templates.len(), 1);
        let claim = &manifest.spec.volume_claim_templates[0];
        assert_eq!(claim.metadata.name, "data");
        assert_eq!(claim.spec.resources.requests["storage"].0, "20.000000Gi");
        assert_eq!(claim.spec.access_modes, vec![AccessMode::ReadWriteOnce]);

        let mounts = &manifest.spec.template.spec.containers[0].volume_mounts;
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].mount_path, "/var/lib/mysql");

        assert_eq!(
            manifest.spec.template.spec.termination_grace_period_seconds,
            Some(10)
        );
        assert_eq!(manifest.spec.service_name, "mysql-a");
    }

    #[test]
    fn service_defaults_to_cluster_ip_and_selects_workload() {
        let service = NetworkService {
            id: 0,
            name: "api-svc".to_string(),
            namespace: "prod".to_string(),
            workload_name: "api".to_string(),
            service_type: "internal".to_string(), // unrecognized
            external_name: String::new(),
            team_id: 0,
            ports: vec![ServicePort {
                port: 80,
                target_port: 8080,
                node_port: 0,
                protocol: "TCP".to_string(),
            }],
        };
        let manifest = service_manifest(&service, &TranslatePolicy::default());
        assert_eq!(manifest.spec.service_type, ServiceType::ClusterIp);
        assert_eq!(
            manifest.spec.selector.get("app-name"),
            Some(&"api".to_string())
        );
        assert_eq!(manifest.spec.ports[0].target_port, 8080);
        assert_eq!(manifest.spec.ports[0].node_port, None);
    }

    #[test]
    fn node_port_only_emitted_for_node_port_services() {
        let service = NetworkService {
            id: 0,
            name: "edge".to_string(),
            namespace: "prod".to_string(),
            workload_name: "api".to_string(),
            service_type: "NodePort".to_string(),
            external_name: String::new(),
            team_id: 0,
            ports: vec![ServicePort {
                port: 80,
                target_port: 8080,
                node_port: 30080,
                protocol: "TCP".to_string(),
            }],
        };
        let manifest = service_manifest(&service, &TranslatePolicy::default());
        assert_eq!(manifest.spec.service_type, ServiceType::NodePort);
        assert_eq!(manifest.spec.ports[0].node_port, Some(30080));
    }

    #[test]
    fn route_paths_keep_order() {
        let route = Route {
            id: 0,
            name: "edge".to_string(),
            namespace: "prod".to_string(),
            host: "app.example.com".to_string(),
            paths: vec![
                RoutePath {
                    path: "/api".to_string(),
                    backend_service: "api-svc".to_string(),
                    backend_port: 80,
                },
                RoutePath {
                    path: "/".to_string(),
                    backend_service: "web-svc".to_string(),
                    backend_port: 8080,
                },
            ],
        };
        let manifest = route_manifest(&route, &TranslatePolicy::default());
        assert_eq!(manifest.spec.ingress_class_name, "nginx");
        assert_eq!(manifest.spec.rules.len(), 1);
        let paths = &manifest.spec.rules[0].http.paths;
        assert_eq!(paths[0].path, "/api");
        assert_eq!(paths[1].backend.service.name, "web-svc");
        assert_eq!(paths[0].path_type, "Prefix");
    }

    #[test]
    fn volume_storage_request_format() {
        let volume = Volume {
            id: 0,
            name: "data-1".to_string(),
            namespace: "ns1".to_string(),
            access_mode: "ReadWriteOnce".to_string(),
            storage_class: "rbd".to_string(),
            request_size_gi: 10.0,
            volume_mode: String::new(),
        };
        let manifest = volume_manifest(&volume, &TranslatePolicy::default());
        assert_eq!(manifest.spec.resources.requests["storage"].0, "10.000000Gi");
        assert_eq!(manifest.spec.access_modes, vec![AccessMode::ReadWriteOnce]);
        assert_eq!(manifest.spec.volume_mode, Some(VolumeMode::Filesystem));
        assert_eq!(
            manifest.metadata.annotations["volume.beta.kubernetes.io/storage-provisioner"],
            "rbd.csi.ceph.com"
        );
    }

    #[test]
    fn policy_override_changes_derivation() {
        let policy = TranslatePolicy {
            workload_request_ratio: 0.5,
            ..Default::default()
        };
        let manifest = workload_manifest(&test_workload(), &policy);
        let resources = &manifest.spec.template.spec.containers[0].resources;
        assert_eq!(resources.requests["cpu"].0, "2.000000");
    }
}
