//! mooring-manifest — descriptor-to-manifest translation.
//!
//! Pure mapping from Mooring domain descriptors to orchestrator-native
//! manifests (Deployment, StatefulSet, Service, Ingress,
//! PersistentVolumeClaim). No network or store access happens here; the
//! translators take a validated descriptor and a [`TranslatePolicy`] and
//! return a typed manifest ready to submit.
//!
//! Unrecognized enumeration strings (protocols, access modes, pull
//! policies, volume modes, service types) normalize silently to the
//! policy default. That permissiveness is deliberate: validation belongs
//! to the coordinator, compatibility of the emitted manifest belongs
//! here.

pub mod model;
pub mod policy;
pub mod translate;

pub use model::*;
pub use policy::TranslatePolicy;
pub use translate::{
    middleware_manifest, route_manifest, service_manifest, volume_manifest, workload_manifest,
};
