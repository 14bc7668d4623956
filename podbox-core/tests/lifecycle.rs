//! Integration tests driving the full entity lifecycle through a runtime
//! with in-memory collaborators.

use std::sync::Arc;

use podbox_core::container::{
    with_dependency_ctrs, with_name, with_pod, with_user_ns_from, with_uts_ns_from_pod,
};
use podbox_core::oci::{IdMap, IdMappingOptions};
use podbox_core::pod::{with_infra_container, with_pod_name, with_pod_namespace, with_pod_uts};
use podbox_core::runtime::RuntimeOption;
use podbox_core::secret::InMemorySecretStore;
use podbox_core::state::InMemoryState;
use podbox_core::volume::with_volume_name;
use podbox_core::{container, PodboxError, Runtime};

fn new_runtime(options: Vec<RuntimeOption>) -> Runtime {
    Runtime::new(
        Arc::new(InMemoryState::new()),
        Arc::new(InMemorySecretStore::new()),
        options,
    )
    .unwrap()
}

#[test_log::test]
fn test_pod_uts_sharing_requires_infra_registration() {
    let rt = new_runtime(vec![]);

    let pod = rt
        .new_pod(vec![
            with_pod_name("frontend"),
            with_pod_namespace("prod"),
            with_pod_uts(),
            with_infra_container(),
        ])
        .unwrap();

    // No infra container exists yet, so joining the pod's UTS namespace
    // cannot resolve a target
    let err = rt.new_container(vec![
        container::with_ctr_namespace("prod"),
        with_pod(&pod),
        with_uts_ns_from_pod(&pod),
    ]);
    assert!(matches!(err, Err(PodboxError::NoInfraContainer(_))));

    let infra = rt
        .new_infra_container(&pod, vec![container::with_ctr_namespace("prod")])
        .unwrap();

    // The pod snapshot handed to the option must carry the registration,
    // so re-resolve it through the runtime
    let pod = rt.pod(pod.id()).unwrap();
    let ctr = rt
        .new_container(vec![
            with_name("web"),
            container::with_ctr_namespace("prod"),
            with_pod(&pod),
            with_uts_ns_from_pod(&pod),
        ])
        .unwrap();

    assert_eq!(ctr.config().uts_ns_ctr(), infra.id());
    assert_eq!(ctr.dependencies(), vec![infra.id().to_string()]);
}

#[test_log::test]
fn test_finalized_entities_reject_mutation() {
    let rt = new_runtime(vec![]);
    let mut ctr = rt.new_container(vec![with_name("web")]).unwrap();

    let err = with_name("renamed")(&mut ctr);
    assert!(matches!(err, Err(PodboxError::ContainerFinalized)));
    assert_eq!(ctr.name(), "web");
}

#[test_log::test]
fn test_user_ns_sharing_propagates_id_mappings() {
    let rt = new_runtime(vec![]);

    let mappings = IdMappingOptions {
        uid_map: vec![IdMap {
            host_id: 100000,
            container_id: 0,
            size: 65536,
        }],
        gid_map: vec![
            IdMap {
                host_id: 100000,
                container_id: 0,
                size: 65536,
            },
            IdMap {
                host_id: 5000,
                container_id: 65536,
                size: 10,
            },
        ],
        ..IdMappingOptions::default()
    };

    let source = rt
        .new_container(vec![
            with_name("mapped"),
            container::with_id_mappings(mappings.clone()),
        ])
        .unwrap();

    let joined = rt
        .new_container(vec![with_name("joiner"), with_user_ns_from(&source)])
        .unwrap();

    assert_eq!(joined.id_mappings(), &mappings);
    assert_eq!(joined.spec().uid_mappings().len(), 1);
    assert_eq!(joined.spec().gid_mappings().len(), 2);
    assert_eq!(joined.spec().gid_mappings()[1].host_id, 5000);
    assert_eq!(joined.config().user_ns_ctr(), source.id());
}

#[test_log::test]
fn test_namespace_sharing_never_crosses_pods() {
    let rt = new_runtime(vec![]);

    let pod_a = rt.new_pod(vec![with_pod_name("a")]).unwrap();
    let pod_b = rt.new_pod(vec![with_pod_name("b")]).unwrap();

    let member_a = rt.new_container(vec![with_pod(&pod_a)]).unwrap();

    let err = rt.new_container(vec![with_pod(&pod_b), with_user_ns_from(&member_a)]);
    assert!(matches!(err, Err(PodboxError::Dependency(_))));

    // Explicit dependency lists obey the same boundary
    let err = rt.new_container(vec![
        with_pod(&pod_b),
        with_dependency_ctrs(std::slice::from_ref(&member_a)),
    ]);
    assert!(matches!(err, Err(PodboxError::Dependency(_))));
}

#[test_log::test]
fn test_volume_lifecycle_and_chown_state() {
    let rt = new_runtime(vec![]);

    let anon = rt.new_volume(vec![]).unwrap();
    assert!(*anon.config().is_anon());
    assert_eq!(anon.name().len(), 64);

    let named = rt.new_volume(vec![with_volume_name("pgdata")]).unwrap();
    assert!(named.needs_chown());

    // The chown fixup flag is runtime state and stays writable after
    // finalization
    let mut stored = rt.volume("pgdata").unwrap();
    stored.set_needs_chown(false);
    assert!(!stored.needs_chown());

    // Duplicate names are rejected by the store
    let err = rt.new_volume(vec![with_volume_name("pgdata")]);
    assert!(matches!(err, Err(PodboxError::EntityExists(_))));
}

#[test_log::test]
fn test_failed_construction_leaves_no_trace_in_state() {
    let rt = new_runtime(vec![]);

    let err = rt.new_container(vec![
        with_name("half-built"),
        container::with_stop_signal(99),
    ]);
    assert!(matches!(err, Err(PodboxError::InvalidArgument(_))));

    // Nothing was handed to the backing store
    let pod = rt.new_pod(vec![with_pod_name("probe")]).unwrap();
    let probe = rt.new_container(vec![with_pod(&pod)]).unwrap();
    assert!(rt.container(probe.id()).is_ok());
}
