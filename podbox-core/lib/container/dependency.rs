//! Namespace dependency resolution.
//!
//! Joining another container's namespace creates a hard dependency between
//! the two. The checks here encode the legality rules: the referenced
//! container must be a finalized entity, and namespace sharing must never
//! cross a pod boundary.

use crate::pod::Pod;
use crate::{PodboxError, PodboxResult};

use super::Container;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Validates that `dep` is a legal namespace/startup dependency for `ctr`.
///
/// The referenced container must have completed construction, and when `ctr`
/// has joined a pod, `dep` must be a member of the same pod. On success the
/// caller stores `dep`'s ID; no object reference is retained.
pub(crate) fn check_dependency_container(dep: &Container, ctr: &Container) -> PodboxResult<()> {
    if !dep.valid {
        return Err(PodboxError::Dependency(format!(
            "container {} has not completed construction",
            dep.id()
        )));
    }

    if !ctr.config.pod.is_empty() && dep.config.pod != ctr.config.pod {
        return Err(PodboxError::Dependency(format!(
            "container has joined pod {} and dependency container {} is not a member of the pod",
            ctr.config.pod,
            dep.id()
        )));
    }

    Ok(())
}

/// Validates that `ctr_pod` (the pod the container joined, possibly empty)
/// matches the pod whose namespaces are being requested.
pub(crate) fn valid_pod_ns_option(pod: &Pod, ctr_pod: &str) -> PodboxResult<()> {
    if ctr_pod.is_empty() {
        return Err(PodboxError::InvalidArgument(
            "container must be a member of the pod to share its namespaces".to_string(),
        ));
    }

    if ctr_pod != pod.id() {
        return Err(PodboxError::InvalidArgument(
            "pod passed in does not match the pod this container is associated with".to_string(),
        ));
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pod::PodConfig;

    fn finalized_container(pod: &str) -> Container {
        let mut ctr = Container::new();
        ctr.config.pod = pod.to_string();
        ctr.valid = true;
        ctr
    }

    fn pod_with_id(id: &str) -> Pod {
        let mut pod = Pod::new();
        pod.config = PodConfig {
            id: id.to_string(),
            ..PodConfig::default()
        };
        pod.valid = true;
        pod
    }

    #[test]
    fn test_unfinalized_dependency_rejected() {
        let dep = Container::new();
        let ctr = Container::new();
        assert!(matches!(
            check_dependency_container(&dep, &ctr),
            Err(PodboxError::Dependency(_))
        ));
    }

    #[test]
    fn test_cross_pod_dependency_rejected() {
        let dep = finalized_container("pod-a");
        let mut ctr = Container::new();
        ctr.config.pod = "pod-b".to_string();

        assert!(matches!(
            check_dependency_container(&dep, &ctr),
            Err(PodboxError::Dependency(_))
        ));
    }

    #[test]
    fn test_same_pod_dependency_accepted() {
        let dep = finalized_container("pod-a");
        let mut ctr = Container::new();
        ctr.config.pod = "pod-a".to_string();

        assert!(check_dependency_container(&dep, &ctr).is_ok());
    }

    #[test]
    fn test_podless_container_may_depend_anywhere() {
        let dep = finalized_container("pod-a");
        let ctr = Container::new();

        assert!(check_dependency_container(&dep, &ctr).is_ok());
    }

    #[test]
    fn test_pod_ns_option_requires_membership() {
        let pod = pod_with_id("pod-a");

        assert!(valid_pod_ns_option(&pod, "pod-a").is_ok());
        assert!(valid_pod_ns_option(&pod, "").is_err());
        assert!(valid_pod_ns_option(&pod, "pod-b").is_err());
    }
}
