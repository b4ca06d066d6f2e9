use std::future::Future;

use azboot_provider::ProviderError;
use tracing::{info, warn};

use crate::error::WorkflowError;
use crate::report::{ResourceKind, StepStatus};

/// Result of [`ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ensured<T> {
    Existing(T),
    Created(T),
    /// Nothing matched and the run is plan-only.
    Planned,
}

impl<T> Ensured<T> {
    pub fn status(&self) -> StepStatus {
        match self {
            Ensured::Existing(_) => StepStatus::Existing,
            Ensured::Created(_) => StepStatus::Created,
            Ensured::Planned => StepStatus::Planned,
        }
    }

    pub fn resource(&self) -> Option<&T> {
        match self {
            Ensured::Existing(r) | Ensured::Created(r) => Some(r),
            Ensured::Planned => None,
        }
    }
}

/// Read-before-write ensure, keyed on a natural identifier.
///
/// `query` yields every remote resource matching `key`. Any match satisfies
/// the step without mutation. With no match, `create` is invoked exactly once,
/// unless `plan_only` is set, in which case nothing is created. Query and
/// create failures propagate unchanged; there is no retry.
pub async fn ensure<T, Q, C, F>(
    kind: ResourceKind,
    key: &str,
    plan_only: bool,
    query: Q,
    create: C,
) -> Result<Ensured<T>, WorkflowError>
where
    Q: Future<Output = Result<Vec<T>, ProviderError>>,
    C: FnOnce() -> F,
    F: Future<Output = Result<T, WorkflowError>>,
{
    let matches = query.await?;
    if matches.len() > 1 {
        warn!(%kind, key, count = matches.len(), "multiple matches; using the first");
    }

    if let Some(found) = matches.into_iter().next() {
        info!(%kind, key, "already exists");
        return Ok(Ensured::Existing(found));
    }

    if plan_only {
        info!(%kind, key, "would create");
        return Ok(Ensured::Planned);
    }

    let created = create().await?;
    info!(%kind, key, "created");
    Ok(Ensured::Created(created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn existing_match_skips_create() {
        let created = Cell::new(0);
        let counter = &created;
        let out = ensure(
            ResourceKind::Application,
            "app",
            false,
            async { Ok(vec!["found"]) },
            move || async move {
                counter.set(counter.get() + 1);
                Ok("new")
            },
        )
        .await
        .unwrap();
        assert_eq!(out, Ensured::Existing("found"));
        assert_eq!(created.get(), 0);
    }

    #[tokio::test]
    async fn no_match_creates_once() {
        let created = Cell::new(0);
        let counter = &created;
        let out = ensure(
            ResourceKind::Application,
            "app",
            false,
            async { Ok(Vec::<&str>::new()) },
            move || async move {
                counter.set(counter.get() + 1);
                Ok("new")
            },
        )
        .await
        .unwrap();
        assert_eq!(out, Ensured::Created("new"));
        assert_eq!(created.get(), 1);
    }

    #[tokio::test]
    async fn plan_only_never_creates() {
        let created = Cell::new(0);
        let counter = &created;
        let out = ensure(
            ResourceKind::RoleAssignment,
            "ra",
            true,
            async { Ok(Vec::<&str>::new()) },
            move || async move {
                counter.set(counter.get() + 1);
                Ok("new")
            },
        )
        .await
        .unwrap();
        assert_eq!(out, Ensured::Planned);
        assert_eq!(out.status(), StepStatus::Planned);
        assert_eq!(created.get(), 0);
    }

    #[tokio::test]
    async fn query_failure_is_fatal() {
        let created = Cell::new(0);
        let counter = &created;
        let err = ensure(
            ResourceKind::ResourceGroup,
            "rg",
            false,
            async { Err::<Vec<&str>, _>(ProviderError::Internal("network".into())) },
            move || async move {
                counter.set(counter.get() + 1);
                Ok("new")
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Provider(_)));
        assert_eq!(created.get(), 0);
    }
}
