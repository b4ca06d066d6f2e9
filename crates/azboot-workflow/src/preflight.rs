use azboot_domain::CallerContext;
use azboot_provider::{Provider, ProviderError};
use tracing::info;

use crate::error::WorkflowError;

/// Confirm there is a signed-in session and that its active subscription is
/// `subscription_id`. Makes exactly one provider call and nothing else.
pub async fn preflight(
    provider: &dyn Provider,
    subscription_id: &str,
) -> Result<CallerContext, WorkflowError> {
    let ctx = match provider.caller_context().await {
        Ok(ctx) => ctx,
        Err(ProviderError::NotAuthenticated(msg)) => return Err(WorkflowError::NotAuthenticated(msg)),
        Err(e) => return Err(e.into()),
    };

    if !ctx.is_subscription(subscription_id) {
        return Err(WorkflowError::SubscriptionMismatch {
            expected: subscription_id.to_string(),
            actual: ctx.subscription_id,
        });
    }

    info!(
        tenant_id = %ctx.tenant_id,
        subscription = %ctx.subscription_name,
        user = %ctx.user_name,
        "signed in"
    );
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use azboot_provider::InMemoryProvider;

    #[tokio::test]
    async fn signed_out_is_not_authenticated() {
        let p = InMemoryProvider::new();
        let err = preflight(&p, "sub").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotAuthenticated(_)));
    }

    #[tokio::test]
    async fn wrong_subscription_is_rejected() {
        let p = InMemoryProvider::signed_in("tenant", "sub-a");
        let err = preflight(&p, "sub-b").await.unwrap_err();
        match err {
            WorkflowError::SubscriptionMismatch { expected, actual } => {
                assert_eq!(expected, "sub-b");
                assert_eq!(actual, "sub-a");
            }
            other => panic!("unexpected: {}", other),
        }
        assert_eq!(p.calls().await, vec!["caller_context".to_string()]);
    }

    #[tokio::test]
    async fn matching_subscription_passes() {
        let p = InMemoryProvider::signed_in("tenant", "SUB-A");
        let ctx = preflight(&p, "sub-a").await.unwrap();
        assert_eq!(ctx.tenant_id, "tenant");
    }
}
