use tracing::debug;

use caravan_core::model::Order;

/// Fire-and-forget customer notification after finalization. Failures are
/// logged by the caller and never roll back a finalized run.
pub trait NotificationDispatch: Send + Sync {
    fn order_scheduled(&self, order: &Order) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Discards notifications; the default when no SMS/push channel is wired up.
pub struct NoopNotifier;

impl NotificationDispatch for NoopNotifier {
    async fn order_scheduled(&self, order: &Order) -> anyhow::Result<()> {
        debug!(order = %order.id, eta = ?order.estimated_arrival, "notification suppressed");
        Ok(())
    }
}
