//! Cross-entity reference tracking.
//!
//! Shapes can act as reference sources for other product entities. The
//! tracker is notified after shape operations succeed; its failures are
//! logged by the caller and never fail the shape operation itself.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Shape;

#[async_trait]
pub trait ReferenceTracker: Send + Sync {
    /// Whether shapes of this kind take part in reference tracking.
    fn is_reference_source(&self, _shape: &Shape) -> bool {
        true
    }

    async fn shape_created(&self, diagram_id: &str, shape: &Shape) -> Result<()>;

    async fn shape_label_updated(&self, diagram_id: &str, shape: &Shape) -> Result<()>;

    async fn shape_deleted(&self, diagram_id: &str, shape_id: &str) -> Result<()>;
}

/// Tracker that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReferenceTracker;

#[async_trait]
impl ReferenceTracker for NoopReferenceTracker {
    fn is_reference_source(&self, _shape: &Shape) -> bool {
        false
    }

    async fn shape_created(&self, _diagram_id: &str, _shape: &Shape) -> Result<()> {
        Ok(())
    }

    async fn shape_label_updated(&self, _diagram_id: &str, _shape: &Shape) -> Result<()> {
        Ok(())
    }

    async fn shape_deleted(&self, _diagram_id: &str, _shape_id: &str) -> Result<()> {
        Ok(())
    }
}
