use async_trait::async_trait;
use serde::Serialize;

use super::DocumentRef;
use crate::errors::{Error, Result};

/// Renders a payload through a template and stores the result.
#[async_trait]
pub trait DocumentStoreTrait: Send + Sync {
    async fn render(&self, template_id: &str, payload: serde_json::Value) -> Result<DocumentRef>;
}

/// Serializes `payload` and hands it to the store.
pub async fn render_document<T: Serialize + ?Sized>(
    store: &dyn DocumentStoreTrait,
    template_id: &str,
    payload: &T,
) -> Result<DocumentRef> {
    let value = serde_json::to_value(payload)
        .map_err(|e| Error::Document(format!("unserializable payload: {}", e)))?;
    store.render(template_id, value).await
}
