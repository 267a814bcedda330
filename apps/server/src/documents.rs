//! Local filesystem document store.
//!
//! Renders a payload by writing it as pretty JSON under
//! `<documents_dir>/<template_id>/<document_id>.json`. Layout-specific
//! rendering (PDF sheets, portal uploads) plugs in behind the same trait.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use fundflow_core::documents::{DocumentRef, DocumentStoreTrait};
use fundflow_core::errors::{Error, Result};
use uuid::Uuid;

pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn valid_template_id(template_id: &str) -> bool {
    !template_id.is_empty()
        && template_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl DocumentStoreTrait for LocalDocumentStore {
    async fn render(&self, template_id: &str, payload: serde_json::Value) -> Result<DocumentRef> {
        if !valid_template_id(template_id) {
            return Err(Error::Document(format!(
                "invalid template id '{}'",
                template_id
            )));
        }
        let dir = self.root.join(template_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Document(format!("{}: {}", dir.display(), e)))?;

        let document_id = Uuid::now_v7().to_string();
        let path = dir.join(format!("{}.json", document_id));
        let body = serde_json::to_vec_pretty(&payload)
            .map_err(|e| Error::Document(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| Error::Document(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Rendered {} as {}", template_id, path.display());
        Ok(DocumentRef {
            document_id,
            template_id: template_id.to_string(),
            location: path.to_string_lossy().into_owned(),
            rendered_at: Utc::now().naive_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_render_writes_payload_to_template_folder() {
        let dir = tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        let doc = store
            .render("allotment_sheet", serde_json::json!({"totalUnits": 12000}))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&doc.location).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["totalUnits"], 12000);
        assert!(doc.location.contains("allotment_sheet"));
    }

    #[tokio::test]
    async fn test_render_rejects_path_like_template_ids() {
        let dir = tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        let err = store
            .render("../escape", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "DocumentError");
    }
}
