//! SurrealDB implementation of [`ImageStore`].
//!
//! The `image` table acts as the binary object bucket: one row per
//! screenshot, keyed by a UUID-derived filename so concurrent uploads
//! cannot collide. Bytes are stored base64-encoded to keep the table
//! SCHEMAFULL with plain string columns.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use vigil_core::error::VigilResult;
use vigil_core::repository::ImageStore;

use crate::error::StoreError;

#[derive(Debug, SurrealValue)]
struct ImageRow {
    #[allow(dead_code)]
    content_type: String,
    data: String,
}

#[derive(Debug, SurrealValue)]
struct TotalRow {
    total: u64,
}

/// SurrealDB implementation of the image bucket.
#[derive(Clone)]
pub struct SurrealImageStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealImageStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ImageStore for SurrealImageStore<C> {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> VigilResult<String> {
        let size = bytes.len() as u64;
        let data = BASE64.encode(bytes);

        self.db
            .query(
                "CREATE type::record('image', $filename) SET \
                 content_type = $content_type, \
                 data = $data, \
                 size = $size",
            )
            .bind(("filename", filename.to_string()))
            .bind(("content_type", content_type.to_string()))
            .bind(("data", data))
            .bind(("size", size))
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(filename.to_string())
    }

    async fn fetch(&self, reference: &str) -> VigilResult<Vec<u8>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('image', $filename)")
            .bind(("filename", reference.to_string()))
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<ImageRow> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "image".into(),
            id: reference.to_string(),
        })?;

        BASE64
            .decode(row.data)
            .map_err(|e| StoreError::Migration(format!("corrupt image data: {e}")).into())
    }

    async fn delete(&self, reference: &str) -> VigilResult<()> {
        self.db
            .query("DELETE type::record('image', $filename)")
            .bind(("filename", reference.to_string()))
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn total_bytes(&self) -> VigilResult<u64> {
        let mut result = self
            .db
            .query("SELECT math::sum(size) AS total FROM image GROUP ALL")
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<TotalRow> = result.take(0).map_err(StoreError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
