//! SurrealDB implementation of [`SettingsRepository`].
//!
//! One row under a fixed id holds the whole settings object.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use vigil_core::error::VigilResult;
use vigil_core::models::settings::Settings;
use vigil_core::repository::SettingsRepository;

use crate::error::StoreError;

const SETTINGS_ID: &str = "global";

#[derive(Debug, SurrealValue)]
struct SettingsRow {
    webhook_url: Option<String>,
    message_template: String,
    title: String,
    subtitle: String,
    logo_url: Option<String>,
    favicon_url: Option<String>,
}

impl SettingsRow {
    fn into_settings(self) -> Settings {
        Settings {
            webhook_url: self.webhook_url,
            message_template: self.message_template,
            title: self.title,
            subtitle: self.subtitle,
            logo_url: self.logo_url,
            favicon_url: self.favicon_url,
        }
    }
}

/// SurrealDB implementation of the settings repository.
#[derive(Clone)]
pub struct SurrealSettingsRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSettingsRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SettingsRepository for SurrealSettingsRepository<C> {
    async fn load(&self) -> VigilResult<Settings> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('settings', $id)")
            .bind(("id", SETTINGS_ID.to_string()))
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<SettingsRow> = result.take(0).map_err(StoreError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(SettingsRow::into_settings)
            .unwrap_or_default())
    }

    async fn save(&self, settings: Settings) -> VigilResult<()> {
        self.db
            .query(
                "UPSERT type::record('settings', $id) SET \
                 webhook_url = $webhook_url, \
                 message_template = $message_template, \
                 title = $title, \
                 subtitle = $subtitle, \
                 logo_url = $logo_url, \
                 favicon_url = $favicon_url",
            )
            .bind(("id", SETTINGS_ID.to_string()))
            .bind(("webhook_url", settings.webhook_url))
            .bind(("message_template", settings.message_template))
            .bind(("title", settings.title))
            .bind(("subtitle", settings.subtitle))
            .bind(("logo_url", settings.logo_url))
            .bind(("favicon_url", settings.favicon_url))
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }
}
