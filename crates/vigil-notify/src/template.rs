//! Message template rendering.
//!
//! The message body comes from an operator-configurable template with
//! named `{placeholder}` substitution. Missing optional fields render
//! as a literal fallback so the message never shows an empty slot.

use chrono::{DateTime, Utc};

/// Fallback substituted for absent optional fields.
pub const EMPTY_FIELD: &str = "None";

/// The named values available to a message template.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub individual_name: String,
    pub date_time: DateTime<Utc>,
    pub location: String,
    pub reason: String,
    pub seized_items: Option<String>,
    pub responsible_officers: String,
    pub created_by: String,
    pub articles: Vec<String>,
    pub observations: Option<String>,
}

fn or_fallback(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => EMPTY_FIELD,
    }
}

/// Substitute every named placeholder in `template`.
///
/// Placeholders keep the operator-facing camelCase names the template
/// editor documents: `{individualName}`, `{dateTime}`, `{location}`,
/// `{reason}`, `{seizedItems}`, `{responsibleOfficers}`, `{createdBy}`,
/// `{articles}`, `{observations}`.
pub fn render_template(template: &str, ctx: &MessageContext) -> String {
    let articles = if ctx.articles.is_empty() {
        EMPTY_FIELD.to_string()
    } else {
        ctx.articles.join(", ")
    };

    template
        .replace("{individualName}", &ctx.individual_name)
        .replace(
            "{dateTime}",
            &ctx.date_time.format("%Y-%m-%d %H:%M UTC").to_string(),
        )
        .replace("{location}", &ctx.location)
        .replace("{reason}", &ctx.reason)
        .replace("{seizedItems}", or_fallback(&ctx.seized_items))
        .replace("{responsibleOfficers}", &ctx.responsible_officers)
        .replace("{createdBy}", &ctx.created_by)
        .replace("{articles}", &articles)
        .replace("{observations}", or_fallback(&ctx.observations))
}
