//! Per-event configuration document as fetched from
//! `<base>/events/<slug>/config.json`.
//!
//! Every field is optional. The renderer treats an absent field and an empty
//! one the same way: the section that would show it is left out.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A text field that is either the same in every locale or keyed by locale
/// code (`en`, `jp`). Non-string entries of a locale map count as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    ByLocale(BTreeMap<String, Value>),
    /// Anything else in the document (numbers, nulls, nested objects). Renders as empty.
    Other(Value),
}

impl Default for LocalizedText {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigDocument {
    pub brand: Option<LocalizedText>,
    pub title: Option<LocalizedText>,
    pub subtitle: Option<LocalizedText>,
    pub date: Option<LocalizedText>,
    pub venue: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub policy: Option<LocalizedText>,
    pub dress_code: Option<LocalizedText>,
    pub hero_bg: Option<String>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tiers: Vec<TicketTier>,
    #[serde(deserialize_with = "null_as_default")]
    pub lineup: Vec<LineupEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub faq: Vec<FaqEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub vip_flow: Vec<VipStep>,
    #[serde(deserialize_with = "null_as_default")]
    pub gallery: Vec<String>,
    pub video: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub payments: Vec<PaymentMethod>,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Links,
    pub music: Option<String>,
}

impl ConfigDocument {
    pub fn tier(&self, id: &str) -> Option<&TicketTier> {
        self.tiers.iter().find(|t| t.id == id)
    }

    /// Music asset filename, if one is configured and non-blank.
    pub fn music_asset(&self) -> Option<&str> {
        self.music.as_deref().filter(|m| !m.trim().is_empty())
    }

    pub fn currency_symbol(&self) -> &str {
        self.currency
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("¥")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketTier {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub name: Option<LocalizedText>,
    #[serde(deserialize_with = "lenient_amount")]
    pub price: i64,
    pub includes: Option<LocalizedText>,
    #[serde(deserialize_with = "null_as_default")]
    pub sold_out: bool,
    pub badge: Option<LocalizedText>,
    pub note: Option<LocalizedText>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineupEntry {
    pub name: Option<LocalizedText>,
    pub role: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleEntry {
    pub time: Option<String>,
    pub label: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqEntry {
    pub q: Option<LocalizedText>,
    pub a: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VipStep {
    pub title: Option<LocalizedText>,
    pub text: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentMethod {
    pub name: Option<LocalizedText>,
    pub note: Option<LocalizedText>,
    pub qr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    pub tickets: Option<String>,
    pub merch: Option<String>,
    pub instagram: Option<String>,
    pub x: Option<String>,
    pub line: Option<String>,
}

impl Links {
    /// Configured links in display order, blank ones skipped.
    pub fn present(&self) -> Vec<(&'static str, &str)> {
        [
            ("tickets", &self.tickets),
            ("merch", &self.merch),
            ("instagram", &self.instagram),
            ("x", &self.x),
            ("line", &self.line),
        ]
        .into_iter()
        .filter_map(|(kind, href)| {
            href.as_deref()
                .filter(|h| !h.trim().is_empty())
                .map(|h| (kind, h))
        })
        .collect()
    }
}

/// `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `1500`, `1500.0` or `"1500"`; anything else is `0`.
fn lenient_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    })
}
