//! Producer for the Productive.io financial report.
//!
//! Pulls the current year's financial item report, formats the configured
//! attributes and renders each as a white label slide followed by a yellow
//! value slide.

use crate::error::ProducerError;
use crate::producer::{Producer, Widget};
use crate::slide::{Color, Slide, SlideSet};
use async_trait::async_trait;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

const LABEL_DURATION: NonZeroU32 = seconds(4);
const VALUE_DURATION: NonZeroU32 = seconds(6);

const fn seconds(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(d) => d,
        None => NonZeroU32::MIN,
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How a raw report attribute is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Cents, shown as `1,234.56 EUR`.
    #[default]
    Currency,
    /// Minutes, shown as `12.50 h`.
    Hours,
    /// The raw value as text.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportField {
    /// Attribute name in the API response.
    pub attribute: String,
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
}

impl ReportField {
    pub fn new(attribute: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            attribute: attribute.to_string(),
            label: label.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductiveConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default = "default_unit_name")]
    pub unit_name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_report_endpoint")]
    pub report_endpoint: String,
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_fields")]
    pub fields: Vec<ReportField>,
}

fn default_unit_name() -> String {
    "Productive_Report".to_string()
}

fn default_base_url() -> String {
    "https://api.productive.io/api/v2/reports/".to_string()
}

fn default_report_endpoint() -> String {
    "financial_item_reports".to_string()
}

fn default_groups() -> Vec<String> {
    vec!["organization".to_string(), "date:year".to_string()]
}

fn default_page_size() -> u32 {
    100
}

fn default_fields() -> Vec<ReportField> {
    vec![
        ReportField::new("total_recognized_revenue", "Umsatz", FieldKind::Currency),
        ReportField::new("total_recognized_profit", "Gewinn", FieldKind::Currency),
        ReportField::new("total_recognized_time", "Arbeitsstunden", FieldKind::Hours),
    ]
}

impl Default for ProductiveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            org_id: String::new(),
            unit_name: default_unit_name(),
            base_url: default_base_url(),
            report_endpoint: default_report_endpoint(),
            groups: default_groups(),
            page_size: default_page_size(),
            fields: default_fields(),
        }
    }
}

impl ProductiveConfig {
    /// Both credentials are required before the producer is registered.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.org_id.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// API response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReportPage {
    #[serde(default)]
    data: Vec<ReportRow>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct ReportRow {
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    total_pages: Option<u32>,
}

// ---------------------------------------------------------------------------
// ProductiveProducer
// ---------------------------------------------------------------------------

pub struct ProductiveProducer {
    config: ProductiveConfig,
    http: reqwest::Client,
}

impl ProductiveProducer {
    pub fn new(config: ProductiveConfig, timeout: Duration) -> Result<Self, ProducerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProducerError::Upstream(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn report_url(&self) -> String {
        format!("{}{}", self.config.base_url, self.config.report_endpoint)
    }

    fn query(&self, year: i32, page: u32) -> Vec<(String, String)> {
        vec![
            ("filter[0][date][gt_eq]".into(), format!("{year}-01-01")),
            ("filter[0][date][lt_eq]".into(), format!("{year}-12-31")),
            ("filter[$op]".into(), "and".into()),
            ("page[number]".into(), page.to_string()),
            ("per_page".into(), self.config.page_size.to_string()),
            ("group".into(), self.config.groups.join(",")),
            ("report_currency".into(), "1".into()),
            ("sort".into(), "date:year".into()),
        ]
    }

    async fn fetch_page(&self, year: i32, page: u32) -> Result<ReportPage, ProducerError> {
        let url = self.report_url();
        tracing::info!(url = %url, page, "fetching productive report");
        let response = self
            .http
            .get(&url)
            .query(&self.query(year, page))
            .header("X-Auth-Token", &self.config.api_key)
            .header("X-Organization-Id", &self.config.org_id)
            .header(reqwest::header::CONTENT_TYPE, "application/vnd.api+json")
            .send()
            .await
            .map_err(|e| ProducerError::Upstream(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProducerError::Upstream(format!(
                "productive answered {status} for page {page}"
            )));
        }
        response
            .json::<ReportPage>()
            .await
            .map_err(|e| ProducerError::Upstream(format!("unreadable report page {page}: {e}")))
    }

    async fn fetch_all(&self, year: i32) -> Result<Vec<ReportRow>, ProducerError> {
        let mut rows = Vec::new();
        let mut page = 1;
        loop {
            let body = self.fetch_page(year, page).await?;
            if body.data.is_empty() {
                break;
            }
            rows.extend(body.data);
            let total_pages = body
                .meta
                .and_then(|m| m.pagination)
                .and_then(|p| p.total_pages)
                .unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }
        Ok(rows)
    }
}

#[async_trait]
impl Producer for ProductiveProducer {
    fn label(&self) -> String {
        format!("productive:{}", self.config.unit_name)
    }

    async fn get_slides(&self) -> Result<Widget, ProducerError> {
        let year = chrono::Local::now().year();
        let rows = self.fetch_all(year).await?;
        if rows.is_empty() {
            tracing::warn!("no report rows from productive; sending empty widget");
        }
        let slides = build_slides(&rows, &self.config.fields);
        Ok(Widget::new(self.config.unit_name.clone(), slides))
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn build_slides(rows: &[ReportRow], fields: &[ReportField]) -> SlideSet {
    let mut slides = SlideSet::empty();
    for row in rows {
        for field in fields {
            let value = format_value(row.attributes.get(&field.attribute), field.kind);
            slides.push(Slide {
                text: field.label.clone(),
                duration: LABEL_DURATION,
                color: Color::WHITE,
                no_scroll: false,
            });
            slides.push(Slide {
                text: value,
                duration: VALUE_DURATION,
                color: Color::YELLOW,
                no_scroll: false,
            });
        }
    }
    slides
}

fn format_value(raw: Option<&serde_json::Value>, kind: FieldKind) -> String {
    let number = || {
        raw.and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0.0)
    };
    match kind {
        FieldKind::Currency => format!("{} EUR", group_thousands(number() / 100.0)),
        FieldKind::Hours => format!("{} h", group_thousands(number() / 60.0)),
        FieldKind::Plain => match raw {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
    }
}

/// Two decimals with comma thousands separators: `1234567.891` → `1,234,567.89`.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
