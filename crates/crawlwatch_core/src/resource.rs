use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier of a tracked URL. Values `<= 0` never name a resource.
pub type ResourceId = i64;

pub fn is_valid_id(id: ResourceId) -> bool {
    id > 0
}

/// Persisted lifecycle status of a tracked URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Queued,
    Running,
    Completed,
    Error,
}

impl ResourceStatus {
    pub const ALL: [ResourceStatus; 4] = [
        ResourceStatus::Queued,
        ResourceStatus::Running,
        ResourceStatus::Completed,
        ResourceStatus::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Queued => "queued",
            ResourceStatus::Running => "running",
            ResourceStatus::Completed => "completed",
            ResourceStatus::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(rename = "url")]
    pub locator: String,
    pub status: ResourceStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(rename = "crawl_result", default)]
    pub result: Option<CrawlResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Analysis snapshot attached to a resource after a successful crawl.
///
/// Replaced wholesale by the server on every crawl; the client never edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html_version: Option<String>,
    #[serde(default)]
    pub h1_count: u32,
    #[serde(default)]
    pub h2_count: u32,
    #[serde(default)]
    pub h3_count: u32,
    #[serde(default)]
    pub h4_count: u32,
    #[serde(default)]
    pub h5_count: u32,
    #[serde(default)]
    pub h6_count: u32,
    #[serde(default)]
    pub internal_links: u32,
    #[serde(default)]
    pub external_links: u32,
    #[serde(default)]
    pub broken_links_count: u32,
    #[serde(default)]
    pub has_login_form: bool,
    #[serde(default)]
    pub crawled_at: Option<DateTime<Utc>>,
}

impl CrawlResult {
    /// Heading counts indexed by level, `h1` first.
    pub fn heading_counts(&self) -> [u32; 6] {
        [
            self.h1_count,
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ]
    }

    /// True when the page had neither links nor headings.
    pub fn is_empty(&self) -> bool {
        let links = self.internal_links + self.external_links;
        let headings: u32 = self.heading_counts().iter().sum();
        links == 0 && headings == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    #[serde(rename = "url")]
    pub locator: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub link_text: Option<String>,
    #[serde(default)]
    pub is_internal: bool,
}

/// Live phase of a server-side crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Started,
    Fetching,
    Parsing,
    Analyzing,
    CheckingLinks,
    Completed,
    Failed,
    /// Any phase this client does not know about.
    #[serde(other)]
    Unknown,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }
}

/// Ephemeral job snapshot returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "id")]
    pub resource_id: ResourceId,
    #[serde(rename = "url", default)]
    pub locator: String,
    #[serde(rename = "status")]
    pub phase: JobPhase,
    /// Whole percent. The server reports a float; it is rounded on decode.
    #[serde(default, deserialize_with = "rounded_percent")]
    pub progress: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl JobStatus {
    /// Progress clamped to 0..=100.
    pub fn percent(&self) -> u8 {
        self.progress.min(100) as u8
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePage {
    #[serde(rename = "data", default, deserialize_with = "null_as_default")]
    pub items: Vec<Resource>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl ResourcePage {
    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.items.iter().map(|item| item.id)
    }
}

/// Detail payload: the resource plus its latest result and any running job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDetail {
    #[serde(rename = "url")]
    pub resource: Resource,
    #[serde(rename = "crawl_result", default)]
    pub result: Option<CrawlResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub broken_links: Vec<BrokenLink>,
    #[serde(default)]
    pub job_status: Option<JobStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub database_error: Option<String>,
}

// Go encodes empty slices as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn rounded_percent<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
    // Saturating cast: negatives and NaN become 0.
    Ok(raw.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_job_phase_decodes_to_unknown() {
        let status: JobStatus = serde_json::from_str(
            r#"{"id": 3, "url": "https://a.example", "status": "warming_up", "progress": 5}"#,
        )
        .unwrap();
        assert_eq!(status.phase, JobPhase::Unknown);
        assert_eq!(status.resource_id, 3);
    }

    #[test]
    fn page_with_null_data_is_empty() {
        let page: ResourcePage = serde_json::from_str(
            r#"{"data": null, "page": 1, "page_size": 10, "total": 0, "total_pages": 0}"#,
        )
        .unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn crawl_result_without_links_or_headings_is_empty() {
        let mut result: CrawlResult = serde_json::from_str("{}").unwrap();
        assert!(result.is_empty());
        result.h3_count = 1;
        assert!(!result.is_empty());
    }

    #[test]
    fn progress_is_clamped() {
        let status: JobStatus =
            serde_json::from_str(r#"{"id": 1, "status": "parsing", "progress": 140}"#).unwrap();
        assert_eq!(status.percent(), 100);
    }

    #[test]
    fn fractional_progress_is_rounded() {
        let status: JobStatus =
            serde_json::from_str(r#"{"id": 1, "status": "fetching", "progress": 42.5}"#).unwrap();
        assert_eq!(status.progress, 43);

        let status: JobStatus =
            serde_json::from_str(r#"{"id": 1, "status": "started", "progress": null}"#).unwrap();
        assert_eq!(status.progress, 0);
    }
}
