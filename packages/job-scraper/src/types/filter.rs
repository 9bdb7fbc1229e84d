//! Read-side types for the job board: listing filters, pages, and stats.

use serde::{Deserialize, Serialize};

use super::job::{Certification, JobPosting, JobSource, JobType, Specialty};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filter for listing active postings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilter {
    /// Case-insensitive substring of the location
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub specialty: Option<Specialty>,
    pub certification: Option<Certification>,
    pub source: Option<JobSource>,
    /// Case-insensitive substring of title, company, or description
    pub search: Option<String>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: JobSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Page number clamped to at least 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to 1..=100, defaulting to 50.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        (self.page() as u64 - 1) * self.limit() as u64
    }

    /// In-process evaluation, used by the memory store.
    pub fn matches(&self, job: &JobPosting) -> bool {
        if !job.is_active {
            return false;
        }
        if let Some(location) = &self.location {
            if !contains_ignore_case(&job.location, location) {
                return false;
            }
        }
        if self.job_type.is_some() && job.job_type != self.job_type {
            return false;
        }
        if self.specialty.is_some() && job.specialty != self.specialty {
            return false;
        }
        if let Some(cert) = self.certification {
            if !job.certifications_req.contains(&cert) {
                return false;
            }
        }
        if let Some(source) = self.source {
            if job.source != source {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let hit = contains_ignore_case(&job.title, search)
                || contains_ignore_case(&job.company, search)
                || contains_ignore_case(&job.description, search);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit.max(1) as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: JobSource,
    pub count: u64,
}

/// Snapshot of the job table for operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperStats {
    pub total_jobs: u64,
    pub active_jobs: u64,
    pub jobs_by_source: Vec<SourceCount>,
    /// Most recently scraped active postings, newest first
    pub recent_jobs: Vec<JobPosting>,
}
