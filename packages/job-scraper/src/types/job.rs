//! Job posting types and the closed vocabularies they draw from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParseError, ValidationError};

pub type JobId = Uuid;

// =============================================================================
// Closed vocabularies
// =============================================================================

/// External job board a posting was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobSource {
    Indeed,
    LinkedIn,
    HealthcareJobSite,
    BehavioralHealthJobs,
}

impl JobSource {
    pub const ALL: [JobSource; 4] = [
        JobSource::Indeed,
        JobSource::LinkedIn,
        JobSource::HealthcareJobSite,
        JobSource::BehavioralHealthJobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Indeed => "Indeed",
            JobSource::LinkedIn => "LinkedIn",
            JobSource::HealthcareJobSite => "HealthcareJobSite",
            JobSource::BehavioralHealthJobs => "BehavioralHealthJobs",
        }
    }

    /// Key for the per-source advisory lock. Stable across releases.
    pub fn lock_key(&self) -> i64 {
        const BASE: i64 = 0x6a6f_6273_0000;
        match self {
            JobSource::Indeed => BASE + 1,
            JobSource::LinkedIn => BASE + 2,
            JobSource::HealthcareJobSite => BASE + 3,
            JobSource::BehavioralHealthJobs => BASE + 4,
        }
    }
}

impl std::fmt::Display for JobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobSource {
    type Err = ParseError;

    /// Accepts the canonical name in any case (`Indeed`, `indeed`, `LINKEDIN`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobSource::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("job source", s))
    }
}

/// Employment type, inferred from posting text when not stated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Temporary,
    Remote,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Temporary => "Temporary",
            JobType::Remote => "Remote",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Full-time" => Ok(JobType::FullTime),
            "Part-time" => Ok(JobType::PartTime),
            "Contract" => Ok(JobType::Contract),
            "Temporary" => Ok(JobType::Temporary),
            "Remote" => Ok(JobType::Remote),
            _ => Err(ParseError::new("job type", s)),
        }
    }
}

/// Practice area of a peer-support role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialty {
    #[serde(rename = "Substance Use")]
    SubstanceUse,
    #[serde(rename = "Mental Health")]
    MentalHealth,
    #[serde(rename = "Dual Diagnosis")]
    DualDiagnosis,
    #[serde(rename = "Youth Services")]
    YouthServices,
    #[serde(rename = "Veterans Services")]
    VeteransServices,
    #[serde(rename = "LGBTQ+ Services")]
    LgbtqServices,
    /// Catch-all when nothing more specific matches
    #[serde(rename = "General Peer Support")]
    GeneralPeerSupport,
}

impl Specialty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::SubstanceUse => "Substance Use",
            Specialty::MentalHealth => "Mental Health",
            Specialty::DualDiagnosis => "Dual Diagnosis",
            Specialty::YouthServices => "Youth Services",
            Specialty::VeteransServices => "Veterans Services",
            Specialty::LgbtqServices => "LGBTQ+ Services",
            Specialty::GeneralPeerSupport => "General Peer Support",
        }
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Specialty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Substance Use" => Ok(Specialty::SubstanceUse),
            "Mental Health" => Ok(Specialty::MentalHealth),
            "Dual Diagnosis" => Ok(Specialty::DualDiagnosis),
            "Youth Services" => Ok(Specialty::YouthServices),
            "Veterans Services" => Ok(Specialty::VeteransServices),
            "LGBTQ+ Services" => Ok(Specialty::LgbtqServices),
            "General Peer Support" => Ok(Specialty::GeneralPeerSupport),
            _ => Err(ParseError::new("specialty", s)),
        }
    }
}

/// Recognized peer-support certification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Certification {
    #[serde(rename = "CRPA")]
    Crpa,
    #[serde(rename = "CPS")]
    Cps,
    #[serde(rename = "CPRS")]
    Cprs,
    #[serde(rename = "CRS")]
    Crs,
    #[serde(rename = "CASAC")]
    Casac,
    /// Filter value only; extraction never produces it
    #[serde(rename = "None Required")]
    NoneRequired,
}

impl Certification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Certification::Crpa => "CRPA",
            Certification::Cps => "CPS",
            Certification::Cprs => "CPRS",
            Certification::Crs => "CRS",
            Certification::Casac => "CASAC",
            Certification::NoneRequired => "None Required",
        }
    }
}

impl std::fmt::Display for Certification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Certification {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRPA" => Ok(Certification::Crpa),
            "CPS" => Ok(Certification::Cps),
            "CPRS" => Ok(Certification::Cprs),
            "CRS" => Ok(Certification::Crs),
            "CASAC" => Ok(Certification::Casac),
            "None Required" => Ok(Certification::NoneRequired),
            _ => Err(ParseError::new("certification", s)),
        }
    }
}

// =============================================================================
// Postings
// =============================================================================

/// A raw extracted posting before validation, dedup, and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCandidate {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub description: String,
    pub url: String,
    pub source: JobSource,
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub certifications_req: Vec<Certification>,
    pub specialty: Option<Specialty>,
    pub posted_date: Option<DateTime<Utc>>,
}

impl JobCandidate {
    /// Check required fields and the url shape, producing an insertable job.
    pub fn validate(self) -> Result<NewJob, ValidationError> {
        let required = [
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("description", &self.description),
            ("url", &self.url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField { field });
            }
        }

        let parsed = url::Url::parse(&self.url).map_err(|e| ValidationError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let mut candidate = self;
        candidate.certifications_req.sort();
        candidate.certifications_req.dedup();
        Ok(NewJob(candidate))
    }
}

/// A candidate that passed validation. Only `JobCandidate::validate` builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob(JobCandidate);

impl NewJob {
    pub fn into_inner(self) -> JobCandidate {
        self.0
    }
}

impl std::ops::Deref for NewJob {
    type Target = JobCandidate;

    fn deref(&self) -> &JobCandidate {
        &self.0
    }
}

/// A persisted posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub description: String,
    pub url: String,
    pub source: JobSource,
    pub job_type: Option<JobType>,
    pub certifications_req: Vec<Certification>,
    pub specialty: Option<Specialty>,
    pub posted_date: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl JobPosting {
    /// Materialize a new active posting with a fresh id, stamped at `now`.
    pub fn from_new(job: NewJob, now: DateTime<Utc>) -> Self {
        let c = job.into_inner();
        Self {
            id: Uuid::new_v4(),
            title: c.title,
            company: c.company,
            location: c.location,
            salary: c.salary,
            description: c.description,
            url: c.url,
            source: c.source,
            job_type: c.job_type,
            certifications_req: c.certifications_req,
            specialty: c.specialty,
            posted_date: c.posted_date,
            scraped_at: now,
            updated_at: now,
            is_active: true,
        }
    }
}

/// The slice of an active posting used for duplicate checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExistingJob {
    pub title: String,
    pub company: String,
    pub url: String,
}

impl From<&JobPosting> for ExistingJob {
    fn from(job: &JobPosting) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            url: job.url.clone(),
        }
    }
}
