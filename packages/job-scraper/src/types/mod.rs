//! Data types shared across the pipeline.

pub mod filter;
pub mod job;
pub mod result;

pub use filter::{JobFilter, Page, ScraperStats, SourceCount};
pub use job::{
    Certification, ExistingJob, JobCandidate, JobId, JobPosting, JobSource, JobType, NewJob,
    Specialty,
};
pub use result::{SaveOutcome, SchedulerResult, ScrapeResult};
