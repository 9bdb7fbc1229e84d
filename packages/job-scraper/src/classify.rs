//! Keyword inference for job type and specialty.
//!
//! Both tables are ordered; the first rule with a matching phrase wins.

use crate::types::{JobType, Specialty};

const JOB_TYPE_RULES: &[(&[&str], JobType)] = &[
    (&["full-time", "full time"], JobType::FullTime),
    (&["part-time", "part time"], JobType::PartTime),
    (&["contract"], JobType::Contract),
    (&["temporary", "temp"], JobType::Temporary),
    (&["remote"], JobType::Remote),
];

const SPECIALTY_RULES: &[(&[&str], Specialty)] = &[
    (&["substance use", "substance abuse", "addiction"], Specialty::SubstanceUse),
    (&["mental health", "psychiatric"], Specialty::MentalHealth),
    (&["dual diagnosis", "co-occurring"], Specialty::DualDiagnosis),
    (&["youth", "adolescent", "child"], Specialty::YouthServices),
    (&["veteran", "military"], Specialty::VeteransServices),
    (&["lgbtq", "lgbt"], Specialty::LgbtqServices),
];

/// Job type from title + description, defaulting to full-time.
pub fn infer_job_type(title: &str, description: &str) -> JobType {
    let combined = format!("{} {}", title, description).to_lowercase();
    first_match(JOB_TYPE_RULES, &combined).unwrap_or(JobType::FullTime)
}

/// Specialty from the description, defaulting to general peer support.
pub fn infer_specialty(description: &str) -> Specialty {
    first_match(SPECIALTY_RULES, &description.to_lowercase())
        .unwrap_or(Specialty::GeneralPeerSupport)
}

fn first_match<T: Copy>(rules: &[(&[&str], T)], text: &str) -> Option<T> {
    rules
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|phrase| text.contains(phrase)))
        .map(|(_, value)| *value)
}
