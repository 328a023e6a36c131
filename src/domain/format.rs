//! Formatting helpers shared by the listing and detail presentations

use chrono::{DateTime, Utc};

pub fn experience_level(years_experience_min: u32) -> &'static str {
    match years_experience_min {
        0..=1 => "Entry Level",
        2..=4 => "Intermediate",
        _ => "Expert",
    }
}

pub fn job_type_tag(remote: &str) -> &'static str {
    match remote {
        "remote" => "Remote",
        "hybrid" => "Hybrid",
        _ => "On-site",
    }
}

/// "Posted today" / "Posted 1 day ago" / "Posted N days ago"
///
/// Unparseable timestamps render as "Posted recently".
pub fn posted_days_ago(created_at: &str, now: DateTime<Utc>) -> String {
    let Ok(created) = DateTime::parse_from_rfc3339(created_at) else {
        return "Posted recently".to_string();
    };
    let days = (now - created.with_timezone(&Utc)).num_days();
    match days {
        i64::MIN..=0 => "Posted today".to_string(),
        1 => "Posted 1 day ago".to_string(),
        days => format!("Posted {days} days ago"),
    }
}

pub fn format_salary(salary_min: Option<u64>, salary_max: Option<u64>) -> String {
    let k = |value: u64| (value as f64 / 1000.0).round() as u64;
    match (salary_min, salary_max) {
        (Some(min), Some(max)) => format!("${}K – ${}K", k(min), k(max)),
        (Some(min), None) => format!("${}K+", k(min)),
        (None, Some(max)) => format!("Up to ${}K", k(max)),
        (None, None) => String::new(),
    }
}
