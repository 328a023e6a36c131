use chrono::{DateTime, Utc};
use thousands::Separable;

use crate::{
    core::state::FeedView,
    domain::{
        format::{experience_level, format_salary, job_type_tag, posted_days_ago},
        job::{JobListing, MatchResult},
        page::WindowItem,
        text::fit_to_width,
    },
};

/// Lines of text a grid cell is made of
pub trait Card: WindowItem {
    fn card_lines(&self, now: DateTime<Utc>) -> Vec<String>;
    fn detail_lines(&self, now: DateTime<Utc>) -> Vec<String>;
}

impl Card for JobListing {
    fn card_lines(&self, now: DateTime<Utc>) -> Vec<String> {
        vec![
            self.title.clone(),
            self.company_name.clone(),
            format!(
                "{} · {}",
                job_type_tag(&self.remote),
                experience_level(self.years_experience_min)
            ),
            format_salary(self.salary_min, self.salary_max),
            posted_days_ago(&self.created_at, now),
        ]
    }

    fn detail_lines(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut lines = vec![
            format!("{} at {}", self.title, self.company_name),
            format!("{} · {}", self.location, job_type_tag(&self.remote)),
            format!(
                "{} ({}-{} years)",
                experience_level(self.years_experience_min),
                self.years_experience_min,
                self.years_experience_max
            ),
        ];
        let salary = format_salary(self.salary_min, self.salary_max);
        if !salary.is_empty() {
            lines.push(salary);
        }
        if !self.skills_required.is_empty() {
            lines.push(format!("Skills: {}", self.skills_required.join(", ")));
        }
        lines.push(posted_days_ago(&self.created_at, now));
        if !self.description.is_empty() {
            lines.push(String::new());
            lines.push(self.description.clone());
        }
        lines
    }
}

impl Card for MatchResult {
    fn card_lines(&self, _now: DateTime<Utc>) -> Vec<String> {
        vec![
            self.job.title.clone(),
            self.job.company_name.clone(),
            format!("{:.0}% match", self.score * 100.0),
            format!(
                "{}/{} skills · {}",
                self.skills_matched(),
                self.skills_required(),
                job_type_tag(&self.job.remote)
            ),
            format_salary(self.job.salary_min, self.job.salary_max),
        ]
    }

    fn detail_lines(&self, _now: DateTime<Utc>) -> Vec<String> {
        let mut lines = vec![
            format!("{} at {}", self.job.title, self.job.company_name),
            format!(
                "Score {:.0}% (skills {:.2}, semantic {:.2}, experience {:.2})",
                self.score * 100.0,
                self.breakdown.skills,
                self.breakdown.semantic,
                self.breakdown.yoe
            ),
        ];
        if !self.explanation.matched_skills.is_empty() {
            lines.push(format!(
                "Matched: {}",
                self.explanation.matched_skills.join(", ")
            ));
        }
        if !self.explanation.missing_required.is_empty() {
            lines.push(format!(
                "Missing: {}",
                self.explanation.missing_required.join(", ")
            ));
        }
        if !self.explanation.summary.is_empty() {
            lines.push(self.explanation.summary.clone());
        }
        lines
    }
}

/// Plain-text rendering of a feed view's visible rows
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    cell_width: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self { cell_width: 30 }
    }
}

impl Renderer {
    pub fn new(cell_width: usize) -> Self {
        Self {
            cell_width: cell_width.max(4),
        }
    }

    /// "jobs 51-550 of 1,200"
    pub fn status_line<T: WindowItem>(&self, label: &str, view: &FeedView<T>) -> String {
        let window = view.feed.window();
        if window.is_empty() {
            return format!("{label}: none");
        }
        let first = window.start_offset() + 1;
        let last = window.start_offset() + window.len();
        format!(
            "{label} {}-{} of {}",
            first.separate_with_commas(),
            last.separate_with_commas(),
            view.feed.display_total().separate_with_commas()
        )
    }

    pub fn render<T: Card>(&self, view: &FeedView<T>, now: DateTime<Utc>) -> String {
        let mut out = String::new();
        let separator = " │ ";
        for row in view.visible_grid() {
            let cells: Vec<Vec<String>> = row
                .iter()
                .map(|cell| cell.map(|item| item.card_lines(now)).unwrap_or_default())
                .collect();
            let height = cells.iter().map(Vec::len).max().unwrap_or(0);
            for line in 0..height {
                let text: Vec<String> = cells
                    .iter()
                    .map(|lines| {
                        fit_to_width(
                            lines.get(line).map(String::as_str).unwrap_or(""),
                            self.cell_width,
                        )
                    })
                    .collect();
                out.push_str(text.join(separator).trim_end());
                out.push('\n');
            }
            out.push('\n');
        }

        if let Some(item) = view.selected_item() {
            out.push_str(&"─".repeat(self.cell_width));
            out.push('\n');
            for line in item.detail_lines(now) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}
