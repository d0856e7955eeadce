use chrono::{DateTime, Utc};
use colored::*;
use edutrack_core::session::SessionRecord;
use edutrack_core::{Announcement, ApiError, AttendanceRecord, TeacherClass};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a request is in flight
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

pub fn format_attendance(records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return "No attendance records found for this section.".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<12}  {:<20}  {:<10}  {:<16}  {}\n",
        "Date", "Course Name", "Section", "Username", "Presence"
    ));
    for record in records {
        let status = if record.present {
            "Present".green()
        } else {
            "Absent".red()
        };
        out.push_str(&format!(
            "{:<12}  {:<20}  {:<10}  {:<16}  {}\n",
            record.attendance_date.format("%Y-%m-%d").to_string(),
            record.course_name.as_deref().unwrap_or("-"),
            record.section_name.as_deref().unwrap_or("-"),
            record.username.as_deref().unwrap_or("-"),
            status
        ));
    }

    let present = records.iter().filter(|r| r.present).count();
    out.push_str(&format!(
        "\n{} of {} present ({:.1}%)",
        present,
        records.len(),
        present as f64 * 100.0 / records.len() as f64
    ));
    out
}

pub fn format_announcements(announcements: &[Announcement]) -> String {
    if announcements.is_empty() {
        return "No announcements found.".to_string();
    }

    let mut out = String::new();
    for (index, announcement) in announcements.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{} {}",
            format!("[{}]", announcement.id).cyan(),
            announcement.title.bold()
        ));
        if let Some(importance) = announcement.importance {
            out.push_str(&format!(" ({})", importance));
        }
        out.push('\n');

        let mut scope = Vec::new();
        if let Some(course_id) = announcement.course_id {
            scope.push(format!("course {}", course_id));
        }
        if let Some(section) = &announcement.section_name {
            scope.push(format!("section {}", section));
        }
        if let Some(class_id) = &announcement.class_id {
            scope.push(format!("class {}", class_id));
        }
        if let Some(created_at) = announcement.created_at {
            scope.push(created_at.format("%Y-%m-%d %H:%M").to_string());
        }
        if !scope.is_empty() {
            out.push_str(&format!("    {}\n", scope.join(" · ").dimmed()));
        }
        out.push_str(&format!("    {}\n", announcement.content));
    }
    out
}

pub fn format_classes(classes: &[TeacherClass]) -> String {
    if classes.is_empty() {
        return "No classes assigned.".to_string();
    }
    classes
        .iter()
        .map(|class| format!("{:<10} {}", class.id, class.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shows only the start of a token
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(6).collect();
    if token.chars().count() <= 6 {
        "*".repeat(token.chars().count())
    } else {
        format!("{}…", visible)
    }
}

pub fn format_session(record: &SessionRecord, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();
    match record.token() {
        Ok(token) => lines.push(format!("Token:   {}", mask_token(token))),
        Err(_) => lines.push(format!("Token:   {}", "missing".red())),
    }
    if let Some(role) = record.role {
        lines.push(format!("Role:    {}", role));
    }

    if let Some(claims) = record.claims() {
        if let Some(sub) = &claims.sub {
            lines.push(format!("Subject: {}", sub));
        }
        if record.role.is_none() {
            if let Some(role) = &claims.role {
                lines.push(format!("Role:    {}", role));
            }
        }
        if let Some(expires_at) = claims.expires_at() {
            let when = expires_at.format("%Y-%m-%d %H:%M UTC").to_string();
            if claims.is_expired_at(now) {
                lines.push(format!("Expires: {} {}", when, "(expired)".red()));
            } else {
                lines.push(format!("Expires: {}", when));
            }
        }
    }
    lines.join("\n")
}

/// Banner text for a failed command
pub fn error_banner(err: &ApiError) -> String {
    match err {
        ApiError::NoSession | ApiError::NoToken => {
            "You are not logged in. Please log in and store your token with `edutrack session set-token`."
                .to_string()
        }
        ApiError::Unauthorized => "Unauthorized access. Please log in again.".to_string(),
        ApiError::HttpError { status, .. } => {
            format!("Request failed ({}): {}", status, err.message())
        }
        ApiError::NetworkError(_) => {
            format!("{}. Please try again later.", err.message())
        }
        ApiError::Cancelled => "Cancelled.".to_string(),
        other => other.to_string(),
    }
}

pub fn print_error(err: &anyhow::Error) {
    let text = match err.downcast_ref::<ApiError>() {
        Some(api_error) => error_banner(api_error),
        None => format!("{:#}", err),
    };
    eprintln!("{} {}", "Error:".red().bold(), text);
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}
