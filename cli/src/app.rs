use anyhow::{bail, Context, Result};
use chrono::Utc;
use colored::*;
use dialoguer::Confirm;
use edutrack_core::session::{self, Role, SessionProvider, SessionRecord};
use edutrack_core::{
    Announcement, AnnouncementFilter, AnnouncementUpdate, ApiResult, EduTrackApi, Importance,
    NewAnnouncement,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cli::{AnnouncementCommand, Command, SessionCommand};
use crate::output;

/// Keeps the announcements matching `search`; no term keeps everything
fn search_announcements(
    announcements: Vec<Announcement>,
    search: Option<&str>,
) -> Vec<Announcement> {
    announcements
        .into_iter()
        .filter(|announcement| search.map_or(true, |term| announcement.matches(term)))
        .collect()
}

/// JSON view of a session record with the token masked
fn masked_session_json(record: &SessionRecord) -> Result<Value> {
    let mut value = serde_json::to_value(record).context("Failed to render JSON")?;
    if let Some(Value::String(token)) = value.get_mut("accessToken") {
        *token = output::mask_token(token);
    }
    Ok(value)
}

/// Runs one command against the API
pub struct App {
    api: EduTrackApi,
    json: bool,
}

impl App {
    pub fn new(api: EduTrackApi, json: bool) -> Self {
        Self { api, json }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Attendance {
                section_id,
                course_id,
            } => self.section_attendance(&section_id, &course_id).await,
            Command::Announcements(command) => self.announcements(command).await,
            Command::Classes => self.classes().await,
            Command::Session(SessionCommand::SetToken { token, role }) => {
                self.set_token(token, role).await
            }
            Command::Session(SessionCommand::Show) => self.show_session().await,
            Command::Logout => self.logout().await,
        }
    }

    async fn announcements(&self, command: AnnouncementCommand) -> Result<()> {
        match command {
            AnnouncementCommand::List { class_id, search } => {
                self.list_announcements(&class_id, search.as_deref()).await
            }
            AnnouncementCommand::Create {
                title,
                content,
                course_id,
                section_name,
            } => {
                self.create_announcement(NewAnnouncement {
                    title,
                    content,
                    section_name,
                    course_id,
                })
                .await
            }
            AnnouncementCommand::Edit {
                id,
                title,
                content,
                class_id,
                importance,
            } => {
                self.edit_announcement(id, title, content, class_id, importance)
                    .await
            }
            AnnouncementCommand::Delete { id, yes } => self.delete_announcement(id, yes).await,
        }
    }

    /// Awaits `call` behind a spinner
    async fn with_spinner<T, F>(&self, message: &str, call: F) -> ApiResult<T>
    where
        F: std::future::Future<Output = ApiResult<T>>,
    {
        let spinner = output::spinner(message);
        let result = call.await;
        spinner.finish_and_clear();
        result
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
        println!("{}", text);
        Ok(())
    }

    async fn section_attendance(&self, section_id: &str, course_id: &str) -> Result<()> {
        if section_id.trim().is_empty() || course_id.trim().is_empty() {
            bail!("Section ID and Course ID are required.");
        }

        let records = self
            .with_spinner(
                "Fetching attendance...",
                self.api.section_attendance(section_id, course_id),
            )
            .await?;

        if self.json {
            return self.print_json(&records);
        }
        println!(
            "{}",
            format!("Attendance for section {} (course {})", section_id, course_id).bold()
        );
        println!("{}", output::format_attendance(&records));
        Ok(())
    }

    async fn list_announcements(&self, class_id: &str, search: Option<&str>) -> Result<()> {
        let filter: AnnouncementFilter = class_id.parse().unwrap_or_default();
        let announcements = self
            .with_spinner(
                "Fetching announcements...",
                self.api.list_announcements(&filter),
            )
            .await?;

        let visible = search_announcements(announcements, search);
        debug!("{} announcements after search filter", visible.len());

        if self.json {
            return self.print_json(&visible);
        }
        print!("{}", output::format_announcements(&visible));
        println!();
        Ok(())
    }

    async fn create_announcement(&self, announcement: NewAnnouncement) -> Result<()> {
        let missing = announcement.missing_fields();
        if !missing.is_empty() {
            bail!("Please fill all required fields ({})", missing.join(", "));
        }

        let created = self
            .with_spinner(
                "Posting announcement...",
                self.api.create_announcement(&announcement),
            )
            .await?;

        if self.json {
            return self.print_json(&created);
        }
        output::print_success(&format!(
            "Announcement created successfully! (id {})",
            created.id
        ));
        Ok(())
    }

    async fn edit_announcement(
        &self,
        id: i64,
        title: Option<String>,
        content: Option<String>,
        class_id: Option<String>,
        importance: Option<Importance>,
    ) -> Result<()> {
        let (current, classes) = self
            .with_spinner("Loading announcement...", async {
                tokio::try_join!(self.api.get_announcement(id), self.api.teacher_classes())
            })
            .await?;

        let mut update = AnnouncementUpdate::from_announcement(&current);
        if let Some(title) = title {
            update.title = title;
        }
        if let Some(content) = content {
            update.content = content;
        }
        if let Some(class_id) = class_id {
            update.class_id = class_id;
        }
        if let Some(importance) = importance {
            update.importance = importance;
        }

        let missing = update.missing_fields();
        if !missing.is_empty() {
            bail!("Please fill all required fields ({})", missing.join(", "));
        }
        if !classes.iter().any(|class| class.id == update.class_id) {
            warn!("Class {} is not one of your classes", update.class_id);
        }

        let updated = self
            .with_spinner(
                "Saving announcement...",
                self.api.update_announcement(id, &update),
            )
            .await?;

        if self.json {
            return self.print_json(&updated);
        }
        output::print_success("Announcement updated successfully!");
        Ok(())
    }

    async fn delete_announcement(&self, id: i64, yes: bool) -> Result<()> {
        if !yes {
            let confirmed = Confirm::new()
                .with_prompt("Are you sure you want to delete this announcement?")
                .default(false)
                .interact()
                .context("Failed to read confirmation")?;
            if !confirmed {
                println!("Nothing deleted.");
                return Ok(());
            }
        }

        self.with_spinner(
            "Deleting announcement...",
            self.api.delete_announcement(id),
        )
        .await?;
        output::print_success(&format!("Announcement {} deleted.", id));
        Ok(())
    }

    async fn classes(&self) -> Result<()> {
        let classes = self
            .with_spinner("Fetching classes...", self.api.teacher_classes())
            .await?;

        if self.json {
            return self.print_json(&classes);
        }
        println!("{}", output::format_classes(&classes));
        Ok(())
    }

    async fn set_token(&self, token: String, role: Option<Role>) -> Result<()> {
        if token.trim().is_empty() {
            bail!("The access token must not be empty");
        }

        let record = SessionRecord::new(token, role);
        self.api
            .client()
            .session()
            .store(record.to_json()?)
            .await
            .map_err(edutrack_core::ApiError::from)?;
        info!("Stored new session record");
        output::print_success("Session saved.");
        Ok(())
    }

    async fn show_session(&self) -> Result<()> {
        let record = session::load_record(self.api.client().session().as_ref()).await?;

        if self.json {
            return self.print_json(&masked_session_json(&record)?);
        }
        println!("{}", output::format_session(&record, Utc::now()));
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.api.client().logout().await?;
        output::print_success("Logged out.");
        Ok(())
    }
}
