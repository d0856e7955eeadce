//! Typed EDU Track endpoints
//!
//! Thin wrappers that build the request descriptor for each back-end call and
//! decode the payload into the matching type. Paths follow the call sites of
//! the web front-end; endpoints it only referenced indirectly (class lists,
//! announcement lookup and update) still need confirming against the server.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::ApiClient;
use crate::errors::ApiResult;
use crate::request::RequestDescriptor;
use crate::types::{
    Announcement, AnnouncementFilter, AnnouncementUpdate, AttendanceRecord, NewAnnouncement,
    TeacherClass,
};

pub fn section_attendance_request(section_id: &str, course_id: &str) -> RequestDescriptor {
    RequestDescriptor::get("/api/attendance/section")
        .query("sectionId", section_id)
        .query("courseId", course_id)
}

pub fn list_announcements_request(filter: &AnnouncementFilter) -> RequestDescriptor {
    let descriptor = RequestDescriptor::get("/api/announcements");
    match filter {
        AnnouncementFilter::All => descriptor,
        AnnouncementFilter::Class(class_id) => descriptor.query("classId", class_id.as_str()),
    }
}

pub fn get_announcement_request(id: i64) -> RequestDescriptor {
    RequestDescriptor::get("/api/announcements").segment(id.to_string())
}

pub fn create_announcement_request(announcement: &NewAnnouncement) -> ApiResult<RequestDescriptor> {
    RequestDescriptor::post("/api/announcements")
        .segment(announcement.course_id.to_string())
        .segment(announcement.section_name.as_str())
        .json_from(announcement)
}

pub fn update_announcement_request(
    id: i64,
    update: &AnnouncementUpdate,
) -> ApiResult<RequestDescriptor> {
    RequestDescriptor::put("/api/announcements")
        .segment(id.to_string())
        .json_from(update)
}

pub fn delete_announcement_request(id: i64) -> RequestDescriptor {
    RequestDescriptor::delete("/api/announcements").segment(id.to_string())
}

pub fn teacher_classes_request() -> RequestDescriptor {
    RequestDescriptor::get("/api/teacher/classes")
}

/// Typed view over [`ApiClient`] for the EDU Track endpoints
///
/// Every call observes `cancel`; cancelling it aborts whichever call is in
/// flight.
#[derive(Debug, Clone)]
pub struct EduTrackApi {
    client: ApiClient,
    cancel: CancellationToken,
}

impl EduTrackApi {
    pub fn new(client: ApiClient) -> Self {
        Self::with_cancellation(client, CancellationToken::new())
    }

    pub fn with_cancellation(client: ApiClient, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Attendance of one section for one course
    pub async fn section_attendance(
        &self,
        section_id: &str,
        course_id: &str,
    ) -> ApiResult<Vec<AttendanceRecord>> {
        self.client
            .request_as_cancellable(&section_attendance_request(section_id, course_id), &self.cancel)
            .await
    }

    pub async fn list_announcements(
        &self,
        filter: &AnnouncementFilter,
    ) -> ApiResult<Vec<Announcement>> {
        self.client
            .request_as_cancellable(&list_announcements_request(filter), &self.cancel)
            .await
    }

    pub async fn get_announcement(&self, id: i64) -> ApiResult<Announcement> {
        self.client
            .request_as_cancellable(&get_announcement_request(id), &self.cancel)
            .await
    }

    pub async fn create_announcement(
        &self,
        announcement: &NewAnnouncement,
    ) -> ApiResult<Announcement> {
        let descriptor = create_announcement_request(announcement)?;
        let created: Announcement = self
            .client
            .request_as_cancellable(&descriptor, &self.cancel)
            .await?;
        info!("Created announcement {}", created.id);
        Ok(created)
    }

    pub async fn update_announcement(
        &self,
        id: i64,
        update: &AnnouncementUpdate,
    ) -> ApiResult<Announcement> {
        self.client
            .request_as_cancellable(&update_announcement_request(id, update)?, &self.cancel)
            .await
    }

    /// Deletes an announcement. Whatever body the server sends back is ignored.
    pub async fn delete_announcement(&self, id: i64) -> ApiResult<()> {
        let _: Value = self
            .client
            .request_cancellable(&delete_announcement_request(id), &self.cancel)
            .await?;
        info!("Deleted announcement {}", id);
        Ok(())
    }

    pub async fn teacher_classes(&self) -> ApiResult<Vec<TeacherClass>> {
        self.client
            .request_as_cancellable(&teacher_classes_request(), &self.cancel)
            .await
    }
}
