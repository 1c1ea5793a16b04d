//! Application view of a listing: shared fields plus a job or service variant.
//!
//! The `post` table is flat; `Post::try_from(model)` and `Post::write_row`
//! translate between the two shapes.

use chrono::{DateTime, FixedOffset};
use models::post::{self, DisplayContact, JobType, PostType};
use models::user::validate_phone;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FieldErrors, ServiceError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub company: String,
    pub job_type: JobType,
    pub salary: String,
    pub requirements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub provider: String,
    pub rating: f64,
    pub rating_count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PostKind {
    Job(JobDetails),
    Service(ServiceDetails),
}

impl PostKind {
    pub fn post_type(&self) -> PostType {
        match self {
            PostKind::Job(_) => PostType::Job,
            PostKind::Service(_) => PostType::Service,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub display_contact: DisplayContact,
    #[serde(flatten)]
    pub kind: PostKind,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    /// Owner display name, filled on single-post reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// Request body for create and update. Every field is optional so that
/// missing values are reported per field instead of as a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub display_contact: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<String>,
    pub provider: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<i32>,
}

/// Validated create request, before an owner and id are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub display_contact: DisplayContact,
    pub kind: PostKind,
}

const JOB_FIELDS: [&str; 4] = ["company", "jobType", "salary", "requirements"];
const SERVICE_FIELDS: [&str; 3] = ["provider", "rating", "ratingCount"];

fn required(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) -> Option<String> {
    match value {
        Some(v) => errors.take(post::validate_text(field, v, max)),
        None => {
            errors.push(field, format!("{field} is required"));
            None
        }
    }
}

impl PostInput {
    fn job_fields_present(&self) -> Vec<&'static str> {
        let present = [self.company.is_some(), self.job_type.is_some(), self.salary.is_some(), self.requirements.is_some()];
        JOB_FIELDS.iter().zip(present).filter(|(_, p)| *p).map(|(f, _)| *f).collect()
    }

    fn service_fields_present(&self) -> Vec<&'static str> {
        let present = [self.provider.is_some(), self.rating.is_some(), self.rating_count.is_some()];
        SERVICE_FIELDS.iter().zip(present).filter(|(_, p)| *p).map(|(f, _)| *f).collect()
    }

    /// Validate a create request. All problems are reported together.
    pub fn into_new_post(self) -> Result<NewPost, ServiceError> {
        let mut errors = FieldErrors::new();

        let title = match self.title.as_deref() {
            Some(t) => errors.take(post::validate_title(t)),
            None => {
                errors.push("title", "title is required");
                None
            }
        };
        let description = match self.description.as_deref() {
            Some(d) => errors.take(post::validate_description(d)),
            None => {
                errors.push("description", "description is required");
                None
            }
        };
        let post_type = match self.post_type.as_deref() {
            Some(t) => errors.take(PostType::parse(t.trim())),
            None => {
                errors.push("type", "please specify if this is a job or service");
                None
            }
        };
        let category = required(&mut errors, "category", self.category.as_deref(), 128);
        let location = required(&mut errors, "location", self.location.as_deref(), 128);
        let contact_email = match self.contact_email.as_deref() {
            Some(e) => errors.take(post::validate_contact_email(e)),
            None => {
                errors.push("contactEmail", "contactEmail is required");
                None
            }
        };
        let phone_given = self.contact_phone.as_deref().is_some_and(|p| !p.trim().is_empty());
        let contact_phone = match self.contact_phone.as_deref() {
            Some(p) => errors.take(validate_phone("contactPhone", p)).flatten(),
            None => None,
        };
        let display_contact = match self.display_contact.as_deref() {
            Some(d) => errors.take(DisplayContact::parse(d.trim())),
            None => Some(DisplayContact::default()),
        };
        if let Some(d) = display_contact {
            if d.needs_phone() && !phone_given {
                errors.push("contactPhone", format!("contactPhone is required when displayContact is {}", d.as_str()));
            }
        }

        let kind = match post_type {
            Some(PostType::Job) => {
                for field in self.service_fields_present() {
                    errors.push(field, format!("{field} is only valid for service posts"));
                }
                let company = required(&mut errors, "company", self.company.as_deref(), 255);
                let job_type = match self.job_type.as_deref() {
                    Some(j) => errors.take(JobType::parse(j.trim())),
                    None => {
                        errors.push("jobType", "jobType is required");
                        None
                    }
                };
                let salary = required(&mut errors, "salary", self.salary.as_deref(), 128);
                let requirements = required(&mut errors, "requirements", self.requirements.as_deref(), 5000);
                match (company, job_type, salary, requirements) {
                    (Some(company), Some(job_type), Some(salary), Some(requirements)) => {
                        Some(PostKind::Job(JobDetails { company, job_type, salary, requirements }))
                    }
                    _ => None,
                }
            }
            Some(PostType::Service) => {
                for field in self.job_fields_present() {
                    errors.push(field, format!("{field} is only valid for job posts"));
                }
                let provider = required(&mut errors, "provider", self.provider.as_deref(), 255);
                let rating = errors.take(post::validate_rating(self.rating.unwrap_or(0.0)));
                let rating_count = errors.take(post::validate_rating_count(self.rating_count.unwrap_or(0)));
                match (provider, rating, rating_count) {
                    (Some(provider), Some(rating), Some(rating_count)) => {
                        Some(PostKind::Service(ServiceDetails { provider, rating, rating_count }))
                    }
                    _ => None,
                }
            }
            None => None,
        };

        errors.into_result()?;
        match (title, description, category, location, contact_email, display_contact, kind) {
            (Some(title), Some(description), Some(category), Some(location), Some(contact_email), Some(display_contact), Some(kind)) => {
                Ok(NewPost { title, description, category, location, contact_email, contact_phone, display_contact, kind })
            }
            _ => Err(ServiceError::invalid("_", "post is incomplete")),
        }
    }
}

impl Post {
    pub fn create(new: NewPost, owner: Uuid, now: DateTime<FixedOffset>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            category: new.category,
            location: new.location,
            contact_email: new.contact_email,
            contact_phone: new.contact_phone,
            display_contact: new.display_contact,
            kind: new.kind,
            user_id: owner,
            user_name: None,
            created_at: now,
        }
    }

    pub fn post_type(&self) -> PostType { self.kind.post_type() }

    /// Copy of `self` with `input` merged in. `type` may be repeated but not
    /// changed; fields of the other variant are rejected.
    pub fn patched(&self, input: PostInput) -> Result<Post, ServiceError> {
        let mut next = self.clone();
        let mut errors = FieldErrors::new();

        if let Some(t) = input.post_type.as_deref() {
            if let Some(requested) = errors.take(PostType::parse(t.trim())) {
                if requested != self.post_type() {
                    errors.push("type", "type cannot be changed after creation");
                }
            }
        }
        if let Some(t) = input.title.as_deref() {
            if let Some(v) = errors.take(post::validate_title(t)) { next.title = v; }
        }
        if let Some(d) = input.description.as_deref() {
            if let Some(v) = errors.take(post::validate_description(d)) { next.description = v; }
        }
        if let Some(c) = input.category.as_deref() {
            if let Some(v) = errors.take(post::validate_text("category", c, 128)) { next.category = v; }
        }
        if let Some(l) = input.location.as_deref() {
            if let Some(v) = errors.take(post::validate_text("location", l, 128)) { next.location = v; }
        }
        if let Some(e) = input.contact_email.as_deref() {
            if let Some(v) = errors.take(post::validate_contact_email(e)) { next.contact_email = v; }
        }
        let mut phone_rejected = false;
        if let Some(p) = input.contact_phone.as_deref() {
            match errors.take(validate_phone("contactPhone", p)) {
                Some(v) => next.contact_phone = v,
                None => phone_rejected = true,
            }
        }
        if let Some(d) = input.display_contact.as_deref() {
            if let Some(v) = errors.take(DisplayContact::parse(d.trim())) { next.display_contact = v; }
        }

        match &mut next.kind {
            PostKind::Job(job) => {
                for field in input.service_fields_present() {
                    errors.push(field, format!("{field} is only valid for service posts"));
                }
                if let Some(c) = input.company.as_deref() {
                    if let Some(v) = errors.take(post::validate_text("company", c, 255)) { job.company = v; }
                }
                if let Some(j) = input.job_type.as_deref() {
                    if let Some(v) = errors.take(JobType::parse(j.trim())) { job.job_type = v; }
                }
                if let Some(s) = input.salary.as_deref() {
                    if let Some(v) = errors.take(post::validate_text("salary", s, 128)) { job.salary = v; }
                }
                if let Some(r) = input.requirements.as_deref() {
                    if let Some(v) = errors.take(post::validate_text("requirements", r, 5000)) { job.requirements = v; }
                }
            }
            PostKind::Service(service) => {
                for field in input.job_fields_present() {
                    errors.push(field, format!("{field} is only valid for job posts"));
                }
                if let Some(p) = input.provider.as_deref() {
                    if let Some(v) = errors.take(post::validate_text("provider", p, 255)) { service.provider = v; }
                }
                if let Some(r) = input.rating {
                    if let Some(v) = errors.take(post::validate_rating(r)) { service.rating = v; }
                }
                if let Some(c) = input.rating_count {
                    if let Some(v) = errors.take(post::validate_rating_count(c)) { service.rating_count = v; }
                }
            }
        }

        if next.display_contact.needs_phone() && next.contact_phone.is_none() && !phone_rejected {
            errors.push(
                "contactPhone",
                format!("contactPhone is required when displayContact is {}", next.display_contact.as_str()),
            );
        }

        errors.into_result()?;
        Ok(next)
    }

    /// Full row for insertion.
    pub fn to_active_model(&self) -> post::ActiveModel {
        let mut am = post::ActiveModel {
            id: Set(self.id),
            post_type: Set(self.post_type().as_str().to_string()),
            user_id: Set(self.user_id),
            created_at: Set(self.created_at),
            ..Default::default()
        };
        self.write_row(&mut am);
        am
    }

    /// Set every mutable column; id, type, owner and createdAt are left alone.
    pub fn write_row(&self, am: &mut post::ActiveModel) {
        am.title = Set(self.title.clone());
        am.description = Set(self.description.clone());
        am.category = Set(self.category.clone());
        am.location = Set(self.location.clone());
        am.contact_email = Set(self.contact_email.clone());
        am.contact_phone = Set(self.contact_phone.clone());
        am.display_contact = Set(self.display_contact.as_str().to_string());
        match &self.kind {
            PostKind::Job(job) => {
                am.company = Set(Some(job.company.clone()));
                am.job_type = Set(Some(job.job_type.as_str().to_string()));
                am.salary = Set(Some(job.salary.clone()));
                am.requirements = Set(Some(job.requirements.clone()));
                am.provider = Set(None);
                am.rating = Set(0.0);
                am.rating_count = Set(0);
            }
            PostKind::Service(service) => {
                am.company = Set(None);
                am.job_type = Set(None);
                am.salary = Set(None);
                am.requirements = Set(None);
                am.provider = Set(Some(service.provider.clone()));
                am.rating = Set(service.rating);
                am.rating_count = Set(service.rating_count);
            }
        }
    }
}

fn corrupt(id: Uuid, what: &str) -> ServiceError {
    tracing::error!(post_id = %id, what, "stored post row is inconsistent");
    ServiceError::Db(format!("post {id} has invalid stored {what}"))
}

impl TryFrom<post::Model> for Post {
    type Error = ServiceError;

    fn try_from(m: post::Model) -> Result<Self, Self::Error> {
        let id = m.id;
        let post_type = PostType::parse(&m.post_type).map_err(|_| corrupt(id, "type"))?;
        let display_contact = DisplayContact::parse(&m.display_contact).map_err(|_| corrupt(id, "displayContact"))?;
        let kind = match post_type {
            PostType::Job => {
                let job_type = m
                    .job_type
                    .as_deref()
                    .map(JobType::parse)
                    .transpose()
                    .map_err(|_| corrupt(id, "jobType"))?;
                match (m.company, job_type, m.salary, m.requirements) {
                    (Some(company), Some(job_type), Some(salary), Some(requirements)) => {
                        PostKind::Job(JobDetails { company, job_type, salary, requirements })
                    }
                    _ => return Err(corrupt(id, "job fields")),
                }
            }
            PostType::Service => match m.provider {
                Some(provider) => PostKind::Service(ServiceDetails { provider, rating: m.rating, rating_count: m.rating_count }),
                None => return Err(corrupt(id, "provider")),
            },
        };
        Ok(Post {
            id,
            title: m.title,
            description: m.description,
            category: m.category,
            location: m.location,
            contact_email: m.contact_email,
            contact_phone: m.contact_phone,
            display_contact,
            kind,
            user_id: m.user_id,
            user_name: None,
            created_at: m.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use models::errors::FieldError;

    pub(crate) fn job_input() -> PostInput {
        PostInput {
            title: Some("Software Developer".into()),
            description: Some("React and Node.js".into()),
            post_type: Some("job".into()),
            category: Some("IT".into()),
            location: Some("Shimla".into()),
            contact_email: Some("hr@techsolutions.com".into()),
            company: Some("Tech Solutions".into()),
            job_type: Some("Full-time".into()),
            salary: Some("40k".into()),
            requirements: Some("2 years".into()),
            ..Default::default()
        }
    }

    fn service_input() -> PostInput {
        PostInput {
            title: Some("Plumbing Services".into()),
            description: Some("Leak repair".into()),
            post_type: Some("service".into()),
            category: Some("Home".into()),
            location: Some("Kullu".into()),
            contact_email: Some("fix@example.com".into()),
            provider: Some("Ravi".into()),
            ..Default::default()
        }
    }

    fn fields(err: ServiceError) -> Vec<String> {
        match err {
            ServiceError::Validation(f) => f.into_iter().map(|FieldError { field, .. }| field).collect(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn job_input_validates() {
        let new = job_input().into_new_post().unwrap();
        assert_eq!(new.display_contact, DisplayContact::Email);
        match new.kind {
            PostKind::Job(j) => assert_eq!(j.job_type, JobType::FullTime),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn job_without_job_fields_lists_each_missing_field() {
        let input = PostInput { company: None, job_type: None, salary: None, requirements: None, ..job_input() };
        let missing = fields(input.into_new_post().unwrap_err());
        assert_eq!(missing, vec!["company", "jobType", "salary", "requirements"]);
    }

    #[test]
    fn service_does_not_need_job_fields_and_defaults_rating() {
        let new = service_input().into_new_post().unwrap();
        assert_eq!(
            new.kind,
            PostKind::Service(ServiceDetails { provider: "Ravi".into(), rating: 0.0, rating_count: 0 })
        );
    }

    #[test]
    fn service_without_provider_mentions_provider() {
        let input = PostInput { provider: None, ..service_input() };
        assert_eq!(fields(input.into_new_post().unwrap_err()), vec!["provider"]);
    }

    #[test]
    fn cross_variant_fields_are_rejected() {
        let input = PostInput { company: Some("Acme".into()), ..service_input() };
        assert_eq!(fields(input.into_new_post().unwrap_err()), vec!["company"]);
    }

    #[test]
    fn common_field_errors_are_collected() {
        let input = PostInput {
            title: Some("x".repeat(101)),
            post_type: Some("gig".into()),
            contact_email: None,
            ..job_input()
        };
        let bad = fields(input.into_new_post().unwrap_err());
        assert_eq!(bad, vec!["title", "type", "contactEmail"]);
    }

    #[test]
    fn phone_display_requires_phone() {
        let input = PostInput { display_contact: Some("both".into()), ..job_input() };
        assert_eq!(fields(input.into_new_post().unwrap_err()), vec!["contactPhone"]);
        let ok = PostInput { display_contact: Some("both".into()), contact_phone: Some("98160 00000".into()), ..job_input() };
        assert!(ok.into_new_post().is_ok());
    }

    #[test]
    fn contact_phone_is_bounded_on_create_and_patch() {
        let long = "1".repeat(33);
        let input = PostInput { display_contact: Some("phone".into()), contact_phone: Some(long.clone()), ..job_input() };
        assert_eq!(fields(input.into_new_post().unwrap_err()), vec!["contactPhone"]);
        let fits = PostInput { contact_phone: Some("1".repeat(32)), ..job_input() };
        assert!(fits.into_new_post().is_ok());

        let post = Post::create(job_input().into_new_post().unwrap(), Uuid::new_v4(), Utc::now().into());
        let err = post.patched(PostInput { contact_phone: Some(long), ..Default::default() }).unwrap_err();
        assert_eq!(fields(err), vec!["contactPhone"]);
    }

    #[test]
    fn patch_rejects_type_change() {
        let post = Post::create(job_input().into_new_post().unwrap(), Uuid::new_v4(), Utc::now().into());
        let err = post.patched(PostInput { post_type: Some("service".into()), ..Default::default() }).unwrap_err();
        assert_eq!(fields(err), vec!["type"]);
        let same = post.patched(PostInput { post_type: Some("job".into()), ..Default::default() }).unwrap();
        assert_eq!(same, post);
    }

    #[test]
    fn patch_merges_and_revalidates() {
        let post = Post::create(job_input().into_new_post().unwrap(), Uuid::new_v4(), Utc::now().into());
        let next = post
            .patched(PostInput { title: Some(" Senior Developer ".into()), salary: Some("60k".into()), ..Default::default() })
            .unwrap();
        assert_eq!(next.title, "Senior Developer");
        assert_eq!(next.description, post.description);
        match &next.kind {
            PostKind::Job(j) => assert_eq!(j.salary, "60k"),
            other => panic!("unexpected kind {other:?}"),
        }
        let err = post.patched(PostInput { rating: Some(4.0), title: Some("".into()), ..Default::default() }).unwrap_err();
        assert_eq!(fields(err), vec!["title", "rating"]);
    }

    #[test]
    fn row_translation_round_trips() {
        let post = Post::create(service_input().into_new_post().unwrap(), Uuid::new_v4(), Utc::now().into());
        let am = post.to_active_model();
        let model = post::Model {
            id: am.id.clone().unwrap(),
            title: am.title.clone().unwrap(),
            description: am.description.clone().unwrap(),
            post_type: am.post_type.clone().unwrap(),
            category: am.category.clone().unwrap(),
            location: am.location.clone().unwrap(),
            contact_email: am.contact_email.clone().unwrap(),
            contact_phone: am.contact_phone.clone().unwrap(),
            display_contact: am.display_contact.clone().unwrap(),
            company: am.company.clone().unwrap(),
            job_type: am.job_type.clone().unwrap(),
            salary: am.salary.clone().unwrap(),
            requirements: am.requirements.clone().unwrap(),
            provider: am.provider.clone().unwrap(),
            rating: am.rating.clone().unwrap(),
            rating_count: am.rating_count.clone().unwrap(),
            user_id: am.user_id.clone().unwrap(),
            created_at: am.created_at.clone().unwrap(),
        };
        assert_eq!(Post::try_from(model).unwrap(), post);
    }

    #[test]
    fn serializes_flat_with_type_tag() {
        let post = Post::create(job_input().into_new_post().unwrap(), Uuid::new_v4(), Utc::now().into());
        let v = serde_json::to_value(&post).unwrap();
        assert_eq!(v["type"], "job");
        assert_eq!(v["jobType"], "Full-time");
        assert_eq!(v["company"], "Tech Solutions");
        assert_eq!(v["user"], post.user_id.to_string());
        assert!(v.get("provider").is_none());
        assert!(v.get("userName").is_none());
        assert!(v.get("contactPhone").is_none());
    }
}
