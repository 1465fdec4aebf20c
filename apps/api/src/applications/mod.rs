//! Candidate applications: multipart intake with resume text extraction,
//! listing, status changes and the assessment flow.

pub mod assessment;
pub mod extract;
pub mod handlers;
pub mod store;
