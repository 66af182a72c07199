//! The `AdmissionsStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `coursefinder-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend.
//!
//! Compound checks (uniqueness, ownership, status transitions) are part of
//! each operation's contract: an implementation must perform them atomically
//! with the write they guard, so two racing identical requests cannot both
//! succeed.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  application::{
    Application, ApplicationStatus, CollegeApplication, NewApplication,
    StudentApplication,
  },
  catalog::{CollegeSummary, Course, CourseUpdate, FilterData, NewCourse},
  contact::{ContactMessage, NewContact},
  error::Result,
  profile::{
    Account, CollegeProfile, CollegeUpdate, NewCollege, NewStudent,
    StudentProfile, StudentRecord, StudentUpdate,
  },
  review::{NewReview, ReviewEntry},
  user::{NewUser, User},
};

/// Abstraction over a CourseFinder storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Domain failures
/// surface as [`crate::Error`] variants; backend faults as
/// [`crate::Error::Storage`].
pub trait AdmissionsStore: Send + Sync {
  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create an admin identity. Fails with `UsernameTaken`/`EmailTaken` on
  /// a uniqueness clash.
  fn create_admin(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<Account>> + Send + '_;

  /// Create a student identity plus profile in one transaction. The caller
  /// is responsible for having verified email ownership first; the profile
  /// is written with `verified = true`.
  fn create_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Account>> + Send + '_;

  /// Create a college identity plus profile in one transaction. The
  /// profile starts unapproved.
  fn create_college(
    &self,
    input: NewCollege,
  ) -> impl Future<Output = Result<Account>> + Send + '_;

  /// Look up a user by login identifier: by email when the identifier
  /// contains `@`, by username otherwise.
  fn find_user_by_identifier<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<User>>> + Send + 'a;

  /// Fetch a user together with its role-specific profile.
  fn get_account(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<Account>>> + Send + '_;

  /// Stamp `last_login` with the current time.
  fn record_login(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Apply a partial update to a student's identity and profile. Supplied
  /// identity fields must still satisfy the registration rules; blank
  /// values are rejected, not treated as clears.
  fn update_student(
    &self,
    user_id: i64,
    update: StudentUpdate,
  ) -> impl Future<Output = Result<StudentProfile>> + Send + '_;

  /// Apply a partial update to a college profile (and optionally the
  /// owning user's password). Approval state is not touchable here.
  fn update_college_profile(
    &self,
    college_id: i64,
    update: CollegeUpdate,
  ) -> impl Future<Output = Result<CollegeProfile>> + Send + '_;

  /// All student profiles joined with their identity fields.
  fn list_students(
    &self,
  ) -> impl Future<Output = Result<Vec<StudentRecord>>> + Send + '_;

  // ── One-time codes ────────────────────────────────────────────────────

  /// Store a verification code for an email address, replacing any
  /// previous code for the same address.
  fn store_otp<'a>(
    &'a self,
    email: &'a str,
    code: &'a str,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Check a code against the stored record and delete it on match.
  /// Returns `false` for an unknown email, wrong code, or expired code.
  fn consume_otp<'a>(
    &'a self,
    email: &'a str,
    code: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool>> + Send + 'a;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// All colleges with their courses. Public browse data.
  fn list_colleges(
    &self,
  ) -> impl Future<Output = Result<Vec<CollegeSummary>>> + Send + '_;

  /// One college with its courses. `None` if absent.
  fn get_college(
    &self,
    college_id: i64,
  ) -> impl Future<Output = Result<Option<CollegeSummary>>> + Send + '_;

  /// Insert a validated batch of courses for a college in one
  /// transaction — all rows or none.
  fn add_courses(
    &self,
    college_id: i64,
    items: Vec<NewCourse>,
  ) -> impl Future<Output = Result<Vec<Course>>> + Send + '_;

  fn list_courses(
    &self,
    college_id: i64,
  ) -> impl Future<Output = Result<Vec<Course>>> + Send + '_;

  fn get_course(
    &self,
    course_id: i64,
  ) -> impl Future<Output = Result<Option<Course>>> + Send + '_;

  fn update_course(
    &self,
    course_id: i64,
    update: CourseUpdate,
  ) -> impl Future<Output = Result<Course>> + Send + '_;

  fn delete_course(
    &self,
    course_id: i64,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// De-duplicated course names and distinct college locations, used to
  /// populate search filters.
  fn filter_data(
    &self,
  ) -> impl Future<Output = Result<FilterData>> + Send + '_;

  // ── Applications ──────────────────────────────────────────────────────

  /// Create a `pending` application. A duplicate (student, college,
  /// course) triple fails with `AlreadyApplied`; a reused payment id with
  /// `PaymentIdTaken`. Both checks are atomic with the insert.
  fn create_application(
    &self,
    input: NewApplication,
  ) -> impl Future<Output = Result<Application>> + Send + '_;

  /// Applications authored by one student, with display names joined.
  fn list_student_applications(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Vec<StudentApplication>>> + Send + '_;

  /// Applications received by one college, with applicant details joined.
  fn list_college_applications(
    &self,
    college_id: i64,
  ) -> impl Future<Output = Result<Vec<CollegeApplication>>> + Send + '_;

  /// Transition an application's status on behalf of `college_id`.
  ///
  /// Fails with `ApplicationNotFound` if absent, `NotApplicationOwner` if
  /// the application references a different college, and
  /// `InvalidTransition` unless the move is `pending -> approved` or
  /// `pending -> rejected`. Guard and write happen atomically.
  fn set_application_status(
    &self,
    application_id: i64,
    college_id: i64,
    next: ApplicationStatus,
  ) -> impl Future<Output = Result<Application>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  /// Create a review. The referenced college must exist.
  fn create_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<ReviewEntry>> + Send + '_;

  fn list_college_reviews(
    &self,
    college_id: i64,
  ) -> impl Future<Output = Result<Vec<ReviewEntry>>> + Send + '_;

  fn list_all_reviews(
    &self,
  ) -> impl Future<Output = Result<Vec<ReviewEntry>>> + Send + '_;

  // ── Moderation ────────────────────────────────────────────────────────

  /// Mark a college approved. Idempotent.
  fn approve_college(
    &self,
    college_id: i64,
  ) -> impl Future<Output = Result<CollegeProfile>> + Send + '_;

  /// Delete a college; its courses, applications, and reviews go with it.
  /// Returns the deleted profile.
  fn delete_college(
    &self,
    college_id: i64,
  ) -> impl Future<Output = Result<CollegeProfile>> + Send + '_;

  // ── Contact log ───────────────────────────────────────────────────────

  fn create_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<ContactMessage>> + Send + '_;

  fn list_user_contacts(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<ContactMessage>>> + Send + '_;

  fn list_all_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<ContactMessage>>> + Send + '_;
}
