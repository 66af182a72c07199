//! [`SqliteStore`] — the SQLite implementation of
//! [`AdmissionsStore`](coursefinder_core::store::AdmissionsStore).
//!
//! All access goes through one connection, so every `call` closure runs
//! serialised; uniqueness and ownership checks inside a closure are atomic
//! with the writes they guard. The UNIQUE constraints in the schema back
//! the same invariants at the database level.

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension as _};

use coursefinder_core::{
  application::{
    Application, ApplicationStatus, CollegeApplication, NewApplication,
    StudentApplication,
  },
  catalog::{CollegeSummary, Course, CourseUpdate, FilterData, Location, NewCourse},
  contact::{ContactMessage, NewContact},
  profile::{
    Account, AccountProfile, CollegeProfile, CollegeUpdate, NewCollege,
    NewStudent, StudentFields, StudentProfile, StudentRecord, StudentUpdate,
  },
  review::{NewReview, Review, ReviewEntry},
  store::AdmissionsStore,
  user::{NewUser, Role, User},
  Error, Result,
};

use crate::{
  encode::{
    decode_status, encode_date, encode_dt, encode_gender, encode_role,
    encode_status, RawApplication, RawCollege, RawContact, RawStudent, RawUser,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CourseFinder store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(storage)
  }
}

fn storage(e: tokio_rusqlite::Error) -> Error {
  Error::Storage(e.to_string())
}

// ─── AdmissionsStore impl ────────────────────────────────────────────────────

impl AdmissionsStore for SqliteStore {
  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_admin(&self, user: NewUser) -> Result<Account> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(err) = identity_clash(&tx, &user.username, &user.email, None)? {
          return Ok(Err(err));
        }
        let created = insert_user(&tx, &user, Role::Admin)?;
        tx.commit()?;
        Ok(Ok(Account { user: created, profile: AccountProfile::Admin }))
      })
      .await
      .map_err(storage)?
  }

  async fn create_student(&self, input: NewStudent) -> Result<Account> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(err) =
          identity_clash(&tx, &input.user.username, &input.user.email, None)?
        {
          return Ok(Err(err));
        }
        let user = insert_user(&tx, &input.user, Role::Student)?;
        let profile = insert_student(&tx, user.id, &input.fields)?;
        tx.commit()?;
        Ok(Ok(Account {
          user,
          profile: AccountProfile::Student(profile),
        }))
      })
      .await
      .map_err(storage)?
  }

  async fn create_college(&self, input: NewCollege) -> Result<Account> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(err) =
          identity_clash(&tx, &input.user.username, &input.user.email, None)?
        {
          return Ok(Err(err));
        }
        let user = insert_user(&tx, &input.user, Role::College)?;
        let id: i64 = {
          tx.execute(
            "INSERT INTO colleges (user_id, name, logo, image, street, state, district, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
              user.id,
              input.fields.name,
              input.fields.logo,
              input.fields.image,
              input.fields.street,
              input.fields.state,
              input.fields.district,
              input.fields.description,
            ],
          )?;
          tx.last_insert_rowid()
        };
        let profile = CollegeProfile {
          id,
          user_id: user.id,
          fields: input.fields,
          is_approved: false,
        };
        tx.commit()?;
        Ok(Ok(Account {
          user,
          profile: AccountProfile::College(profile),
        }))
      })
      .await
      .map_err(storage)?
  }

  async fn find_user_by_identifier<'a>(
    &'a self,
    identifier: &'a str,
  ) -> Result<Option<User>> {
    let by_email = identifier.contains('@');
    let ident = identifier.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let sql = if by_email {
          format!("SELECT {USER_COLS} FROM users WHERE email = ?1")
        } else {
          format!("SELECT {USER_COLS} FROM users WHERE username = ?1")
        };
        Ok(conn.query_row(&sql, params![ident], map_user).optional()?)
      })
      .await
      .map_err(storage)?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_account(&self, user_id: i64) -> Result<Option<Account>> {
    let raw = self
      .conn
      .call(move |conn| {
        let Some(user) = user_by_id(conn, user_id)? else {
          return Ok(None);
        };
        let student = student_by_user(conn, user_id)?;
        let college = college_by_user(conn, user_id)?;
        Ok(Some((user, student, college)))
      })
      .await
      .map_err(storage)?;

    let Some((raw_user, raw_student, raw_college)) = raw else {
      return Ok(None);
    };
    let user = raw_user.into_user()?;

    let profile = match user.role {
      Role::Admin => AccountProfile::Admin,
      Role::Student => {
        let raw = raw_student.ok_or_else(|| {
          Error::Storage(format!("missing student profile for user {user_id}"))
        })?;
        AccountProfile::Student(raw.into_profile()?)
      }
      Role::College => {
        let raw = raw_college.ok_or_else(|| {
          Error::Storage(format!("missing college profile for user {user_id}"))
        })?;
        AccountProfile::College(raw.into_profile())
      }
    };

    Ok(Some(Account { user, profile }))
  }

  async fn record_login(&self, user_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET last_login = ?1 WHERE id = ?2",
          params![encode_dt(Utc::now()), user_id],
        )?;
        if changed == 0 {
          return Ok(Err(Error::UserNotFound(user_id)));
        }
        Ok(Ok(()))
      })
      .await
      .map_err(storage)?
  }

  async fn update_student(
    &self,
    user_id: i64,
    update: StudentUpdate,
  ) -> Result<StudentProfile> {
    update.validate()?;
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if student_by_user(&tx, user_id)?.is_none() {
          return Ok(Err(Error::StudentNotFound(user_id)));
        }
        if let Some(err) = identity_clash(
          &tx,
          update.username.as_deref().unwrap_or(""),
          update.email.as_deref().unwrap_or(""),
          Some(user_id),
        )? {
          return Ok(Err(err));
        }

        tx.execute(
          "UPDATE users SET
             username      = COALESCE(?1, username),
             email         = COALESCE(?2, email),
             password_hash = COALESCE(?3, password_hash)
           WHERE id = ?4",
          params![update.username, update.email, update.password_hash, user_id],
        )?;

        tx.execute(
          "UPDATE students SET
             phone_number          = COALESCE(?1, phone_number),
             date_of_birth         = COALESCE(?2, date_of_birth),
             gender                = COALESCE(?3, gender),
             school_name           = COALESCE(?4, school_name),
             highest_qualification = COALESCE(?5, highest_qualification),
             marks_percentage      = COALESCE(?6, marks_percentage),
             passing_year          = COALESCE(?7, passing_year),
             street                = COALESCE(?8, street),
             district              = COALESCE(?9, district),
             state                 = COALESCE(?10, state)
           WHERE user_id = ?11",
          params![
            update.phone_number,
            update.date_of_birth.map(encode_date),
            update.gender.map(encode_gender),
            update.school_name,
            update.highest_qualification,
            update.marks_percentage,
            update.passing_year.map(|y| y as i64),
            update.street,
            update.district,
            update.state,
            user_id,
          ],
        )?;

        let raw = student_by_user(&tx, user_id)?.expect("row checked above");
        tx.commit()?;
        Ok(raw.into_profile())
      })
      .await
      .map_err(storage)?
  }

  async fn update_college_profile(
    &self,
    college_id: i64,
    update: CollegeUpdate,
  ) -> Result<CollegeProfile> {
    update.validate()?;
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(existing) = college_by_id(&tx, college_id)? else {
          return Ok(Err(Error::CollegeNotFound(college_id)));
        };

        if let Some(hash) = &update.password_hash {
          tx.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![hash, existing.user_id],
          )?;
        }

        tx.execute(
          "UPDATE colleges SET
             name        = COALESCE(?1, name),
             logo        = COALESCE(?2, logo),
             image       = COALESCE(?3, image),
             street      = COALESCE(?4, street),
             state       = COALESCE(?5, state),
             district    = COALESCE(?6, district),
             description = COALESCE(?7, description)
           WHERE id = ?8",
          params![
            update.name,
            update.logo,
            update.image,
            update.street,
            update.state,
            update.district,
            update.description,
            college_id,
          ],
        )?;

        let raw = college_by_id(&tx, college_id)?.expect("row checked above");
        tx.commit()?;
        Ok(Ok(raw.into_profile()))
      })
      .await
      .map_err(storage)?
  }

  async fn list_students(&self) -> Result<Vec<StudentRecord>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDENT_COLS}, u.username, u.email
           FROM students s JOIN users u ON u.id = s.user_id
           ORDER BY s.id"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            Ok((map_student(row)?, row.get::<_, String>(13)?, row.get::<_, String>(14)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    rows
      .into_iter()
      .map(|(raw, username, email)| {
        Ok(StudentRecord { username, email, profile: raw.into_profile()? })
      })
      .collect()
  }

  // ── One-time codes ────────────────────────────────────────────────────────

  async fn store_otp<'a>(
    &'a self,
    email: &'a str,
    code: &'a str,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let email = email.to_owned();
    let code = code.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO otp_codes (email, code, expires_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(email) DO UPDATE SET
             code = excluded.code, expires_at = excluded.expires_at",
          params![email, code, encode_dt(expires_at)],
        )?;
        Ok(())
      })
      .await
      .map_err(storage)
  }

  async fn consume_otp<'a>(
    &'a self,
    email: &'a str,
    code: &'a str,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    let email = email.to_owned();
    let code = code.to_owned();
    self
      .conn
      .call(move |conn| {
        // Delete-on-match keeps check and consumption atomic. RFC 3339
        // UTC strings compare correctly as text.
        let changed = conn.execute(
          "DELETE FROM otp_codes
           WHERE email = ?1 AND code = ?2 AND expires_at > ?3",
          params![email, code, encode_dt(now)],
        )?;
        Ok(changed > 0)
      })
      .await
      .map_err(storage)
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_colleges(&self) -> Result<Vec<CollegeSummary>> {
    let (colleges, courses) = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {COLLEGE_COLS} FROM colleges ORDER BY id"))?;
        let colleges = stmt
          .query_map([], map_college)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT id, college_id, name, duration, fee FROM courses ORDER BY id",
        )?;
        let courses = stmt
          .query_map([], map_course)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((colleges, courses))
      })
      .await
      .map_err(storage)?;

    let mut by_college: HashMap<i64, Vec<Course>> = HashMap::new();
    for course in courses {
      by_college.entry(course.college_id).or_default().push(course);
    }

    Ok(
      colleges
        .into_iter()
        .map(|raw| {
          let courses = by_college.remove(&raw.id).unwrap_or_default();
          CollegeSummary { college: raw.into_profile(), courses }
        })
        .collect(),
    )
  }

  async fn get_college(&self, college_id: i64) -> Result<Option<CollegeSummary>> {
    let raw = self
      .conn
      .call(move |conn| {
        let Some(college) = college_by_id(conn, college_id)? else {
          return Ok(None);
        };
        let courses = courses_of(conn, college_id)?;
        Ok(Some((college, courses)))
      })
      .await
      .map_err(storage)?;

    Ok(raw.map(|(college, courses)| CollegeSummary {
      college: college.into_profile(),
      courses,
    }))
  }

  async fn add_courses(
    &self,
    college_id: i64,
    items: Vec<NewCourse>,
  ) -> Result<Vec<Course>> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if college_by_id(&tx, college_id)?.is_none() {
          return Ok(Err(Error::CollegeNotFound(college_id)));
        }

        let mut created = Vec::with_capacity(items.len());
        for item in items {
          tx.execute(
            "INSERT INTO courses (college_id, name, duration, fee) VALUES (?1, ?2, ?3, ?4)",
            params![college_id, item.name, item.duration as i64, item.fee as i64],
          )?;
          created.push(Course {
            id: tx.last_insert_rowid(),
            college_id,
            name: item.name,
            duration: item.duration,
            fee: item.fee,
          });
        }
        tx.commit()?;
        Ok(Ok(created))
      })
      .await
      .map_err(storage)?
  }

  async fn list_courses(&self, college_id: i64) -> Result<Vec<Course>> {
    self
      .conn
      .call(move |conn| courses_of(conn, college_id).map_err(Into::into))
      .await
      .map_err(storage)
  }

  async fn get_course(&self, course_id: i64) -> Result<Option<Course>> {
    self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, college_id, name, duration, fee FROM courses WHERE id = ?1",
              params![course_id],
              map_course,
            )
            .optional()?,
        )
      })
      .await
      .map_err(storage)
  }

  async fn update_course(
    &self,
    course_id: i64,
    update: CourseUpdate,
  ) -> Result<Course> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE courses SET
             name     = COALESCE(?1, name),
             duration = COALESCE(?2, duration),
             fee      = COALESCE(?3, fee)
           WHERE id = ?4",
          params![
            update.name,
            update.duration.map(|d| d as i64),
            update.fee.map(|f| f as i64),
            course_id,
          ],
        )?;
        if changed == 0 {
          return Ok(Err(Error::CourseNotFound(course_id)));
        }
        let course = conn.query_row(
          "SELECT id, college_id, name, duration, fee FROM courses WHERE id = ?1",
          params![course_id],
          map_course,
        )?;
        Ok(Ok(course))
      })
      .await
      .map_err(storage)?
  }

  async fn delete_course(&self, course_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let changed =
          conn.execute("DELETE FROM courses WHERE id = ?1", params![course_id])?;
        if changed == 0 {
          return Ok(Err(Error::CourseNotFound(course_id)));
        }
        Ok(Ok(()))
      })
      .await
      .map_err(storage)?
  }

  async fn filter_data(&self) -> Result<FilterData> {
    let (names, locations) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM courses ORDER BY id")?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT DISTINCT state, district FROM colleges
           WHERE state IS NOT NULL AND district IS NOT NULL
           ORDER BY state, district",
        )?;
        let locations = stmt
          .query_map([], |row| {
            Ok(Location { state: row.get(0)?, district: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((names, locations))
      })
      .await
      .map_err(storage)?;

    // Case-insensitive de-duplication; the first-seen casing wins.
    let mut seen = std::collections::HashSet::new();
    let mut courses = Vec::new();
    for name in names {
      if seen.insert(name.to_lowercase()) {
        courses.push(name);
      }
    }

    Ok(FilterData { courses, locations })
  }

  // ── Applications ──────────────────────────────────────────────────────────

  async fn create_application(&self, input: NewApplication) -> Result<Application> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if college_by_id(&tx, input.college_id)?.is_none() {
          return Ok(Err(Error::CollegeNotFound(input.college_id)));
        }
        let course: Option<Course> = tx
          .query_row(
            "SELECT id, college_id, name, duration, fee FROM courses WHERE id = ?1",
            params![input.course_id],
            map_course,
          )
          .optional()?;
        let Some(course) = course else {
          return Ok(Err(Error::CourseNotFound(input.course_id)));
        };
        if course.college_id != input.college_id {
          return Ok(Err(Error::Validation(
            "course does not belong to the selected college".into(),
          )));
        }

        let duplicate = exists(
          &tx,
          "SELECT 1 FROM applications
           WHERE student_id = ?1 AND college_id = ?2 AND course_id = ?3",
          params![input.student_id, input.college_id, input.course_id],
        )?;
        if duplicate {
          return Ok(Err(Error::AlreadyApplied));
        }

        let payment_used = exists(
          &tx,
          "SELECT 1 FROM applications WHERE payment_id = ?1",
          params![input.payment_id],
        )?;
        if payment_used {
          return Ok(Err(Error::PaymentIdTaken(input.payment_id)));
        }

        let applied_at = Utc::now();
        tx.execute(
          "INSERT INTO applications (student_id, college_id, course_id, status, payment_id, applied_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            input.student_id,
            input.college_id,
            input.course_id,
            encode_status(ApplicationStatus::Pending),
            input.payment_id,
            encode_dt(applied_at),
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Ok(Application {
          id,
          student_id: input.student_id,
          college_id: input.college_id,
          course_id: input.course_id,
          status: ApplicationStatus::Pending,
          payment_id: input.payment_id,
          applied_at,
        }))
      })
      .await
      .map_err(storage)?
  }

  async fn list_student_applications(
    &self,
    student_id: i64,
  ) -> Result<Vec<StudentApplication>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.id, a.student_id, a.college_id, a.course_id, a.status,
                  a.payment_id, a.applied_at, c.name, co.name
           FROM applications a
           JOIN colleges c ON c.id = a.college_id
           JOIN courses co ON co.id = a.course_id
           WHERE a.student_id = ?1
           ORDER BY a.id",
        )?;
        let rows = stmt
          .query_map(params![student_id], |row| {
            Ok((
              map_application(row)?,
              row.get::<_, String>(7)?,
              row.get::<_, String>(8)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    rows
      .into_iter()
      .map(|(raw, college_name, course_name)| {
        Ok(StudentApplication {
          application: raw.into_application()?,
          college_name,
          course_name,
        })
      })
      .collect()
  }

  async fn list_college_applications(
    &self,
    college_id: i64,
  ) -> Result<Vec<CollegeApplication>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT a.id, a.status, u.username, u.email, co.name, {STUDENT_COLS}
           FROM applications a
           JOIN students s ON s.id = a.student_id
           JOIN users u    ON u.id = s.user_id
           JOIN courses co ON co.id = a.course_id
           WHERE a.college_id = ?1
           ORDER BY a.id",
        ))?;
        let rows = stmt
          .query_map(params![college_id], |row| {
            Ok((
              row.get::<_, i64>(0)?,
              row.get::<_, String>(1)?,
              row.get::<_, String>(2)?,
              row.get::<_, String>(3)?,
              row.get::<_, String>(4)?,
              map_student_at(row, 5)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    rows
      .into_iter()
      .map(|(id, status, student_name, email, course_name, raw)| {
        Ok(CollegeApplication {
          id,
          status: decode_status(&status)?,
          student_name,
          email,
          course_name,
          student: raw.into_profile()?.fields,
        })
      })
      .collect()
  }

  async fn set_application_status(
    &self,
    application_id: i64,
    college_id: i64,
    next: ApplicationStatus,
  ) -> Result<Application> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw: Option<RawApplication> = tx
          .query_row(
            "SELECT id, student_id, college_id, course_id, status, payment_id, applied_at
             FROM applications WHERE id = ?1",
            params![application_id],
            map_application,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(Err(Error::ApplicationNotFound(application_id)));
        };

        let mut application = match raw.into_application() {
          Ok(a) => a,
          Err(e) => return Ok(Err(e)),
        };
        if application.college_id != college_id {
          return Ok(Err(Error::NotApplicationOwner {
            application_id,
            college_id,
          }));
        }
        if let Err(e) = application.status.check_transition(next) {
          return Ok(Err(e));
        }

        tx.execute(
          "UPDATE applications SET status = ?1 WHERE id = ?2",
          params![encode_status(next), application_id],
        )?;
        tx.commit()?;

        application.status = next;
        Ok(Ok(application))
      })
      .await
      .map_err(storage)?
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn create_review(&self, input: NewReview) -> Result<ReviewEntry> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let college_name: Option<String> = tx
          .query_row(
            "SELECT name FROM colleges WHERE id = ?1",
            params![input.college_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(college_name) = college_name else {
          return Ok(Err(Error::CollegeNotFound(input.college_id)));
        };

        let student_name: Option<String> = tx
          .query_row(
            "SELECT u.username FROM students s JOIN users u ON u.id = s.user_id
             WHERE s.id = ?1",
            params![input.student_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(student_name) = student_name else {
          return Ok(Err(Error::StudentNotFound(input.student_id)));
        };

        let created_at = Utc::now();
        tx.execute(
          "INSERT INTO reviews (student_id, college_id, rating, review_text, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            input.student_id,
            input.college_id,
            input.rating,
            input.review_text,
            encode_dt(created_at),
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Ok(ReviewEntry {
          review: Review {
            id,
            student_id: input.student_id,
            college_id: input.college_id,
            rating: input.rating,
            review_text: input.review_text,
            created_at,
          },
          student_name,
          college_name,
        }))
      })
      .await
      .map_err(storage)?
  }

  async fn list_college_reviews(&self, college_id: i64) -> Result<Vec<ReviewEntry>> {
    self.review_entries(Some(college_id)).await
  }

  async fn list_all_reviews(&self) -> Result<Vec<ReviewEntry>> {
    self.review_entries(None).await
  }

  // ── Moderation ────────────────────────────────────────────────────────────

  async fn approve_college(&self, college_id: i64) -> Result<CollegeProfile> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE colleges SET is_approved = 1 WHERE id = ?1",
          params![college_id],
        )?;
        if changed == 0 {
          return Ok(Err(Error::CollegeNotFound(college_id)));
        }
        let raw = college_by_id(conn, college_id)?.expect("row updated above");
        Ok(Ok(raw.into_profile()))
      })
      .await
      .map_err(storage)?
  }

  async fn delete_college(&self, college_id: i64) -> Result<CollegeProfile> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = college_by_id(&tx, college_id)? else {
          return Ok(Err(Error::CollegeNotFound(college_id)));
        };
        // Courses, applications, and reviews go through ON DELETE CASCADE.
        tx.execute("DELETE FROM colleges WHERE id = ?1", params![college_id])?;
        tx.commit()?;
        Ok(Ok(raw.into_profile()))
      })
      .await
      .map_err(storage)?
  }

  // ── Contact log ───────────────────────────────────────────────────────────

  async fn create_contact(&self, input: NewContact) -> Result<ContactMessage> {
    self
      .conn
      .call(move |conn| {
        let submitted_at = Utc::now();
        conn.execute(
          "INSERT INTO contacts (user_id, name, email, subject, message, role, submitted_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            input.user_id,
            input.name,
            input.email,
            input.subject,
            input.message,
            encode_role(input.role),
            encode_dt(submitted_at),
          ],
        )?;
        Ok(ContactMessage {
          id: conn.last_insert_rowid(),
          user_id: input.user_id,
          name: input.name,
          email: input.email,
          subject: input.subject,
          message: input.message,
          role: input.role,
          submitted_at,
        })
      })
      .await
      .map_err(storage)
  }

  async fn list_user_contacts(&self, user_id: i64) -> Result<Vec<ContactMessage>> {
    self.contact_rows(Some(user_id)).await
  }

  async fn list_all_contacts(&self) -> Result<Vec<ContactMessage>> {
    self.contact_rows(None).await
  }
}

// ─── Shared queries ──────────────────────────────────────────────────────────

impl SqliteStore {
  async fn review_entries(&self, college_id: Option<i64>) -> Result<Vec<ReviewEntry>> {
    let rows = self
      .conn
      .call(move |conn| {
        let base = "SELECT r.id, r.student_id, r.college_id, r.rating,
                           r.review_text, r.created_at, u.username, c.name
                    FROM reviews r
                    JOIN students s ON s.id = r.student_id
                    JOIN users u    ON u.id = s.user_id
                    JOIN colleges c ON c.id = r.college_id";
        let map = |row: &rusqlite::Row<'_>| {
          Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i32>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
          ))
        };
        let rows = if let Some(id) = college_id {
          let mut stmt =
            conn.prepare(&format!("{base} WHERE r.college_id = ?1 ORDER BY r.id"))?;
          stmt
            .query_map(params![id], map)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!("{base} ORDER BY r.id"))?;
          stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    rows
      .into_iter()
      .map(
        |(id, student_id, college_id, rating, review_text, created_at, student_name, college_name)| {
          Ok(ReviewEntry {
            review: Review {
              id,
              student_id,
              college_id,
              rating,
              review_text,
              created_at: crate::encode::decode_dt(&created_at)?,
            },
            student_name,
            college_name,
          })
        },
      )
      .collect()
  }

  async fn contact_rows(&self, user_id: Option<i64>) -> Result<Vec<ContactMessage>> {
    let rows = self
      .conn
      .call(move |conn| {
        let base = "SELECT id, user_id, name, email, subject, message, role, submitted_at
                    FROM contacts";
        let rows = if let Some(id) = user_id {
          let mut stmt =
            conn.prepare(&format!("{base} WHERE user_id = ?1 ORDER BY id"))?;
          stmt
            .query_map(params![id], map_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!("{base} ORDER BY id"))?;
          stmt
            .query_map([], map_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    rows.into_iter().map(RawContact::into_message).collect()
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

const USER_COLS: &str =
  "id, username, email, password_hash, role, is_active, last_login, created_at";

const STUDENT_COLS: &str =
  "s.id, s.user_id, s.phone_number, s.date_of_birth, s.gender, s.school_name,
   s.highest_qualification, s.marks_percentage, s.passing_year, s.street,
   s.district, s.state, s.verified";

const COLLEGE_COLS: &str =
  "id, user_id, name, logo, image, street, state, district, description, is_approved";

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    id:            row.get(0)?,
    username:      row.get(1)?,
    email:         row.get(2)?,
    password_hash: row.get(3)?,
    role:          row.get(4)?,
    is_active:     row.get(5)?,
    last_login:    row.get(6)?,
    created_at:    row.get(7)?,
  })
}

fn map_student(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawStudent> {
  map_student_at(row, 0)
}

/// Read student columns starting at `base` — used when the student row is
/// joined after other columns.
fn map_student_at(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<RawStudent> {
  Ok(RawStudent {
    id:                    row.get(base)?,
    user_id:               row.get(base + 1)?,
    phone_number:          row.get(base + 2)?,
    date_of_birth:         row.get(base + 3)?,
    gender:                row.get(base + 4)?,
    school_name:           row.get(base + 5)?,
    highest_qualification: row.get(base + 6)?,
    marks_percentage:      row.get(base + 7)?,
    passing_year:          row.get(base + 8)?,
    street:                row.get(base + 9)?,
    district:              row.get(base + 10)?,
    state:                 row.get(base + 11)?,
    verified:              row.get(base + 12)?,
  })
}

fn map_college(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCollege> {
  Ok(RawCollege {
    id:          row.get(0)?,
    user_id:     row.get(1)?,
    name:        row.get(2)?,
    logo:        row.get(3)?,
    image:       row.get(4)?,
    street:      row.get(5)?,
    state:       row.get(6)?,
    district:    row.get(7)?,
    description: row.get(8)?,
    is_approved: row.get(9)?,
  })
}

fn map_course(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
  Ok(Course {
    id:         row.get(0)?,
    college_id: row.get(1)?,
    name:       row.get(2)?,
    duration:   row.get::<_, i64>(3)? as u32,
    fee:        row.get::<_, i64>(4)? as u32,
  })
}

fn map_application(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawApplication> {
  Ok(RawApplication {
    id:         row.get(0)?,
    student_id: row.get(1)?,
    college_id: row.get(2)?,
    course_id:  row.get(3)?,
    status:     row.get(4)?,
    payment_id: row.get(5)?,
    applied_at: row.get(6)?,
  })
}

fn map_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawContact> {
  Ok(RawContact {
    id:           row.get(0)?,
    user_id:      row.get(1)?,
    name:         row.get(2)?,
    email:        row.get(3)?,
    subject:      row.get(4)?,
    message:      row.get(5)?,
    role:         row.get(6)?,
    submitted_at: row.get(7)?,
  })
}

fn user_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
      params![id],
      map_user,
    )
    .optional()
}

fn student_by_user(
  conn: &rusqlite::Connection,
  user_id: i64,
) -> rusqlite::Result<Option<RawStudent>> {
  conn
    .query_row(
      &format!("SELECT {STUDENT_COLS} FROM students s WHERE s.user_id = ?1"),
      params![user_id],
      map_student,
    )
    .optional()
}

fn college_by_user(
  conn: &rusqlite::Connection,
  user_id: i64,
) -> rusqlite::Result<Option<RawCollege>> {
  conn
    .query_row(
      &format!("SELECT {COLLEGE_COLS} FROM colleges WHERE user_id = ?1"),
      params![user_id],
      map_college,
    )
    .optional()
}

fn college_by_id(
  conn: &rusqlite::Connection,
  college_id: i64,
) -> rusqlite::Result<Option<RawCollege>> {
  conn
    .query_row(
      &format!("SELECT {COLLEGE_COLS} FROM colleges WHERE id = ?1"),
      params![college_id],
      map_college,
    )
    .optional()
}

fn courses_of(conn: &rusqlite::Connection, college_id: i64) -> rusqlite::Result<Vec<Course>> {
  let mut stmt = conn.prepare(
    "SELECT id, college_id, name, duration, fee FROM courses
     WHERE college_id = ?1 ORDER BY id",
  )?;
  stmt
    .query_map(params![college_id], map_course)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

fn exists(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, params, |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

/// Check whether `username` or `email` is already held by a user other than
/// `exclude`. Empty strings never clash — partial updates pass `""` for
/// fields they do not touch.
fn identity_clash(
  conn: &rusqlite::Connection,
  username: &str,
  email: &str,
  exclude: Option<i64>,
) -> rusqlite::Result<Option<Error>> {
  let exclude = exclude.unwrap_or(-1);
  if !username.is_empty()
    && exists(
      conn,
      "SELECT 1 FROM users WHERE username = ?1 AND id != ?2",
      params![username, exclude],
    )?
  {
    return Ok(Some(Error::UsernameTaken(username.to_owned())));
  }
  if !email.is_empty()
    && exists(
      conn,
      "SELECT 1 FROM users WHERE email = ?1 AND id != ?2",
      params![email, exclude],
    )?
  {
    return Ok(Some(Error::EmailTaken(email.to_owned())));
  }
  Ok(None)
}

fn insert_user(
  conn: &rusqlite::Connection,
  input: &NewUser,
  role: Role,
) -> rusqlite::Result<User> {
  let created_at = Utc::now();
  conn.execute(
    "INSERT INTO users (username, email, password_hash, role, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      input.username,
      input.email,
      input.password_hash,
      encode_role(role),
      encode_dt(created_at),
    ],
  )?;
  Ok(User {
    id: conn.last_insert_rowid(),
    username: input.username.clone(),
    email: input.email.clone(),
    password_hash: input.password_hash.clone(),
    role,
    is_active: true,
    last_login: None,
    created_at,
  })
}

fn insert_student(
  conn: &rusqlite::Connection,
  user_id: i64,
  fields: &StudentFields,
) -> rusqlite::Result<StudentProfile> {
  conn.execute(
    "INSERT INTO students (user_id, phone_number, date_of_birth, gender, school_name,
       highest_qualification, marks_percentage, passing_year, street, district, state, verified)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1)",
    params![
      user_id,
      fields.phone_number,
      fields.date_of_birth.map(encode_date),
      fields.gender.map(encode_gender),
      fields.school_name,
      fields.highest_qualification,
      fields.marks_percentage,
      fields.passing_year.map(|y| y as i64),
      fields.street,
      fields.district,
      fields.state,
    ],
  )?;
  Ok(StudentProfile {
    id:       conn.last_insert_rowid(),
    user_id,
    fields:   fields.clone(),
    verified: true,
  })
}
