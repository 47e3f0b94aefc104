//! Student-records lookups.
//!
//! Credit aggregates are keyed by the student's class code: the class
//! enrollment defines which courses (and how many credits) apply.

use super::{Db, StoreError, StudentStore};
use campus_common::{CourseCredit, CreditSummary, SemesterCredits, StudentProfile};
use rusqlite::OptionalExtension;

pub struct SqliteStudentStore {
    db: Db,
}

impl SqliteStudentStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert or replace a student row. Used by provisioning and tests.
    pub fn upsert_student(
        &self,
        student_id: &str,
        full_name: &str,
        class_code: &str,
        details: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO students (student_id, full_name, class_code, details_json)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![student_id, full_name, class_code, details.to_string()],
        )?;
        Ok(())
    }

    /// Insert a course-credit row for a class. Used by provisioning and tests.
    pub fn insert_course_credit(
        &self,
        class_code: &str,
        course_code: &str,
        credits: u32,
        term: &str,
        year: &str,
    ) -> Result<(), StoreError> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "INSERT INTO course_credits (class_code, course_code, credits, term, year)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![class_code, course_code, credits, term, year],
        )?;
        Ok(())
    }

    fn class_code_of(&self, student_id: &str) -> Result<Option<String>, StoreError> {
        let conn = self.db.lock().unwrap();
        let class_code = conn
            .query_row(
                "SELECT class_code FROM students WHERE student_id = ?1",
                rusqlite::params![student_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(class_code)
    }
}

impl StudentStore for SqliteStudentStore {
    fn profile(&self, student_id: &str) -> Result<Option<StudentProfile>, StoreError> {
        let conn = self.db.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT student_id, full_name, class_code, details_json
                 FROM students WHERE student_id = ?1",
                rusqlite::params![student_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((student_id, full_name, class_code, details_json)) => {
                let details = serde_json::from_str(&details_json)
                    .map_err(|e| StoreError::Corrupt(format!("details for {}: {}", student_id, e)))?;
                Ok(Some(StudentProfile {
                    student_id,
                    full_name,
                    class_code,
                    details,
                }))
            }
        }
    }

    fn total_credits(&self, student_id: &str) -> Result<Option<CreditSummary>, StoreError> {
        let class_code = match self.class_code_of(student_id)? {
            Some(code) => code,
            None => return Ok(None),
        };

        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT course_code, credits FROM course_credits WHERE class_code = ?1",
        )?;
        let courses = stmt
            .query_map(rusqlite::params![class_code], |row| {
                Ok(CourseCredit {
                    course_code: row.get(0)?,
                    credits: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let total_credits = courses.iter().map(|c| c.credits).sum();

        Ok(Some(CreditSummary {
            student_id: student_id.to_string(),
            class_code,
            total_credits,
            courses,
        }))
    }

    fn semester_credits(
        &self,
        student_id: &str,
        term: &str,
        year: &str,
    ) -> Result<Option<SemesterCredits>, StoreError> {
        let class_code = match self.class_code_of(student_id)? {
            Some(code) => code,
            None => return Ok(None),
        };

        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT course_code, credits FROM course_credits
             WHERE class_code = ?1 AND term = ?2 AND year = ?3",
        )?;
        let courses = stmt
            .query_map(rusqlite::params![class_code, term, year], |row| {
                Ok(CourseCredit {
                    course_code: row.get(0)?,
                    credits: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if courses.is_empty() {
            // No rows for that semester: expected absence
            return Ok(None);
        }

        let total_credits = courses.iter().map(|c| c.credits).sum();

        Ok(Some(SemesterCredits {
            student_id: student_id.to_string(),
            class_code,
            term: term.to_string(),
            year: year.to_string(),
            total_credits,
            courses,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::open_in_memory;
    use super::*;

    fn seeded_store() -> SqliteStudentStore {
        let store = SqliteStudentStore::new(open_in_memory().unwrap());
        store
            .upsert_student(
                "K123456789",
                "Nguyễn Văn A",
                "CNTT01",
                &serde_json::json!({"major": "Công nghệ thông tin"}),
            )
            .unwrap();
        store
            .insert_course_credit("CNTT01", "MATH101", 3, "HK1", "2024")
            .unwrap();
        store
            .insert_course_credit("CNTT01", "PROG102", 4, "HK1", "2024")
            .unwrap();
        store
            .insert_course_credit("CNTT01", "DATA201", 3, "HK2", "2024")
            .unwrap();
        store
    }

    #[test]
    fn test_profile_lookup() {
        let store = seeded_store();
        let profile = store.profile("K123456789").unwrap().unwrap();
        assert_eq!(profile.full_name, "Nguyễn Văn A");
        assert_eq!(profile.class_code, "CNTT01");
        assert_eq!(profile.details["major"], "Công nghệ thông tin");
    }

    #[test]
    fn test_profile_absent() {
        let store = seeded_store();
        assert!(store.profile("K000000000").unwrap().is_none());
    }

    #[test]
    fn test_total_credits_sums_class() {
        let store = seeded_store();
        let summary = store.total_credits("K123456789").unwrap().unwrap();
        assert_eq!(summary.total_credits, 10);
        assert_eq!(summary.courses.len(), 3);
        assert_eq!(summary.class_code, "CNTT01");
    }

    #[test]
    fn test_total_credits_unknown_student() {
        let store = seeded_store();
        assert!(store.total_credits("X999999999").unwrap().is_none());
    }

    #[test]
    fn test_semester_credits_filters_term() {
        let store = seeded_store();
        let sem = store
            .semester_credits("K123456789", "HK1", "2024")
            .unwrap()
            .unwrap();
        assert_eq!(sem.total_credits, 7);
        assert_eq!(sem.courses.len(), 2);
    }

    #[test]
    fn test_semester_credits_no_rows_is_none() {
        let store = seeded_store();
        assert!(store
            .semester_credits("K123456789", "HK3", "2024")
            .unwrap()
            .is_none());
    }
}
