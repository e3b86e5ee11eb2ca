use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::sqlite::{open_database, open_memory_database};
use crate::db::DatabaseError;
use crate::models::doctor::{display_name, DoctorRecord, DEFAULT_DEGREE};
use crate::models::enums::UserRole;
use crate::pipeline::triage::DoctorDirectory;

/// Fields needed to register a doctor together with its user row.
#[derive(Debug, Clone)]
pub struct NewDoctor<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub specialization: &'a str,
    pub degree: Option<&'a str>,
    pub experience: Option<u32>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub working_place: Option<&'a str>,
    pub is_available: bool,
}

impl<'a> NewDoctor<'a> {
    pub fn new(first_name: &'a str, last_name: &'a str, specialization: &'a str) -> Self {
        Self {
            first_name,
            last_name,
            specialization,
            degree: None,
            experience: None,
            city: None,
            state: None,
            working_place: None,
            is_available: true,
        }
    }
}

pub fn insert_user(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    role: UserRole,
    city: Option<&str>,
    state: Option<&str>,
) -> Result<String, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users (id, first_name, last_name, role, city, state)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, first_name, last_name, role.as_str(), city, state],
    )?;
    Ok(id)
}

/// Insert a doctor row for an existing user. Returns the doctor id.
pub fn insert_doctor(
    conn: &Connection,
    user_id: &str,
    doctor: &NewDoctor<'_>,
) -> Result<String, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO doctors (id, user_id, degree, specialization, experience, working_place, is_available)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            user_id,
            doctor.degree,
            doctor.specialization,
            doctor.experience,
            doctor.working_place,
            doctor.is_available,
        ],
    )?;
    Ok(id)
}

/// Create the user and doctor rows in one transaction. Returns the doctor id.
pub fn seed_doctor(conn: &mut Connection, doctor: &NewDoctor<'_>) -> Result<String, DatabaseError> {
    let tx = conn.transaction()?;
    let user_id = insert_user(
        &tx,
        doctor.first_name,
        doctor.last_name,
        UserRole::Doctor,
        doctor.city,
        doctor.state,
    )?;
    let doctor_id = insert_doctor(&tx, &user_id, doctor)?;
    tx.commit()?;
    Ok(doctor_id)
}

pub fn set_doctor_availability(
    conn: &Connection,
    doctor_id: &str,
    is_available: bool,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET is_available = ?1 WHERE id = ?2",
        params![is_available, doctor_id],
    )?;
    Ok(changed > 0)
}

/// Available doctors whose specialization matches exactly, most experienced first.
///
/// Only rows joined to a user with role `doctor` qualify.
pub fn find_available_doctors(
    conn: &Connection,
    specialty: &str,
    limit: usize,
) -> Result<Vec<DoctorRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, u.first_name, u.last_name, d.degree, d.experience,
                u.city, u.state, d.working_place
         FROM doctors d
         JOIN users u ON u.id = d.user_id
         WHERE d.specialization = ?1
           AND d.is_available = 1
           AND u.role = 'doctor'
         ORDER BY COALESCE(d.experience, 0) DESC, u.last_name, u.first_name
         LIMIT ?2",
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![specialty, limit], |row| {
        let first_name: Option<String> = row.get(1)?;
        let last_name: Option<String> = row.get(2)?;
        let degree = row
            .get::<_, Option<String>>(3)?
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DEGREE.to_string());
        let experience = row.get::<_, Option<i64>>(4)?.unwrap_or(0);

        Ok(DoctorRecord {
            doctor_id: row.get(0)?,
            name: display_name(
                first_name.as_deref().unwrap_or(""),
                last_name.as_deref().unwrap_or(""),
            ),
            degree,
            experience_years: u32::try_from(experience).unwrap_or(0),
            city: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            state: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            working_place: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// SQLite-backed doctor directory shared across request threads.
pub struct SqliteDoctorDirectory {
    conn: Mutex<Connection>,
}

impl SqliteDoctorDirectory {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (and migrate) the directory database at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(open_memory_database()?))
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let mut conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&mut conn)
    }
}

impl DoctorDirectory for SqliteDoctorDirectory {
    fn available_doctors(
        &self,
        specialty: &str,
        limit: usize,
    ) -> Result<Vec<DoctorRecord>, DatabaseError> {
        self.with_conn(|conn| find_available_doctors(conn, specialty, limit))
    }
}
