//! SQL implementation of the booking store
//!
//! The conflict re-check and the insert of a new appointment are a single
//! conditional `INSERT ... SELECT ... WHERE NOT EXISTS` statement executed in
//! a transaction, so two racing bookings for the same trainer cannot both land.

use crate::error::DbError;
use crate::repositories::rows::{
    appointment_from_row, date_to_text, range_from_row, service_from_row, time_to_minutes,
    timestamp_to_text, weekday_to_number, window_from_row, APPOINTMENT_COLUMNS,
};
use crate::{DbBackend, DbClient};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use gymbook_common::models::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, MemberId, NewAppointment,
    Service, ServiceId, TimeRange, TrainerAvailability, TrainerId,
};
use gymbook_common::store::{BookingStore, BoxFuture, ConflictKind, InsertGuard, StoreError};
use sqlx::Row;
use tracing::{debug, error, info, warn};

const INSERT_IF_TRAINER_FREE: &str = r#"
    INSERT INTO appointments
        (member_id, trainer_id, service_id, appointment_date, start_minute, end_minute,
         status, price, notes, created_at)
    SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
    WHERE NOT EXISTS (
        SELECT 1 FROM appointments
        WHERE trainer_id = $11 AND appointment_date = $12
          AND status NOT IN ('Cancelled', 'Rejected')
          AND start_minute < $13 AND end_minute > $14
    )
    RETURNING id
"#;

const INSERT_IF_TRAINER_AND_MEMBER_FREE: &str = r#"
    INSERT INTO appointments
        (member_id, trainer_id, service_id, appointment_date, start_minute, end_minute,
         status, price, notes, created_at)
    SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
    WHERE NOT EXISTS (
        SELECT 1 FROM appointments
        WHERE trainer_id = $11 AND appointment_date = $12
          AND status NOT IN ('Cancelled', 'Rejected')
          AND start_minute < $13 AND end_minute > $14
    )
    AND NOT EXISTS (
        SELECT 1 FROM appointments
        WHERE member_id = $15 AND appointment_date = $16
          AND status NOT IN ('Cancelled', 'Rejected')
          AND start_minute < $17 AND end_minute > $18
    )
    RETURNING id
"#;

const TRAINER_OVERLAP_EXISTS: &str = r#"
    SELECT COUNT(*) AS overlapping FROM appointments
    WHERE trainer_id = $1 AND appointment_date = $2
      AND status NOT IN ('Cancelled', 'Rejected')
      AND start_minute < $3 AND end_minute > $4
"#;

/// DDL for the appointments table; only the generated key differs per engine.
fn appointments_table_ddl(backend: DbBackend) -> String {
    let id_column = match backend {
        DbBackend::Postgres => "id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
        _ => "id INTEGER PRIMARY KEY AUTOINCREMENT",
    };
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            {id_column},
            member_id TEXT NOT NULL,
            trainer_id INTEGER NOT NULL,
            service_id INTEGER NOT NULL,
            appointment_date TEXT NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            status TEXT NOT NULL,
            price INTEGER NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            CHECK (start_minute < end_minute)
        )
        "#
    )
}

/// SQL implementation of [`BookingStore`]
#[derive(Debug, Clone)]
pub struct SqlBookingStore {
    /// The database client
    db_client: DbClient,
}

impl SqlBookingStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub fn client(&self) -> &DbClient {
        &self.db_client
    }

    /// Create the booking tables if they don't already exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let backend = self.db_client.backend();
        debug!("Initializing booking schema on {:?}", backend);
        if backend == DbBackend::MySql {
            return Err(DbError::ConfigError(
                "The booking store supports SQLite and Postgres only".to_string(),
            ));
        }

        self.db_client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS services (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    duration_minutes INTEGER NOT NULL CHECK (duration_minutes BETWEEN 15 AND 180),
                    price INTEGER NOT NULL,
                    is_active INTEGER NOT NULL DEFAULT 1
                )
                "#,
            )
            .await?;

        self.db_client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS trainer_availability (
                    trainer_id INTEGER NOT NULL,
                    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
                    start_minute INTEGER NOT NULL,
                    end_minute INTEGER NOT NULL,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    CHECK (start_minute < end_minute),
                    UNIQUE (trainer_id, day_of_week)
                )
                "#,
            )
            .await?;

        self.db_client
            .execute(&appointments_table_ddl(backend))
            .await?;

        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_appointments_trainer_date \
                 ON appointments (trainer_id, appointment_date)",
            )
            .await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_appointments_member_date \
                 ON appointments (member_id, appointment_date)",
            )
            .await?;

        info!("Booking schema initialized successfully");
        Ok(())
    }

    async fn find_service(&self, id: ServiceId) -> Result<Option<Service>, DbError> {
        let row = sqlx::query(
            "SELECT id, name, duration_minutes, price, is_active FROM services WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.db_client.pool())
        .await?;

        row.as_ref().map(service_from_row).transpose()
    }

    async fn find_active_window(
        &self,
        trainer_id: TrainerId,
        day: Weekday,
    ) -> Result<Option<TrainerAvailability>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT trainer_id, day_of_week, start_minute, end_minute, is_active
            FROM trainer_availability
            WHERE trainer_id = $1 AND day_of_week = $2 AND is_active = 1
            "#,
        )
        .bind(trainer_id.0)
        .bind(weekday_to_number(day))
        .fetch_optional(self.db_client.pool())
        .await?;

        row.as_ref().map(window_from_row).transpose()
    }

    async fn find_busy(
        &self,
        column_filter: &str,
        key: BusyKey,
        date: NaiveDate,
    ) -> Result<Vec<TimeRange>, DbError> {
        let sql = format!(
            "SELECT start_minute, end_minute FROM appointments \
             WHERE {} = $1 AND appointment_date = $2 \
               AND status NOT IN ('Cancelled', 'Rejected') \
             ORDER BY start_minute",
            column_filter
        );
        let query = sqlx::query(&sql);
        let query = match key {
            BusyKey::Trainer(id) => query.bind(id.0),
            BusyKey::Member(id) => query.bind(id.0),
        };
        let rows = query
            .bind(date_to_text(date))
            .fetch_all(self.db_client.pool())
            .await?;

        rows.iter().map(range_from_row).collect()
    }

    async fn insert_guarded(
        &self,
        new: &NewAppointment,
        guard: InsertGuard,
    ) -> Result<Result<Appointment, ConflictKind>, DbError> {
        let date = date_to_text(new.date);
        let start = time_to_minutes(new.start_time);
        let end = time_to_minutes(new.end_time);
        let status = AppointmentStatus::Pending;

        let mut tx = self.db_client.begin().await?;

        let sql = if guard.check_member {
            INSERT_IF_TRAINER_AND_MEMBER_FREE
        } else {
            INSERT_IF_TRAINER_FREE
        };
        let mut query = sqlx::query(sql)
            .bind(new.member_id.0.clone())
            .bind(new.trainer_id.0)
            .bind(new.service_id.0)
            .bind(date.clone())
            .bind(start)
            .bind(end)
            .bind(status.code())
            .bind(new.price)
            .bind(new.notes.clone())
            .bind(timestamp_to_text(new.created_at))
            .bind(new.trainer_id.0)
            .bind(date.clone())
            .bind(end)
            .bind(start);
        if guard.check_member {
            query = query
                .bind(new.member_id.0.clone())
                .bind(date.clone())
                .bind(end)
                .bind(start);
        }

        let inserted = query.fetch_optional(&mut *tx).await?;

        let Some(row) = inserted else {
            let overlapping: i64 = sqlx::query(TRAINER_OVERLAP_EXISTS)
                .bind(new.trainer_id.0)
                .bind(date)
                .bind(end)
                .bind(start)
                .fetch_one(&mut *tx)
                .await?
                .try_get("overlapping")?;
            tx.rollback().await?;

            let kind = if overlapping > 0 {
                ConflictKind::Trainer
            } else {
                ConflictKind::Member
            };
            warn!(
                "Rejected insert for trainer {} on {} {}-{}: {:?} conflict",
                new.trainer_id, new.date, new.start_time, new.end_time, kind
            );
            return Ok(Err(kind));
        };

        let id: i64 = row.try_get("id")?;
        tx.commit().await?;

        debug!("Inserted appointment {} for member {}", id, new.member_id);
        Ok(Ok(Appointment {
            id: AppointmentId(id),
            member_id: new.member_id.clone(),
            trainer_id: new.trainer_id,
            service_id: new.service_id,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            status,
            price: new.price,
            notes: new.notes.clone(),
            created_at: new.created_at,
            updated_at: None,
        }))
    }

    async fn find_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, DbError> {
        let sql = format!("SELECT {} FROM appointments WHERE id = $1", APPOINTMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(self.db_client.pool())
            .await?;

        row.as_ref().map(appointment_from_row).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        next: AppointmentStatus,
        at: NaiveDateTime,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE appointments SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(next.code())
        .bind(timestamp_to_text(at))
        .bind(id.0)
        .bind(expected.code())
        .execute(self.db_client.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, DbError> {
        let mut clauses = Vec::new();
        let mut next_param = 0;
        let mut placeholder = || {
            next_param += 1;
            format!("${}", next_param)
        };
        if filter.member_id.is_some() {
            clauses.push(format!("member_id = {}", placeholder()));
        }
        if filter.trainer_id.is_some() {
            clauses.push(format!("trainer_id = {}", placeholder()));
        }
        if filter.date.is_some() {
            clauses.push(format!("appointment_date = {}", placeholder()));
        }
        if filter.status.is_some() {
            clauses.push(format!("status = {}", placeholder()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM appointments{} ORDER BY appointment_date, start_minute, id",
            APPOINTMENT_COLUMNS, where_clause
        );

        let mut query = sqlx::query(&sql);
        if let Some(member_id) = &filter.member_id {
            query = query.bind(member_id.0.clone());
        }
        if let Some(trainer_id) = filter.trainer_id {
            query = query.bind(trainer_id.0);
        }
        if let Some(date) = filter.date {
            query = query.bind(date_to_text(date));
        }
        if let Some(status) = filter.status {
            query = query.bind(status.code());
        }

        let rows = query.fetch_all(self.db_client.pool()).await?;
        rows.iter().map(appointment_from_row).collect()
    }

    async fn save_service(&self, service: &Service) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO services (id, name, duration_minutes, price, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                duration_minutes = excluded.duration_minutes,
                price = excluded.price,
                is_active = excluded.is_active
            "#,
        )
        .bind(service.id.0)
        .bind(service.name.clone())
        .bind(i64::from(service.duration_minutes))
        .bind(service.price)
        .bind(i64::from(service.is_active))
        .execute(self.db_client.pool())
        .await?;
        Ok(())
    }

    async fn save_window(&self, window: &TrainerAvailability) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO trainer_availability
                (trainer_id, day_of_week, start_minute, end_minute, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (trainer_id, day_of_week) DO UPDATE SET
                start_minute = excluded.start_minute,
                end_minute = excluded.end_minute,
                is_active = excluded.is_active
            "#,
        )
        .bind(window.trainer_id.0)
        .bind(weekday_to_number(window.day_of_week))
        .bind(time_to_minutes(window.start_time))
        .bind(time_to_minutes(window.end_time))
        .bind(i64::from(window.is_active))
        .execute(self.db_client.pool())
        .await?;
        Ok(())
    }
}

enum BusyKey {
    Trainer(TrainerId),
    Member(MemberId),
}

fn log_failure(operation: &str) -> impl FnOnce(DbError) -> StoreError + '_ {
    move |e| {
        error!("Failed to {}: {}", operation, e);
        StoreError::from(e)
    }
}

impl BookingStore for SqlBookingStore {
    fn service(&self, id: ServiceId) -> BoxFuture<'_, Option<Service>, StoreError> {
        Box::pin(async move {
            self.find_service(id)
                .await
                .map_err(log_failure("load service"))
        })
    }

    fn active_window(
        &self,
        trainer_id: TrainerId,
        day: Weekday,
    ) -> BoxFuture<'_, Option<TrainerAvailability>, StoreError> {
        Box::pin(async move {
            self.find_active_window(trainer_id, day)
                .await
                .map_err(log_failure("load availability window"))
        })
    }

    fn busy_intervals(
        &self,
        trainer_id: TrainerId,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<TimeRange>, StoreError> {
        Box::pin(async move {
            self.find_busy("trainer_id", BusyKey::Trainer(trainer_id), date)
                .await
                .map_err(log_failure("load trainer busy set"))
        })
    }

    fn member_busy_intervals(
        &self,
        member_id: &MemberId,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<TimeRange>, StoreError> {
        let member_id = member_id.clone();
        Box::pin(async move {
            self.find_busy("member_id", BusyKey::Member(member_id), date)
                .await
                .map_err(log_failure("load member busy set"))
        })
    }

    fn insert_appointment(
        &self,
        appointment: NewAppointment,
        guard: InsertGuard,
    ) -> BoxFuture<'_, Appointment, StoreError> {
        Box::pin(async move {
            match self.insert_guarded(&appointment, guard).await {
                Ok(Ok(created)) => Ok(created),
                Ok(Err(kind)) => Err(StoreError::Conflict(kind)),
                Err(e) => Err(log_failure("insert appointment")(e)),
            }
        })
    }

    fn appointment(&self, id: AppointmentId) -> BoxFuture<'_, Option<Appointment>, StoreError> {
        Box::pin(async move {
            self.find_appointment(id)
                .await
                .map_err(log_failure("load appointment"))
        })
    }

    fn update_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        next: AppointmentStatus,
        at: NaiveDateTime,
    ) -> BoxFuture<'_, Appointment, StoreError> {
        Box::pin(async move {
            let updated = self
                .compare_and_set_status(id, expected, next, at)
                .await
                .map_err(log_failure("update appointment status"))?;

            let current = self
                .find_appointment(id)
                .await
                .map_err(log_failure("reload appointment"))?
                .ok_or(StoreError::NotFound)?;

            if updated == 0 {
                return Err(StoreError::StatusChanged);
            }
            Ok(current)
        })
    }

    fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> BoxFuture<'_, Vec<Appointment>, StoreError> {
        Box::pin(async move {
            self.find_appointments(&filter)
                .await
                .map_err(log_failure("list appointments"))
        })
    }

    fn upsert_service(&self, service: Service) -> BoxFuture<'_, (), StoreError> {
        Box::pin(async move {
            self.save_service(&service)
                .await
                .map_err(log_failure("save service"))
        })
    }

    fn upsert_availability(&self, window: TrainerAvailability) -> BoxFuture<'_, (), StoreError> {
        Box::pin(async move {
            self.save_window(&window)
                .await
                .map_err(log_failure("save availability window"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::appointments_table_ddl;
    use crate::DbBackend;
    use gymbook_common::models::AppointmentStatus;

    #[test]
    fn appointment_key_ddl_follows_the_engine() {
        let sqlite = appointments_table_ddl(DbBackend::Sqlite);
        assert!(sqlite.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));

        let postgres = appointments_table_ddl(DbBackend::Postgres);
        assert!(postgres.contains("GENERATED BY DEFAULT AS IDENTITY"));
        assert!(!postgres.contains("AUTOINCREMENT"));
    }

    #[test]
    fn hardcoded_free_statuses_match_label_table() {
        // The SQL above spells out the non-live status codes.
        assert_eq!(AppointmentStatus::Cancelled.code(), "Cancelled");
        assert_eq!(AppointmentStatus::Rejected.code(), "Rejected");
        assert!(!AppointmentStatus::Cancelled.is_live());
        assert!(!AppointmentStatus::Rejected.is_live());
    }
}
