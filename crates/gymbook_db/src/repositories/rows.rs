//! Conversions between domain values and their column representations.
//!
//! `sqlx::Any` cannot decode chrono types, so dates are stored as
//! `YYYY-MM-DD` text, timestamps as ISO-8601 text and times of day as minutes
//! since midnight. Weekdays use 0 = Sunday .. 6 = Saturday.

use crate::error::DbError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use gymbook_common::models::{
    Appointment, AppointmentId, AppointmentStatus, MemberId, Service, ServiceId, TimeRange,
    TrainerAvailability, TrainerId,
};
use sqlx::any::AnyRow;
use sqlx::{Row, ValueRef};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub(crate) const APPOINTMENT_COLUMNS: &str = "id, member_id, trainer_id, service_id, \
     appointment_date, start_minute, end_minute, status, price, notes, created_at, updated_at";

pub(crate) fn date_to_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn timestamp_to_text(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn time_to_minutes(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}

pub(crate) fn minutes_to_time(minutes: i64) -> Result<NaiveTime, DbError> {
    u32::try_from(minutes)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0))
        .ok_or_else(|| DbError::DecodeError(format!("invalid minute of day: {}", minutes)))
}

pub(crate) fn weekday_to_number(day: Weekday) -> i64 {
    i64::from(day.num_days_from_sunday())
}

pub(crate) fn number_to_weekday(number: i64) -> Result<Weekday, DbError> {
    match number {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        other => Err(DbError::DecodeError(format!("invalid day of week: {}", other))),
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| DbError::DecodeError(format!("invalid date {:?}: {}", text, e)))
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|e| DbError::DecodeError(format!("invalid timestamp {:?}: {}", text, e)))
}

/// Reads a nullable text column.
///
/// `Any` rows report a NULL cell with the `NULL` type, which `Option<String>`
/// does not accept, so the null check has to come first.
fn optional_text(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    Ok(Some(row.try_get(column)?))
}

pub(crate) fn appointment_from_row(row: &AnyRow) -> Result<Appointment, DbError> {
    let status: String = row.try_get("status")?;
    let updated_at = optional_text(row, "updated_at")?;
    let created_at: String = row.try_get("created_at")?;
    let date: String = row.try_get("appointment_date")?;

    Ok(Appointment {
        id: AppointmentId(row.try_get("id")?),
        member_id: MemberId(row.try_get("member_id")?),
        trainer_id: TrainerId(row.try_get("trainer_id")?),
        service_id: ServiceId(row.try_get("service_id")?),
        date: parse_date(&date)?,
        start_time: minutes_to_time(row.try_get("start_minute")?)?,
        end_time: minutes_to_time(row.try_get("end_minute")?)?,
        status: status
            .parse::<AppointmentStatus>()
            .map_err(|e| DbError::DecodeError(e.to_string()))?,
        price: row.try_get("price")?,
        notes: optional_text(row, "notes")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

pub(crate) fn service_from_row(row: &AnyRow) -> Result<Service, DbError> {
    let duration: i64 = row.try_get("duration_minutes")?;
    let is_active: i64 = row.try_get("is_active")?;
    Ok(Service {
        id: ServiceId(row.try_get("id")?),
        name: row.try_get("name")?,
        duration_minutes: u32::try_from(duration)
            .map_err(|_| DbError::DecodeError(format!("invalid duration: {}", duration)))?,
        price: row.try_get("price")?,
        is_active: is_active != 0,
    })
}

pub(crate) fn window_from_row(row: &AnyRow) -> Result<TrainerAvailability, DbError> {
    let is_active: i64 = row.try_get("is_active")?;
    Ok(TrainerAvailability {
        trainer_id: TrainerId(row.try_get("trainer_id")?),
        day_of_week: number_to_weekday(row.try_get("day_of_week")?)?,
        start_time: minutes_to_time(row.try_get("start_minute")?)?,
        end_time: minutes_to_time(row.try_get("end_minute")?)?,
        is_active: is_active != 0,
    })
}

pub(crate) fn range_from_row(row: &AnyRow) -> Result<TimeRange, DbError> {
    Ok(TimeRange::new(
        minutes_to_time(row.try_get("start_minute")?)?,
        minutes_to_time(row.try_get("end_minute")?)?,
    ))
}
