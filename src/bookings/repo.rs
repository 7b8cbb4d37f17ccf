use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateBookingRequest, DEFAULT_STATUS};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TravelBooking {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile_no: String,
    pub pickup_add: String,
    pub drop_add: String,
    pub car_type: String,
    pub trip_type: String,
    #[serde(rename = "from")]
    pub from_place: String,
    #[serde(rename = "to")]
    pub to_place: String,
    pub distance: Option<f64>,
    pub fare: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub date_of_booking: OffsetDateTime,
    pub booking_status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, email, mobile_no, pickup_add, drop_add, car_type, trip_type, \
                       from_place, to_place, distance, fare, date_of_booking, booking_status, \
                       created_at, updated_at";

impl TravelBooking {
    pub async fn create(db: &PgPool, req: &CreateBookingRequest) -> anyhow::Result<TravelBooking> {
        let status = req
            .booking_status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STATUS);
        let date = req.date_of_booking.unwrap_or_else(OffsetDateTime::now_utc);

        let row = sqlx::query_as::<_, TravelBooking>(&format!(
            r#"
            INSERT INTO travel_bookings
                (id, name, email, mobile_no, pickup_add, drop_add, car_type, trip_type,
                 from_place, to_place, distance, fare, date_of_booking, booking_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(req.email.trim())
        .bind(req.mobile_no.trim())
        .bind(req.pickup_add.trim())
        .bind(req.drop_add.trim())
        .bind(req.car_type.trim())
        .bind(req.trip_type.trim())
        .bind(req.from.trim())
        .bind(req.to.trim())
        .bind(req.distance)
        .bind(req.fare)
        .bind(date)
        .bind(status)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<TravelBooking>> {
        let rows = sqlx::query_as::<_, TravelBooking>(&format!(
            "SELECT {COLUMNS} FROM travel_bookings ORDER BY date_of_booking DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        status: &str,
    ) -> anyhow::Result<Option<TravelBooking>> {
        let row = sqlx::query_as::<_, TravelBooking>(&format!(
            r#"
            UPDATE travel_bookings
               SET booking_status = $2, updated_at = now()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
