use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub image: String,
    pub car_name: Option<String>,
    pub car_type: String,
    pub price: f64,
    pub price_per_km: Option<f64>,
    pub travel_user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCar {
    pub image: String,
    pub car_name: Option<String>,
    pub car_type: String,
    pub price: f64,
    pub price_per_km: Option<f64>,
    pub travel_user_id: Uuid,
}

const COLUMNS: &str =
    "id, image, car_name, car_type, price, price_per_km, travel_user_id, created_at, updated_at";

impl Car {
    pub async fn create(db: &PgPool, car: &NewCar) -> anyhow::Result<Car> {
        let row = sqlx::query_as::<_, Car>(&format!(
            r#"
            INSERT INTO cars (id, image, car_name, car_type, price, price_per_km, travel_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&car.image)
        .bind(&car.car_name)
        .bind(&car.car_type)
        .bind(car.price)
        .bind(car.price_per_km)
        .bind(car.travel_user_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Car>> {
        let row = sqlx::query_as::<_, Car>(&format!("SELECT {COLUMNS} FROM cars WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    pub async fn list_by_user(db: &PgPool, travel_user_id: Uuid) -> anyhow::Result<Vec<Car>> {
        let rows = sqlx::query_as::<_, Car>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM cars
            WHERE travel_user_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(travel_user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Writes every mutable column of `self` back.
    pub async fn save(&self, db: &PgPool) -> anyhow::Result<Car> {
        let row = sqlx::query_as::<_, Car>(&format!(
            r#"
            UPDATE cars
               SET image = $2, car_name = $3, car_type = $4, price = $5, price_per_km = $6,
                   updated_at = now()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.image)
        .bind(&self.car_name)
        .bind(&self.car_type)
        .bind(self.price)
        .bind(self.price_per_km)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
