use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TravelAgency {
    pub id: Uuid,
    pub logo: Option<String>, // public URL in object storage
    pub name: String,
    pub email: String,
    pub contact_no: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub travel_user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Descriptive columns of an agency. On update, `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AgencyFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_no: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub logo: Option<String>,
}

const COLUMNS: &str = "id, logo, name, email, contact_no, city, state, address, country, \
                       pincode, travel_user_id, created_at, updated_at";

impl TravelAgency {
    pub async fn create(
        db: &PgPool,
        travel_user_id: Uuid,
        name: &str,
        email: &str,
        f: &AgencyFields,
    ) -> anyhow::Result<TravelAgency> {
        let row = sqlx::query_as::<_, TravelAgency>(&format!(
            r#"
            INSERT INTO travel_agencies
                (id, logo, name, email, contact_no, city, state, address, country, pincode,
                 travel_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&f.logo)
        .bind(name)
        .bind(email)
        .bind(&f.contact_no)
        .bind(&f.city)
        .bind(&f.state)
        .bind(&f.address)
        .bind(&f.country)
        .bind(&f.pincode)
        .bind(travel_user_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<TravelAgency>> {
        let rows = sqlx::query_as::<_, TravelAgency>(&format!(
            "SELECT {COLUMNS} FROM travel_agencies ORDER BY created_at ASC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_user(db: &PgPool, travel_user_id: Uuid) -> anyhow::Result<Vec<TravelAgency>> {
        let rows = sqlx::query_as::<_, TravelAgency>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM travel_agencies
            WHERE travel_user_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(travel_user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// The agency an update addressed by user id applies to: the oldest one.
    pub async fn first_by_user(
        db: &PgPool,
        travel_user_id: Uuid,
    ) -> anyhow::Result<Option<TravelAgency>> {
        let row = sqlx::query_as::<_, TravelAgency>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM travel_agencies
            WHERE travel_user_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#
        ))
        .bind(travel_user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn update(db: &PgPool, id: Uuid, f: &AgencyFields) -> anyhow::Result<TravelAgency> {
        let row = sqlx::query_as::<_, TravelAgency>(&format!(
            r#"
            UPDATE travel_agencies
               SET name       = COALESCE($2, name),
                   email      = COALESCE($3, email),
                   contact_no = COALESCE($4, contact_no),
                   city       = COALESCE($5, city),
                   state      = COALESCE($6, state),
                   address    = COALESCE($7, address),
                   country    = COALESCE($8, country),
                   pincode    = COALESCE($9, pincode),
                   logo       = COALESCE($10, logo),
                   updated_at = now()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&f.name)
        .bind(&f.email)
        .bind(&f.contact_no)
        .bind(&f.city)
        .bind(&f.state)
        .bind(&f.address)
        .bind(&f.country)
        .bind(&f.pincode)
        .bind(&f.logo)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
