use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repo::{AgencyFields, TravelAgency};
use crate::{
    auth::AuthUser,
    error::ApiError,
    images::{delete_image, read_form, store_image, FormData},
    state::AppState,
};

const LOGO_FOLDER: &str = "images/travel-logos";

pub fn travel_routes() -> Router<AppState> {
    Router::new()
        .route("/travel", post(create_agency).get(list_agencies))
        .route(
            "/travel/:travel_user_id",
            get(list_user_agencies).put(update_agency),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

fn agency_fields(form: &FormData) -> AgencyFields {
    AgencyFields {
        name: form.text("name"),
        email: form.text("email"),
        contact_no: form.text("contactNo"),
        city: form.text("city"),
        state: form.text("state"),
        address: form.text("address"),
        country: form.text("country"),
        pincode: form.text("pincode"),
        logo: None,
    }
}

/// POST /travel (multipart: agency fields, optional `logo` file)
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn create_agency(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<TravelAgency>), ApiError> {
    let mut form = read_form(mp, "logo").await?;
    let name = form.require("name")?;
    let email = form.require("email")?;
    let owner = form.uuid("travelUserId")?.unwrap_or(session.user_id);
    if !state.user_exists(owner).await? {
        return Err(ApiError::BadRequest("User ID is invalid".into()));
    }

    let mut fields = agency_fields(&form);
    if let Some(logo) = form.file.take() {
        fields.logo = Some(store_image(state.storage.as_ref(), LOGO_FOLDER, logo).await?);
    }

    let agency = TravelAgency::create(&state.db, owner, &name, &email, &fields).await?;
    info!(agency_id = %agency.id, travel_user_id = %owner, "agency created");
    Ok((StatusCode::CREATED, Json(agency)))
}

#[instrument(skip_all)]
pub async fn list_agencies(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<TravelAgency>>, ApiError> {
    Ok(Json(TravelAgency::list_all(&state.db).await?))
}

#[instrument(skip(state, _auth))]
pub async fn list_user_agencies(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(travel_user_id): Path<Uuid>,
) -> Result<Json<Vec<TravelAgency>>, ApiError> {
    let agencies = TravelAgency::list_by_user(&state.db, travel_user_id).await?;
    if agencies.is_empty() {
        return Err(ApiError::NotFound(
            "No travel agencies found for this user".into(),
        ));
    }
    Ok(Json(agencies))
}

/// PUT /travel/:travel_user_id (multipart). Sent fields overwrite, a new
/// `logo` replaces the old object.
#[instrument(skip(state, _auth, mp))]
pub async fn update_agency(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(travel_user_id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<TravelAgency>, ApiError> {
    let Some(existing) = TravelAgency::first_by_user(&state.db, travel_user_id).await? else {
        return Err(ApiError::NotFound(
            "Travel agency not found for this user".into(),
        ));
    };

    let mut form = read_form(mp, "logo").await?;
    let mut fields = agency_fields(&form);
    if let Some(logo) = form.file.take() {
        if let Some(old) = &existing.logo {
            // a stale logo in the bucket must not block the update
            if let Err(e) = delete_image(state.storage.as_ref(), old).await {
                warn!(error = %format!("{:#}", e), agency_id = %existing.id, "old logo not deleted");
            }
        }
        fields.logo = Some(store_image(state.storage.as_ref(), LOGO_FOLDER, logo).await?);
    }

    let agency = TravelAgency::update(&state.db, existing.id, &fields).await?;
    info!(agency_id = %agency.id, "agency updated");
    Ok(Json(agency))
}
