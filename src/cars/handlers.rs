use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{Car, NewCar};
use crate::{
    auth::AuthUser,
    error::{ApiError, Message},
    images::{delete_image, read_form, store_image, FormData},
    state::AppState,
};

const IMAGE_FOLDER: &str = "images/cars";

pub fn car_routes() -> Router<AppState> {
    Router::new()
        .route("/cars/create", post(create_car))
        // one param name per segment: GET reads a user id, PUT/DELETE a car id
        .route(
            "/cars/:id",
            get(list_user_cars).put(update_car).delete(delete_car),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

/// Copies the fields present in `form` onto `car`; absent ones keep their value.
fn apply_update(car: &mut Car, form: &FormData) -> Result<(), ApiError> {
    if let Some(name) = form.text("carName") {
        car.car_name = Some(name);
    }
    if let Some(car_type) = form.text("carType") {
        car.car_type = car_type;
    }
    if let Some(price) = form.number("price")? {
        car.price = price;
    }
    if let Some(per_km) = form.number("pricePerKm")? {
        car.price_per_km = Some(per_km);
    }
    Ok(())
}

/// POST /cars/create (multipart: car fields + required `image` file)
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn create_car(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<Car>), ApiError> {
    let mut form = read_form(mp, "image").await?;
    let Some(image) = form.file.take() else {
        return Err(ApiError::BadRequest("Image file is required".into()));
    };
    let car_type = form.require("carType")?;
    let price = form
        .number("price")?
        .ok_or_else(|| ApiError::BadRequest("price is required".into()))?;
    let price_per_km = form.number("pricePerKm")?;

    let owner = form.uuid("travelUserId")?.unwrap_or(session.user_id);
    if !state.user_exists(owner).await? {
        return Err(ApiError::BadRequest("User ID is invalid".into()));
    }

    let image = store_image(state.storage.as_ref(), IMAGE_FOLDER, image).await?;
    let car = Car::create(
        &state.db,
        &NewCar {
            image,
            car_name: form.text("carName"),
            car_type,
            price,
            price_per_km,
            travel_user_id: owner,
        },
    )
    .await?;

    info!(car_id = %car.id, travel_user_id = %owner, "car created");
    Ok((StatusCode::CREATED, Json(car)))
}

#[instrument(skip(state, _auth))]
pub async fn list_user_cars(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(travel_user_id): Path<Uuid>,
) -> Result<Json<Vec<Car>>, ApiError> {
    if !state.user_exists(travel_user_id).await? {
        return Err(ApiError::NotFound("Invalid userId, user not found".into()));
    }
    let cars = Car::list_by_user(&state.db, travel_user_id).await?;
    if cars.is_empty() {
        return Err(ApiError::NotFound("No cars found for this userId".into()));
    }
    Ok(Json(cars))
}

/// PUT /cars/:id (multipart). A new `image` replaces the stored one; the
/// old object is deleted first.
#[instrument(skip(state, _auth, mp))]
pub async fn update_car(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(car_id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<Car>, ApiError> {
    let Some(mut car) = Car::find(&state.db, car_id).await? else {
        return Err(ApiError::NotFound("Car not found".into()));
    };

    let mut form = read_form(mp, "image").await?;
    apply_update(&mut car, &form)?;
    if let Some(image) = form.file.take() {
        delete_image(state.storage.as_ref(), &car.image).await?;
        car.image = store_image(state.storage.as_ref(), IMAGE_FOLDER, image).await?;
    }

    let car = car.save(&state.db).await?;
    info!(car_id = %car.id, "car updated");
    Ok(Json(car))
}

#[instrument(skip(state, _auth))]
pub async fn delete_car(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(car_id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let Some(car) = Car::find(&state.db, car_id).await? else {
        return Err(ApiError::NotFound("Car not found".into()));
    };

    delete_image(state.storage.as_ref(), &car.image).await?;
    Car::delete(&state.db, car.id).await?;
    info!(car_id = %car.id, "car deleted");
    Ok(Json(Message::new("Car deleted successfully")))
}
