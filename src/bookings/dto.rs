use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::TravelBooking;

pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub name: String,
    pub email: String,
    pub mobile_no: String,
    pub pickup_add: String,
    pub drop_add: String,
    pub car_type: String,
    pub trip_type: String,
    pub from: String,
    pub to: String,
    pub distance: Option<f64>,
    pub fare: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_of_booking: Option<OffsetDateTime>,
    pub booking_status: Option<String>,
}

impl CreateBookingRequest {
    /// Name of the first required field that is blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("mobileNo", &self.mobile_no),
            ("pickupAdd", &self.pickup_add),
            ("dropAdd", &self.drop_add),
            ("carType", &self.car_type),
            ("tripType", &self.trip_type),
            ("from", &self.from),
            ("to", &self.to),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub booking_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingUpdated {
    pub message: String,
    pub booking: TravelBooking,
}
