mod form;
pub mod services;

pub use form::{read_form, FormData};
pub use services::{delete_image, store_image, UploadItem};
