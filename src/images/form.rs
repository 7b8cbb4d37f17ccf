use std::collections::HashMap;

use axum::extract::Multipart;
use uuid::Uuid;

use super::services::UploadItem;
use crate::error::ApiError;

/// Text fields and at most one file collected from a multipart body.
#[derive(Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadItem>,
}

impl FormData {
    /// Trimmed, non-empty value of a text field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn require(&self, name: &str) -> Result<String, ApiError> {
        self.text(name)
            .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))
    }

    pub fn number(&self, name: &str) -> Result<Option<f64>, ApiError> {
        self.text(name)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| ApiError::BadRequest(format!("{} must be a number", name)))
            })
            .transpose()
    }

    pub fn uuid(&self, name: &str) -> Result<Option<Uuid>, ApiError> {
        self.text(name)
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|_| ApiError::BadRequest(format!("{} is not a valid id", name)))
            })
            .transpose()
    }
}

/// Drains `mp`, keeping the part named `file_field` as the upload.
pub async fn read_form(mut mp: Multipart, file_field: &str) -> Result<FormData, ApiError> {
    let mut form = FormData::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == file_field {
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            if !body.is_empty() {
                form.file = Some(UploadItem { body, content_type });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    #[test]
    fn text_trims_and_drops_blank_values() {
        let f = form(&[("name", "  Safar Tours "), ("city", "   ")]);
        assert_eq!(f.text("name").as_deref(), Some("Safar Tours"));
        assert_eq!(f.text("city"), None);
        assert_eq!(f.text("missing"), None);
    }

    #[test]
    fn require_reports_field_name() {
        let f = form(&[]);
        match f.require("carType") {
            Err(ApiError::BadRequest(m)) => assert_eq!(m, "carType is required"),
            _ => panic!("expected bad request"),
        }
    }

    #[test]
    fn number_parses_or_rejects() {
        let f = form(&[("price", "1500.5"), ("pricePerKm", "abc")]);
        assert_eq!(f.number("price").unwrap(), Some(1500.5));
        assert_eq!(f.number("distance").unwrap(), None);
        assert!(matches!(f.number("pricePerKm"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn uuid_parses_or_rejects() {
        let id = Uuid::new_v4();
        let raw = id.to_string();
        let f = form(&[("travelUserId", raw.as_str()), ("bad", "42")]);
        assert_eq!(f.uuid("travelUserId").unwrap(), Some(id));
        assert_eq!(f.uuid("missing").unwrap(), None);
        assert!(f.uuid("bad").is_err());
    }
}
