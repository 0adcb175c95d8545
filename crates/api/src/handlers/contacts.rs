//! Dataset contact handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use vocatlas_common::{db::models::Contact, errors::Result, metrics};

/// Request to create a new contact
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 3, max = 64))]
    pub phone: Option<String>,
}

/// Create a new contact
pub async fn create_contact(
    State(state): State<AppState>,
    Json(request): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<Contact>)> {
    request.validate()?;

    let uow = state.db.unit_of_work().await?;
    let contact = uow
        .repository()
        .create_contact(request.name, request.email, request.phone)
        .await?;
    uow.commit().await?;

    metrics::record_created("contact");
    tracing::info!(contact_id = contact.id, "Contact created");

    Ok((StatusCode::CREATED, Json(contact)))
}

/// List all contacts
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>> {
    let uow = state.db.read_unit_of_work().await?;
    let contacts = uow.repository().list_contacts().await?;
    uow.commit().await?;

    Ok(Json(contacts))
}

/// Contacts of a dataset
pub async fn contacts_by_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<i32>,
) -> Result<Json<Vec<Contact>>> {
    let uow = state.db.read_unit_of_work().await?;
    let contacts = uow.repository().contacts_for_dataset(dataset_id).await?;
    uow.commit().await?;

    Ok(Json(contacts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocatlas_common::errors::AppError;

    #[test]
    fn test_email_format() {
        let req: CreateContactRequest =
            serde_json::from_str(r#"{"name": "A. Researcher", "email": "nope"}"#).unwrap();
        let err = AppError::from(req.validate().unwrap_err());
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "email"));

        let req: CreateContactRequest = serde_json::from_str(
            r#"{"name": "A. Researcher", "email": "a.researcher@example.org", "phone": "+49 30 1234"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
