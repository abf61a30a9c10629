use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::error;

use crate::{
    http_err::{ApiError, ApiResponse},
    ledger::{
        commands::{RecordEntryError, RenameParentError, TransferError},
        domain::entries::{AccountId, EntryId},
        services::{GeneralLedgerService, HistoryError, ViewError},
    },
    server::AppState,
};

use super::{reps, UserId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transfer-to-general-ledger",
            post(transfer_to_general_ledger),
        )
        .route("/transfer/validate", post(validate_transfer))
        .route("/transfer-history", get(get_transfer_history))
        .route("/general-ledger/view", get(get_general_ledger_view))
        .route("/gl/:parent_id/description", put(update_parent_description))
        .route(
            "/entries/:entry_id/record",
            post(record_entry).delete(unrecord_entry),
        )
}

async fn transfer_to_general_ledger(
    UserId(user_id): UserId,
    State(ledger_service): State<GeneralLedgerService>,
    Json(request): Json<reps::TransferRequest>,
) -> ApiResponse<(StatusCode, Json<reps::TransferSuccess>)> {
    match ledger_service
        .transfer(
            user_id,
            &request.transaction_ids,
            request.target_month,
            &request.gl_description,
        )
        .await
    {
        Ok(receipt) => Ok((StatusCode::CREATED, Json(receipt.into()))),
        Err(TransferError::InvalidDescription) => Err(ApiError::UnprocessableReason(
            "The general ledger description must be between 1 and 255 characters.".to_owned(),
        )),
        Err(TransferError::NoEligibleEntries) => Err(ApiError::BadRequestReason(
            "No entries were eligible for transfer.".to_owned(),
        )),
        Err(TransferError::MissingEntries(ids)) => Err(ApiError::BadRequestReason(format!(
            "No entries found with IDs {ids:?}."
        ))),
        Err(TransferError::ConcurrencyConflict) => Err(ApiError::ConflictReason(
            "One or more entries were transferred by another request. Re-validate and retry."
                .to_owned(),
        )),
        Err(error) => {
            error!(?error, "Failed to transfer entries to the general ledger.");

            Err(ApiError::InternalServerError)
        }
    }
}

async fn validate_transfer(
    UserId(user_id): UserId,
    State(ledger_service): State<GeneralLedgerService>,
    Json(request): Json<reps::ValidateTransferRequest>,
) -> ApiResponse<Json<reps::ValidationResult>> {
    match ledger_service
        .validate_transfer(user_id, &request.transaction_ids)
        .await
    {
        Ok(report) => Ok(Json(report.into())),
        Err(error) => {
            error!(?error, "Failed to validate entries for transfer.");

            Err(ApiError::InternalServerError)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferHistoryParams {
    transfer_group_id: Option<EntryId>,
}

async fn get_transfer_history(
    UserId(user_id): UserId,
    State(ledger_service): State<GeneralLedgerService>,
    Query(params): Query<TransferHistoryParams>,
) -> ApiResponse<Json<Vec<reps::TransferGroupRep>>> {
    match ledger_service
        .transfer_history(user_id, params.transfer_group_id)
        .await
    {
        Ok(groups) => Ok(Json(groups.iter().map(reps::TransferGroupRep::from).collect())),
        Err(HistoryError::GroupNotFound) => Err(ApiError::NotFoundReason(
            "No transfer group found with the provided ID.".to_owned(),
        )),
        Err(error) => {
            error!(?error, "Failed to query for transfer history.");

            Err(ApiError::InternalServerError)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneralLedgerViewParams {
    account_id: AccountId,
    date_from: NaiveDate,
    date_to: NaiveDate,
}

async fn get_general_ledger_view(
    UserId(user_id): UserId,
    State(ledger_service): State<GeneralLedgerService>,
    Query(params): Query<GeneralLedgerViewParams>,
) -> ApiResponse<Json<reps::GeneralLedgerView>> {
    match ledger_service
        .general_ledger_view(user_id, params.account_id, params.date_from, params.date_to)
        .await
    {
        Ok(statement) => Ok(Json((&statement).into())),
        Err(ViewError::AccountNotFound) => Err(ApiError::NotFoundReason(
            "No account found with the provided ID.".to_owned(),
        )),
        Err(error) => {
            error!(
                ?error,
                account_id = params.account_id,
                "Failed to build the general ledger view."
            );

            Err(ApiError::InternalServerError)
        }
    }
}

async fn update_parent_description(
    UserId(user_id): UserId,
    State(ledger_service): State<GeneralLedgerService>,
    Path(parent_id): Path<EntryId>,
    Json(request): Json<reps::UpdateDescriptionRequest>,
) -> ApiResponse<Json<reps::EntrySummary>> {
    match ledger_service
        .rename_parent(user_id, parent_id, &request.description)
        .await
    {
        Ok(parent) => Ok(Json((&parent).into())),
        Err(RenameParentError::InvalidDescription) => Err(ApiError::UnprocessableReason(
            "The general ledger description must be between 1 and 255 characters.".to_owned(),
        )),
        Err(RenameParentError::ParentNotFound) => Err(ApiError::NotFoundReason(
            "No parent general ledger entry found with the provided ID.".to_owned(),
        )),
        Err(error) => {
            error!(?error, %parent_id, "Failed to update parent posting description.");

            Err(ApiError::InternalServerError)
        }
    }
}

async fn record_entry(
    UserId(user_id): UserId,
    State(ledger_service): State<GeneralLedgerService>,
    Path(entry_id): Path<EntryId>,
) -> ApiResponse<Json<reps::EntrySummary>> {
    match ledger_service.record_entry(user_id, entry_id).await {
        Ok(entry) => Ok(Json((&entry).into())),
        Err(error) => Err(record_error_to_api(error, entry_id, "record")),
    }
}

async fn unrecord_entry(
    UserId(user_id): UserId,
    State(ledger_service): State<GeneralLedgerService>,
    Path(entry_id): Path<EntryId>,
) -> ApiResponse<Json<reps::EntrySummary>> {
    match ledger_service.unrecord_entry(user_id, entry_id).await {
        Ok(entry) => Ok(Json((&entry).into())),
        Err(error) => Err(record_error_to_api(error, entry_id, "undo record for")),
    }
}

fn record_error_to_api(error: RecordEntryError, entry_id: EntryId, action: &str) -> ApiError {
    match error {
        RecordEntryError::EntryNotFound => {
            ApiError::NotFoundReason("No entry found with the provided ID.".to_owned())
        }
        RecordEntryError::AlreadyTransferred => ApiError::ConflictReason(
            "The entry has already been transferred to the general ledger.".to_owned(),
        ),
        RecordEntryError::Unknown(error) => {
            error!(?error, %entry_id, "Failed to {} entry.", action);

            ApiError::InternalServerError
        }
    }
}
