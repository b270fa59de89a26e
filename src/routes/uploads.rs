use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
};
use axum_extra::extract::WithRejection;
use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{Error, Result},
    middleware::auth::Principal,
    models::user::{CandidateProfile, UserRole},
    services::upload_service::UploadKind,
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub profile: CandidateProfile,
}

struct UploadForm {
    kind: UploadKind,
    content_type: String,
    data: Bytes,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut kind = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "type" => kind = Some(field.text().await?.parse::<UploadKind>()?),
            "file" => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_default();
                let data = field.bytes().await?;
                file = Some((content_type, data));
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| Error::BadRequest("Upload type is required".into()))?;
    let (content_type, data) = file.ok_or_else(|| Error::BadRequest("No file uploaded".into()))?;
    Ok(UploadForm {
        kind,
        content_type,
        data,
    })
}

/// Multipart form with a `type` field (`photo` or `resume`) and a `file` field.
#[utoipa::path(
    post,
    path = "/api/uploads",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "`type` = photo | resume, `file` = the binary"),
    responses(
        (status = 200, description = "Stored and linked to the profile", body = UploadResponse),
        (status = 400, description = "Wrong type, too large, or content does not match"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a candidate"),
        (status = 500, description = "Storage failed; profile left unchanged")
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    principal: Principal,
    WithRejection(multipart, _): WithRejection<Multipart, Error>,
) -> Result<impl IntoResponse> {
    let candidate = principal.require_role(UserRole::Candidate)?;
    let form = read_form(multipart).await?;

    let asset = state
        .upload_service
        .store(candidate.id, form.kind, &form.content_type, form.data)
        .await?;
    let profile = state
        .user_service
        .set_candidate_asset(candidate.id, form.kind.asset(), &asset.url)
        .await?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".into(),
        url: asset.url,
        profile,
    }))
}
