use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::MediaField;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::multipart::ApiMultipart;
use crate::inbound::http::multipart::UploadForm;
use crate::inbound::http::router::AppState;

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiSuccess<UserData>, ApiError> {
    replace_media(state, authenticated_user, multipart, MediaField::Avatar).await
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiSuccess<UserData>, ApiError> {
    replace_media(state, authenticated_user, multipart, MediaField::CoverImage).await
}

async fn replace_media(
    state: AppState,
    authenticated_user: AuthenticatedUser,
    multipart: Multipart,
    field: MediaField,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let form = UploadForm::read(multipart, &state.upload_dir).await?;
    let field_name = field.to_string();

    let staged = form
        .file(&field_name)
        .ok_or_else(|| ApiError::BadRequest(format!("{} file is missing", field_name)))?;

    let user_id = &authenticated_user.user_id;
    let user = match field {
        MediaField::Avatar => {
            state
                .user_service
                .update_avatar(user_id, staged.media().clone())
                .await?
        }
        MediaField::CoverImage => {
            state
                .user_service
                .update_cover_image(user_id, staged.media().clone())
                .await?
        }
    };

    let message = match field {
        MediaField::Avatar => "Avatar updated successfully",
        MediaField::CoverImage => "Cover image updated successfully",
    };

    Ok(ApiSuccess::new(StatusCode::OK, (&user).into(), message))
}
