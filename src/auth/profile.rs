use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID, UserProfile,
    auth::AuthState,
    user::get_user_by_id,
};

/// A route handler that returns the profile of the logged in user.
pub async fn get_profile(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserProfile>, Error> {
    let connection = state.db_connection.lock()?;

    match get_user_by_id(user_id, &connection) {
        Ok(user) => Ok(Json(user.into())),
        // The middleware checked the user exists, so they were deleted since.
        Err(Error::NotFound) => Err(Error::InvalidToken),
        Err(error) => Err(error),
    }
}
