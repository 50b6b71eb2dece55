//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::models::catalog::Album;
use crate::state::AppState;

/// How many of the newest albums the home page shows.
const FEATURED_ALBUM_COUNT: i64 = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub current_user: Option<CurrentUser>,
    pub albums: Vec<Album>,
}

/// Display the home page with the latest additions to the catalog.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<HomeTemplate> {
    let albums = crate::db::catalog::CatalogRepository::new(state.pool())
        .recent_albums(FEATURED_ALBUM_COUNT)
        .await?;

    Ok(HomeTemplate {
        current_user,
        albums,
    })
}
