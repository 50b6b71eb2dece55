//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};

use melodex_core::AlbumId;

use crate::db::catalog::CatalogRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::models::catalog::{Album, Artist, Genre};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Genre listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "store/genres.html")]
pub struct GenresTemplate {
    pub current_user: Option<CurrentUser>,
    pub genres: Vec<Genre>,
}

/// Genre detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "store/genre.html")]
pub struct GenreTemplate {
    pub current_user: Option<CurrentUser>,
    pub genre: Genre,
    pub albums: Vec<Album>,
}

/// Album detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "store/album.html")]
pub struct AlbumTemplate {
    pub current_user: Option<CurrentUser>,
    pub album: Album,
}

/// Artist listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "store/artists.html")]
pub struct ArtistsTemplate {
    pub current_user: Option<CurrentUser>,
    pub artists: Vec<Artist>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the genre listing.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<GenresTemplate> {
    let genres = CatalogRepository::new(state.pool()).genres().await?;

    Ok(GenresTemplate {
        current_user,
        genres,
    })
}

/// Display the albums in a genre.
pub async fn genre(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(name): Path<String>,
) -> Result<GenreTemplate> {
    let catalog = CatalogRepository::new(state.pool());

    let genre = catalog
        .genre_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("genre '{name}'")))?;

    let albums = catalog.albums_by_genre(genre.id).await?;

    Ok(GenreTemplate {
        current_user,
        genre,
        albums,
    })
}

/// Display a single album.
pub async fn album(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<AlbumTemplate> {
    let album = CatalogRepository::new(state.pool())
        .album(AlbumId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("album {id}")))?;

    Ok(AlbumTemplate {
        current_user,
        album,
    })
}

/// Display the artist listing.
pub async fn artists(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<ArtistsTemplate> {
    let artists = CatalogRepository::new(state.pool()).artists().await?;

    Ok(ArtistsTemplate {
        current_user,
        artists,
    })
}
