//! Catalog seeding command.
//!
//! Inserts a starter set of genres, artists, and albums. Re-running is safe;
//! every insert is `ON CONFLICT DO NOTHING` keyed on the natural name.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{CommandError, connect};

/// Default album price in cents.
const DEFAULT_PRICE_CENTS: i64 = 8_99;

const GENRES: &[(&str, &str)] = &[
    ("Rock", "Guitar-driven music from garage to stadium."),
    ("Jazz", "Improvisation, swing, and blue notes."),
    ("Classical", "Orchestral and chamber works."),
    ("Pop", "Catchy songs built for the charts."),
    ("Electronic", "Synthesizers, samplers, and drum machines."),
    ("Metal", "Heavy riffs and double kick drums."),
];

/// (album title, artist, genre) seed rows.
const ALBUMS: &[(&str, &str, &str)] = &[
    ("Led Zeppelin IV", "Led Zeppelin", "Rock"),
    ("The Dark Side of the Moon", "Pink Floyd", "Rock"),
    ("Abbey Road", "The Beatles", "Rock"),
    ("Kind of Blue", "Miles Davis", "Jazz"),
    ("A Love Supreme", "John Coltrane", "Jazz"),
    ("Time Out", "The Dave Brubeck Quartet", "Jazz"),
    ("The Four Seasons", "Antonio Vivaldi", "Classical"),
    ("Symphony No. 9", "Ludwig van Beethoven", "Classical"),
    ("Thriller", "Michael Jackson", "Pop"),
    ("1989", "Taylor Swift", "Pop"),
    ("Discovery", "Daft Punk", "Electronic"),
    ("Selected Ambient Works 85-92", "Aphex Twin", "Electronic"),
    ("Master of Puppets", "Metallica", "Metal"),
    ("Paranoid", "Black Sabbath", "Metal"),
];

/// Seed the catalog tables.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Seeding genres...");
    for (name, description) in GENRES {
        sqlx::query("INSERT INTO genres (name, description) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .bind(description)
            .execute(&pool)
            .await?;
    }

    tracing::info!("Seeding artists and albums...");
    let price = Decimal::new(DEFAULT_PRICE_CENTS, 2);
    for (title, artist, genre) in ALBUMS {
        seed_album(&pool, title, artist, genre, price).await?;
    }

    tracing::info!("Seed complete!");
    Ok(())
}

async fn seed_album(
    pool: &PgPool,
    title: &str,
    artist: &str,
    genre: &str,
    price: Decimal,
) -> Result<(), CommandError> {
    sqlx::query("INSERT INTO artists (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(artist)
        .execute(pool)
        .await?;

    sqlx::query(
        "INSERT INTO albums (genre_id, artist_id, title, price) \
         SELECT g.id, a.id, $1, $2 \
         FROM genres g, artists a \
         WHERE g.name = $3 AND a.name = $4 \
           AND NOT EXISTS (SELECT 1 FROM albums x WHERE x.title = $1 AND x.artist_id = a.id)",
    )
    .bind(title)
    .bind(price)
    .bind(genre)
    .bind(artist)
    .execute(pool)
    .await?;

    Ok(())
}
