//! Gallery album and image queries.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Gallery album record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GalleryAlbum {
    pub id: String,
    pub category: String,
    pub album_name: String,
    pub album_description: Option<String>,
    pub is_featured_news: bool,
    pub created_at: String,
}

/// Gallery image record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub album_id: String,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: String,
}

/// Input for creating or updating an album.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveGalleryAlbum {
    pub category: String,
    pub album_name: String,
    pub album_description: Option<String>,
    #[serde(default)]
    pub is_featured_news: bool,
}

/// Input for adding an image to an album.
#[derive(Debug, Clone, Deserialize)]
pub struct AddGalleryImage {
    pub image_url: String,
    pub caption: Option<String>,
}

impl SaveGalleryAlbum {
    fn validate(&self) -> Result<()> {
        if self.album_name.trim().is_empty() {
            return Err(Error::Validation("album_name is required".into()));
        }
        if self.category.trim().is_empty() {
            return Err(Error::Validation("category is required".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Album Queries
// ============================================================================

/// Create a new album.
pub async fn create_album(pool: &DbPool, input: SaveGalleryAlbum) -> Result<GalleryAlbum> {
    input.validate()?;

    sqlx::query_as::<_, GalleryAlbum>(
        r#"
        INSERT INTO gallery_albums (id, category, album_name, album_description, is_featured_news)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(input.category.trim())
    .bind(input.album_name.trim())
    .bind(&input.album_description)
    .bind(input.is_featured_news)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get an album by ID.
pub async fn get_album(pool: &DbPool, id: &str) -> Result<GalleryAlbum> {
    sqlx::query_as::<_, GalleryAlbum>("SELECT * FROM gallery_albums WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Album not found: {}", id)))
}

/// List albums, newest first, optionally by category.
pub async fn list_albums(pool: &DbPool, category: Option<&str>) -> Result<Vec<GalleryAlbum>> {
    let albums = match category {
        Some(category) => {
            sqlx::query_as::<_, GalleryAlbum>(
                "SELECT * FROM gallery_albums WHERE category = ? ORDER BY created_at DESC",
            )
            .bind(category)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, GalleryAlbum>(
                "SELECT * FROM gallery_albums ORDER BY created_at DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(albums)
}

/// Update album details.
pub async fn update_album(
    pool: &DbPool,
    id: &str,
    input: SaveGalleryAlbum,
) -> Result<GalleryAlbum> {
    input.validate()?;

    sqlx::query_as::<_, GalleryAlbum>(
        r#"
        UPDATE gallery_albums
        SET category = ?, album_name = ?, album_description = ?, is_featured_news = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(input.category.trim())
    .bind(input.album_name.trim())
    .bind(&input.album_description)
    .bind(input.is_featured_news)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Album not found: {}", id)))
}

/// Delete an album. Its images go with it.
pub async fn delete_album(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM gallery_albums WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Album not found: {}", id)));
    }

    Ok(())
}

// ============================================================================
// Image Queries
// ============================================================================

/// Add an image to an album.
pub async fn add_image(
    pool: &DbPool,
    album_id: &str,
    input: AddGalleryImage,
) -> Result<GalleryImage> {
    if input.image_url.trim().is_empty() {
        return Err(Error::Validation("image_url is required".into()));
    }
    get_album(pool, album_id).await?;

    sqlx::query_as::<_, GalleryImage>(
        r#"
        INSERT INTO gallery_images (id, album_id, image_url, caption)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(album_id)
    .bind(input.image_url.trim())
    .bind(&input.caption)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List the images of an album in upload order.
pub async fn list_images(pool: &DbPool, album_id: &str) -> Result<Vec<GalleryImage>> {
    sqlx::query_as::<_, GalleryImage>(
        "SELECT * FROM gallery_images WHERE album_id = ? ORDER BY created_at, rowid",
    )
    .bind(album_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Delete one image.
pub async fn delete_image(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM gallery_images WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Image not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};

    #[tokio::test]
    async fn test_album_delete_cascades_to_images() {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let album = create_album(
            &pool,
            SaveGalleryAlbum {
                category: "events".into(),
                album_name: "Safety week".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        add_image(
            &pool,
            &album.id,
            AddGalleryImage {
                image_url: "https://cdn.example.com/a.jpg".into(),
                caption: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(list_images(&pool, &album.id).await.unwrap().len(), 1);

        delete_album(&pool, &album.id).await.unwrap();
        assert!(list_images(&pool, &album.id).await.unwrap().is_empty());
    }
}
