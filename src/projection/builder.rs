use super::reducer::Reducer;
use crate::dataset::Catalog;
use crate::error::CoreError;
use crate::knowledge::store::EmbeddingStore;
use serde::Serialize;

pub const UNKNOWN_GENRE: &str = "Unknown";

/// One item placed on the 2D map, with the columns the plots colour by.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub id: usize,
    #[serde(rename = "movie_title")]
    pub title: String,
    pub genre: String,
    pub x: f64,
    pub y: f64,
    pub primary_genre: String,
    pub genre_count: usize,
    /// Position of `primary_genre` in the sorted genre list; items without a
    /// genre get `genres.len()`.
    pub genre_code: usize,
    pub year: i32,
    pub script_length: usize,
}

impl ProjectionPoint {
    pub fn has_genre(&self, label: &str) -> bool {
        let label = label.trim();
        crate::dataset::split_genres(&self.genre).any(|g| g == label)
    }
}

/// Runs the reducer once over every embedding and joins the coordinates back
/// to the items by id. Output is in id order.
pub fn build_projection(
    store: &EmbeddingStore,
    catalog: &Catalog,
    genres: &[String],
    reducer: &dyn Reducer,
) -> Result<Vec<ProjectionPoint>, CoreError> {
    if catalog.len() != store.len() {
        return Err(CoreError::JoinMismatch(format!(
            "{} items but {} embeddings",
            catalog.len(),
            store.len()
        )));
    }

    let coords = reducer.reduce(store.vectors());
    if coords.len() != store.len() {
        return Err(CoreError::JoinMismatch(format!(
            "reducer returned {} points for {} embeddings",
            coords.len(),
            store.len()
        )));
    }

    catalog
        .items()
        .iter()
        .map(|item| {
            let row = store.row_of(item.id).ok_or_else(|| {
                CoreError::JoinMismatch(format!("item {} has no embedding", item.id))
            })?;
            let [x, y] = coords[row];
            let primary_genre = item.genres().next().unwrap_or(UNKNOWN_GENRE).to_string();
            let genre_code = genres
                .iter()
                .position(|g| *g == primary_genre)
                .unwrap_or(genres.len());
            Ok(ProjectionPoint {
                id: item.id,
                title: item.title.clone(),
                genre: item.genre.clone(),
                x,
                y,
                genre_count: item.genres().count(),
                primary_genre,
                genre_code,
                year: item.year,
                script_length: item.script_length,
            })
        })
        .collect()
}
