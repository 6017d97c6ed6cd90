use super::builder::ProjectionPoint;
use crate::error::CoreError;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// How the emphasised point is picked among the genre's matches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FocusRule {
    #[default]
    FirstById,
    Seeded(u64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupedProjection {
    pub genre: String,
    pub focus: ProjectionPoint,
    pub matches: Vec<ProjectionPoint>,
    pub others: Vec<ProjectionPoint>,
}

pub fn focus(
    points: &[ProjectionPoint],
    genre: &str,
    rule: FocusRule,
) -> Result<GroupedProjection, CoreError> {
    let genre = genre.trim();
    let (mut matches, mut others): (Vec<_>, Vec<_>) =
        points.iter().cloned().partition(|p| p.has_genre(genre));
    matches.sort_by_key(|p| p.id);
    others.sort_by_key(|p| p.id);

    let focus = match rule {
        FocusRule::FirstById => matches.first(),
        FocusRule::Seeded(seed) => matches.choose(&mut ChaCha8Rng::seed_from_u64(seed)),
    }
    .cloned()
    .ok_or_else(|| CoreError::GenreNotFound(genre.to_string()))?;
    debug!(
        "focus genre: {}, matches: {}, focus: {}",
        genre,
        matches.len(),
        focus.title
    );

    Ok(GroupedProjection {
        genre: genre.to_string(),
        focus,
        matches,
        others,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: usize, genre: &str) -> ProjectionPoint {
        ProjectionPoint {
            id,
            title: format!("Movie {}", id),
            genre: genre.to_string(),
            x: id as f64,
            y: 0.0,
            primary_genre: genre.split(',').next().unwrap_or("").to_string(),
            genre_count: genre.split(',').count(),
            genre_code: 0,
            year: 2000,
            script_length: 100,
        }
    }

    fn points() -> Vec<ProjectionPoint> {
        vec![
            point(4, "Comedy,Romance"),
            point(1, "Drama"),
            point(3, "Romance"),
            point(2, "Drama, Romance"),
            point(5, "Romantic Comedy"),
        ]
    }

    #[test]
    fn partitions_on_any_label() {
        let group = focus(&points(), "Romance", FocusRule::FirstById).unwrap();
        assert_eq!(group.genre, "Romance");
        assert_eq!(
            group.matches.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert_eq!(
            group.others.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 5]
        );
        assert_eq!(group.focus.id, 2);
    }

    #[test]
    fn seeded_focus_is_reproducible_and_a_match() {
        for seed in 0..16 {
            let a = focus(&points(), "Romance", FocusRule::Seeded(seed)).unwrap();
            let b = focus(&points(), "Romance", FocusRule::Seeded(seed)).unwrap();
            assert_eq!(a.focus, b.focus);
            assert!(a.focus.has_genre("Romance"));
        }
    }

    #[test]
    fn unknown_genre_is_an_error() {
        assert_eq!(
            focus(&points(), "Nonexistent Genre", FocusRule::FirstById).unwrap_err(),
            CoreError::GenreNotFound("Nonexistent Genre".into())
        );
        assert!(matches!(
            focus(&[], "Drama", FocusRule::Seeded(1)),
            Err(CoreError::GenreNotFound(_))
        ));
    }
}
