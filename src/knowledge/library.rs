use super::matching::{precompute, Metric, Similarities};
use super::neighbors::{metric_correlation, query, MetricCorrelation, NeighborRecord};
use super::store::EmbeddingStore;
use crate::dataset::{genre_labels, title_choices, Catalog, Choice, Item};
use crate::error::CoreError;
use crate::projection::builder::{build_projection, ProjectionPoint};
use crate::projection::figures::{focus_figure, make_all_figures, neighbor_figure, Figure};
use crate::projection::focus::{focus, FocusRule, GroupedProjection};
use crate::projection::reducer::Reducer;
use serde::Serialize;
use std::time::Instant;

#[derive(Copy, Clone, Debug)]
pub struct Settings {
    pub rank_metric: Metric,
    /// Seed of the title list shuffle, independent of the reducer.
    pub title_seed: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Neighborhood {
    pub movie_title: String,
    pub metric: Metric,
    pub neighbors: Vec<NeighborRecord>,
    pub metric_correlation: MetricCorrelation,
    pub neighbors_plot: Figure,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProjectionView<'a> {
    pub points: &'a [ProjectionPoint],
    pub figures: &'a [Figure],
}

#[derive(Clone, Debug, Serialize)]
pub struct GenreFocus {
    pub group: GroupedProjection,
    pub figure: Figure,
}

/// Everything derived from the dataset, built once at startup and read-only
/// afterwards. Handlers share it behind an `Arc`.
pub struct Library {
    catalog: Catalog,
    store: EmbeddingStore,
    similarities: Similarities,
    projection: Vec<ProjectionPoint>,
    figures: Vec<Figure>,
    titles: Vec<Choice>,
    genres: Vec<String>,
    settings: Settings,
}

impl Library {
    pub fn build(
        items: Vec<Item>,
        embeddings: Vec<(usize, Vec<f32>)>,
        reducer: &dyn Reducer,
        settings: Settings,
    ) -> Result<Self, CoreError> {
        let catalog = Catalog::new(items)?;
        let store = EmbeddingStore::new(embeddings)?;
        if catalog.len() != store.len() {
            return Err(CoreError::JoinMismatch(format!(
                "{} items but {} embeddings",
                catalog.len(),
                store.len()
            )));
        }
        if let Some(item) = catalog.items().iter().find(|i| store.row_of(i.id).is_none()) {
            return Err(CoreError::JoinMismatch(format!(
                "item {} ({}) has no embedding",
                item.id, item.title
            )));
        }
        info!(
            "library init: {} movies, embedding dim: {}",
            catalog.len(),
            store.dim()
        );

        let start = Instant::now();
        let similarities = precompute(store.vectors())?;
        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "precompute {}^2 pairs for {:?} spends {}s",
            similarities.len(),
            Metric::ALL,
            elapsed
        );

        let genres = genre_labels(catalog.items());
        let start = Instant::now();
        let projection = build_projection(&store, &catalog, &genres, reducer)?;
        let figures = make_all_figures(&projection);
        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "projection of {} points and {} figures spends {}s",
            projection.len(),
            figures.len(),
            elapsed
        );

        let titles = title_choices(catalog.items(), settings.title_seed);
        info!("genres: {:?}", genres);

        Ok(Library {
            catalog,
            store,
            similarities,
            projection,
            figures,
            titles,
            genres,
            settings,
        })
    }

    pub fn get_neighbors(
        &self,
        title: &str,
        metric: Option<Metric>,
    ) -> Result<Neighborhood, CoreError> {
        let metric = metric.unwrap_or(self.settings.rank_metric);
        let neighbors = query(
            title,
            &self.similarities,
            &self.store,
            &self.catalog,
            metric,
        )?;
        let metric_correlation = metric_correlation(&neighbors);
        let neighbors_plot = neighbor_figure(title, &neighbors);
        Ok(Neighborhood {
            movie_title: title.to_string(),
            metric,
            neighbors,
            metric_correlation,
            neighbors_plot,
        })
    }

    pub fn get_projection(&self) -> ProjectionView<'_> {
        ProjectionView {
            points: &self.projection,
            figures: &self.figures,
        }
    }

    pub fn get_genre_focus(&self, genre: &str, rule: FocusRule) -> Result<GenreFocus, CoreError> {
        let group = focus(&self.projection, genre, rule)?;
        let figure = focus_figure(&group);
        Ok(GenreFocus { group, figure })
    }

    pub fn titles(&self) -> &[Choice] {
        &self.titles
    }

    pub fn genres(&self) -> Vec<Choice> {
        self.genres.iter().map(|g| Choice::from(g.as_str())).collect()
    }
}

#[cfg(test)]
pub(crate) fn toy_library() -> Library {
    use crate::dataset::item;
    use crate::projection::reducer::GaussianProjection;

    let items = vec![
        item(0, "A", "Drama,Romance"),
        item(1, "B", "Drama"),
        item(2, "C", "Comedy"),
        item(3, "D", "Horror,Comedy"),
    ];
    let embeddings = vec![
        (3, vec![-1.0, 0.0]),
        (1, vec![1.0, 0.0]),
        (0, vec![1.0, 0.0]),
        (2, vec![0.0, 1.0]),
    ];
    Library::build(
        items,
        embeddings,
        &GaussianProjection::new(42),
        Settings {
            rank_metric: Metric::Distance,
            title_seed: 42,
        },
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::item;
    use crate::projection::reducer::GaussianProjection;

    fn settings() -> Settings {
        Settings {
            rank_metric: Metric::Cosine,
            title_seed: 1,
        }
    }

    #[test]
    fn neighbors_use_default_or_requested_metric() {
        let library = toy_library();
        let by_distance = library.get_neighbors("A", None).unwrap();
        assert_eq!(by_distance.metric, Metric::Distance);
        assert_eq!(by_distance.neighbors.len(), 3);
        assert_eq!(by_distance.neighbors[0].title, "B");
        assert_eq!(by_distance.neighbors[2].title, "D");

        let by_cosine = library.get_neighbors("A", Some(Metric::Cosine)).unwrap();
        let titles = by_cosine
            .neighbors
            .iter()
            .map(|r| r.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["B", "C", "D"]);
    }

    #[test]
    fn unknown_title_returns_no_data() {
        assert!(matches!(
            toy_library().get_neighbors("Nonexistent Movie", None),
            Err(CoreError::ItemNotFound { .. })
        ));
    }

    #[test]
    fn projection_and_lists() {
        let library = toy_library();
        let view = library.get_projection();
        assert_eq!(view.points.len(), 4);
        assert_eq!(view.figures.len(), 4);
        // A and B share an embedding, so they share a coordinate
        assert_eq!((view.points[0].x, view.points[0].y), (view.points[1].x, view.points[1].y));
        assert_eq!(library.titles().len(), 4);
        let genres = library.genres().into_iter().map(|c| c.text).collect::<Vec<_>>();
        assert_eq!(genres, vec!["Comedy", "Drama", "Horror", "Romance"]);
    }

    #[test]
    fn title_order_ignores_reducer_seed() {
        let build = |reducer_seed| {
            Library::build(
                (0..12)
                    .map(|i| item(i, &format!("Movie {}", i), "Drama"))
                    .collect(),
                (0..12).map(|i| (i, vec![i as f32, 1.0, -1.0])).collect(),
                &GaussianProjection::new(reducer_seed),
                settings(),
            )
            .unwrap()
        };
        let a = build(1);
        let b = build(2);
        assert_eq!(a.titles(), b.titles());
        assert_ne!(a.get_projection().points, b.get_projection().points);
    }

    #[test]
    fn genre_focus() {
        let library = toy_library();
        let focus = library.get_genre_focus("Comedy", FocusRule::FirstById).unwrap();
        assert_eq!(focus.group.focus.title, "C");
        assert_eq!(focus.group.matches.len(), 2);
        assert_eq!(focus.group.others.len(), 2);
        assert_eq!(
            library
                .get_genre_focus("Nonexistent Genre", FocusRule::FirstById)
                .unwrap_err(),
            CoreError::GenreNotFound("Nonexistent Genre".into())
        );
    }

    #[test]
    fn startup_rejects_misaligned_data() {
        let reducer = GaussianProjection::new(0);
        let items = vec![item(0, "A", ""), item(1, "B", "")];

        let missing = Library::build(items.clone(), vec![(0, vec![1.0])], &reducer, settings());
        assert!(matches!(missing, Err(CoreError::JoinMismatch(_))));

        let orphan = Library::build(
            items.clone(),
            vec![(0, vec![1.0]), (7, vec![2.0])],
            &reducer,
            settings(),
        );
        assert!(matches!(orphan, Err(CoreError::JoinMismatch(_))));

        let ragged = Library::build(
            items.clone(),
            vec![(0, vec![1.0]), (1, vec![2.0, 3.0])],
            &reducer,
            settings(),
        );
        assert!(matches!(ragged, Err(CoreError::ShapeMismatch { .. })));

        let corrupt = Library::build(
            items.clone(),
            vec![(0, vec![1.0]), (1, vec![f32::NAN])],
            &reducer,
            settings(),
        );
        assert!(matches!(
            corrupt,
            Err(CoreError::NonFiniteEmbedding { index: 1, .. })
        ));

        let empty = Library::build(vec![], vec![], &reducer, settings());
        assert!(matches!(empty, Err(CoreError::EmptyInput)));

        let dup = Library::build(
            vec![item(0, "A", ""), item(1, "A", "")],
            vec![(0, vec![1.0]), (1, vec![2.0])],
            &reducer,
            settings(),
        );
        assert_eq!(dup.err(), Some(CoreError::DuplicateTitle("A".into())));
    }
}
