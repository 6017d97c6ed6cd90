use super::matching::{Metric, Similarities};
use super::store::EmbeddingStore;
use crate::dataset::Catalog;
use crate::error::CoreError;
use serde::Serialize;
use strsim::jaro_winkler;

const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Column order of the correlation table.
pub const CORRELATION_AXES: [Metric; 3] = [Metric::Dotproduct, Metric::Cosine, Metric::Distance];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NeighborRecord {
    pub id: usize,
    #[serde(rename = "movie_title")]
    pub title: String,
    #[serde(rename = "Distance")]
    pub distance: f64,
    #[serde(rename = "Dotproduct")]
    pub dotproduct: f64,
    #[serde(rename = "Cosine")]
    pub cosine: f64,
}

impl NeighborRecord {
    pub fn score(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Distance => self.distance,
            Metric::Dotproduct => self.dotproduct,
            Metric::Cosine => self.cosine,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricCorrelation {
    pub axes: [Metric; 3],
    pub values: [[f64; 3]; 3],
}

/// Every item except `title` itself, scored by all three metrics and ordered
/// closest first by `rank`. Equal scores keep id order.
pub fn query(
    title: &str,
    similarities: &Similarities,
    store: &EmbeddingStore,
    catalog: &Catalog,
    rank: Metric,
) -> Result<Vec<NeighborRecord>, CoreError> {
    let item = catalog.find(title).ok_or_else(|| CoreError::ItemNotFound {
        title: title.to_string(),
        suggestion: closest_title(title, catalog),
    })?;
    let row = store.row_of(item.id).ok_or_else(|| {
        CoreError::JoinMismatch(format!("item {} has no embedding", item.id))
    })?;

    let mut records = Vec::with_capacity(catalog.len().saturating_sub(1));
    for candidate in catalog.items() {
        if candidate.id == item.id {
            continue;
        }
        let other = store.row_of(candidate.id).ok_or_else(|| {
            CoreError::JoinMismatch(format!("item {} has no embedding", candidate.id))
        })?;
        records.push(NeighborRecord {
            id: candidate.id,
            title: candidate.title.clone(),
            distance: similarities.distance.get(row, other),
            dotproduct: similarities.dotproduct.get(row, other),
            cosine: similarities.cosine.get(row, other),
        });
    }
    records.sort_by(|a, b| {
        rank.rank(a.score(rank), b.score(rank))
            .then(a.id.cmp(&b.id))
    });
    debug!(
        "query: {} by {}, top: {:?}",
        title,
        rank,
        records.first().map(|r| r.title.as_str())
    );

    Ok(records)
}

/// Pearson correlation between the metric columns of one query's result set.
pub fn metric_correlation(records: &[NeighborRecord]) -> MetricCorrelation {
    let columns = CORRELATION_AXES.map(|metric| {
        records
            .iter()
            .map(|r| r.score(metric))
            .collect::<Vec<_>>()
    });

    let mut values = [[0.0; 3]; 3];
    for i in 0..3 {
        values[i][i] = 1.0;
        for j in (i + 1)..3 {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    MetricCorrelation {
        axes: CORRELATION_AXES,
        values,
    }
}

// a constant column has no defined correlation; report 0
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

fn closest_title(title: &str, catalog: &Catalog) -> Option<String> {
    catalog
        .items()
        .iter()
        .map(|i| (jaro_winkler(title, &i.title), &i.title))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, t)| t.clone())
}
