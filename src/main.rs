mod dataset;
mod error;
mod knowledge;
mod projection;

use dataset::storage::Storage;
use dotenv::dotenv;
use env_logger::Builder;
use error::CoreError;
use knowledge::library::{Library, Settings};
use knowledge::matching::Metric;
use lazy_static::lazy_static;
use log::LevelFilter;
use projection::focus::FocusRule;
use projection::reducer::GaussianProjection;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

#[macro_use]
extern crate log;

lazy_static! {
    static ref DATA_DIR: String = env_or("DATA_DIR", "./data".to_string());
    static ref ITEMS_FILE: String = env_or("ITEMS_FILE", "movies.json".to_string());
    static ref EMBEDDINGS_FILE: String = env_or("EMBEDDINGS_FILE", "embeddings.bin".to_string());
    static ref PORT: u16 = env_or("PORT", 8080);
    static ref RANK_METRIC: Metric = env_or("RANK_METRIC", Metric::Distance);
    static ref PROJECTION_SEED: u64 = env_or("PROJECTION_SEED", 42);
    static ref TITLE_SEED: u64 = env_or("TITLE_SEED", 42);
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                warn!("invalid {}={}: {}, using default", key, raw, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct VisualizeRequest {
    movie_title: Option<String>,
    metric: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GenrePlotRequest {
    genre: Option<String>,
    seed: Option<u64>,
}

#[derive(Debug)]
enum ApiError {
    MissingField(&'static str),
    Core(CoreError),
}

impl warp::reject::Reject for ApiError {}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::Core(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // read .env
    dotenv().ok();

    // init logger
    let log_level = std::env::var("RUST_LOG").unwrap_or_default();

    if log_level == "debug" {
        Builder::new()
            .filter(None, LevelFilter::Off)
            .filter(Some("script_neighbors::knowledge"), LevelFilter::Debug)
            .filter(Some("script_neighbors::projection"), LevelFilter::Debug)
            .filter(Some("script_neighbors"), LevelFilter::Debug)
            .init();
    } else if log_level == "info" {
        Builder::new()
            .filter(None, LevelFilter::Off)
            .filter(Some("script_neighbors::knowledge"), LevelFilter::Info)
            .filter(Some("script_neighbors::projection"), LevelFilter::Info)
            .filter(Some("script_neighbors"), LevelFilter::Info)
            .init();
    } else {
        env_logger::init();
    }

    // load dataset, any structural problem aborts startup
    let start = Instant::now();
    let storage = Storage::new(&DATA_DIR)?;
    let items = storage.load_items(&ITEMS_FILE).await?;
    let embeddings = storage.load_embeddings(&EMBEDDINGS_FILE).await?;
    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "load {} items and {} embeddings from {} spends {}s",
        items.len(),
        embeddings.len(),
        *DATA_DIR,
        elapsed
    );

    let library = Library::build(
        items,
        embeddings,
        &GaussianProjection::new(*PROJECTION_SEED),
        Settings {
            rank_metric: *RANK_METRIC,
            title_seed: *TITLE_SEED,
        },
    )?;

    info!("server running at port: {}", *PORT);
    warp::serve(routes(Arc::new(library)))
        .run(([0, 0, 0, 0], *PORT))
        .await;

    Ok(())
}

fn routes(
    library: Arc<Library>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_library = warp::any().map(move || Arc::clone(&library));

    let titles_route = warp::path("titles")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_library.clone())
        .and_then(handle_titles);

    let genres_route = warp::path("genres")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_library.clone())
        .and_then(handle_genres);

    let visualize_route = warp::path("visualize")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_library.clone())
        .and_then(handle_visualize);

    let umap_route = warp::path("umap_plots")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_library.clone())
        .and_then(handle_umap_plots);

    let genre_plot_route = warp::path("update_genre_plot")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_library)
        .and_then(handle_genre_plot);

    titles_route
        .or(genres_route)
        .or(visualize_route)
        .or(umap_route)
        .or(genre_plot_route)
        .recover(handle_rejection)
}

async fn handle_titles(library: Arc<Library>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&library.titles()))
}

async fn handle_genres(library: Arc<Library>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&library.genres()))
}

async fn handle_visualize(
    request: VisualizeRequest,
    library: Arc<Library>,
) -> Result<impl Reply, Rejection> {
    info!("get visualize request: {:?}", request);

    let title = match request.movie_title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title,
        _ => return Err(warp::reject::custom(ApiError::MissingField("movie title"))),
    };
    let metric = request
        .metric
        .as_deref()
        .map(Metric::from_str)
        .transpose()
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;

    let neighborhood = library
        .get_neighbors(title, metric)
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;
    info!(
        "visualize {} by {}: {} neighbors",
        title,
        neighborhood.metric,
        neighborhood.neighbors.len()
    );
    Ok(warp::reply::json(&neighborhood))
}

async fn handle_umap_plots(library: Arc<Library>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&library.get_projection()))
}

async fn handle_genre_plot(
    request: GenrePlotRequest,
    library: Arc<Library>,
) -> Result<impl Reply, Rejection> {
    info!("get genre plot request: {:?}", request);

    let genre = match request.genre.as_deref().map(str::trim) {
        Some(genre) if !genre.is_empty() => genre,
        _ => return Err(warp::reject::custom(ApiError::MissingField("genre"))),
    };
    let rule = request.seed.map(FocusRule::Seeded).unwrap_or_default();

    let focus = library
        .get_genre_focus(genre, rule)
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;
    Ok(warp::reply::json(&focus))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(api_error) = err.find::<ApiError>() {
        match api_error {
            ApiError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: format!("No {} provided", field),
                    suggestion: None,
                },
            ),
            ApiError::Core(e) => {
                let status = match e {
                    CoreError::ItemNotFound { .. } | CoreError::UnknownMetric(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    CoreError::GenreNotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if e.is_per_query() {
                    warn!("handle request failed: {}", e);
                } else {
                    error!("handle request failed: {}", e);
                }
                let suggestion = match e {
                    CoreError::ItemNotFound { suggestion, .. } => suggestion.clone(),
                    _ => None,
                };
                (
                    status,
                    ErrorBody {
                        error: e.to_string(),
                        suggestion,
                    },
                )
            }
        }
    } else if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ErrorBody {
                error: "Not found".to_string(),
                suggestion: None,
            },
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorBody {
                error: e.to_string(),
                suggestion: None,
            },
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorBody {
                error: "Method not allowed".to_string(),
                suggestion: None,
            },
        )
    } else {
        error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                error: "Internal server error".to_string(),
                suggestion: None,
            },
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
