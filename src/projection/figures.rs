use super::builder::ProjectionPoint;
use super::focus::GroupedProjection;
use crate::knowledge::neighbors::NeighborRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// One scatter series, ready for the plotting frontend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
}

impl Trace {
    fn new<'a>(name: &str, points: impl IntoIterator<Item = &'a ProjectionPoint>) -> Self {
        let mut trace = Trace {
            name: name.to_string(),
            x: vec![],
            y: vec![],
            text: vec![],
            color: None,
            size: None,
        };
        for p in points {
            trace.x.push(p.x);
            trace.y.push(p.y);
            trace.text.push(p.title.clone());
        }
        trace
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    pub color_by: String,
    pub traces: Vec<Trace>,
}

pub fn make_all_figures(points: &[ProjectionPoint]) -> Vec<Figure> {
    vec![
        categorical("Scripts by primary genre", "primary_genre", points, |p| {
            p.primary_genre.clone()
        }),
        numeric("Scripts by release year", "year", points, |p| p.year as f64),
        numeric("Scripts by script length", "script_length", points, |p| {
            p.script_length as f64
        }),
        categorical("Scripts by number of genres", "genre_count", points, |p| {
            p.genre_count
        }),
    ]
}

/// Two traces, the genre's matches and everything else, plus the focus on its own.
pub fn focus_figure(group: &GroupedProjection) -> Figure {
    Figure {
        title: format!("{} scripts, focus on {}", group.genre, group.focus.title),
        color_by: "genre".to_string(),
        traces: vec![
            Trace::new("Other", &group.others),
            Trace::new(&group.genre, &group.matches),
            Trace::new(&group.focus.title, [&group.focus]),
        ],
    }
}

/// Neighbors of one movie: x = Distance, y = Dotproduct, coloured by Cosine
/// and sized by Dotproduct.
pub fn neighbor_figure(title: &str, records: &[NeighborRecord]) -> Figure {
    let trace = Trace {
        name: title.to_string(),
        x: records.iter().map(|r| r.distance).collect(),
        y: records.iter().map(|r| r.dotproduct).collect(),
        text: records.iter().map(|r| r.title.clone()).collect(),
        color: Some(records.iter().map(|r| r.cosine).collect()),
        size: Some(records.iter().map(|r| r.dotproduct).collect()),
    };
    Figure {
        title: format!("Nearest Neighbors to {}", title),
        color_by: "Cosine".to_string(),
        traces: vec![trace],
    }
}

fn categorical<K: Ord + Display>(
    title: &str,
    color_by: &str,
    points: &[ProjectionPoint],
    key: impl Fn(&ProjectionPoint) -> K,
) -> Figure {
    let mut groups: BTreeMap<K, Vec<&ProjectionPoint>> = BTreeMap::new();
    for p in points {
        groups.entry(key(p)).or_default().push(p);
    }
    Figure {
        title: title.to_string(),
        color_by: color_by.to_string(),
        traces: groups
            .into_iter()
            .map(|(name, members)| Trace::new(&name.to_string(), members))
            .collect(),
    }
}

fn numeric(
    title: &str,
    color_by: &str,
    points: &[ProjectionPoint],
    value: impl Fn(&ProjectionPoint) -> f64,
) -> Figure {
    let mut trace = Trace::new(color_by, points);
    trace.color = Some(points.iter().map(value).collect());
    Figure {
        title: title.to_string(),
        color_by: color_by.to_string(),
        traces: vec![trace],
    }
}
