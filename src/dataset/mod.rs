pub mod storage;

use crate::error::CoreError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

/// One movie row of the item table, keyed by the dataset column names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "index")]
    pub id: usize,
    #[serde(rename = "movie_title")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genre: String,
    pub script_length: usize,
    pub year: i32,
}

impl Item {
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        split_genres(&self.genre)
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Item {{ id: {}, title: {}, genre: {}, year: {} }}",
            self.id, self.title, self.genre, self.year
        )
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn split_genres(genre: &str) -> impl Iterator<Item = &str> {
    genre.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Item metadata ordered by id and indexed by title.
#[derive(Clone, Debug)]
pub struct Catalog {
    items: Vec<Item>,
    by_title: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(mut items: Vec<Item>) -> Result<Self, CoreError> {
        if items.is_empty() {
            return Err(CoreError::EmptyInput);
        }
        items.sort_by_key(|i| i.id);

        let mut by_title = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            debug!("catalog {}", item);
            if pos > 0 && items[pos - 1].id == item.id {
                return Err(CoreError::DuplicateId(item.id));
            }
            if by_title.insert(item.title.clone(), pos).is_some() {
                return Err(CoreError::DuplicateTitle(item.title.clone()));
            }
        }

        Ok(Catalog {
            items,
            by_title,
        })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn find(&self, title: &str) -> Option<&Item> {
        self.by_title.get(title).map(|&pos| &self.items[pos])
    }
}

/// Entry of a select box: the frontend wants `{id, text}` pairs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

impl From<&str> for Choice {
    fn from(s: &str) -> Self {
        Choice {
            id: s.to_string(),
            text: s.to_string(),
        }
    }
}

/// Every title once, in an order shuffled by `seed`.
pub fn title_choices(items: &[Item], seed: u64) -> Vec<Choice> {
    let mut titles = items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    titles.shuffle(&mut rng);
    titles.into_iter().map(Choice::from).collect()
}

/// Unique genre labels, alphabetically ordered.
pub fn genre_labels(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .flat_map(|i| i.genres())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
pub(crate) fn item(id: usize, title: &str, genre: &str) -> Item {
    Item {
        id,
        title: title.to_string(),
        genre: genre.to_string(),
        script_length: 1000 * (id + 1),
        year: 1990 + id as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genres_are_trimmed_and_non_empty() {
        let it = item(0, "Alien", " Horror, Sci-Fi ,,");
        assert_eq!(it.genres().collect::<Vec<_>>(), vec!["Horror", "Sci-Fi"]);
        assert_eq!(item(1, "Blank", "").genres().count(), 0);
    }

    #[test]
    fn genre_labels_sorted_unique() {
        let items = vec![
            item(0, "A", "Drama,Crime"),
            item(1, "B", "Crime"),
            item(2, "C", "Action, Drama"),
        ];
        assert_eq!(genre_labels(&items), vec!["Action", "Crime", "Drama"]);
    }

    #[test]
    fn title_choices_are_a_seeded_permutation() {
        let items = (0..20)
            .map(|i| item(i, &format!("Movie {}", i), "Drama"))
            .collect::<Vec<_>>();
        let a = title_choices(&items, 7);
        let b = title_choices(&items, 7);
        assert_eq!(a, b);
        let mut texts = a.iter().map(|c| c.text.clone()).collect::<Vec<_>>();
        texts.sort();
        let mut expected = items.iter().map(|i| i.title.clone()).collect::<Vec<_>>();
        expected.sort();
        assert_eq!(texts, expected);
        assert!(a.iter().all(|c| c.id == c.text));
    }

    #[test]
    fn catalog_indexes_by_id_and_title() {
        let catalog = Catalog::new(vec![item(5, "Heat", "Crime"), item(1, "Up", "Animation")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.items()[0].id, 1);
        assert_eq!(catalog.items()[1].title, "Heat");
        assert_eq!(catalog.find("Up").map(|i| i.id), Some(1));
        assert!(catalog.find("up").is_none());
    }

    #[test]
    fn catalog_flags_collisions() {
        assert_eq!(
            Catalog::new(vec![item(0, "Heat", ""), item(1, "Heat", "")]).unwrap_err(),
            CoreError::DuplicateTitle("Heat".into())
        );
        assert_eq!(
            Catalog::new(vec![item(3, "A", ""), item(3, "B", "")]).unwrap_err(),
            CoreError::DuplicateId(3)
        );
        assert_eq!(Catalog::new(vec![]).unwrap_err(), CoreError::EmptyInput);
    }

    #[test]
    fn item_uses_dataset_column_names() {
        let json = r#"{"index": 3, "movie_title": "Heat", "genre": "Crime,Drama", "script_length": 120000, "year": 1995}"#;
        let it: Item = serde_json::from_str(json).unwrap();
        assert_eq!(it.id, 3);
        assert_eq!(it.title, "Heat");
        assert_eq!(it.genres().collect::<Vec<_>>(), vec!["Crime", "Drama"]);

        let json = r#"{"index": 4, "movie_title": "Tenet", "genre": null, "script_length": 1, "year": 2020}"#;
        let it: Item = serde_json::from_str(json).unwrap();
        assert_eq!(it.genre, "");
    }
}
