use super::matching::check_finite;
use crate::error::CoreError;
use std::collections::HashMap;

/// The fixed embedding matrix, one row per item, with the id <-> row mapping.
#[derive(Clone, Debug)]
pub struct EmbeddingStore {
    dim: usize,
    rows: HashMap<usize, usize>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingStore {
    pub fn new(entries: Vec<(usize, Vec<f32>)>) -> Result<Self, CoreError> {
        let dim = match entries.first() {
            Some((_, vector)) => vector.len(),
            None => return Err(CoreError::EmptyInput),
        };

        let mut rows = HashMap::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        for (row, (id, vector)) in entries.into_iter().enumerate() {
            if vector.is_empty() || vector.len() != dim {
                return Err(CoreError::ShapeMismatch {
                    index: id,
                    expected: dim.max(1),
                    found: vector.len(),
                });
            }
            check_finite(id, &vector)?;
            if rows.insert(id, row).is_some() {
                return Err(CoreError::DuplicateId(id));
            }
            vectors.push(vector);
        }

        Ok(EmbeddingStore {
            dim,
            rows,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row_of(&self, id: usize) -> Option<usize> {
        self.rows.get(&id).copied()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}
