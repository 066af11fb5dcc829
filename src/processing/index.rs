use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::errors::IndexError;

/// Candidates fetched per query before tie resolution widens the window.
const SEARCH_WINDOW: usize = 8;

/// A reference vector close to a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in the slice the index was built from.
    pub position: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// Exact nearest-neighbour index over a fixed set of vectors.
pub struct VectorIndex {
    index: Index,
    dimensions: usize,
    len: usize,
}

impl VectorIndex {
    /// Index `vectors`, keyed by their position.
    pub fn build<T>(vectors: &[T]) -> Result<Self, IndexError>
    where
        T: AsRef<[f32]>,
    {
        let Some(first) = vectors.first() else {
            return Err(IndexError::Empty);
        };
        let dimensions = first.as_ref().len();

        let index = Index::new(&IndexOptions {
            dimensions,
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            ..Default::default()
        })
        .map_err(|error| IndexError::Backend(error.to_string()))?;

        index
            .reserve(vectors.len())
            .map_err(|error| IndexError::Backend(error.to_string()))?;

        for (position, vector) in vectors.iter().enumerate() {
            let vector = vector.as_ref();
            if vector.len() != dimensions {
                return Err(IndexError::Dimension {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            index
                .add(position as u64, vector)
                .map_err(|error| IndexError::Backend(error.to_string()))?;
        }

        Ok(Self {
            index,
            dimensions,
            len: vectors.len(),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `k` nearest vectors for every query, closest first.
    ///
    /// Equal distances are ordered by position, so the lowest position wins
    /// a tie.
    pub fn search<T>(&self, queries: &[T], k: usize) -> Result<Vec<Vec<Neighbor>>, IndexError>
    where
        T: AsRef<[f32]>,
    {
        queries
            .iter()
            .map(|query| self.search_one(query.as_ref(), k))
            .collect()
    }

    fn search_one(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::Dimension {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        let k = k.min(self.len);
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut window = k.max(SEARCH_WINDOW).min(self.len);
        loop {
            let matches = self
                .index
                .exact_search(query, window)
                .map_err(|error| IndexError::Backend(error.to_string()))?;

            let mut neighbors: Vec<Neighbor> = matches
                .keys
                .iter()
                .zip(matches.distances.iter())
                .map(|(&key, &distance)| Neighbor {
                    position: key as usize,
                    distance,
                })
                .collect();
            neighbors.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.position.cmp(&b.position))
            });

            // Every vector tied with the k-th neighbour must be in the window,
            // otherwise a lower position could be hiding just outside it.
            let complete = window == self.len
                || neighbors.len() < window
                || neighbors[window - 1].distance > neighbors[k - 1].distance;
            if complete {
                neighbors.truncate(k);
                return Ok(neighbors);
            }

            window = (window * 2).min(self.len);
        }
    }
}
