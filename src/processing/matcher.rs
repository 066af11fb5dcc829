use crate::domain::{Dataset, RedirectMatch};
use crate::errors::{DatasetSide, IndexError, InputError, MatcherResult};
use crate::processing::embedding::{Embedder, embed_texts};
use crate::processing::index::VectorIndex;
use crate::processing::normalizer::normalize_dataset;

/// Counters describing one matching run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchStats {
    pub origin_rows: usize,
    pub destination_rows: usize,
    pub dimensions: usize,
    pub max_distance: f32,
    pub exact_matches: usize,
    pub low_similarity: usize,
}

/// Output of [`Matcher::run`]: one match per origin row, in origin order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchReport {
    pub matches: Vec<RedirectMatch>,
    pub stats: MatchStats,
}

/// Maps every origin row to its semantically closest destination row.
pub struct Matcher<'a, E: ?Sized> {
    embedder: &'a mut E,
    low_similarity_threshold: f32,
}

impl<'a, E> Matcher<'a, E>
where
    E: Embedder + ?Sized,
{
    pub fn new(embedder: &'a mut E) -> Self {
        Self {
            embedder,
            low_similarity_threshold: crate::LOW_SIMILARITY_THRESHOLD,
        }
    }

    /// Score below which a match is counted as low similarity in the stats.
    pub fn with_low_similarity_threshold(mut self, threshold: f32) -> Self {
        self.low_similarity_threshold = threshold;
        self
    }

    /// Match `origin` against `destination` using the text of `columns`.
    ///
    /// Input problems are reported before the embedder is called. On any
    /// failure no matches are returned.
    pub fn run(
        &mut self,
        origin: &Dataset,
        destination: &Dataset,
        columns: &[String],
    ) -> MatcherResult<MatchReport> {
        validate_columns(origin, destination, columns)?;
        if destination.is_empty() {
            return Err(InputError::EmptyDestination.into());
        }

        log::info!(
            "Matching {} origin rows against {} destination rows on columns {columns:?}",
            origin.len(),
            destination.len()
        );

        let mut stats = MatchStats {
            origin_rows: origin.len(),
            destination_rows: destination.len(),
            ..Default::default()
        };

        let origin_texts = normalize_dataset(origin, columns);
        let destination_texts = normalize_dataset(destination, columns);

        let origin_vectors = embed_texts(&mut *self.embedder, &origin_texts)?;
        let destination_vectors = embed_texts(&mut *self.embedder, &destination_texts)?;

        let index = VectorIndex::build(&destination_vectors)?;
        stats.dimensions = index.dimensions();

        let nearest = index
            .search(&origin_vectors, 1)?
            .into_iter()
            .map(|neighbors| neighbors.into_iter().next().ok_or(IndexError::Empty))
            .collect::<Result<Vec<_>, _>>()?;

        let distances: Vec<f32> = nearest.iter().map(|neighbor| neighbor.distance).collect();
        // A lone candidate is trivially the best match for every origin row.
        let scores = if destination.len() == 1 {
            vec![1.0; distances.len()]
        } else {
            similarity_scores(&distances)
        };
        stats.max_distance = distances.iter().copied().fold(0.0, f32::max);

        let mut matches = Vec::with_capacity(origin.len());
        for ((row, neighbor), score) in origin.rows().iter().zip(&nearest).zip(scores) {
            if neighbor.distance == 0.0 {
                stats.exact_matches += 1;
            }
            if score < self.low_similarity_threshold {
                stats.low_similarity += 1;
            }
            matches.push(RedirectMatch {
                origin_url: row.url.clone(),
                matched_url: destination.rows()[neighbor.position].url.clone(),
                similarity_score: score,
            });
        }

        log::info!(
            "Finished matching: origin_rows={}, destination_rows={}, dimensions={}, max_distance={}, exact_matches={}, low_similarity={}",
            stats.origin_rows,
            stats.destination_rows,
            stats.dimensions,
            stats.max_distance,
            stats.exact_matches,
            stats.low_similarity
        );
        if stats.low_similarity > 0 {
            log::warn!(
                "{} matches scored below {}; review them before publishing redirects",
                stats.low_similarity,
                self.low_similarity_threshold
            );
        }

        Ok(MatchReport { matches, stats })
    }
}

fn validate_columns(
    origin: &Dataset,
    destination: &Dataset,
    columns: &[String],
) -> Result<(), InputError> {
    if columns.is_empty() {
        return Err(InputError::NoColumnsSelected);
    }
    for (dataset, side) in [
        (origin, DatasetSide::Origin),
        (destination, DatasetSide::Destination),
    ] {
        if let Some(column) = columns.iter().find(|column| !dataset.has_column(column)) {
            return Err(InputError::UnknownColumn {
                column: column.clone(),
                side,
            });
        }
    }
    Ok(())
}

/// Turn nearest-neighbour distances into scores in `[0, 1]`.
///
/// Each distance is divided by the largest distance of the run, so scores
/// are only comparable within one run. When every distance is zero all
/// scores are 1.
pub fn similarity_scores(distances: &[f32]) -> Vec<f32> {
    let max_distance = distances.iter().copied().fold(0.0_f32, f32::max);
    if max_distance <= 0.0 {
        return vec![1.0; distances.len()];
    }
    distances
        .iter()
        .map(|distance| (1.0 - distance / max_distance).clamp(0.0, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Matcher, similarity_scores};
    use crate::domain::{Dataset, Row};
    use crate::errors::{DatasetSide, InputError, MatcherError, ProviderError};
    use crate::processing::embedding::Embedder;

    /// Looks texts up in a fixed table and records how often it was called.
    #[derive(Default)]
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        calls: usize,
    }

    impl TableEmbedder {
        fn with(entries: &[(&str, [f32; 2])]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(text, vector)| (text.to_string(), vector.to_vec()))
                    .collect(),
                calls: 0,
            }
        }
    }

    impl Embedder for TableEmbedder {
        fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            self.calls += 1;
            texts
                .iter()
                .map(|text| {
                    self.table
                        .get(text)
                        .cloned()
                        .ok_or_else(|| ProviderError::Inference(format!("unknown text {text}")))
                })
                .collect()
        }
    }

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        Dataset::from_rows(
            rows.iter()
                .map(|(url, title)| {
                    Row::new(*url)
                        .with_field("Address", *url)
                        .with_field("Title", *title)
                })
                .collect(),
        )
    }

    fn title() -> Vec<String> {
        vec!["Title".to_string()]
    }

    #[test]
    fn scores_are_relative_to_the_largest_distance() {
        assert_eq!(similarity_scores(&[0.0, 0.5, 2.0]), vec![1.0, 0.75, 0.0]);
    }

    #[test]
    fn all_zero_distances_score_one() {
        assert_eq!(similarity_scores(&[0.0, 0.0]), vec![1.0, 1.0]);
        assert!(similarity_scores(&[]).is_empty());
    }

    #[test]
    fn matches_each_origin_row_to_its_nearest_destination() {
        let mut embedder = TableEmbedder::with(&[
            ("Blue Widgets", [1.0, 0.0]),
            ("Red Gadgets", [0.0, 1.0]),
            ("Blue Gadgets", [0.8, 0.6]),
        ]);
        let origin = dataset(&[("/a", "Blue Widgets"), ("/b", "Red Gadgets")]);
        let destination = dataset(&[("/new-b", "Red Gadgets"), ("/new-a", "Blue Gadgets")]);

        let report = Matcher::new(&mut embedder)
            .run(&origin, &destination, &title())
            .expect("match succeeds");

        let matched: Vec<(&str, &str)> = report
            .matches
            .iter()
            .map(|m| (m.origin_url.as_str(), m.matched_url.as_str()))
            .collect();
        assert_eq!(matched, vec![("/a", "/new-a"), ("/b", "/new-b")]);
        assert_eq!(report.matches[1].similarity_score, 1.0);
        assert_eq!(report.matches[0].similarity_score, 0.0);
        assert_eq!(report.stats.exact_matches, 1);
        assert_eq!(report.stats.low_similarity, 1);
        assert_eq!(report.stats.dimensions, 2);
    }

    #[test]
    fn single_destination_scores_every_match_one() {
        let mut embedder = TableEmbedder::with(&[
            ("Blue Widgets", [1.0, 0.0]),
            ("Red Gadgets", [0.0, 1.0]),
            ("Green Things", [0.6, 0.8]),
        ]);
        let origin = dataset(&[("/a", "Blue Widgets"), ("/b", "Red Gadgets")]);
        let destination = dataset(&[("/only", "Green Things")]);

        let report = Matcher::new(&mut embedder)
            .run(&origin, &destination, &title())
            .expect("match succeeds");

        assert_eq!(report.matches.len(), 2);
        for m in &report.matches {
            assert_eq!(m.matched_url, "/only");
            assert_eq!(m.similarity_score, 1.0);
        }
    }

    #[test]
    fn rejects_empty_column_selection_before_embedding() {
        let mut embedder = TableEmbedder::default();
        let origin = dataset(&[("/a", "Blue Widgets")]);

        let result = Matcher::new(&mut embedder).run(&origin, &origin, &[]);

        assert!(matches!(
            result,
            Err(MatcherError::Input(InputError::NoColumnsSelected))
        ));
        assert_eq!(embedder.calls, 0);
    }

    #[test]
    fn rejects_column_missing_from_destination() {
        let mut embedder = TableEmbedder::default();
        let origin = Dataset::from_rows(vec![
            Row::new("/a").with_field("Title", "A").with_field("H1-1", "A"),
        ]);
        let destination = dataset(&[("/new-a", "A")]);

        let result = Matcher::new(&mut embedder).run(
            &origin,
            &destination,
            &["Title".to_string(), "H1-1".to_string()],
        );

        assert!(matches!(
            result,
            Err(MatcherError::Input(InputError::UnknownColumn {
                ref column,
                side: DatasetSide::Destination,
            })) if column == "H1-1"
        ));
        assert_eq!(embedder.calls, 0);
    }

    #[test]
    fn rejects_empty_destination() {
        let mut embedder = TableEmbedder::default();
        let origin = dataset(&[("/a", "Blue Widgets")]);
        let destination = Dataset::new(vec!["Address".into(), "Title".into()], vec![]);

        let result = Matcher::new(&mut embedder).run(&origin, &destination, &title());

        assert!(matches!(
            result,
            Err(MatcherError::Input(InputError::EmptyDestination))
        ));
        assert_eq!(embedder.calls, 0);
    }

    #[test]
    fn empty_origin_yields_empty_report() {
        let mut embedder = TableEmbedder::with(&[("Blue Widgets", [1.0, 0.0])]);
        let origin = Dataset::new(vec!["Address".into(), "Title".into()], vec![]);
        let destination = dataset(&[("/new-a", "Blue Widgets")]);

        let report = Matcher::new(&mut embedder)
            .run(&origin, &destination, &title())
            .expect("match succeeds");

        assert!(report.matches.is_empty());
    }

    #[test]
    fn provider_failure_returns_no_partial_results() {
        let mut embedder = TableEmbedder::with(&[("Blue Widgets", [1.0, 0.0])]);
        let origin = dataset(&[("/a", "Blue Widgets")]);
        let destination = dataset(&[("/new-a", "Unknown")]);

        let result = Matcher::new(&mut embedder).run(&origin, &destination, &title());

        assert!(matches!(
            result,
            Err(MatcherError::Provider(ProviderError::Inference(_)))
        ));
    }
}
