use serde::Serialize;

/// Best destination for one origin URL.
///
/// `similarity_score` lies in `[0, 1]` and is relative to the run that
/// produced it: it is the nearest-neighbour distance divided by the largest
/// such distance in the same run, subtracted from one. Scores from two runs
/// over different datasets are not comparable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RedirectMatch {
    pub origin_url: String,
    pub matched_url: String,
    pub similarity_score: f32,
}
