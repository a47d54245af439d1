use std::cmp::Ordering;

use crate::models::{Doctor, RankedDoctor, RankingExplanation, RankingWeights, TieBreak};

/// Default rating at or above which a doctor counts as highly rated
pub const DEFAULT_HIGHLY_RATED: f64 = 4.5;

/// Decides where a doctor lands for a query
///
/// # Ordering
/// 1. Sponsored (boosted) doctors before organic results
/// 2. Relevance score, descending
/// 3. Tie-break: rating descending, or input order
///
/// Sorting is stable, so anything still equal keeps its input position.
#[derive(Debug, Clone)]
pub struct RankingPolicy {
    weights: RankingWeights,
    tie_break: TieBreak,
    highly_rated_threshold: f64,
}

impl RankingPolicy {
    pub fn new(weights: RankingWeights, tie_break: TieBreak, highly_rated_threshold: f64) -> Self {
        Self {
            weights,
            tie_break,
            highly_rated_threshold,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RankingWeights::default(), TieBreak::default(), DEFAULT_HIGHLY_RATED)
    }

    /// Compute the feature explanation for one doctor against query tokens
    ///
    /// Tokens are expected lowercased. A field matches when any token is a
    /// substring of it, so an empty token list yields no match features.
    pub fn explain(&self, tokens: &[String], doctor: &Doctor) -> RankingExplanation {
        RankingExplanation {
            specialty_match: field_matches(&doctor.specialty, tokens),
            location_match: field_matches(&doctor.location, tokens),
            name_match: field_matches(&doctor.name, tokens),
            available: doctor.available,
            highly_rated: doctor.rating >= self.highly_rated_threshold,
            sponsored: doctor.boosted,
        }
    }

    /// Relevance (0-100) from an explanation
    ///
    /// score = (
    ///     specialty_match * 0.45 +
    ///     location_match  * 0.30 +
    ///     name_match      * 0.15 +
    ///     available       * 0.10
    /// ) * 100
    ///
    /// Sponsorship and rating are not part of the score; `compare` applies them.
    pub fn relevance(&self, explanation: &RankingExplanation) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        let total = (flag(explanation.specialty_match) * self.weights.specialty
            + flag(explanation.location_match) * self.weights.location
            + flag(explanation.name_match) * self.weights.name
            + flag(explanation.available) * self.weights.availability)
            * 100.0;

        total.clamp(0.0, 100.0)
    }

    /// Score a single doctor
    pub fn rank_one(&self, tokens: &[String], doctor: Doctor) -> RankedDoctor {
        let explanation = self.explain(tokens, &doctor);
        let relevance = self.relevance(&explanation);
        RankedDoctor {
            doctor,
            relevance,
            explanation,
        }
    }

    /// Total order used by `rank`
    pub fn compare(&self, a: &RankedDoctor, b: &RankedDoctor) -> Ordering {
        b.explanation
            .sponsored
            .cmp(&a.explanation.sponsored)
            .then_with(|| {
                b.relevance
                    .partial_cmp(&a.relevance)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| match self.tie_break {
                TieBreak::Rating => b
                    .doctor
                    .rating
                    .partial_cmp(&a.doctor.rating)
                    .unwrap_or(Ordering::Equal),
                TieBreak::Original => Ordering::Equal,
            })
    }

    /// Score and order a list of doctors
    pub fn rank(&self, tokens: &[String], doctors: Vec<Doctor>) -> Vec<RankedDoctor> {
        let mut ranked: Vec<RankedDoctor> = doctors
            .into_iter()
            .map(|doctor| self.rank_one(tokens, doctor))
            .collect();

        // slice::sort_by is stable
        ranked.sort_by(|a, b| self.compare(a, b));
        ranked
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[inline]
pub(crate) fn field_matches(field: &str, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return false;
    }
    let field = field.to_lowercase();
    tokens.iter().any(|token| field.contains(token.as_str()))
}
