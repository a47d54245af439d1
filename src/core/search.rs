use crate::core::ranking::{field_matches, RankingPolicy};
use crate::models::{Doctor, RankedDoctor, SearchQuery};

/// Result of a search
#[derive(Debug)]
pub struct SearchResult {
    pub results: Vec<RankedDoctor>,
    pub total_candidates: usize,
}

/// Filters and ranks doctor records for a query
///
/// # Pipeline Stages
/// 1. Free-text filter (every token must hit name, specialty or location)
/// 2. Specialty and availability filters
/// 3. Ranking
/// 4. Limit
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    policy: RankingPolicy,
}

impl SearchIndex {
    pub fn new(policy: RankingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Run a query against a list of doctors
    ///
    /// An empty (or whitespace-only) query keeps every doctor, so the result
    /// is the full list in ranked order.
    pub fn search(&self, doctors: Vec<Doctor>, query: &SearchQuery) -> SearchResult {
        let total_candidates = doctors.len();
        let tokens = query.tokens();

        let filtered: Vec<Doctor> = doctors
            .into_iter()
            // Stage 1: free-text
            .filter(|doctor| matches_text(doctor, &tokens))
            // Stage 2: structured filters
            .filter(|doctor| matches_specialty(doctor, query.specialty.as_deref()))
            .filter(|doctor| !query.available_only || doctor.available)
            .collect();

        // Stage 3
        let mut results = self.policy.rank(&tokens, filtered);

        // Stage 4
        results.truncate(query.limit);

        SearchResult {
            results,
            total_candidates,
        }
    }
}

/// Check that every token appears in at least one searchable field
#[inline]
pub fn matches_text(doctor: &Doctor, tokens: &[String]) -> bool {
    tokens.iter().all(|token| {
        let token = std::slice::from_ref(token);
        field_matches(&doctor.name, token)
            || field_matches(&doctor.specialty, token)
            || field_matches(&doctor.location, token)
    })
}

/// Case-insensitive specialty equality; `None` or blank matches everything
#[inline]
pub fn matches_specialty(doctor: &Doctor, specialty: Option<&str>) -> bool {
    match specialty.map(str::trim) {
        None | Some("") => true,
        Some(wanted) => doctor.specialty.eq_ignore_ascii_case(wanted),
    }
}
