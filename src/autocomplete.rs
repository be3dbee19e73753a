//! Autocomplete over the fixed list of Indian states.

/// Known state names, in display order. Only used for suggestions; the
/// provider is authoritative for resolution.
pub const INDIAN_STATES: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

/// Filter `candidates` to those containing `query` as a case-insensitive
/// substring, keeping the original order.
///
/// An empty query yields no suggestions rather than the whole list.
pub fn suggest<'a>(candidates: &[&'a str], query: &str) -> Vec<&'a str> {
    if query.is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    candidates
        .iter()
        .copied()
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .collect()
}

/// Suggestions from [`INDIAN_STATES`]
pub fn suggest_states(query: &str) -> Vec<&'static str> {
    suggest(INDIAN_STATES, query)
}
