//! PubMed eutils source.
//!
//! Two-phase API: `esearch` returns an ordered list of opaque article ids,
//! `efetch` returns unstructured abstract text for them. The detail text has
//! no guaranteed field structure, so per-id candidates are synthesized with
//! stable titles and links, sharing the length-capped abstract text.

use serde_json::Value;

use super::candidate_from_fields;
use crate::core::errors::ApiError;
use crate::corpus::{Candidate, Origin};

const PUBMED_SEARCH: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const PUBMED_FETCH: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

pub async fn fetch(
    client: &reqwest::Client,
    topic: &str,
    max_results: usize,
    detail_char_cap: usize,
) -> Result<Vec<Candidate>, ApiError> {
    let search_url = format!(
        "{}?db=pubmed&term={}&retmode=json&retmax={}",
        PUBMED_SEARCH,
        urlencoding::encode(topic),
        max_results
    );

    let response = client
        .get(&search_url)
        .send()
        .await
        .map_err(ApiError::source)?;
    if !response.status().is_success() {
        return Err(ApiError::SourceUnavailable(format!(
            "PubMed search failed: {}",
            response.status()
        )));
    }

    let payload: Value = response.json().await.map_err(ApiError::source)?;
    let ids = parse_id_list(&payload, max_results);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let fetch_url = format!(
        "{}?db=pubmed&id={}&retmode=text&rettype=abstract",
        PUBMED_FETCH,
        ids.join(",")
    );

    let response = client
        .get(&fetch_url)
        .send()
        .await
        .map_err(ApiError::source)?;
    if !response.status().is_success() {
        return Err(ApiError::SourceUnavailable(format!(
            "PubMed fetch failed: {}",
            response.status()
        )));
    }

    let abstracts = response.text().await.map_err(ApiError::source)?;
    Ok(candidates_from_abstracts(&ids, &abstracts, detail_char_cap))
}

/// Pull the ordered id list out of an esearch payload, defensively.
pub fn parse_id_list(payload: &Value, max_results: usize) -> Vec<String> {
    payload
        .get("esearchresult")
        .and_then(|v| v.get("idlist"))
        .and_then(|v| v.as_array())
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_str())
                .filter(|id| !id.trim().is_empty())
                .take(max_results)
                .map(|id| id.trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Synthesize one candidate per id from the shared abstract text.
pub fn candidates_from_abstracts(
    ids: &[String],
    abstracts: &str,
    detail_char_cap: usize,
) -> Vec<Candidate> {
    let capped: String = abstracts.chars().take(detail_char_cap).collect();

    ids.iter()
        .filter_map(|id| {
            let title = format!("PubMed Article {id}");
            let link = format!("https://pubmed.ncbi.nlm.nih.gov/{id}/");
            match candidate_from_fields(&title, &capped, &link, Origin::Pubmed) {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    tracing::debug!("Dropping PubMed entry {}: {}", id, err);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_id_list_in_rank_order() {
        let payload = json!({
            "esearchresult": {
                "count": "3",
                "idlist": ["39000001", "38999999", "38000000"]
            }
        });

        let ids = parse_id_list(&payload, 5);
        assert_eq!(ids, vec!["39000001", "38999999", "38000000"]);
    }

    #[test]
    fn id_list_respects_cap_and_skips_blanks() {
        let payload = json!({
            "esearchresult": { "idlist": ["1", "", "2", "3"] }
        });

        let ids = parse_id_list(&payload, 2);
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn missing_idlist_yields_empty() {
        assert!(parse_id_list(&json!({"esearchresult": {}}), 5).is_empty());
        assert!(parse_id_list(&json!({}), 5).is_empty());
    }

    #[test]
    fn synthesizes_titles_links_and_caps_detail_text() {
        let ids = vec!["12345".to_string(), "67890".to_string()];
        let text = "x".repeat(2000);

        let candidates = candidates_from_abstracts(&ids, &text, 1000);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "PubMed Article 12345");
        assert_eq!(
            candidates[0].source_url,
            "https://pubmed.ncbi.nlm.nih.gov/12345/"
        );
        assert_eq!(candidates[0].abstract_text.chars().count(), 1000);
        assert_eq!(candidates[0].origin, Origin::Pubmed);
    }

    #[test]
    fn detail_cap_respects_char_boundaries() {
        let ids = vec!["1".to_string()];
        let text = "αβγδε".repeat(400);

        let candidates = candidates_from_abstracts(&ids, &text, 1000);
        assert_eq!(candidates[0].abstract_text.chars().count(), 1000);
    }
}
