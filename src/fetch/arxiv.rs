//! arXiv Atom feed source.
//!
//! Single-request feed query: entries arrive with `title`, `summary` and one
//! or more `link` elements. The `rel="alternate"` link is the canonical
//! abstract page; the raw `<id>` is kept as a fallback when no such link is
//! present.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::candidate_from_fields;
use crate::core::errors::ApiError;
use crate::corpus::{Candidate, Origin};

const ARXIV_API: &str = "http://export.arxiv.org/api/query";

pub async fn fetch(
    client: &reqwest::Client,
    topic: &str,
    max_results: usize,
) -> Result<Vec<Candidate>, ApiError> {
    let url = format!(
        "{}?search_query=all:{}&start=0&max_results={}",
        ARXIV_API,
        urlencoding::encode(topic),
        max_results
    );

    let response = client.get(&url).send().await.map_err(ApiError::source)?;
    if !response.status().is_success() {
        return Err(ApiError::SourceUnavailable(format!(
            "arXiv query failed: {}",
            response.status()
        )));
    }

    let body = response.text().await.map_err(ApiError::source)?;
    Ok(parse_feed(&body, max_results))
}

#[derive(Default)]
struct EntryFields {
    title: String,
    summary: String,
    id: String,
    alternate_link: String,
}

impl EntryFields {
    fn link(&self) -> &str {
        if self.alternate_link.is_empty() {
            &self.id
        } else {
            &self.alternate_link
        }
    }
}

/// Parse an Atom payload into candidates, dropping unusable entries.
pub fn parse_feed(xml: &str, max_results: usize) -> Vec<Candidate> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut candidates = Vec::new();
    let mut entry: Option<EntryFields> = None;
    let mut current_tag: Vec<u8> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if name == b"entry" {
                    entry = Some(EntryFields::default());
                }
                current_tag = name;
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"link" {
                    if let Some(fields) = entry.as_mut() {
                        read_link(&e, fields);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(fields) = entry.as_mut() {
                    let text = t.unescape().unwrap_or_default();
                    match current_tag.as_slice() {
                        b"title" => push_text(&mut fields.title, &text),
                        b"summary" => push_text(&mut fields.summary, &text),
                        b"id" => push_text(&mut fields.id, &text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                current_tag.clear();
                if e.name().as_ref() == b"entry" {
                    if let Some(fields) = entry.take() {
                        match candidate_from_fields(
                            &fields.title,
                            &fields.summary,
                            fields.link(),
                            Origin::Arxiv,
                        ) {
                            Ok(candidate) => candidates.push(candidate),
                            Err(err) => tracing::debug!("Dropping arXiv entry: {}", err),
                        }
                    }
                    if candidates.len() >= max_results {
                        break;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!("arXiv feed parse stopped early: {}", err);
                break;
            }
            _ => {}
        }
    }

    candidates
}

fn read_link(e: &quick_xml::events::BytesStart<'_>, fields: &mut EntryFields) {
    let mut href = String::new();
    let mut rel = String::new();

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().unwrap_or_default().to_string();
        match attr.key.as_ref() {
            b"href" => href = value,
            b"rel" => rel = value,
            _ => {}
        }
    }

    // Atom defaults a missing rel to "alternate".
    if !href.is_empty() && (rel.is_empty() || rel == "alternate") {
        fields.alternate_link = href;
    }
}

fn push_text(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}
