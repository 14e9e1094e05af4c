use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use scraper::Html;
use tracing::debug;

use crate::dom::{find_child, find_descendant, find_descendants, has_tag_and_class};
use crate::parameters::parameters;
use crate::permalink::{PermalinkResolver, area_name_from_url, breadcrumbs, depth};
use crate::record::{RecordType, SearchRecord};
use crate::text::extract_text;

pub const HTML_DOCTYPE: &str = "<!DOCTYPE html>";

/// Parse one build output file into search records.
///
/// Files that are not documentation pages produce no records; malformed
/// parameter or admonition markup inside a documentation page is an error.
pub fn parse_file(path: &Path, resolver: &PermalinkResolver) -> Result<Vec<SearchRecord>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let source = decode_ignoring_invalid(&bytes);
    if source.lines().next().map(str::trim) != Some(HTML_DOCTYPE) {
        debug!(path = %path.display(), "skipping non-HTML file");
        return Ok(Vec::new());
    }

    let url = resolver.url_for_path(path);
    parse_document(&source, &url).with_context(|| format!("failed to parse {}", path.display()))
}

/// Flatten an HTML page already known to be a documentation page candidate.
pub fn parse_document(source: &str, url: &str) -> Result<Vec<SearchRecord>> {
    let document = Html::parse_document(source);
    let Some(content) = find_descendant(document.root_element(), |el| {
        has_tag_and_class(el, "div", "content")
    }) else {
        debug!(url, "no div.content container");
        return Ok(Vec::new());
    };
    let Some(heading) = find_descendant(content, |el| el.value().name() == "h1") else {
        debug!(url, "no h1 page title");
        return Ok(Vec::new());
    };

    let area = area_name_from_url(url);
    let title = extract_text(Some(heading))?;
    let mut current_section: Option<String> = None;
    let mut records = Vec::new();

    for section in find_descendants(content, |el| has_tag_and_class(el, "div", "section")) {
        if let Some(subheading) = find_child(section, |el| el.value().name() == "h2") {
            current_section = Some(extract_text(Some(subheading))?);
        }
        let section_title = current_section.as_deref();
        let trail = breadcrumbs(area, &title, section_title);

        let text = extract_text(Some(section))?;
        if !text.is_empty() {
            records.push(SearchRecord {
                title: title.clone(),
                permalink: url.to_string(),
                section: current_section.clone(),
                content: text,
                breadcrumbs: trail.clone(),
                record_type: RecordType::Text,
                parameter: None,
                depth: depth(section_title, None),
            });
        }

        for parameter in parameters(section) {
            let parameter = parameter?;
            if parameter.description.is_empty() {
                continue;
            }
            records.push(SearchRecord {
                title: format!("Parameter `{}`", parameter.name),
                permalink: url.to_string(),
                section: current_section.clone(),
                content: parameter.description,
                breadcrumbs: trail.clone(),
                record_type: RecordType::Parameter,
                depth: depth(section_title, Some(&parameter.name)),
                parameter: Some(parameter.name),
            });
        }
    }

    Ok(records)
}

/// UTF-8 decode that drops invalid byte sequences instead of replacing them.
pub fn decode_ignoring_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(error) => {
                let (valid, rest) = bytes.split_at(error.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                match error.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => return out,
                }
            }
        }
    }
}
