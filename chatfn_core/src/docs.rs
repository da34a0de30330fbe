//! Splits rustdoc-style documentation into a short description and
//! per-parameter descriptions taken from an `# Arguments` section.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocs {
    pub short_description: Option<String>,
    pub params: IndexMap<String, String>,
}

const ARGUMENT_HEADINGS: &[&str] = &["arguments", "args", "parameters", "params"];

pub fn parse_docs(raw: &str) -> ParsedDocs {
    let mut docs = ParsedDocs::default();
    let mut summary: Vec<&str> = Vec::new();
    let mut summary_done = false;
    let mut in_arguments = false;
    let mut current: Option<String> = None;

    for line in raw.lines() {
        let trimmed = line.trim();

        if let Some(heading) = trimmed.strip_prefix('#') {
            summary_done = true;
            let heading = heading.trim_start_matches('#').trim().to_ascii_lowercase();
            in_arguments = ARGUMENT_HEADINGS.contains(&heading.as_str());
            current = None;
            continue;
        }

        if !summary_done {
            if trimmed.is_empty() {
                summary_done = !summary.is_empty();
            } else {
                summary.push(trimmed);
            }
            continue;
        }

        if !in_arguments || trimmed.is_empty() {
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("* ")
            .or_else(|| trimmed.strip_prefix("- "))
        {
            if let Some((name, description)) = split_item(item) {
                docs.params.insert(name.clone(), description);
                current = Some(name);
            }
        } else if let Some(name) = &current {
            // continuation line
            if let Some(description) = docs.params.get_mut(name) {
                if !description.is_empty() {
                    description.push(' ');
                }
                description.push_str(trimmed);
            }
        }
    }

    if !summary.is_empty() {
        docs.short_description = Some(summary.join(" "));
    }
    docs
}

/// "`name` - text", "name: text" and "`name`: text" are all accepted.
fn split_item(item: &str) -> Option<(String, String)> {
    let (name, rest) = match item.find([':', '-', ' ']) {
        Some(idx) => item.split_at(idx),
        None => (item, ""),
    };
    let name = name.trim().trim_matches('`').trim();
    if name.is_empty() {
        return None;
    }
    let description = rest
        .trim_start()
        .trim_start_matches([':', '-'])
        .trim()
        .to_string();
    Some((name.to_string(), description))
}
