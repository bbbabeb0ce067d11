//! Content transforms: title and word-count extraction, front matter
//! generation, body cleanup, slugs and inline image handling.

use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;

use crate::models::{FrontMatter, ImageRef};

/// URL scheme used in processed content for images waiting to be extracted.
pub const INLINE_IMAGE_SCHEME: &str = "inline-image:";

static FRONT_MATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\s*\n.*?\n---\s*\n").expect("valid front matter regex"));
static FRONT_MATTER_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---").expect("valid front matter regex"));
static TITLE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"title:\s*["']?([^"'\n]+)["']?"#).expect("valid title key regex")
});
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("valid heading regex"));
static LATIN_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]+").expect("valid word regex"));
static TRAILING_WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("valid trailing whitespace regex"));
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line regex"));
static SLUG_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"));
static SLUG_JOIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid slug regex"));
static INLINE_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\((data:image/[A-Za-z0-9.+-]+;base64,[A-Za-z0-9+/=\s]+)\)")
        .expect("valid inline image regex")
});

/// Remove a leading front matter block, if any.
pub fn strip_front_matter(content: &str) -> &str {
    match FRONT_MATTER_RE.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    }
}

/// Find a title in existing front matter or the first level-one heading.
pub fn extract_title(content: &str) -> Option<String> {
    if let Some(caps) = FRONT_MATTER_BLOCK_RE.captures(content) {
        let block = &caps[1];
        let from_yaml = serde_yaml::from_str::<serde_yaml::Value>(block)
            .ok()
            .and_then(|v| v.get("title").and_then(|t| t.as_str()).map(str::to_string));
        let title = from_yaml.or_else(|| {
            TITLE_KEY_RE
                .captures(block)
                .map(|c| c[1].to_string())
        });
        if let Some(title) = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            return Some(title);
        }
    }

    HEADING_RE
        .captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Count words: CJK ideographs one each, plus runs of Latin letters.
///
/// Front matter and the markdown markers `#*`_[]()` are ignored.
pub fn count_words(content: &str) -> usize {
    let body: String = strip_front_matter(content)
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '`' | '_' | '[' | ']' | '(' | ')'))
        .collect();

    let cjk = body
        .chars()
        .filter(|c| ('\u{4e00}'..='\u{9fa5}').contains(c))
        .count();
    let latin = LATIN_WORD_RE.find_iter(&body).count();
    cjk + latin
}

/// Render a front matter block (without trailing newline).
pub fn render_front_matter(fm: &FrontMatter) -> String {
    let lines = [
        "---".to_string(),
        format!("title: {}", quote(&fm.title)),
        format!("date: {}", fm.date),
        format!("draft: {}", fm.draft),
        format!("tags: {}", json_list(&fm.tags)),
        format!("categories: {}", json_list(&fm.categories)),
        format!("description: {}", quote(&fm.description)),
        format!("ShowToc: {}", fm.show_toc),
        format!("TocOpen: {}", fm.toc_open),
        "---".to_string(),
    ];
    lines.join("\n")
}

/// JSON string literals are valid YAML double-quoted scalars.
fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.replace('"', "'")))
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Strip trailing whitespace from every line, collapse runs of blank lines
/// and trim the result.
pub fn clean_body(body: &str) -> String {
    let stripped = TRAILING_WS_RE.replace_all(body, "");
    let collapsed = BLANK_RUN_RE.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}

/// Overlay the keys of a leading front matter block in `content` onto `fm`.
///
/// Returns whether a block was found. Unknown keys and values of the wrong
/// shape are ignored, so stored values fill the gaps.
pub fn merge_front_matter(fm: &mut FrontMatter, content: &str) -> bool {
    let Some(caps) = FRONT_MATTER_BLOCK_RE.captures(content) else {
        return false;
    };
    let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(&caps[1]) else {
        return false;
    };
    if !value.is_mapping() {
        return false;
    }

    if let Some(title) = value
        .get("title")
        .and_then(yaml_scalar)
        .filter(|t| !t.trim().is_empty())
    {
        fm.title = title.trim().to_string();
    }
    if let Some(date) = value.get("date").and_then(yaml_scalar) {
        fm.date = date;
    }
    if let Some(draft) = value.get("draft").and_then(|v| v.as_bool()) {
        fm.draft = draft;
    }
    if let Some(tags) = value.get("tags").and_then(yaml_list) {
        fm.tags = tags;
    }
    if let Some(categories) = value.get("categories").and_then(yaml_list) {
        fm.categories = categories;
    }
    if let Some(description) = value.get("description").and_then(yaml_scalar) {
        fm.description = description;
    }
    if let Some(show_toc) = value.get("ShowToc").and_then(|v| v.as_bool()) {
        fm.show_toc = show_toc;
    }
    if let Some(toc_open) = value.get("TocOpen").and_then(|v| v.as_bool()) {
        fm.toc_open = toc_open;
    }
    true
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_list(value: &serde_yaml::Value) -> Option<Vec<String>> {
    match value {
        serde_yaml::Value::Sequence(items) => Some(items.iter().filter_map(yaml_scalar).collect()),
        serde_yaml::Value::Null => Some(Vec::new()),
        other => yaml_scalar(other).map(|s| vec![s]),
    }
}

/// Build the processed artifact: fresh front matter followed by the cleaned
/// body. Any front matter already present in `content` is discarded.
pub fn compose(fm: &FrontMatter, content: &str) -> String {
    let body = clean_body(strip_front_matter(content));
    format!("{}\n\n{}", render_front_matter(fm), body)
}

/// Filename-safe slug: non-word characters dropped, whitespace and hyphen
/// runs collapsed to a single hyphen.
pub fn slugify(title: &str) -> String {
    let stripped = SLUG_STRIP_RE.replace_all(title, "");
    let joined = SLUG_JOIN_RE.replace_all(stripped.trim(), "-");
    joined.trim_matches('-').to_string()
}

/// Sanitize an uploaded filename for storage in a record.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('_');
    if trimmed.is_empty() {
        "document.md".to_string()
    } else if trimmed.chars().count() > 100 {
        trimmed.chars().take(100).collect()
    } else {
        trimmed.to_string()
    }
}

/// The placeholder URL an inline image is replaced with until publish.
pub fn placeholder(image_id: &str) -> String {
    format!("{}{}", INLINE_IMAGE_SCHEME, image_id)
}

/// Move `data:` image URIs out of markdown image links into the extraction
/// queue, leaving placeholders behind.
///
/// New ids are numbered after `existing` queued images.
pub fn lift_inline_images(body: &str, doc_id: &str, existing: usize) -> (String, Vec<ImageRef>) {
    let mut images = Vec::new();
    let replaced = INLINE_IMAGE_RE.replace_all(body, |caps: &regex::Captures| {
        let id = format!("{}_img{}", doc_id, existing + images.len() + 1);
        let data: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
        let link = format!("![{}]({})", &caps[1], placeholder(&id));
        images.push(ImageRef::Pending { id, data });
        link
    });
    (replaced.into_owned(), images)
}

/// Decode a `data:image/<type>;base64,<payload>` URI into a file extension
/// and raw bytes.
pub fn decode_data_uri(data: &str) -> Option<(String, Vec<u8>)> {
    let rest = data.strip_prefix("data:image/")?;
    let (header, payload) = rest.split_once(',')?;
    let (kind, encoding) = header.split_once(';')?;
    if encoding != "base64" {
        return None;
    }

    let ext = match kind.to_lowercase().as_str() {
        "svg+xml" => "svg".to_string(),
        "jpeg" => "jpg".to_string(),
        other if !other.is_empty() && other.chars().all(|c| c.is_ascii_alphanumeric()) => {
            other.to_string()
        }
        _ => return None,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .ok()?;
    Some((ext, bytes))
}
