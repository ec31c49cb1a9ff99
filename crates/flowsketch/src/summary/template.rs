//! Reassembly of model-written summaries into the fixed three-section layout.
//!
//! The model decides the content, this module decides the format. Text is
//! split on the three literal section headers; each header's content runs up
//! to the next header of any kind. When a header occurs more than once, its
//! first occurrence is used.

/// First line of every summary.
pub const TITLE: &str = "【モデル概要】";

/// Sentence following the title.
pub const INTRODUCTION: &str = "以下は、図から読み取れる内容をもとにモデルの概要を整理したものです。";

/// Section headers in output order.
pub const HEADERS: [&str; 3] = [
    "① モデル化対象",
    "② モデル化の範囲・抽象度",
    "③ モデル化した機能",
];

/// Bullet symbols stripped from the start of a content line.
const BULLETS: [char; 2] = ['•', '・'];

/// ASCII markers stripped when followed by whitespace.
const ASCII_MARKERS: [char; 2] = ['-', '*'];

/// Rebuilds `raw` as title, introduction and the three sections.
///
/// # Examples
///
/// ```
/// use flowsketch::summary::normalize_template;
///
/// let text = normalize_template("① モデル化対象\n- 受注処理\n- 在庫管理\n");
/// let lines: Vec<&str> = text.lines().collect();
///
/// assert_eq!(lines[3], "① モデル化対象");
/// assert_eq!(lines[4], "受注処理 在庫管理");
/// assert_eq!(lines.last(), Some(&"③ モデル化した機能"));
/// ```
pub fn normalize_template(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.trim();

    let mut lines: Vec<String> = vec![TITLE.to_string(), INTRODUCTION.to_string(), String::new()];

    for (index, header) in HEADERS.iter().enumerate() {
        lines.push((*header).to_string());

        if let Some(paragraph) = section_content(text, header).and_then(paragraph) {
            lines.push(paragraph);
        }

        if index + 1 < HEADERS.len() {
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// The text after the first occurrence of `header`, up to the next header.
fn section_content<'t>(text: &'t str, header: &str) -> Option<&'t str> {
    let start = text.find(header)? + header.len();
    let rest = &text[start..];
    let end = HEADERS
        .iter()
        .filter_map(|other| rest.find(other))
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Joins the cleaned, non-empty lines of `content` with single spaces.
fn paragraph(content: &str) -> Option<String> {
    let cleaned: Vec<&str> = content
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .collect();

    (!cleaned.is_empty()).then(|| cleaned.join(" "))
}

fn clean_line(line: &str) -> &str {
    let line = line.trim();
    strip_list_marker(line).trim()
}

fn strip_list_marker(line: &str) -> &str {
    let mut chars = line.chars();
    match chars.next() {
        Some(c) if BULLETS.contains(&c) => return chars.as_str(),
        Some(c) if ASCII_MARKERS.contains(&c) => {
            let rest = chars.as_str();
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest;
            }
        }
        _ => {}
    }

    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(after) = rest.strip_prefix(['.', ')']) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                return after;
            }
        }
    }

    line
}
