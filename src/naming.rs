//! Output naming: filename templates and web-friendly path slugs.
//!
//! ## Templates
//!
//! Rendition filenames are produced from a template such as the default
//! `${name}/${width}x${height}.${ext}`. Four placeholders are recognized:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `${name}` | Base name of the image (no directory, no extension) |
//! | `${width}` | Rendition width |
//! | `${height}` | Rendition height |
//! | `${ext}` | Rendition file format |
//!
//! Only the **first** occurrence of each placeholder is substituted; later
//! repeats and unknown placeholders are left verbatim. Templates may contain
//! `/`, which turns into subdirectories of the output tree.
//!
//! ## Slugs
//!
//! With `--slugify-output`, manifest keys (and therefore output paths) are
//! slugified segment by segment:
//!
//! - `Summer 2019/Beach Day.jpg` → `Summer-2019/Beach-Day.jpg`
//! - `Städte/Köln (Dom).jpg` → `Stadte/Koln-(Dom).jpg`

use std::path::Path;

/// Placeholders in substitution order.
const PLACEHOLDERS: [&str; 4] = ["${name}", "${width}", "${height}", "${ext}"];

/// Render a rendition filename from a template.
///
/// ```
/// # use image_sizes::naming::render_file_name;
/// let path = render_file_name("${name}/${width}x${height}.${ext}", "pic", 100, 200, "jpg");
/// assert_eq!(path, "pic/100x200.jpg");
/// ```
pub fn render_file_name(template: &str, name: &str, width: u32, height: u32, ext: &str) -> String {
    let values = [name.to_string(), width.to_string(), height.to_string(), ext.to_string()];
    PLACEHOLDERS
        .iter()
        .zip(values.iter())
        .fold(template.to_string(), |acc, (placeholder, value)| {
            acc.replacen(placeholder, value, 1)
        })
}

/// Base name of a relative path without its extension.
///
/// `albums/2019/beach.day.jpg` → `beach.day`
pub fn file_stem(relative: &str) -> String {
    Path::new(relative)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Slugify every `/`-separated segment of a relative path.
pub fn slugify_path(path: &str) -> String {
    path.split('/').map(slugify).collect::<Vec<_>>().join("/")
}

/// Slugify a single path segment.
///
/// Transliterates common Latin letters, drops characters that are not safe in
/// URLs, trims, and collapses runs of whitespace and `-` into a single `-`.
/// Case is kept.
pub fn slugify(segment: &str) -> String {
    let mut cleaned = String::with_capacity(segment.len());
    for c in segment.chars() {
        match transliterate(c) {
            Some(replacement) => cleaned.push_str(replacement),
            None if c == '-' => cleaned.push(' '),
            None if is_slug_char(c) => cleaned.push(c),
            None => {}
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(
            c,
            '_' | '$' | '*' | '+' | '~' | '.' | '(' | ')' | '\'' | '"' | '!' | ':' | '@'
        )
}

fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' => "C",
        'ç' => "c",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ñ' => "N",
        'ñ' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        '&' => "and",
        '%' => "percent",
        '<' => "less",
        '>' => "greater",
        '|' => "or",
        _ => return None,
    };
    Some(s)
}
