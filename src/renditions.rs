//! Rendition set construction from `WxH` size strings and format ids.

use crate::types::RenditionSpec;
use log::error;

/// Parse a `WxH` size string, e.g. `"100x200"` → `(100, 200)`.
///
/// Returns `None` unless the string splits on `x` into exactly two
/// non-negative integers.
pub fn parse_size(size: &str) -> Option<(u32, u32)> {
    let mut parts = size.split('x');
    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let width = w.trim().parse::<u32>().ok()?;
    let height = h.trim().parse::<u32>().ok()?;
    Some((width, height))
}

/// Cross every valid size with every format.
///
/// Sizes form the outer loop and formats the inner loop, both in input order.
/// Malformed sizes are logged and skipped without affecting the others.
pub fn build_renditions<S, F>(sizes: &[S], formats: &[F]) -> Vec<RenditionSpec>
where
    S: AsRef<str>,
    F: AsRef<str>,
{
    let mut renditions = Vec::with_capacity(sizes.len() * formats.len());
    for size in sizes {
        let size = size.as_ref();
        let Some((width, height)) = parse_size(size) else {
            error!("invalid rendition {}", size);
            continue;
        };
        for format in formats {
            renditions.push(RenditionSpec {
                width,
                height,
                file_format: format.as_ref().to_string(),
            });
        }
    }
    renditions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(renditions: &[RenditionSpec]) -> Vec<(u32, u32, &str)> {
        renditions
            .iter()
            .map(|r| (r.width, r.height, r.file_format.as_str()))
            .collect()
    }

    #[test]
    fn parse_valid_sizes() {
        assert_eq!(parse_size("100x200"), Some((100, 200)));
        assert_eq!(parse_size("0x0"), Some((0, 0)));
        assert_eq!(parse_size(" 640 x 480 "), Some((640, 480)));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(parse_size("100"), None);
        assert_eq!(parse_size("100x200x300"), None);
        assert_eq!(parse_size("axb"), None);
        assert_eq!(parse_size("100x"), None);
        assert_eq!(parse_size("-1x5"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn cross_product_preserves_order() {
        let renditions = build_renditions(&["100x200", "300x400"], &["jpg", "webp"]);
        assert_eq!(
            summary(&renditions),
            vec![
                (100, 200, "jpg"),
                (100, 200, "webp"),
                (300, 400, "jpg"),
                (300, 400, "webp"),
            ]
        );
    }

    #[test]
    fn n_formats_per_size() {
        let formats = ["jpg", "webp", "png"];
        let renditions = build_renditions(&["10x10", "20x20", "30x30"], &formats);
        assert_eq!(renditions.len(), 9);
        for chunk in renditions.chunks(formats.len()) {
            assert!(chunk.iter().all(|r| r.width == chunk[0].width));
        }
    }

    #[test]
    fn malformed_size_skipped_others_kept() {
        let renditions = build_renditions(&["oops", "50x60", "1x2x3"], &["png"]);
        assert_eq!(summary(&renditions), vec![(50, 60, "png")]);
    }

    #[test]
    fn empty_sizes_yield_nothing() {
        let sizes: [&str; 0] = [];
        assert!(build_renditions(&sizes, &["jpg"]).is_empty());
    }

    #[test]
    fn empty_formats_yield_nothing() {
        let formats: [&str; 0] = [];
        assert!(build_renditions(&["10x10"], &formats).is_empty());
    }
}
