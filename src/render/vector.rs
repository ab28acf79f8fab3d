//! Vector block extraction and wrapping.

/// Return the first complete `<svg>...</svg>` element in `markup`.
///
/// The scan is nesting-aware: inner `<svg>` elements are kept inside the
/// outer block and do not terminate it early. Tag names match
/// case-insensitively; `<svgfoo>`-style names are skipped.
pub fn extract_svg(markup: &str) -> Option<&str> {
    let lower = markup.to_ascii_lowercase();
    let start = find_open(&lower, 0)?;

    let mut depth = 0usize;
    let mut cursor = start;
    loop {
        let next_open = find_open(&lower, cursor);
        let next_close = lower[cursor..].find("</svg").map(|i| i + cursor);

        match (next_open, next_close) {
            (Some(open), Some(close)) if open < close => {
                depth += 1;
                cursor = tag_end(&lower, open)?;
                if lower[..cursor].ends_with("/>") {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&markup[start..cursor]);
                    }
                }
            }
            (_, Some(close)) => {
                depth = depth.checked_sub(1)?;
                cursor = tag_end(&lower, close)?;
                if depth == 0 {
                    return Some(&markup[start..cursor]);
                }
            }
            (Some(open), None) => {
                // Only a self-closing element can complete without a close tag.
                let end = tag_end(&lower, open)?;
                if depth == 0 && lower[..end].ends_with("/>") {
                    return Some(&markup[start..end]);
                }
                return None;
            }
            (None, None) => return None,
        }
    }
}

/// Wrap an SVG excerpt in a minimal host document whose primary content
/// element is `#chart-container`.
pub fn wrap_svg(svg: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>body {{ margin: 0; }} #chart-container {{ display: inline-block; }}</style>\n</head>\n<body>\n<div id=\"chart-container\">{svg}</div>\n</body>\n</html>\n"
    )
}

fn find_open(lower: &str, from: usize) -> Option<usize> {
    let mut offset = from;
    while let Some(i) = lower[offset..].find("<svg") {
        let at = offset + i;
        let after = lower[at + 4..].chars().next();
        if matches!(after, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            return Some(at);
        }
        offset = at + 4;
    }
    None
}

fn tag_end(lower: &str, from: usize) -> Option<usize> {
    lower[from..].find('>').map(|i| from + i + 1)
}
