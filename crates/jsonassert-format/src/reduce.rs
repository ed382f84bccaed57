//! Bounding long diffs to the lines around each change.

use tracing::debug;

/// Line kept in place of every omitted stretch.
pub const OMITTED: &str = "...";

/// Shorten `text` to windows of `surrounding` lines around every changed line.
///
/// Text with at most `max_lines` lines is returned unchanged. Otherwise
/// overlapping or adjacent windows are merged and each omitted stretch,
/// including one at the start or end, becomes a single `...` line.
pub fn reduce_diff(text: &str, max_lines: usize, surrounding: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return text.to_owned();
    }

    let mut windows: Vec<(usize, usize)> = Vec::new();
    for (n, line) in lines.iter().enumerate() {
        if !is_change(line) {
            continue;
        }
        let start = n.saturating_sub(surrounding);
        let end = (n + surrounding).min(lines.len() - 1);
        match windows.last_mut() {
            Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
            _ => windows.push((start, end)),
        }
    }

    let mut out = String::new();
    let mut next = 0;
    let mut kept = 0;
    for (start, end) in windows {
        if start > next {
            out.push_str(OMITTED);
            out.push('\n');
        }
        for line in &lines[start..=end] {
            out.push_str(line);
            out.push('\n');
        }
        kept += end + 1 - start;
        next = end + 1;
    }
    if next < lines.len() {
        out.push_str(OMITTED);
        out.push('\n');
    }

    debug!(lines = lines.len(), kept, "reduced diff");
    out
}

/// Returns `true` for `+` and `-` lines, looking past a leading ANSI escape.
fn is_change(line: &str) -> bool {
    let plain = match line.strip_prefix("\x1b[") {
        Some(rest) => rest.find('m').map_or(line, |end| &rest[end + 1..]),
        None => line,
    };
    plain.starts_with('+') || plain.starts_with('-')
}
