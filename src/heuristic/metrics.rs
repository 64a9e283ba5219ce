//! Line-shape metrics: length irregularity and paragraph formatting.

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<usize>() as f64 / values.len() as f64
}

/// Population coefficient of variation; 0 when the mean is 0.
pub fn coefficient_of_variation(values: &[usize]) -> f64 {
    let avg = mean(values);
    if avg <= 0.0 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| (v as f64 - avg).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt() / avg
}

fn overall_variation_bonus(lengths: &[usize]) -> i32 {
    match coefficient_of_variation(lengths) {
        cv if cv > 0.4 => 40,
        cv if cv > 0.25 => 25,
        cv if cv > 0.15 => 15,
        _ => 0,
    }
}

fn line_to_line_bonus(lengths: &[usize]) -> i32 {
    let diffs: Vec<f64> = lengths
        .windows(2)
        .filter(|w| w[0] > 0)
        .map(|w| w[1].abs_diff(w[0]) as f64 / w[0] as f64)
        .collect();
    if diffs.is_empty() {
        return 0;
    }

    match diffs.iter().sum::<f64>() / diffs.len() as f64 {
        d if d > 2.0 => 140,
        d if d > 1.0 => 80,
        d if d > 0.5 => 50,
        d if d > 0.3 => 40,
        d if d > 0.2 => 25,
        d if d > 0.1 => 15,
        _ => 0,
    }
}

fn range_bonus(lengths: &[usize]) -> i32 {
    let (Some(&min), Some(&max)) = (lengths.iter().min(), lengths.iter().max()) else {
        return 0;
    };
    if max == 0 {
        return 0;
    }
    match (max - min) as f64 / max as f64 {
        r if r > 0.7 => 25,
        r if r > 0.5 => 15,
        _ => 0,
    }
}

/// Code bonus for irregular trimmed line lengths.
///
/// The strongest of overall spread, adjacent-line change and min/max range.
/// Needs at least three lines.
pub fn variation_bonus(lengths: &[usize]) -> i32 {
    if lengths.len() <= 2 {
        return 0;
    }
    overall_variation_bonus(lengths)
        .max(line_to_line_bonus(lengths))
        .max(range_bonus(lengths))
}

/// Small code bonus when indented lines use a 2/4-space or tab unit.
pub fn indent_consistency_bonus(lines: &[&str]) -> i32 {
    let mut indented = 0;
    let mut consistent = 0;
    for line in lines {
        if !line.starts_with([' ', '\t']) {
            continue;
        }
        indented += 1;
        let spaces = line.len() - line.trim_start_matches(' ').len();
        if (spaces > 0 && spaces % 2 == 0) || line.starts_with('\t') {
            consistent += 1;
        }
    }

    if indented > 0 && consistent as f64 / indented as f64 > 0.7 {
        1
    } else {
        0
    }
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Prose bonus when most lines start at the same column.
pub fn consistent_start_bonus(lines: &[&str]) -> i32 {
    let indents: Vec<usize> = lines.iter().map(|l| leading_whitespace(l)).collect();
    if indents.len() <= 1 {
        return 0;
    }

    let mut counts = std::collections::HashMap::new();
    for indent in &indents {
        *counts.entry(*indent).or_insert(0usize) += 1;
    }
    let most = counts.values().copied().max().unwrap_or(0);

    match most as f64 / indents.len() as f64 {
        r if r >= 0.9 => 80,
        r if r >= 0.8 => 60,
        r if r >= 0.7 => 50,
        r if r >= 0.6 => 40,
        r if r >= 0.5 => 30,
        r if r >= 0.4 => 25,
        r if r >= 0.3 => 20,
        _ => 0,
    }
}

/// Prose bonus for the classic paragraph shape: regular, mostly long lines
/// followed by a shorter last line.
pub fn regular_length_bonus(lengths: &[usize]) -> i32 {
    let Some((&last, body)) = lengths.split_last() else {
        return 0;
    };
    if body.len() <= 1 {
        return 0;
    }
    let avg = mean(body);
    if avg <= 0.0 {
        return 0;
    }

    let cv = coefficient_of_variation(body);
    let long_ratio = body.iter().filter(|&&l| l > 60).count() as f64 / body.len() as f64;

    let bonus = if cv < 0.15 && long_ratio >= 0.8 {
        40
    } else if cv < 0.20 && long_ratio >= 0.7 {
        35
    } else if cv < 0.25 && long_ratio >= 0.6 {
        30
    } else if cv < 0.30 && long_ratio >= 0.4 {
        25
    } else if cv < 0.35 && long_ratio >= 0.2 {
        20
    } else if cv < 0.40 {
        15
    } else {
        0
    };

    if bonus > 0 && (last as f64) < avg * 0.7 {
        bonus + 20
    } else {
        bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variation_needs_three_lines() {
        assert_eq!(variation_bonus(&[5, 80]), 0);
    }

    #[test]
    fn test_alternating_lengths_overwhelm() {
        assert_eq!(variation_bonus(&[2, 30, 2, 30, 2]), 140);
    }

    #[test]
    fn test_uniform_lengths_no_bonus() {
        assert_eq!(variation_bonus(&[70, 70, 70, 70]), 0);
    }

    #[test]
    fn test_indent_consistency() {
        assert_eq!(indent_consistency_bonus(&["x", "    y", "  z", "\tw"]), 1);
        assert_eq!(indent_consistency_bonus(&[" a", "   b", "x"]), 0);
    }

    #[test]
    fn test_consistent_start() {
        assert_eq!(consistent_start_bonus(&["a", "b", "c"]), 80);
        assert_eq!(consistent_start_bonus(&["a", "  b"]), 30);
        assert_eq!(consistent_start_bonus(&["a"]), 0);
    }

    #[test]
    fn test_paragraph_shape() {
        assert_eq!(regular_length_bonus(&[72, 70, 71, 20]), 60);
        assert_eq!(regular_length_bonus(&[72, 20]), 0);
    }
}
