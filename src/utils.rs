

/// Cuts `s` to `max_chars` characters (not bytes) and marks the cut with `...`.
#[inline]
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}


#[inline]
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
