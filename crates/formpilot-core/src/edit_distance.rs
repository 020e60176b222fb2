//! Levenshtein edit distance.
//!
//! Used to map free-text answers onto a fixed set of choices. Case folding is
//! the caller's job.

/// Minimum number of single code-point insertions, deletions and
/// substitutions turning `a` into `b`.
pub fn distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two rows instead of the full matrix.
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Index and distance of the candidate closest to `target`.
///
/// Ties go to the first candidate encountered.
pub fn closest<'a, I>(target: &str, candidates: I) -> Option<(usize, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let d = distance(target, candidate);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((index, d));
        }
    }
    best
}

/// Lowercase and trim, the normalization applied before matching.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
