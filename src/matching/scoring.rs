/// Similarity ratio between two strings, 0 to 100.
///
/// Based on the indel edit distance (insertions and deletions only):
/// `100 * (1 - distance / (len_a + len_b))`, which equals
/// `200 * lcs / (len_a + len_b)` where `lcs` is the length of the longest
/// common subsequence. Lengths count Unicode scalar values. The result is
/// rounded half up. Identical strings (including two empty ones) score 100;
/// the ratio is symmetric.
///
/// # Examples
///
/// ```
/// use rom_bulk_patcher::matching::scoring::ratio;
///
/// assert_eq!(ratio("Mother 3", "Mother 3"), 100);
/// assert_eq!(ratio("abcd", "abxy"), 50);
/// assert_eq!(ratio("abc", ""), 0);
/// ```
#[must_use]
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }

    let lcs = lcs_len(&a, &b);
    // floor((200 * lcs / total) + 0.5) in integer arithmetic
    let scaled = (400 * lcs + total) / (2 * total);
    u8::try_from(scaled).unwrap_or(100)
}

/// Length of the longest common subsequence, O(len_a * len_b) time and
/// O(min(len_a, len_b)) memory
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];

    for &lc in long {
        let mut diagonal = 0;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[short.len()]
}
