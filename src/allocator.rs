pub const DEFAULT_WIDTH: usize = 4;

/// Computes the next unused code in a prefix's numbering sequence from a
/// snapshot of existing records: keep the codes carrying the prefix, take the
/// highest numeric suffix, add one, zero-pad.
///
/// The computation is a pure function of the snapshot. A broken legacy code
/// in the snapshot (missing field, foreign prefix, non-numeric suffix) must
/// never block issuance of new codes, so such records simply contribute
/// nothing to the maximum.
#[derive(Debug, Clone, Copy)]
pub struct SequentialCodeAllocator {
    width: usize,
}

impl Default for SequentialCodeAllocator {
    fn default() -> Self {
        SequentialCodeAllocator {
            width: DEFAULT_WIDTH,
        }
    }
}

impl SequentialCodeAllocator {
    pub fn with_width(width: usize) -> Self {
        SequentialCodeAllocator { width }
    }

    /// `code` extracts the stored code from a record; `None` means the record
    /// has no code and is skipped. The prefix match is exact and
    /// case-sensitive.
    pub fn next_code<R, I, F>(&self, prefix: &str, records: I, code: F) -> String
    where
        I: IntoIterator<Item = R>,
        F: Fn(&R) -> Option<&str>,
    {
        let next = max_suffix(prefix, records, code).saturating_add(1);
        format_code(prefix, next, self.width)
    }
}

/// Highest numeric suffix among records whose code starts with `prefix`, with
/// a floor of 0. The floor makes the first-ever allocation `prefix + "0001"`
/// rather than an error, and it is also the seed value for a per-prefix
/// counter taking over from scan-based numbering.
pub fn max_suffix<R, I, F>(prefix: &str, records: I, code: F) -> u64
where
    I: IntoIterator<Item = R>,
    F: Fn(&R) -> Option<&str>,
{
    let mut max = 0;
    for record in records {
        let Some(code) = code(&record) else { continue };
        let Some(suffix) = code.strip_prefix(prefix) else {
            continue;
        };
        max = max.max(suffix_number(suffix));
    }
    max
}

/// Pads to at least `width` digits. Numbers needing more digits are never
/// truncated; the code just comes out wider.
pub fn format_code(prefix: &str, number: u64, width: usize) -> String {
    format!("{prefix}{number:0width$}")
}

// A suffix that is empty or not all digits counts as 0, keeping the record
// in scope without ever raising the maximum.
fn suffix_number(suffix: &str) -> u64 {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    suffix.parse().unwrap_or(0)
}
