use std::cmp::Ordering;

/// Orders dot-separated version strings component by component.
///
/// Missing components count as `0`, so `1.0` and `1.0.0` are equal. Within a
/// component the leading digits compare numerically; a trailing suffix such
/// as `-beta` sorts below the bare number and otherwise compares lexically.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left_parts = left.split('.').collect::<Vec<_>>();
    let right_parts = right.split('.').collect::<Vec<_>>();
    let len = left_parts.len().max(right_parts.len());

    for index in 0..len {
        let left_part = Component::parse(left_parts.get(index).copied().unwrap_or("0"));
        let right_part = Component::parse(right_parts.get(index).copied().unwrap_or("0"));
        let ordering = left_part.cmp(&right_part);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}

pub fn sort_descending(versions: &mut [String]) {
    versions.sort_by(|left, right| compare_versions(right, left));
}

#[derive(Debug, PartialEq, Eq)]
struct Component<'a> {
    number: Option<u64>,
    suffix: &'a str,
}

impl<'a> Component<'a> {
    fn parse(raw: &'a str) -> Self {
        let digits_end = raw
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_digit())
            .map(|(index, _)| index)
            .unwrap_or(raw.len());
        let (digits, suffix) = raw.split_at(digits_end);
        // saturate on absurdly long runs instead of failing the comparison
        let number = if digits.is_empty() {
            None
        } else {
            Some(digits.parse::<u64>().unwrap_or(u64::MAX))
        };
        Self { number, suffix }
    }
}

impl Ord for Component<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number).then_with(|| {
            match (self.suffix.is_empty(), other.suffix.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.suffix.cmp(other.suffix),
            }
        })
    }
}

impl PartialOrd for Component<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
