/// Compact rendering of a set of job ids.
///
/// Numeric ids are sorted and consecutive runs collapse to `first-last`,
/// e.g. `1002-1005,1010`. Ids that are not integers are appended verbatim.
pub fn render_job_ids<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut numeric = Vec::new();
    let mut other = Vec::new();
    for id in ids {
        match id.parse::<u64>() {
            Ok(n) => numeric.push(n),
            Err(_) => other.push(id),
        }
    }
    numeric.sort_unstable();
    numeric.dedup();
    other.sort_unstable();

    let mut parts: Vec<String> = Vec::new();
    let mut iter = numeric.into_iter().peekable();
    while let Some(first) = iter.next() {
        let mut last = first;
        while iter.peek() == Some(&(last + 1)) {
            last += 1;
            iter.next();
        }
        if first == last {
            parts.push(first.to_string());
        } else {
            parts.push(format!("{first}-{last}"));
        }
    }
    parts.extend(other.into_iter().map(str::to_string));
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_consecutive_runs() {
        assert_eq!(
            render_job_ids(["1002", "1003", "1004", "1005", "1010"]),
            "1002-1005,1010"
        );
    }

    #[test]
    fn sorts_before_collapsing() {
        assert_eq!(render_job_ids(["7", "3", "5", "4", "9", "8"]), "3-5,7-9");
    }

    #[test]
    fn singles_and_pairs() {
        assert_eq!(render_job_ids(["1"]), "1");
        assert_eq!(render_job_ids(["1", "2"]), "1-2");
        assert_eq!(render_job_ids(["1", "3"]), "1,3");
        assert_eq!(render_job_ids(Vec::<&str>::new()), "");
    }

    #[test]
    fn non_numeric_ids_are_kept() {
        assert_eq!(render_job_ids(["12", "x", "11"]), "11-12,x");
    }
}
