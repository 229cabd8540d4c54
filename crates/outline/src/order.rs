use std::cmp::Ordering;

/// Total order over tree positions matching reading order: the first
/// differing index decides, and an ancestor sorts before its descendants.
pub fn compare_paths(a: &[usize], b: &[usize]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

pub fn sort_by_path<T>(items: &mut [T], path: impl Fn(&T) -> &[usize]) {
    items.sort_by(|a, b| compare_paths(path(a), path(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_differing_index_wins() {
        assert_eq!(compare_paths(&[0, 5], &[1, 0]), Ordering::Less);
        assert_eq!(compare_paths(&[2, 1, 9], &[2, 3]), Ordering::Less);
        assert_eq!(compare_paths(&[3], &[2, 7, 7]), Ordering::Greater);
    }

    #[test]
    fn ancestor_sorts_before_descendant() {
        assert_eq!(compare_paths(&[1], &[1, 0]), Ordering::Less);
        assert_eq!(compare_paths(&[1, 0, 0], &[1, 0]), Ordering::Greater);
        assert_eq!(compare_paths(&[], &[0]), Ordering::Less);
        assert_eq!(compare_paths(&[4, 2], &[4, 2]), Ordering::Equal);
    }

    #[test]
    fn sorting_yields_reading_order() {
        let mut paths = vec![vec![2], vec![0, 1], vec![1], vec![0], vec![0, 0, 3]];
        sort_by_path(&mut paths, |p| p.as_slice());
        assert_eq!(
            paths,
            vec![vec![0], vec![0, 0, 3], vec![0, 1], vec![1], vec![2]]
        );
    }
}
