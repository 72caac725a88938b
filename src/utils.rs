/// Split a slice into consecutive chunks of at most `chunk_size` elements.
/// The last chunk may be shorter. `chunk_size` must be non-zero (enforced at
/// configuration time).
pub fn split_into_chunks<T: Clone>(arr: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    arr.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_reassemble_to_input() {
        let ids: Vec<u32> = (0..437).collect();
        let chunks = split_into_chunks(&ids, 64);
        assert!(chunks.iter().all(|c| c.len() <= 64));
        let rejoined: Vec<u32> = chunks.into_iter().flatten().collect();
        assert_eq!(rejoined, ids);
    }

    #[test]
    fn fleet_of_450_splits_into_three_chunks() {
        let ids: Vec<String> = (0..450).map(|i| format!("i-{i:05}")).collect();
        let chunks = split_into_chunks(&ids, 200);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![200, 200, 50]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = split_into_chunks::<u32>(&[], 200);
        assert!(chunks.is_empty());
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let ids: Vec<u32> = (0..400).collect();
        let chunks = split_into_chunks(&ids, 200);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 200));
    }
}
