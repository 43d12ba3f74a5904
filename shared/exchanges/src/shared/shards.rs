use common::functions::chunk_by;

/// Splits the sorted native id list into `ceil(n / ceiling)` shards.
pub fn partition_symbols(native_ids: &[String], ceiling: usize) -> Vec<Vec<String>> {
    chunk_by(native_ids, ceiling.max(1))
}
