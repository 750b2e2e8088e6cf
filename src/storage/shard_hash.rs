use crate::core::Value;

const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// Stable shard for a partition-key value of `table`, using FNV-1a.
///
/// The same `(table, value)` pair maps to the same shard for a fixed shard count.
pub fn stable_shard_for(table: &str, partition_value: &Value, shard_count: u32) -> u32 {
    if shard_count == 0 {
        return 0;
    }
    let mut hash = FNV_OFFSET_BASIS;
    for byte in table.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash ^= 0xff;
    hash = hash.wrapping_mul(FNV_PRIME);
    for byte in partition_value.routing_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % shard_count as u64) as u32
}
