//! 分桶选择
//!
//! 将说话人标识稳定地映射到有序集合中的一个元素（音色、音调等）。
//! 同一标识 + 同一集合（内容与顺序相同）总是得到同一元素。

use super::voice::VoiceError;

/// 音调候选集合，顺序固定
pub const PITCH_BUCKETS: &[&str] = &["x-low", "low", "medium", "high", "x-high"];

/// 标识归一化：去除首尾空白并转小写
#[inline]
fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// 计算标识的 128 位摘要
fn identity_digest(identity: &str) -> u128 {
    let digest = md5::compute(normalize_identity(identity).as_bytes());
    u128::from_be_bytes(digest.0)
}

/// 计算分桶下标
pub fn bucket_index(identity: &str, len: usize) -> Result<usize, VoiceError> {
    if len == 0 {
        return Err(VoiceError::EmptyBucketSet);
    }
    Ok((identity_digest(identity) % len as u128) as usize)
}

/// 从有序集合中为标识选择一个元素
pub fn bucket<'a, T>(identity: &str, items: &'a [T]) -> Result<&'a T, VoiceError> {
    let index = bucket_index(identity, items.len())?;
    Ok(&items[index])
}

/// 为标识选择音调
pub fn pitch_for(identity: &str) -> &'static str {
    // PITCH_BUCKETS 非空
    bucket(identity, PITCH_BUCKETS).copied().unwrap_or("medium")
}
