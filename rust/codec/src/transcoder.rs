// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary blob layouts: little-endian `f32` tuples and `u32` words.

const WORD: usize = 4;

/// Packs fixed-size float tuples into a blob.
pub fn encode_f32_tuples<const N: usize>(items: impl IntoIterator<Item = [f32; N]>) -> Vec<u8> {
    let items = items.into_iter();
    let mut blob = Vec::with_capacity(items.size_hint().0 * N * WORD);
    for item in items {
        for value in item {
            blob.extend_from_slice(&value.to_le_bytes());
        }
    }
    blob
}

/// Unpacks exactly `count` float tuples.
///
/// Returns `None` if the blob is too short. Trailing bytes are ignored.
pub fn decode_f32_tuples<const N: usize>(blob: &[u8], count: usize) -> Option<Vec<[f32; N]>> {
    let byte_len = count.checked_mul(N * WORD)?;
    let data = blob.get(..byte_len)?;

    Some(
        data.chunks_exact(N * WORD)
            .map(|chunk| {
                let mut item = [0.0f32; N];
                for (value, bytes) in item.iter_mut().zip(chunk.chunks_exact(WORD)) {
                    *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                }
                item
            })
            .collect(),
    )
}

/// Packs words into a blob.
pub fn encode_u32s(words: &[u32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(words.len() * WORD);
    for word in words {
        blob.extend_from_slice(&word.to_le_bytes());
    }
    blob
}

/// Unpacks the words contained in the first `byte_count` bytes.
///
/// Returns `None` if the blob is shorter than `byte_count` or `byte_count`
/// is not a whole number of words.
pub fn decode_u32s(blob: &[u8], byte_count: usize) -> Option<Vec<u32>> {
    if byte_count % WORD != 0 {
        return None;
    }
    let data = blob.get(..byte_count)?;
    Some(
        data.chunks_exact(WORD)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}
