// storage layout, relative to the operator root:
//
// movies.json    -> JSON array of items: index, movie_title, genre, script_length, year
// embeddings.bin -> little-endian records, one per item, in any order:
//                   [u64 id][u32 dim][dim x f32]
//
// both files are only read; the process restarts to pick up new data

use super::Item;
use anyhow::Result;
use byteorder::{ByteOrder, LittleEndian};
use opendal::services::Fs;
use opendal::Operator;

const RECORD_HEAD: usize = 12;

#[derive(Clone)]
pub struct Storage {
    pub operator: Operator,
}

impl Storage {
    pub fn new(root: &str) -> Result<Self> {
        let mut builder = Fs::default();
        builder.root(root);

        Ok(Storage {
            operator: Operator::new(builder)?.finish(),
        })
    }

    pub async fn load_items(&self, path: &str) -> Result<Vec<Item>> {
        let bytes = self.operator.read(path).await?;
        let items: Vec<Item> = serde_json::from_slice(&bytes)?;
        debug!("load items from {}: {} rows", path, items.len());
        Ok(items)
    }

    pub async fn load_embeddings(&self, path: &str) -> Result<Vec<(usize, Vec<f32>)>> {
        let bytes = self.operator.read(path).await?;
        let embeddings = decode_embeddings(&bytes)?;
        debug!(
            "load embeddings from {}: {} vectors, {} bytes",
            path,
            embeddings.len(),
            bytes.len()
        );
        Ok(embeddings)
    }
}

pub fn decode_embeddings(bytes: &[u8]) -> Result<Vec<(usize, Vec<f32>)>> {
    let mut records = vec![];
    let mut offset = 0;
    while offset < bytes.len() {
        if bytes.len() - offset < RECORD_HEAD {
            return Err(anyhow::anyhow!(
                "truncated embedding header at byte {}",
                offset
            ));
        }
        let id = LittleEndian::read_u64(&bytes[offset..offset + 8]) as usize;
        let dim = LittleEndian::read_u32(&bytes[offset + 8..offset + RECORD_HEAD]) as usize;
        offset += RECORD_HEAD;

        let end = offset + dim * 4;
        if end > bytes.len() {
            return Err(anyhow::anyhow!(
                "truncated embedding for id {}: need {} bytes, have {}",
                id,
                dim * 4,
                bytes.len() - offset
            ));
        }
        records.push((id, bytes_to_float(&bytes[offset..end])));
        offset = end;
    }

    Ok(records)
}

fn bytes_to_float(byte_vec: &[u8]) -> Vec<f32> {
    let mut float_vec = vec![0f32; byte_vec.len() / 4];
    LittleEndian::read_f32_into(byte_vec, &mut float_vec);
    float_vec
}

#[cfg(test)]
pub(crate) fn encode_embeddings(records: &[(usize, Vec<f32>)]) -> Vec<u8> {
    let mut out = vec![];
    for (id, vector) in records {
        let mut head = [0u8; RECORD_HEAD];
        LittleEndian::write_u64(&mut head[..8], *id as u64);
        LittleEndian::write_u32(&mut head[8..], vector.len() as u32);
        out.extend_from_slice(&head);
        let mut body = vec![0u8; vector.len() * 4];
        LittleEndian::write_f32_into(vector, &mut body);
        out.extend(body);
    }
    out
}
