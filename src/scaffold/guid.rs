//! Object GUID construction
//!
//! The top 32 bits of an object GUID identify its model+material pair so
//! that sorting by GUID clusters instances of the same renderer. The low
//! 32 bits are random and only need to be unique within one cell.

use rand::Rng;
use crate::core::hash::{hash64, hash64_seeded};

/// Gather bits 0, 2, 4, ... 62 of `input`
pub fn every_second_bit(input: u64) -> u32 {
    (0..32).fold(0u32, |acc, c| acc | ((((input >> (c * 2)) & 1) as u32) << c))
}

/// GUID top part shared by every instance of `model` with `material`
pub fn object_id_top_part(model: &str, material: &str) -> u64 {
    let model_and_material = hash64_seeded(model, hash64(material));
    u64::from(every_second_bit(model_and_material)) << 32
}

pub fn random_guid32() -> u32 {
    rand::thread_rng().r#gen()
}

/// Pick `top_part | random` until `exists` rejects nothing.
///
/// Terminates for any cell with fewer than 2^32 objects under that top part.
pub fn allocate_guid(top_part: u64, exists: impl Fn(u64) -> bool) -> u64 {
    loop {
        let id = top_part | u64::from(random_guid32());
        if !exists(id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_second_bit() {
        assert_eq!(every_second_bit(0b0101), 0b11);
        assert_eq!(every_second_bit(0b1010), 0);
        assert_eq!(every_second_bit(u64::MAX), u32::MAX);
    }

    #[test]
    fn test_top_part_is_deterministic() {
        let a = object_id_top_part("tree.mdl", "bark.mat");
        assert_eq!(a, object_id_top_part("tree.mdl", "bark.mat"));
        assert_ne!(a, object_id_top_part("tree.mdl", "leaf.mat"));
        assert_eq!(a & 0xffff_ffff, 0);
    }

    #[test]
    fn test_allocate_guid_avoids_taken() {
        let top = object_id_top_part("rock.mdl", "stone.mat");
        let first = allocate_guid(top, |_| false);
        let second = allocate_guid(top, |id| id == first);
        assert_ne!(first, second);
        assert_eq!(second & !0xffff_ffff, top);
    }
}
