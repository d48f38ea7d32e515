//! ## Sector Skewing Module
//!
//! This contains the sector skew tables for 5.25 inch Apple disks.
//! The skews are kept separate from file systems and images because both use them.
//!
//! A sector address is transformed as it propagates from a file system request
//! to the disk surface.  The file system asks for a "logical" sector, which its
//! own RWTS would transform into a "physical" sector on the track.  A disk image
//! file stores the sectors of each track contiguously in one of these orders,
//! so moving between orders is a matter of composing a logical-to-physical
//! permutation with a physical-to-logical one.

use crate::fs::DiskOrder;

/// Identity table used for raw ordering.
pub const IDENTITY: [usize;16] = [0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15];

/// Translate DOS 3.3 logical sector to physical sector.
/// See Understanding the Apple II, p. 9-42.
pub const DOS33_LSEC_TO_PSEC: [usize;16] = [
    0x00,0x0d,0x0b,0x09,0x07,0x05,0x03,0x01,
    0x0e,0x0c,0x0a,0x08,0x06,0x04,0x02,0x0f
];

/// Translate DOS 3.3 physical sector to logical sector.
pub const DOS33_PSEC_TO_LSEC: [usize;16] = [
    0x00,0x07,0x0e,0x06,0x0d,0x05,0x0c,0x04,
    0x0b,0x03,0x0a,0x02,0x09,0x01,0x08,0x0f
];

/// Translate ProDOS logical sector to physical sector.
/// See Understanding the Apple IIe, p. 9-43.
pub const PRODOS_LSEC_TO_PSEC: [usize;16] = [
    0x00,0x02,0x04,0x06,0x08,0x0a,0x0c,0x0e,
    0x01,0x03,0x05,0x07,0x09,0x0b,0x0d,0x0f
];

/// Translate ProDOS physical sector to logical sector.
pub const PRODOS_PSEC_TO_LSEC: [usize;16] = [
    0x00,0x08,0x01,0x09,0x02,0x0a,0x03,0x0b,
    0x04,0x0c,0x05,0x0d,0x06,0x0e,0x07,0x0f
];

/// Table taking a given ordering's logical sectors to physical sectors.
/// `Auto` maps to the identity; the dispatcher resolves it before this point.
pub fn logical_to_physical(order: DiskOrder) -> &'static [usize;16] {
    match order {
        DiskOrder::DOS => &DOS33_LSEC_TO_PSEC,
        DiskOrder::ProDOS => &PRODOS_LSEC_TO_PSEC,
        DiskOrder::Raw | DiskOrder::Auto => &IDENTITY
    }
}

/// Table taking physical sectors to a given ordering's logical sectors.
pub fn physical_to_logical(order: DiskOrder) -> &'static [usize;16] {
    match order {
        DiskOrder::DOS => &DOS33_PSEC_TO_LSEC,
        DiskOrder::ProDOS => &PRODOS_PSEC_TO_LSEC,
        DiskOrder::Raw | DiskOrder::Auto => &IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// every table must be the inverse of its partner
    #[test]
    fn tables_are_inverses() {
        for i in 0..16 {
            assert_eq!(DOS33_PSEC_TO_LSEC[DOS33_LSEC_TO_PSEC[i]],i);
            assert_eq!(PRODOS_PSEC_TO_LSEC[PRODOS_LSEC_TO_PSEC[i]],i);
            assert_eq!(IDENTITY[i],i);
        }
    }
}
