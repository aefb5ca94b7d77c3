use crate::libs::error::Result;
use crate::libs::index::AlignmentIndex;
use crate::libs::insert_size::{insert_size, Distribution};
use crate::libs::sam::{Alignment, Flags};

/// Mates whose insert size scores at least this are flagged as properly paired
pub const PROPER_PAIR_MIN_SCORE: u8 = 3;

/// SAM flags of a finalized read, given its own record and its mate's.
///
/// ```
/// use pairsel::libs::flags::pair_flags;
/// use pairsel::libs::insert_size::Distribution;
/// use pairsel::libs::sam::{Alignment, Flags};
///
/// let dist = Distribution::from_values([
///     100.0, 150.0, 200.0, 250.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0,
/// ]);
/// let a_1 = Alignment::new("r/1", "chr1", 1000, "100M", false);
/// let a_2 = Alignment::new("r/2", "chr1", 1300, "100M", true);
/// assert_eq!(
///     pair_flags(&a_1, &a_2, true, &dist),
///     Flags::SEGMENTED
///         | Flags::PROPERLY_SEGMENTED
///         | Flags::MATE_REVERSE_COMPLEMENTED
///         | Flags::FIRST_SEGMENT
/// );
/// ```
pub fn pair_flags(read: &Alignment, mate: &Alignment, first: bool, dist: &Distribution) -> Flags {
    let mut flags = Flags::SEGMENTED;

    if !read.is_aligned() {
        flags |= Flags::UNMAPPED;
    }
    flags |= if first {
        Flags::FIRST_SEGMENT
    } else {
        Flags::LAST_SEGMENT
    };
    if read.is_aligned() && read.is_reverse() {
        flags |= Flags::REVERSE_COMPLEMENTED;
    }

    if !mate.is_aligned() {
        flags |= Flags::MATE_UNMAPPED;
    } else {
        if mate.is_reverse() {
            flags |= Flags::MATE_REVERSE_COMPLEMENTED;
        }
        if read.is_aligned() && dist.score_pair(read, mate) >= PROPER_PAIR_MIN_SCORE {
            flags |= Flags::PROPERLY_SEGMENTED;
        }
    }

    flags
}

/// Replaces the flags of the final record of every read.
///
/// Only the parse-time strand and aligned bits are consulted, never the
/// previous flags, so running this twice gives the same result.
pub fn reconcile_flags(index: &mut AlignmentIndex, dist: &Distribution) -> Result<()> {
    let names = index.pair_names().to_vec();
    let mut proper = 0;

    for name in &names {
        index.pair(name)?;
        let name_1 = format!("{}/1", name);
        let name_2 = format!("{}/2", name);

        let flags_1 = pair_flags(
            index.final_alignment(&name_1),
            index.final_alignment(&name_2),
            true,
            dist,
        );
        let flags_2 = pair_flags(
            index.final_alignment(&name_2),
            index.final_alignment(&name_1),
            false,
            dist,
        );
        if flags_1.contains(Flags::PROPERLY_SEGMENTED) {
            proper += 1;
        }

        index.final_alignment_mut(&name_1).flags = flags_1;
        index.final_alignment_mut(&name_2).flags = flags_2;
    }

    log::info!("{} read pairs are properly paired", proper);
    Ok(())
}

/// Fills RNEXT, PNEXT and TLEN of every final record from its mate.
///
/// An unaligned read whose mate is aligned is placed at its mate's position,
/// the usual convention for keeping mates together in coordinate-sorted files.
pub fn fix_mate_fields(index: &mut AlignmentIndex) -> Result<()> {
    let names = index.pair_names().to_vec();

    for name in &names {
        index.pair(name)?;
        let name_1 = format!("{}/1", name);
        let name_2 = format!("{}/2", name);
        let mut a_1 = index.final_alignment(&name_1).clone();
        let mut a_2 = index.final_alignment(&name_2).clone();

        match (a_1.is_aligned(), a_2.is_aligned()) {
            (true, true) => {
                set_mate(&mut a_1, &a_2);
                set_mate(&mut a_2, &a_1);
                if a_1.ref_name == a_2.ref_name {
                    let size = insert_size(&a_1, &a_2) as i32;
                    let first_is_leftmost = a_1.ref_start <= a_2.ref_start;
                    a_1.tlen = if first_is_leftmost { size } else { -size };
                    a_2.tlen = -a_1.tlen;
                }
            }
            (true, false) => place_with_mate(&mut a_2, &mut a_1),
            (false, true) => place_with_mate(&mut a_1, &mut a_2),
            (false, false) => {
                for a in [&mut a_1, &mut a_2] {
                    a.mate_ref_name = "*".to_string();
                    a.mate_pos = 0;
                    a.tlen = 0;
                }
            }
        }

        *index.final_alignment_mut(&name_1) = a_1;
        *index.final_alignment_mut(&name_2) = a_2;
    }

    Ok(())
}

fn set_mate(read: &mut Alignment, mate: &Alignment) {
    read.mate_ref_name = if read.ref_name == mate.ref_name {
        "=".to_string()
    } else {
        mate.ref_name.clone()
    };
    read.mate_pos = mate.ref_start + 1;
    read.tlen = 0;
}

fn place_with_mate(unaligned: &mut Alignment, aligned: &mut Alignment) {
    unaligned.ref_name = aligned.ref_name.clone();
    unaligned.ref_start = aligned.ref_start;
    unaligned.ref_end = aligned.ref_start;
    for a in [unaligned, aligned] {
        a.mate_ref_name = "=".to_string();
        a.mate_pos = a.ref_start + 1;
        a.tlen = 0;
    }
}
