//! Dictionary (component A) and masked hash index (component B).
//!
//! Bundled into one type because the original source bundles them: every
//! `MLZ` instance in `examples/original_source/libavcodec/mlz.c` owns
//! `p_dict`/`pp_hash_table` (and a second copy, `bp_dict`/`bpp_hash_table`,
//! for the encoder's backup shadow) as one unit, and the hash index's
//! `candidates` lookup has to dereference dictionary entries to verify a
//! match anyway.

use super::{CODE_UNSET, CODE_BIT_MAX, DIC_INDEX_MAX, FIRST_CODE, MAX_SEARCH, TABLE_SIZE, WORD_SIZE};
use super::Error;

/// A node in the implicit trie over the input. Codes `0..255` are implicit
/// literal leaves and are never stored here.
#[derive(Clone, Copy)]
struct Entry {
    string_code: i32,
    parent_code: i32,
    char_code: i32,
    match_len: i32,
}

impl Entry {
    const EMPTY: Self = Self { string_code: CODE_UNSET, parent_code: CODE_UNSET, char_code: CODE_UNSET, match_len: 0 };
}

#[derive(Clone)]
pub(crate) struct Dictionary {
    entries: Vec<Entry>,
    /// `hash[i][w]` is the dictionary code (or `CODE_UNSET`) occupying probe
    /// slot `i` of column `w`.
    hash: Vec<[i32; WORD_SIZE]>,
}

/// Top `w` bits of an 8-bit char, set. `w = 0` gives `0x00` (matches
/// nothing distinctively — see [`Dictionary::candidates`]'s doc comment for
/// why that is *not* what `install_hashed` uses at `w = 0`).
///
/// `w` is clamped to `0..=WORD_SIZE` (valid mask widths are `0..=7`) so this
/// can never underflow/overflow on an out-of-range width; callers that take
/// mask bytes from outside the crate (`Encoder::encode`) reject anything
/// over 7 before it reaches here, so the clamp is a second line of defense,
/// not the primary validation.
fn mask_for_width(w: usize) -> i32 {
    let w = (w as u32).min(WORD_SIZE as u32);
    (((1i32 << w) - 1) << (WORD_SIZE as u32 - w)) & 0xff
}

/// First probe index for `(parent, char_masked)`, reduced into
/// `[0, TABLE_SIZE)`. The original C computes this without reducing it and
/// indexes directly, which is capable of reading out of bounds for large
/// `parent` values; safe Rust cannot do that, so the reduction happens here
/// instead (see `DESIGN.md`, Open Question resolutions).
fn probe_origin(parent: i32, char_masked: i32) -> i32 {
    let h0 = ((char_masked as i64) << (CODE_BIT_MAX as i64 - WORD_SIZE as i64)) ^ parent as i64;
    h0.rem_euclid(TABLE_SIZE as i64) as i32
}

/// Probe stride for a given origin: `1` if the origin is `0`, else
/// `TABLE_SIZE - origin`.
fn probe_stride(h0: i32) -> i32 {
    if h0 == 0 { 1 } else { TABLE_SIZE - h0 }
}

impl Dictionary {
    pub fn new() -> Self {
        let mut d = Self {
            entries: vec![Entry::EMPTY; TABLE_SIZE as usize],
            hash: vec![[CODE_UNSET; WORD_SIZE]; TABLE_SIZE as usize],
        };
        d.flush();
        d
    }

    /// Mark every entry and hash cell unset. Does not reallocate.
    pub fn flush(&mut self) {
        for e in self.entries.iter_mut() {
            *e = Entry::EMPTY;
        }
        for row in self.hash.iter_mut() {
            *row = [CODE_UNSET; WORD_SIZE];
        }
    }

    /// `match_len` for a node whose parent is `parent`: 2 if the parent is a
    /// literal, else one more than the parent's own `match_len`.
    fn match_len_for(&self, parent: i32) -> i32 {
        if parent < FIRST_CODE {
            2
        } else {
            self.entries[parent as usize].match_len + 1
        }
    }

    /// Set the entry at `code` and index it into every mask-width column of
    /// the hash table.
    pub fn install(&mut self, code: i32, parent: i32, char: i32) {
        let match_len = self.match_len_for(parent);
        self.entries[code as usize] = Entry { string_code: code, parent_code: parent, char_code: char, match_len };
        self.install_hashed(code, parent, char);
    }

    /// Index `code` into every `w in 0..WORD_SIZE` column of the hash table.
    ///
    /// `w = 0` is special-cased to key on the **unmasked** char (full 8-bit
    /// specificity), matching `mlz_set_new_entry_to_dict_with_hash`'s direct
    /// `char_code` argument when `i == 0` in the original C — unlike every
    /// other width, which masks to the top `w` bits before hashing.
    fn install_hashed(&mut self, code: i32, parent: i32, char: i32) {
        for w in 0..WORD_SIZE {
            let char_masked = if w == 0 { char } else { char & mask_for_width(w) };
            let h0 = probe_origin(parent, char_masked);
            let stride = probe_stride(h0);
            let mut h = h0;
            while self.hash[h as usize][w] != CODE_UNSET {
                h = (h - stride).rem_euclid(TABLE_SIZE);
            }
            self.hash[h as usize][w] = code;
        }
    }

    /// Up to [`MAX_SEARCH`] dictionary codes that are children of `parent`
    /// via a char matching `char` under mask width `w`.
    ///
    /// `w = 0` here always zeroes the char before hashing and comparing
    /// (`mask_for_width(0) == 0x00`), so at width 0 this probes a chain keyed
    /// on `(parent, 0)` — a different chain than the one `install_hashed`
    /// populated for the same `(parent, char)` pair, since insertion used the
    /// unmasked char at width 0. This asymmetry is inherited verbatim from
    /// `mlz_get_hash_index`/`mlz_set_new_entry_to_dict_with_hash`; it is not
    /// a bug introduced here (see `spec.md` §9, Open Question (b)).
    pub fn candidates(&self, parent: i32, char: i32, w: usize) -> Vec<i32> {
        let column = w % WORD_SIZE;
        let mask = mask_for_width(w);
        let char_masked = char & mask;
        let h0 = probe_origin(parent, char_masked);
        let stride = probe_stride(h0);
        let mut out = Vec::with_capacity(MAX_SEARCH);
        let mut h = h0;
        loop {
            let code = self.hash[h as usize][column];
            if code == CODE_UNSET {
                break;
            }
            let e = &self.entries[code as usize];
            if e.parent_code == parent && (e.char_code & mask) == char_masked {
                out.push(code);
                if out.len() >= MAX_SEARCH {
                    break;
                }
            }
            h = (h - stride).rem_euclid(TABLE_SIZE);
        }
        out
    }

    pub fn match_len(&self, code: i32) -> i32 {
        self.entries[code as usize].match_len
    }

    /// Reconstruct the substring labeled by `code` into `buf`, right to
    /// left. Returns the number of bytes written and the literal that
    /// terminates the parent chain (`CODE_UNSET` if the chain never
    /// terminates within `buf`'s length — a safety net inherited from
    /// `decode_string`'s bounding `while (count < bufsize)` loop, not logged
    /// as an error since it is not one: it only fires when `buf` is shorter
    /// than the string it's asked to hold, which a correct caller never
    /// does).
    pub fn decode_string(&self, code: i32, buf: &mut [u8]) -> Result<(usize, i32), Error> {
        let mut current = code;
        let mut count = 0usize;
        loop {
            if count >= buf.len() {
                return Ok((count, CODE_UNSET));
            }
            if current == CODE_UNSET {
                return Ok((count, CODE_UNSET));
            }
            if current < FIRST_CODE {
                buf[0] = current as u8;
                return Ok((count + 1, current));
            }
            let e = self.entries[current as usize];
            let offset = (e.match_len - 1) as usize;
            if offset >= buf.len() {
                log::error!("MLZ offset error");
                return Err(Error::OutputOverflow);
            }
            buf[offset] = e.char_code as u8;
            count += 1;
            current = e.parent_code;
            if current < 0 || current > DIC_INDEX_MAX - 1 {
                log::error!("MLZ dic index error");
                return Err(Error::ChainIndexOutOfRange);
            }
        }
    }
}
