//! MLZ codec: a masked-symbol variant of LZW.
//!
//! `dictionary` holds the trie over the symbol stream plus the masked
//! open-address hash index used to search it; `decoder` and `encoder` are
//! the two drivers that read and write it. All three share the reserved
//! codes, the bump/flush/freeze protocol, and the variable-width code
//! emission rule documented on each of them.
//!
//! Bit I/O is deliberately asymmetric: the encoder emits codes MSB-first as
//! one bit per output byte (`0x00`/`0x01`), the decoder reads codes LSB-first
//! from whatever [`BitSource`] the caller supplies. This mirrors the
//! upstream format and is preserved here rather than smoothed over.

mod dictionary;
mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

use bit_vec::BitVec;

pub(crate) const CODE_UNSET: i32 = -1;
pub(crate) const CODE_BIT_INIT: u32 = 9;
pub(crate) const CODE_BIT_MAX: u32 = 15;
pub(crate) const DIC_INDEX_INIT: i32 = 512;
pub(crate) const DIC_INDEX_MAX: i32 = 32768;
pub(crate) const FLUSH_CODE: i32 = 256;
pub(crate) const FREEZE_CODE: i32 = 257;
pub(crate) const FIRST_CODE: i32 = 258;
pub(crate) const MAX_CODE: i32 = 32767;
pub(crate) const TABLE_SIZE: i32 = 35023;
pub(crate) const WORD_SIZE: usize = 8;
pub(crate) const MAX_SEARCH: usize = 4;

/// Errors reported on the logging channel and returned to the caller
/// alongside whatever output was produced before the fault.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("MLZ code {0} exceeds current dictionary index maximum {1}")]
    CodeOutOfRange(i32, i32),
    #[error("MLZ dictionary index out of range during chain walk")]
    ChainIndexOutOfRange,
    #[error("MLZ decode_string offset exceeds remaining output buffer")]
    OutputOverflow,
    #[error("MLZ dictionary table overflow, too many codes")]
    TableOverflow,
    #[error("MLZ bitstream truncated before expected output size was reached")]
    TruncatedStream,
    #[error("MLZ encode buffer capacity exceeded")]
    EncodeCapacityExceeded,
    #[error("MLZ mask byte {0} at position {1} exceeds the maximum mask width 7")]
    InvalidMaskWidth(u8, usize),
}

/// The bytes or bits produced before an [`Error`] terminated the operation.
#[derive(Debug)]
pub struct PartialOutput {
    pub data: Vec<u8>,
    pub error: Error,
}

/// Shared state evolved identically by the encoder and decoder.
///
/// Invariant: `bump_code + 1 == current_dic_index_max == 2^dic_code_bit`
/// holds on entry to and exit from every public operation.
#[derive(Clone)]
pub(crate) struct CodecState {
    pub dic_code_bit: u32,
    pub current_dic_index_max: i32,
    pub bump_code: i32,
    pub next_code: i32,
    pub freeze_flag: bool,
}

impl CodecState {
    fn new() -> Self {
        Self {
            dic_code_bit: CODE_BIT_INIT,
            current_dic_index_max: DIC_INDEX_INIT,
            bump_code: DIC_INDEX_INIT - 1,
            next_code: FIRST_CODE,
            freeze_flag: false,
        }
    }
    /// Widen the code space: double `current_dic_index_max`, recompute
    /// `bump_code`, grow `dic_code_bit` by one.
    fn bump(&mut self) {
        self.dic_code_bit += 1;
        self.current_dic_index_max *= 2;
        self.bump_code = self.current_dic_index_max - 1;
    }
}

/// A source of individual bits, read in stream order. Out of scope per the
/// codec's own spec (an external collaborator), but a concrete pair of
/// adapters ships here so the crate is usable without an outer subband
/// codec supplying one.
pub trait BitSource {
    /// Returns the next bit, or `None` at end of stream.
    fn read_bit(&mut self) -> Option<bool>;
}

/// A sink for individual bits, written in stream order, with a capacity the
/// sink itself enforces.
pub trait BitSink {
    /// Appends one bit. Returns `Err` if the sink's capacity is exhausted.
    fn write_bit(&mut self, bit: bool) -> Result<(), Error>;
}

/// Reads bits LSB-first within each byte of a borrowed slice: bit 0 of
/// `bytes[0]` is read first. This is the shape `Decoder::decompress` expects
/// from whatever bitstream the caller packed.
pub struct SliceBitSource<'a> {
    bytes: &'a [u8],
    bit_pos: usize,
}

impl<'a> SliceBitSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, bit_pos: 0 }
    }
}

impl<'a> BitSource for SliceBitSource<'a> {
    fn read_bit(&mut self) -> Option<bool> {
        let byte = self.bit_pos / 8;
        let bit = self.bit_pos % 8;
        if byte >= self.bytes.len() {
            return None;
        }
        self.bit_pos += 1;
        Some((self.bytes[byte] >> bit) & 1 != 0)
    }
}

/// Literal realization of `spec.md`'s `out_bits[]`: one bit per output byte,
/// `0x00` or `0x01`, bounded by a fixed bit capacity.
pub struct ByteBitSink {
    bits: Vec<u8>,
    cap_bits: usize,
}

impl ByteBitSink {
    pub fn new(cap_bits: usize) -> Self {
        Self { bits: Vec::with_capacity(cap_bits), cap_bits }
    }
    pub fn into_bits(self) -> Vec<u8> {
        self.bits
    }
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }
}

impl BitSink for ByteBitSink {
    fn write_bit(&mut self, bit: bool) -> Result<(), Error> {
        if self.bits.len() >= self.cap_bits {
            return Err(Error::EncodeCapacityExceeded);
        }
        self.bits.push(bit as u8);
        Ok(())
    }
}

/// Read `num_bits` from `src`, assembling the code LSB-first: the first bit
/// read becomes bit 0 of the returned code. Returns `None` on a truncated
/// stream (fewer bits available than requested).
pub(crate) fn read_code<B: BitSource>(src: &mut B, num_bits: u32) -> Option<i32> {
    let mut code: i32 = 0;
    for i in 0..num_bits {
        let bit = src.read_bit()?;
        if bit {
            code |= 1 << i;
        }
    }
    Some(code)
}

/// Write `code` to `sink` MSB-first within a `num_bits`-wide field, matching
/// `mlz_output_code` in the original source exactly.
pub(crate) fn write_code<S: BitSink>(sink: &mut S, num_bits: u32, code: i32) -> Result<(), Error> {
    for i in 0..num_bits {
        let bit = (code >> (num_bits - i - 1)) & 1 != 0;
        sink.write_bit(bit)?;
    }
    Ok(())
}

/// Packs a one-bit-per-byte buffer (as returned by [`Encoder::encode`]) into
/// real bytes, LSB-first within each byte. This is a generic bit-packing
/// helper, not part of the MLZ core — `spec.md` treats the encoder's raw
/// bit-per-byte output as the contract and leaves packing to the caller.
pub fn pack_bits_lsb0(bits: &[u8]) -> Vec<u8> {
    let mut v = BitVec::from_elem(bits.len(), false);
    for (i, b) in bits.iter().enumerate() {
        v.set(i, *b != 0);
    }
    bits_to_bytes_lsb0(&v)
}

fn bits_to_bytes_lsb0(bits: &BitVec) -> Vec<u8> {
    let mut ans = Vec::new();
    let byte_count = bits.len() / 8;
    let rem = bits.len() % 8;
    for i in 0..byte_count {
        let mut val = 0u8;
        for b in 0..8 {
            val |= (bits.get(i * 8 + b).unwrap() as u8) << b;
        }
        ans.push(val);
    }
    if rem > 0 {
        let mut val = 0u8;
        for b in 0..rem {
            val |= (bits.get(byte_count * 8 + b).unwrap() as u8) << b;
        }
        ans.push(val);
    }
    ans
}

/// Compress `data` with an all-zero mask (the degenerate, always-round-trips
/// case from `spec.md` §8's round-trip law), prefixing a 4-byte little-endian
/// expanded-size header in the style of `lzss_huff::compress`/
/// `td0::compress_slice`.
pub fn compress_slice(data: &[u8]) -> Result<Vec<u8>, Error> {
    compress_slice_masked(data, &vec![0u8; data.len()])
}

/// As [`compress_slice`], but with an explicit per-byte mask width (`0..=7`).
pub fn compress_slice_masked(data: &[u8], mask: &[u8]) -> Result<Vec<u8>, Error> {
    let mut enc = Encoder::new();
    let bits = match enc.encode(data, mask) {
        Ok(bits) => bits,
        Err(p) => {
            log::error!("MLZ encode failed: {}", p.error);
            return Err(p.error);
        }
    };
    let packed = pack_bits_lsb0(&bits);
    let mut ans = u32::to_le_bytes(data.len() as u32).to_vec();
    ans.extend(packed);
    Ok(ans)
}

/// Inverse of [`compress_slice`].
pub fn expand_slice(data: &[u8]) -> Result<Vec<u8>, Error> {
    if data.len() < 4 {
        log::error!("MLZ compressed buffer missing size header");
        return Err(Error::TruncatedStream);
    }
    let size = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let mut src = SliceBitSource::new(&data[4..]);
    let mut dec = Decoder::new();
    match dec.decompress(&mut src, size) {
        Ok(out) => Ok(out),
        Err(p) => {
            log::error!("MLZ decode failed: {}", p.error);
            Err(p.error)
        }
    }
}
