//! # MLZ codec
//!
//! A masked-symbol variant of LZW: each input byte carries a parallel mask
//! width (`0..=7`) telling the dictionary how many high-order bits are
//! significant at that position, so the dictionary can match inputs that
//! only share a prefix under a given mask. Used as the lossless entropy
//! layer of an audio/image subband codec; this crate treats it in
//! isolation, leaving bit-level I/O and the surrounding codec to the
//! caller.
//!
//! ## Buffer example
//!
//! ```rs
//! use mlz_codec::mlz;
//! let data = b"abracadabra abracadabra abracadabra";
//! let compressed = mlz::compress_slice(data).expect("compression failed");
//! let expanded = mlz::expand_slice(&compressed).expect("expansion failed");
//! assert_eq!(data.to_vec(), expanded);
//! ```
//!
//! ## Masked example
//!
//! ```rs
//! use mlz_codec::mlz;
//! let data = [0x41u8, 0x43];
//! let mask = [0u8, 3]; // second byte only significant in its top 3 bits
//! let compressed = mlz::compress_slice_masked(&data, &mask).expect("compression failed");
//! ```

pub mod mlz;
