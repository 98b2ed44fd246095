//! Decoder (component C): reads variable-width codes from a [`BitSource`],
//! handles reserved codes, reconstructs symbols by walking parent chains,
//! and installs new entries mirroring the encoder.
//!
//! Grounded on `examples/original_source/libavcodec/mlz.c::ff_mlz_decompression`;
//! loop shape and error-return style follow `src/lzw.rs::expand`.

use super::dictionary::Dictionary;
use super::{
    read_code, BitSource, CodecState, Error, PartialOutput, CODE_UNSET, FIRST_CODE, FLUSH_CODE,
    FREEZE_CODE, MAX_CODE, TABLE_SIZE,
};

pub struct Decoder {
    dict: Dictionary,
    state: CodecState,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self { dict: Dictionary::new(), state: CodecState::new() }
    }

    /// Reset dictionary and state to the initial flushed configuration,
    /// preserving allocations. Idempotent: calling this twice in a row
    /// leaves the same state as calling it once.
    pub fn flush(&mut self) {
        self.dict.flush();
        self.state = CodecState::new();
    }

    /// Install `(next_code, parent, char)` and advance `next_code`, erroring
    /// if the table would overflow. Mirrors the order in the original C: the
    /// entry is written before the overflow check, so a rejected install
    /// still leaves the dictionary mutated (matching `ff_mlz_decompression`,
    /// which does the same before returning).
    fn install_and_advance(&mut self, parent: i32, char: i32) -> Result<(), Error> {
        self.dict.install(self.state.next_code, parent, char);
        if self.state.next_code >= TABLE_SIZE - 1 {
            log::error!("MLZ too many codes");
            return Err(Error::TableOverflow);
        }
        self.state.next_code += 1;
        Ok(())
    }

    /// Read codes from `src` until `size` bytes have been produced,
    /// reconstructing the original symbol sequence.
    pub fn decompress<B: BitSource>(&mut self, src: &mut B, size: usize) -> Result<Vec<u8>, PartialOutput> {
        let mut buf = vec![0u8; size];
        let mut output_chars = 0usize;
        let mut last_string_code: i32 = CODE_UNSET;

        log::debug!("MLZ decompress: target size {} bytes", size);
        while output_chars < size {
            let code = match read_code(src, self.state.dic_code_bit) {
                Some(c) => c,
                None => {
                    log::error!("MLZ bitstream truncated after {} of {} bytes", output_chars, size);
                    return Err(PartialOutput { data: buf[..output_chars].to_vec(), error: Error::TruncatedStream });
                }
            };
            log::trace!("code: {}", code);

            if code == FLUSH_CODE || code == MAX_CODE {
                self.flush();
                last_string_code = CODE_UNSET;
                continue;
            }
            if code == FREEZE_CODE {
                self.state.freeze_flag = true;
                continue;
            }
            if code > self.state.current_dic_index_max {
                log::error!("MLZ code {} exceeds current dictionary index maximum {}", code, self.state.current_dic_index_max);
                return Err(PartialOutput {
                    data: buf[..output_chars].to_vec(),
                    error: Error::CodeOutOfRange(code, self.state.current_dic_index_max),
                });
            }
            if code == self.state.bump_code {
                self.state.bump();
                continue;
            }
            if code >= self.state.next_code {
                // KwK: the encoder installed this code on the same step it
                // emitted it, so we don't have it yet. Reconstruct the
                // previous string, then repeat its own first char.
                let (n, first) = match self.dict.decode_string(last_string_code, &mut buf[output_chars..]) {
                    Ok(r) => r,
                    Err(e) => return Err(PartialOutput { data: buf[..output_chars].to_vec(), error: e }),
                };
                output_chars += n;
                let (n2, _) = match self.dict.decode_string(first, &mut buf[output_chars..]) {
                    Ok(r) => r,
                    Err(e) => return Err(PartialOutput { data: buf[..output_chars].to_vec(), error: e }),
                };
                output_chars += n2;
                if let Err(e) = self.install_and_advance(last_string_code, first) {
                    return Err(PartialOutput { data: buf[..output_chars].to_vec(), error: e });
                }
                last_string_code = code;
            } else {
                let (n, first) = match self.dict.decode_string(code, &mut buf[output_chars..]) {
                    Ok(r) => r,
                    Err(e) => return Err(PartialOutput { data: buf[..output_chars].to_vec(), error: e }),
                };
                output_chars += n;
                if !self.state.freeze_flag && last_string_code != CODE_UNSET {
                    if let Err(e) = self.install_and_advance(last_string_code, first) {
                        return Err(PartialOutput { data: buf[..output_chars].to_vec(), error: e });
                    }
                }
                last_string_code = code;
            }
        }
        log::debug!("MLZ decompress done: {} bytes", output_chars);
        Ok(buf)
    }
}
