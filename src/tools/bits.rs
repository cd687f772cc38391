//! Bit level I/O.  Bits are always packed MSB first.
//!
//! * `BitPacker` accumulates codes and writes whole bytes as they become available
//! * `BitReader` pulls single bits or short codes from a byte stream, one byte at a time

use bit_vec::BitVec;
use std::io::{Read,Write};

/// Accumulates variable length codes and writes them out byte aligned.
/// Bytes are written once more than `chunk_bits` bits are pending.
pub struct BitPacker {
    bits: BitVec,
    chunk_bits: usize,
    count: u64
}

impl BitPacker {
    /// `chunk_bytes` is the flush threshold, it should be at least 1
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            bits: BitVec::new(),
            chunk_bits: 8 * chunk_bytes.max(1),
            count: 0
        }
    }
    /// number of bytes written so far
    pub fn count(&self) -> u64 {
        self.count
    }
    /// number of bits not written yet
    pub fn pending(&self) -> usize {
        self.bits.len()
    }
    /// Append `code`, writing complete bytes if the threshold is exceeded.
    pub fn put_code<W: Write>(&mut self,code: &BitVec,writer: &mut W) -> Result<(),std::io::Error> {
        self.bits.extend(code.iter());
        if self.bits.len() > self.chunk_bits {
            self.write_whole_bytes(writer)?;
        }
        Ok(())
    }
    /// Append `num_bits` of `val` starting from the MSB, no flush is attempted.
    pub fn put_bits(&mut self,num_bits: usize,val: usize) {
        for i in (0..num_bits).rev() {
            self.bits.push((val >> i) & 1 > 0);
        }
    }
    /// write out the complete bytes, the incomplete byte stays in the accumulator
    fn write_whole_bytes<W: Write>(&mut self,writer: &mut W) -> Result<(),std::io::Error> {
        let whole = 8 * (self.bits.len() / 8);
        let mut rem = BitVec::new();
        for i in whole..self.bits.len() {
            rem.push(self.bits[i]);
        }
        self.bits.truncate(whole);
        let bytes = self.bits.to_bytes();
        writer.write_all(&bytes)?;
        self.count += bytes.len() as u64;
        log::trace!("packed {} bytes, {} bits left over",bytes.len(),rem.len());
        self.bits = rem;
        Ok(())
    }
    /// Write everything, padding the last byte on the right with zeros.
    pub fn finish<W: Write>(&mut self,writer: &mut W) -> Result<(),std::io::Error> {
        // `to_bytes` pads with zeros
        let bytes = self.bits.to_bytes();
        writer.write_all(&bytes)?;
        self.count += bytes.len() as u64;
        self.bits = BitVec::new();
        Ok(())
    }
}

/// Reads bits from a stream without reading ahead by more than one byte.
/// Unused bits of the last byte are abandoned when the reader is dropped.
pub struct BitReader {
    bits: BitVec,
    ptr: usize,
    count: u64
}

impl BitReader {
    pub fn new() -> Self {
        Self {
            bits: BitVec::new(),
            ptr: 0,
            count: 0
        }
    }
    /// number of bytes taken from the stream so far
    pub fn count(&self) -> u64 {
        self.count
    }
    /// Get the next bit, reading another byte from the stream as needed.
    pub fn get_bit<R: Read>(&mut self,reader: &mut R) -> Result<bool,std::io::Error> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(bit)
            },
            None => {
                let mut by: [u8;1] = [0];
                reader.read_exact(&mut by)?;
                self.count += 1;
                self.bits = BitVec::from_bytes(&by);
                self.ptr = 0;
                self.get_bit(reader)
            }
        }
    }
    /// Get `num_bits` bits as an unsigned value, MSB first
    pub fn get_code<R: Read>(&mut self,num_bits: usize,reader: &mut R) -> Result<usize,std::io::Error> {
        let mut ans: usize = 0;
        for _i in 0..num_bits {
            ans <<= 1;
            ans |= self.get_bit(reader)? as usize;
        }
        Ok(ans)
    }
}

#[test]
fn packer_pads_last_byte() {
    let mut out: Vec<u8> = Vec::new();
    let mut packer = BitPacker::new(1);
    let code = BitVec::from_fn(3,|i| i != 1); // 101
    for _i in 0..4 {
        packer.put_code(&code,&mut out).expect("write failed");
    }
    // 101101101101 -> 9 bits exceed the 8 bit threshold after the third code
    assert_eq!(packer.count(),1);
    assert_eq!(packer.pending(),4);
    packer.finish(&mut out).expect("write failed");
    assert_eq!(out,hex::decode("B6D0").unwrap());
    assert_eq!(packer.count(),2);
    assert_eq!(packer.pending(),0);
}

#[test]
fn packer_holds_bits_under_threshold() {
    let mut out: Vec<u8> = Vec::new();
    let mut packer = BitPacker::new(4);
    packer.put_bits(16,0xABCD);
    packer.put_code(&BitVec::from_elem(8,true),&mut out).expect("write failed");
    assert!(out.is_empty());
    packer.finish(&mut out).expect("write failed");
    assert_eq!(out,hex::decode("ABCDFF").unwrap());
}

#[test]
fn reader_reads_msb_first() {
    let mut src = std::io::Cursor::new(hex::decode("A5F0").unwrap());
    let mut reader = BitReader::new();
    assert_eq!(reader.get_bit(&mut src).unwrap(),true);
    assert_eq!(reader.get_bit(&mut src).unwrap(),false);
    assert_eq!(reader.get_code(10,&mut src).unwrap(),0b10_0101_1111);
    assert_eq!(reader.get_code(4,&mut src).unwrap(),0);
    assert_eq!(reader.count(),2);
    assert!(reader.get_bit(&mut src).is_err());
}
