//! QR Code Model 2 symbol generation.
//!
//! [`SymbolMatrix::encode`] turns an embedding string into a finished module
//! grid: it picks the densest segment mode the content allows (numeric,
//! alphanumeric, byte), selects the smallest version 1..=40 that fits,
//! appends Reed-Solomon error correction, interleaves blocks, places the
//! codewords in the zigzag order, and selects the mask with the lowest
//! penalty score. The result is immutable and deterministic for a given
//! (content, ecc) pair.

use tracing::debug;

use crate::error::{Error, Result};

/// Error correction level of a QR symbol.
///
/// Levels order by recovery strength: `Low` tolerates ~7% damaged
/// codewords, `Medium` ~15%, `Quartile` ~25%, `High` ~30%. Serialized as
/// the standard single letters `L`/`M`/`Q`/`H`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize,
)]
pub enum EccLevel {
    #[serde(rename = "L", alias = "low")]
    Low,
    #[default]
    #[serde(rename = "M", alias = "medium")]
    Medium,
    #[serde(rename = "Q", alias = "quartile")]
    Quartile,
    #[serde(rename = "H", alias = "high")]
    High,
}

impl EccLevel {
    fn ordinal(self) -> usize {
        match self {
            EccLevel::Low => 0,
            EccLevel::Medium => 1,
            EccLevel::Quartile => 2,
            EccLevel::High => 3,
        }
    }

    /// The 2-bit value carried in the format information.
    fn format_bits(self) -> u8 {
        match self {
            EccLevel::Low => 1,
            EccLevel::Medium => 0,
            EccLevel::Quartile => 3,
            EccLevel::High => 2,
        }
    }
}

/// A QR code version (1 to 40). The symbol side length is `4 * v + 17`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(u8);

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.0 <= ver && ver <= Version::MAX.0,
            "version number out of range"
        );
        Self(ver)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules of a symbol of this version.
    pub const fn side_len(self) -> usize {
        self.0 as usize * 4 + 17
    }
}

/// A finished QR symbol: a square grid of dark and light modules.
///
/// The grid is stored row-major; `true` is a dark module. Instances only
/// come out of [`SymbolMatrix::encode`] and are immutable afterwards, so a
/// matrix can be rendered to several formats without re-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatrix {
    size: usize,
    version: Version,
    ecc: EccLevel,
    mask: u8,
    modules: Vec<bool>,
}

impl SymbolMatrix {
    /// Encodes `content` into the smallest symbol that holds it.
    ///
    /// The error correction level is raised above `ecc` when the chosen
    /// version has spare capacity, never lowered. Fails with
    /// [`Error::DataOverCapacity`] when the content does not fit version 40
    /// at the requested level.
    pub fn encode(content: &str, ecc: EccLevel) -> Result<SymbolMatrix> {
        let segment = Segment::for_text(content);
        let (version, ecc, codewords) = assemble_codewords(&segment, ecc)?;
        let interleaved = add_ecc_and_interleave(&codewords, version, ecc);

        let mut builder = MatrixBuilder::new(version, ecc);
        builder.draw_function_patterns();
        builder.draw_codewords(&interleaved);
        let mask = builder.select_mask();
        builder.apply_mask(mask);
        builder.draw_format_bits(mask);

        debug!(
            version = version.value(),
            ecc = ?ecc,
            mask,
            size = version.side_len(),
            "encoded symbol"
        );
        Ok(builder.finish(mask))
    }

    /// Side length in modules.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The error correction level actually encoded, after any boost.
    pub fn ecc(&self) -> EccLevel {
        self.ecc
    }

    /// The mask pattern the penalty scoring selected, 0 to 7.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Whether the module at (x, y) is dark. Both coordinates must be less
    /// than [`SymbolMatrix::size`].
    pub fn module(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.size + x]
    }

    /// The full grid, row-major, `size * size` entries.
    pub fn modules(&self) -> &[bool] {
        &self.modules
    }
}

// ---------------------------------------------------------------------------
// Segments

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

impl SegmentMode {
    fn mode_bits(self) -> u32 {
        match self {
            SegmentMode::Numeric => 0x1,
            SegmentMode::Alphanumeric => 0x2,
            SegmentMode::Byte => 0x4,
        }
    }

    /// Width of the character count field at the given version.
    fn char_count_bits(self, version: Version) -> u8 {
        let bucket = usize::from((version.value() + 7) / 17);
        match self {
            SegmentMode::Numeric => [10, 12, 14][bucket],
            SegmentMode::Alphanumeric => [9, 11, 13][bucket],
            SegmentMode::Byte => [8, 16, 16][bucket],
        }
    }
}

/// One run of content in a single encoding mode.
struct Segment {
    mode: SegmentMode,
    num_chars: usize,
    bits: BitBuffer,
}

impl Segment {
    /// Builds a segment in the densest mode the text allows.
    fn for_text(text: &str) -> Segment {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            Segment::numeric(text)
        } else if text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c)) {
            Segment::alphanumeric(text)
        } else {
            Segment::bytes(text.as_bytes())
        }
    }

    fn numeric(text: &str) -> Segment {
        let mut bits = BitBuffer::new();
        let mut accum: u32 = 0;
        let mut count: u8 = 0;
        for b in text.bytes() {
            accum = accum * 10 + u32::from(b - b'0');
            count += 1;
            if count == 3 {
                bits.append_bits(accum, 10);
                accum = 0;
                count = 0;
            }
        }
        if count > 0 {
            bits.append_bits(accum, count * 3 + 1);
        }
        Segment {
            mode: SegmentMode::Numeric,
            num_chars: text.len(),
            bits,
        }
    }

    fn alphanumeric(text: &str) -> Segment {
        let mut bits = BitBuffer::new();
        let mut accum: u32 = 0;
        let mut count: u8 = 0;
        for c in text.chars() {
            // for_text only routes charset members here
            let index = ALPHANUMERIC_CHARSET.find(c).unwrap_or(0);
            accum = accum * 45 + index as u32;
            count += 1;
            if count == 2 {
                bits.append_bits(accum, 11);
                accum = 0;
                count = 0;
            }
        }
        if count > 0 {
            bits.append_bits(accum, 6);
        }
        Segment {
            mode: SegmentMode::Alphanumeric,
            num_chars: text.len(),
            bits,
        }
    }

    fn bytes(data: &[u8]) -> Segment {
        let mut bits = BitBuffer::new();
        for &b in data {
            bits.append_bits(b.into(), 8);
        }
        Segment {
            mode: SegmentMode::Byte,
            num_chars: data.len(),
            bits,
        }
    }

    /// Total bit cost at the given version, or `None` when the character
    /// count does not fit that version's count field.
    fn total_bits(&self, version: Version) -> Option<usize> {
        let ccbits = self.mode.char_count_bits(version);
        if self.num_chars >= (1usize << ccbits) {
            return None;
        }
        Some(4 + usize::from(ccbits) + self.bits.len())
    }
}

/// Assembles the data codeword stream: mode header, content bits,
/// terminator, and pad bytes, at the smallest fitting version.
fn assemble_codewords(segment: &Segment, mut ecc: EccLevel) -> Result<(Version, EccLevel, Vec<u8>)> {
    let mut version = Version::MIN;
    let used_bits = loop {
        let capacity = num_data_codewords(version, ecc) * 8;
        match segment.total_bits(version) {
            Some(n) if n <= capacity => break n,
            total => {
                if version == Version::MAX {
                    return Err(match total {
                        Some(needed) => Error::DataOverCapacity { needed, capacity },
                        None => Error::SegmentTooLong,
                    });
                }
                version = Version::new(version.value() + 1);
            }
        }
    };

    // Raise the level as far as the spare capacity of this version allows.
    for &boosted in &[EccLevel::Medium, EccLevel::Quartile, EccLevel::High] {
        if used_bits <= num_data_codewords(version, boosted) * 8 {
            ecc = boosted;
        }
    }

    let capacity_bits = num_data_codewords(version, ecc) * 8;
    let mut bits = BitBuffer::new();
    bits.append_bits(segment.mode.mode_bits(), 4);
    bits.append_bits(segment.num_chars as u32, segment.mode.char_count_bits(version));
    bits.extend(&segment.bits);
    debug_assert_eq!(bits.len(), used_bits);

    // Terminator, then zero bits up to a codeword boundary.
    let terminator = 4.min(capacity_bits - bits.len());
    bits.append_bits(0, terminator as u8);
    let boundary = bits.len().wrapping_neg() & 7;
    bits.append_bits(0, boundary as u8);
    debug_assert_eq!(bits.len() % 8, 0);

    for &pad in [0xEC, 0x11].iter().cycle() {
        if bits.len() >= capacity_bits {
            break;
        }
        bits.append_bits(pad, 8);
    }
    Ok((version, ecc, bits.into_bytes()))
}

/// An appendable big-endian bit string.
struct BitBuffer(Vec<bool>);

impl BitBuffer {
    fn new() -> Self {
        BitBuffer(Vec::new())
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    /// Appends the `len` low-order bits of `val`, most significant first.
    fn append_bits(&mut self, val: u32, len: u8) {
        debug_assert!(len <= 31 && (val >> len) == 0);
        self.0.extend((0..len).rev().map(|i| (val >> i) & 1 != 0));
    }

    fn extend(&mut self, other: &BitBuffer) {
        self.0.extend_from_slice(&other.0);
    }

    /// Packs into bytes. The length must be a multiple of 8.
    fn into_bytes(self) -> Vec<u8> {
        debug_assert_eq!(self.0.len() % 8, 0);
        self.0
            .chunks(8)
            .map(|byte| byte.iter().fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Error correction

/// Splits the data codewords into blocks, appends the Reed-Solomon
/// remainder of each, and interleaves all blocks byte by byte.
fn add_ecc_and_interleave(data: &[u8], version: Version, ecc: EccLevel) -> Vec<u8> {
    debug_assert_eq!(data.len(), num_data_codewords(version, ecc));
    let num_blocks = table_get(&NUM_ERROR_CORRECTION_BLOCKS, version, ecc);
    let block_ecc_len = table_get(&ECC_CODEWORDS_PER_BLOCK, version, ecc);
    let raw_codewords = num_raw_data_modules(version) / 8;
    let num_short_blocks = num_blocks - raw_codewords % num_blocks;
    let short_data_len = raw_codewords / num_blocks - block_ecc_len;

    let rs = ReedSolomon::new(block_ecc_len);
    let mut result = vec![0u8; raw_codewords];
    let mut offset = 0;
    for i in 0..num_blocks {
        let data_len = short_data_len + usize::from(i >= num_short_blocks);
        let block = &data[offset..offset + data_len];
        offset += data_len;
        let ecc_bytes = rs.remainder(block);

        // Data bytes go column-major; long blocks shift down past the
        // column the short blocks are missing.
        let mut k = i;
        for (j, &byte) in block.iter().enumerate() {
            if j == short_data_len {
                k -= num_short_blocks;
            }
            result[k] = byte;
            k += num_blocks;
        }
        let mut k = data.len() + i;
        for &byte in &ecc_bytes {
            result[k] = byte;
            k += num_blocks;
        }
    }
    debug_assert_eq!(offset, data.len());
    result
}

/// Reed-Solomon generator polynomial over GF(2^8 / 0x11D).
struct ReedSolomon {
    divisor: Vec<u8>,
}

impl ReedSolomon {
    fn new(degree: usize) -> Self {
        debug_assert!((1..=30).contains(&degree));
        // Build (x - r^0)(x - r^1)...(x - r^{degree-1}) with r = 0x02.
        let mut divisor = vec![0u8; degree];
        divisor[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = gf_mul(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = gf_mul(root, 0x02);
        }
        ReedSolomon { divisor }
    }

    /// Polynomial division remainder of `data` by the divisor.
    fn remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.divisor.len()];
        for &b in data {
            let factor = b ^ result[0];
            result.copy_within(1.., 0);
            let last = result.len() - 1;
            result[last] = 0;
            for (x, &y) in result.iter_mut().zip(self.divisor.iter()) {
                *x ^= gf_mul(y, factor);
            }
        }
        result
    }
}

fn gf_mul(x: u8, y: u8) -> u8 {
    let mut z: u8 = 0;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * 0x1D);
        z ^= ((y >> i) & 1) * x;
    }
    z
}

// ---------------------------------------------------------------------------
// Capacity tables

fn num_raw_data_modules(version: Version) -> usize {
    let ver = usize::from(version.value());
    let mut result = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

fn num_data_codewords(version: Version, ecc: EccLevel) -> usize {
    num_raw_data_modules(version) / 8
        - table_get(&ECC_CODEWORDS_PER_BLOCK, version, ecc)
            * table_get(&NUM_ERROR_CORRECTION_BLOCKS, version, ecc)
}

fn table_get(table: &'static [[i8; 41]; 4], version: Version, ecc: EccLevel) -> usize {
    table[ecc.ordinal()][usize::from(version.value())] as usize
}

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

// ---------------------------------------------------------------------------
// Module placement

/// Work-in-progress module grid plus the function-pattern reservation map.
struct MatrixBuilder {
    size: usize,
    version: Version,
    ecc: EccLevel,
    modules: Vec<bool>,
    is_function: Vec<bool>,
}

impl MatrixBuilder {
    fn new(version: Version, ecc: EccLevel) -> Self {
        let size = version.side_len();
        MatrixBuilder {
            size,
            version,
            ecc,
            modules: vec![false; size * size],
            is_function: vec![false; size * size],
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!((0..self.size as i32).contains(&x) && (0..self.size as i32).contains(&y));
        y as usize * self.size + x as usize
    }

    fn module(&self, x: i32, y: i32) -> bool {
        self.modules[self.index(x, y)]
    }

    fn set_module(&mut self, x: i32, y: i32, dark: bool) {
        let idx = self.index(x, y);
        self.modules[idx] = dark;
    }

    /// Sets a module and reserves it against masking and data placement.
    fn set_function(&mut self, x: i32, y: i32, dark: bool) {
        let idx = self.index(x, y);
        self.modules[idx] = dark;
        self.is_function[idx] = true;
    }

    fn draw_function_patterns(&mut self) {
        let size = self.size as i32;
        for i in 0..size {
            self.set_function(6, i, i % 2 == 0);
            self.set_function(i, 6, i % 2 == 0);
        }
        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        let positions = alignment_positions(self.version);
        let last = positions.len().wrapping_sub(1);
        for (i, &cx) in positions.iter().enumerate() {
            for (j, &cy) in positions.iter().enumerate() {
                // The three corners overlapping finder patterns stay empty.
                if (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0) {
                    continue;
                }
                self.draw_alignment_pattern(cx, cy);
            }
        }

        // Reserve the format areas now; real bits land after masking.
        self.draw_format_bits(0);
        self.draw_version_info();
    }

    /// 7x7 finder centered at (x, y), with its light separator ring.
    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        let size = self.size as i32;
        for dy in -4..=4 {
            for dx in -4..=4 {
                let (px, py) = (x + dx, y + dy);
                if (0..size).contains(&px) && (0..size).contains(&py) {
                    let dist = dx.abs().max(dy.abs());
                    self.set_function(px, py, dist != 2 && dist != 4);
                }
            }
        }
    }

    /// 5x5 alignment pattern centered at (x, y).
    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2..=2 {
            for dx in -2..=2 {
                self.set_function(x + dx, y + dy, dx.abs().max(dy.abs()) != 1);
            }
        }
    }

    /// Both copies of the 15-bit format information for the given mask,
    /// plus the always-dark module above the bottom-left finder.
    fn draw_format_bits(&mut self, mask: u8) {
        let bits: u32 = {
            let data = u32::from((self.ecc.format_bits() << 3) | mask);
            let mut rem = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            ((data << 10) | rem) ^ 0x5412
        };

        for i in 0..6 {
            self.set_function(8, i, get_bit(bits, i as u8));
        }
        self.set_function(8, 7, get_bit(bits, 6));
        self.set_function(8, 8, get_bit(bits, 7));
        self.set_function(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set_function(14 - i, 8, get_bit(bits, i as u8));
        }

        let size = self.size as i32;
        for i in 0..8 {
            self.set_function(size - 1 - i, 8, get_bit(bits, i as u8));
        }
        for i in 8..15 {
            self.set_function(8, size - 15 + i, get_bit(bits, i as u8));
        }
        self.set_function(8, size - 8, true);
    }

    /// Both copies of the 18-bit version information, for version 7 up.
    fn draw_version_info(&mut self) {
        let ver = u32::from(self.version.value());
        if ver < 7 {
            return;
        }
        let bits: u32 = {
            let mut rem = ver;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
            }
            (ver << 12) | rem
        };
        let size = self.size as i32;
        for i in 0..18 {
            let bit = get_bit(bits, i as u8);
            let a = size - 11 + i % 3;
            let b = i / 3;
            self.set_function(a, b, bit);
            self.set_function(b, a, bit);
        }
    }

    /// Places the interleaved codewords in the standard zigzag: column
    /// pairs right to left, alternating upward and downward, skipping
    /// function modules and the timing column.
    fn draw_codewords(&mut self, data: &[u8]) {
        debug_assert_eq!(data.len(), num_raw_data_modules(self.version) / 8);
        let size = self.size as i32;
        let mut i = 0usize;
        let mut right = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            for vert in 0..size {
                for j in 0..2 {
                    let x = right - j;
                    let upward = ((right + 1) & 2) == 0;
                    let y = if upward { size - 1 - vert } else { vert };
                    let idx = self.index(x, y);
                    if !self.is_function[idx] && i < data.len() * 8 {
                        self.modules[idx] = get_bit(data[i >> 3].into(), 7 - ((i & 7) as u8));
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, data.len() * 8);
    }

    /// XORs the mask pattern over the data modules. Self-inverse.
    fn apply_mask(&mut self, mask: u8) {
        let size = self.size as i32;
        for y in 0..size {
            for x in 0..size {
                let idx = self.index(x, y);
                if self.is_function[idx] {
                    continue;
                }
                let invert = match mask {
                    0 => (x + y) % 2 == 0,
                    1 => y % 2 == 0,
                    2 => x % 3 == 0,
                    3 => (x + y) % 3 == 0,
                    4 => (x / 3 + y / 2) % 2 == 0,
                    5 => ((x * y) % 2) + ((x * y) % 3) == 0,
                    6 => (((x * y) % 2) + ((x * y) % 3)) % 2 == 0,
                    7 => (((x + y) % 2) + ((x * y) % 3)) % 2 == 0,
                    _ => unreachable!(),
                };
                self.modules[idx] ^= invert;
            }
        }
    }

    /// Tries all eight masks and returns the one with the lowest penalty.
    fn select_mask(&mut self) -> u8 {
        let mut best = 0u8;
        let mut min_penalty = i32::MAX;
        for mask in 0..8 {
            self.apply_mask(mask);
            self.draw_format_bits(mask);
            let penalty = self.penalty_score();
            if penalty < min_penalty {
                best = mask;
                min_penalty = penalty;
            }
            // XORing again restores the unmasked grid.
            self.apply_mask(mask);
        }
        best
    }

    /// The four ISO penalty terms: runs of five or more, 2x2 blocks,
    /// finder-like patterns, and dark/light imbalance.
    fn penalty_score(&self) -> i32 {
        let mut result: i32 = 0;
        let size = self.size as i32;

        for y in 0..size {
            let mut run_color = false;
            let mut run_len: i32 = 0;
            let mut history = RunHistory::new(size);
            for x in 0..size {
                if self.module(x, y) == run_color {
                    run_len += 1;
                    if run_len == 5 {
                        result += PENALTY_N1;
                    } else if run_len > 5 {
                        result += 1;
                    }
                } else {
                    history.push(run_len);
                    if !run_color {
                        result += history.finder_patterns() * PENALTY_N3;
                    }
                    run_color = self.module(x, y);
                    run_len = 1;
                }
            }
            result += history.terminate(run_color, run_len) * PENALTY_N3;
        }
        for x in 0..size {
            let mut run_color = false;
            let mut run_len: i32 = 0;
            let mut history = RunHistory::new(size);
            for y in 0..size {
                if self.module(x, y) == run_color {
                    run_len += 1;
                    if run_len == 5 {
                        result += PENALTY_N1;
                    } else if run_len > 5 {
                        result += 1;
                    }
                } else {
                    history.push(run_len);
                    if !run_color {
                        result += history.finder_patterns() * PENALTY_N3;
                    }
                    run_color = self.module(x, y);
                    run_len = 1;
                }
            }
            result += history.terminate(run_color, run_len) * PENALTY_N3;
        }

        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.module(x, y);
                if color == self.module(x + 1, y)
                    && color == self.module(x, y + 1)
                    && color == self.module(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        let dark = self.modules.iter().filter(|&&m| m).count() as i32;
        let total = size * size;
        // Deviation from 50% darkness in 5% steps.
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k * PENALTY_N4;
        result
    }

    fn finish(self, mask: u8) -> SymbolMatrix {
        SymbolMatrix {
            size: self.size,
            version: self.version,
            ecc: self.ecc,
            mask,
            modules: self.modules,
        }
    }
}

/// Alignment pattern center coordinates for one axis.
fn alignment_positions(version: Version) -> Vec<i32> {
    let ver = i32::from(version.value());
    if ver == 1 {
        return Vec::new();
    }
    let numalign = ver / 7 + 2;
    let step = if ver == 32 {
        26
    } else {
        (ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2) * 2
    };
    let mut result: Vec<i32> = (0..numalign - 1).map(|i| ver * 4 + 10 - i * step).collect();
    result.push(6);
    result.reverse();
    result
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// Sliding window of the last seven run lengths on one scan line, used to
/// spot 1:1:3:1:1 finder-like sequences with a 4-wide light flank.
struct RunHistory {
    edge: i32,
    runs: [i32; 7],
}

impl RunHistory {
    fn new(size: i32) -> Self {
        RunHistory {
            edge: size,
            runs: [0; 7],
        }
    }

    fn push(&mut self, mut run_len: i32) {
        if self.runs[0] == 0 {
            // The area outside the symbol counts as light.
            run_len += self.edge;
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run_len;
    }

    fn finder_patterns(&self) -> i32 {
        let r = &self.runs;
        let n = r[1];
        i32::from(
            n > 0
                && r[2] == n
                && r[3] == n * 3
                && r[4] == n
                && r[5] == n
                && (r[0] >= n * 4 || r[6] >= n * 4),
        )
    }

    fn terminate(mut self, run_color: bool, mut run_len: i32) -> i32 {
        if run_color {
            self.push(run_len);
            run_len = 0;
        }
        run_len += self.edge;
        self.push(run_len);
        self.finder_patterns()
    }
}

fn get_bit(x: u32, i: u8) -> bool {
    (x >> i) & 1 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_tables_agree_with_known_values() {
        assert_eq!(num_raw_data_modules(Version::new(1)) / 8, 26);
        assert_eq!(num_raw_data_modules(Version::new(2)) / 8, 44);
        assert_eq!(num_raw_data_modules(Version::new(7)) / 8, 196);
        assert_eq!(num_data_codewords(Version::new(1), EccLevel::Low), 19);
        assert_eq!(num_data_codewords(Version::new(1), EccLevel::Medium), 16);
        assert_eq!(num_data_codewords(Version::new(1), EccLevel::Quartile), 13);
        assert_eq!(num_data_codewords(Version::new(1), EccLevel::High), 9);
    }

    #[test]
    fn alignment_positions_match_the_standard() {
        assert!(alignment_positions(Version::new(1)).is_empty());
        assert_eq!(alignment_positions(Version::new(2)), vec![6, 18]);
        assert_eq!(alignment_positions(Version::new(7)), vec![6, 22, 38]);
        assert_eq!(alignment_positions(Version::new(14)), vec![6, 26, 46, 66]);
        assert_eq!(
            alignment_positions(Version::new(32)),
            vec![6, 34, 60, 86, 112, 138]
        );
        assert_eq!(
            alignment_positions(Version::new(36)),
            vec![6, 24, 50, 76, 102, 128, 154]
        );
    }

    #[test]
    fn short_alphanumeric_content_fits_version_one() {
        let symbol = SymbolMatrix::encode("HELLO WORLD", EccLevel::Medium).unwrap();
        assert_eq!(symbol.version(), Version::new(1));
        assert_eq!(symbol.size(), 21);
        assert!(symbol.mask() < 8);
        // 74 data bits leave room to boost Medium up to Quartile.
        assert_eq!(symbol.ecc(), EccLevel::Quartile);
    }

    #[test]
    fn byte_content_spills_into_version_two() {
        let symbol = SymbolMatrix::encode("https://shiba.pw", EccLevel::Medium).unwrap();
        assert_eq!(symbol.version(), Version::new(2));
        assert_eq!(symbol.size(), 25);
    }

    #[test]
    fn numeric_mode_packs_digits_tighter_than_bytes() {
        let digits = "12345678901234567";
        let symbol = SymbolMatrix::encode(digits, EccLevel::Low).unwrap();
        // 17 digits cost 71 bits, inside even version 1-High's 72.
        assert_eq!(symbol.version(), Version::new(1));
        assert_eq!(symbol.ecc(), EccLevel::High);
    }

    #[test]
    fn requested_level_is_never_lowered() {
        let symbol = SymbolMatrix::encode("https://shiba.pw", EccLevel::High).unwrap();
        assert_eq!(symbol.ecc(), EccLevel::High);
    }

    #[test]
    fn higher_ecc_never_shrinks_the_symbol() {
        let content = "https://shiba.pw/r/abcdef0123456789";
        let low = SymbolMatrix::encode(content, EccLevel::Low).unwrap();
        let high = SymbolMatrix::encode(content, EccLevel::High).unwrap();
        assert!(low.size() <= high.size());
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = SymbolMatrix::encode("WIFI:S:Cafe;T:WPA;P:p4ss;;", EccLevel::Quartile).unwrap();
        let b = SymbolMatrix::encode("WIFI:S:Cafe;T:WPA;P:p4ss;;", EccLevel::Quartile).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn function_patterns_are_in_place() {
        let symbol = SymbolMatrix::encode("hello", EccLevel::Medium).unwrap();
        let size = symbol.size();
        // Finder corners are dark, the separator ring is light.
        assert!(symbol.module(0, 0));
        assert!(symbol.module(3, 3));
        assert!(!symbol.module(1, 1));
        assert!(symbol.module(2, 2));
        assert!(!symbol.module(7, 7));
        assert!(symbol.module(size - 1, 0));
        assert!(symbol.module(0, size - 1));
        // Timing row alternates.
        assert!(symbol.module(8, 6));
        assert!(!symbol.module(7, 6));
        // The dark module above the bottom-left finder.
        assert!(symbol.module(8, size - 8));
    }

    #[test]
    fn finder_like_runs_need_a_four_wide_light_flank() {
        // A 1:1:3:1:1 run flanked by four light modules scores once.
        let mut history = RunHistory::new(0);
        for run in [4, 1, 1, 3, 1, 1, 4] {
            history.push(run);
        }
        assert_eq!(history.finder_patterns(), 1);

        // Without a wide flank on either side the window scores nothing.
        let mut history = RunHistory::new(0);
        for run in [2, 1, 1, 3, 1, 1, 2] {
            history.push(run);
        }
        assert_eq!(history.finder_patterns(), 0);
    }

    #[test]
    fn oversized_content_is_rejected() {
        let content = "A".repeat(5000);
        match SymbolMatrix::encode(&content, EccLevel::Low) {
            Err(Error::DataOverCapacity { needed, capacity }) => {
                assert!(needed > capacity);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn ecc_level_serde_uses_single_letters() {
        assert_eq!(serde_json::to_string(&EccLevel::Quartile).unwrap(), "\"Q\"");
        let level: EccLevel = serde_json::from_str("\"H\"").unwrap();
        assert_eq!(level, EccLevel::High);
    }
}
