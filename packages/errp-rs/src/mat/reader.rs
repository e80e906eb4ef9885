use super::value::{MatArray, MatClass, MatValue};
use super::MatError;
use crate::error::{ErrpError, Result};
use crate::mmap_utils::mmap_file;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use std::io::Read;
use std::path::Path;

pub(crate) const HEADER_LEN: usize = 128;
pub(crate) const HEADER_TEXT_LEN: usize = 116;
pub(crate) const VERSION_5: u16 = 0x0100;
const VERSION_73: u16 = 0x0200;
const HDF5_SIGNATURE: [u8; 8] = [0x89, 0x48, 0x44, 0x46, 0x0d, 0x0a, 0x1a, 0x0a];

pub(crate) const MI_INT8: u32 = 1;
pub(crate) const MI_UINT8: u32 = 2;
pub(crate) const MI_INT16: u32 = 3;
pub(crate) const MI_UINT16: u32 = 4;
pub(crate) const MI_INT32: u32 = 5;
pub(crate) const MI_UINT32: u32 = 6;
pub(crate) const MI_SINGLE: u32 = 7;
pub(crate) const MI_DOUBLE: u32 = 9;
pub(crate) const MI_INT64: u32 = 12;
pub(crate) const MI_UINT64: u32 = 13;
pub(crate) const MI_MATRIX: u32 = 14;
pub(crate) const MI_COMPRESSED: u32 = 15;
const MI_UTF8: u32 = 16;
const MI_UTF16: u32 = 17;
const MI_UTF32: u32 = 18;

const FLAG_COMPLEX: u32 = 0x0800;
const FLAG_LOGICAL: u32 = 0x0200;

/// Smallest encoding of a nested element: its 8-byte tag.
const MIN_ELEMENT_LEN: usize = 8;
const MAX_NESTING: usize = 64;

/// Byte order declared by the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, b: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(b),
            Endian::Big => BigEndian::read_u16(b),
        }
    }

    fn i16(self, b: &[u8]) -> i16 {
        match self {
            Endian::Little => LittleEndian::read_i16(b),
            Endian::Big => BigEndian::read_i16(b),
        }
    }

    fn u32(self, b: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(b),
            Endian::Big => BigEndian::read_u32(b),
        }
    }

    fn i32(self, b: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(b),
            Endian::Big => BigEndian::read_i32(b),
        }
    }

    fn u64(self, b: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(b),
            Endian::Big => BigEndian::read_u64(b),
        }
    }

    fn i64(self, b: &[u8]) -> i64 {
        match self {
            Endian::Little => LittleEndian::read_i64(b),
            Endian::Big => BigEndian::read_i64(b),
        }
    }

    fn f32(self, b: &[u8]) -> f32 {
        match self {
            Endian::Little => LittleEndian::read_f32(b),
            Endian::Big => BigEndian::read_f32(b),
        }
    }

    fn f64(self, b: &[u8]) -> f64 {
        match self {
            Endian::Little => LittleEndian::read_f64(b),
            Endian::Big => BigEndian::read_f64(b),
        }
    }
}

/// A parsed MAT file: header text plus its top-level variables in file order.
#[derive(Debug, Clone)]
pub struct MatFile {
    header_text: String,
    endian: Endian,
    arrays: Vec<MatArray>,
}

impl MatFile {
    /// Memory-map and parse the file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let len = std::fs::metadata(path)
            .map_err(|_| ErrpError::FileNotFound(display.clone()))?
            .len();
        if (len as usize) < HEADER_LEN {
            return Err(ErrpError::format(
                display,
                format!("file is {} bytes, shorter than a MAT header", len),
            ));
        }

        let mmap = mmap_file(path)?;
        Self::parse(&mmap).map_err(|e| ErrpError::format(display, e.to_string()))
    }

    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, MatError> {
        if bytes.len() >= HDF5_SIGNATURE.len() && bytes[..HDF5_SIGNATURE.len()] == HDF5_SIGNATURE {
            return Err(MatError::Hdf5);
        }
        if bytes.len() < HEADER_LEN {
            return Err(MatError::BadHeader(format!(
                "{} bytes, expected at least {}",
                bytes.len(),
                HEADER_LEN
            )));
        }

        let endian = match &bytes[126..128] {
            b"IM" => Endian::Little,
            b"MI" => Endian::Big,
            other => {
                return Err(MatError::BadHeader(format!(
                    "unknown endian indicator {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };

        match endian.u16(&bytes[124..126]) {
            VERSION_5 => {}
            VERSION_73 => return Err(MatError::Hdf5),
            other => return Err(MatError::UnsupportedVersion(other)),
        }

        let header_text = String::from_utf8_lossy(&bytes[..HEADER_TEXT_LEN])
            .trim_end_matches(|c: char| c == ' ' || c == '\0')
            .to_string();
        log::debug!("MAT header: {}", header_text);

        let mut arrays = Vec::new();
        let mut elements = ElementReader::new(&bytes[HEADER_LEN..], endian);
        while let Some(element) = elements.next_element()? {
            match element.data_type {
                MI_MATRIX => arrays.push(parse_matrix(element.data, endian, 0)?),
                MI_COMPRESSED => {
                    let inflated = inflate(element.data)?;
                    let mut inner = ElementReader::new(&inflated, endian);
                    while let Some(nested) = inner.next_element()? {
                        if nested.data_type == MI_MATRIX {
                            arrays.push(parse_matrix(nested.data, endian, 0)?);
                        } else {
                            log::debug!("Skipping compressed element of type {}", nested.data_type);
                        }
                    }
                }
                other => log::debug!("Skipping top-level element of type {}", other),
            }
        }

        Ok(Self {
            header_text,
            endian,
            arrays,
        })
    }

    pub fn header_text(&self) -> &str {
        &self.header_text
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn arrays(&self) -> &[MatArray] {
        &self.arrays
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.arrays.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&MatArray> {
        self.arrays.iter().find(|a| a.name == name)
    }

    /// Remove and return the variable `name`.
    pub fn take(&mut self, name: &str) -> Option<MatArray> {
        let index = self.arrays.iter().position(|a| a.name == name)?;
        Some(self.arrays.remove(index))
    }
}

struct Element<'a> {
    data_type: u32,
    data: &'a [u8],
}

/// Walks consecutive data elements of one buffer.
struct ElementReader<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ElementReader<'a> {
    fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    fn next_element(&mut self) -> std::result::Result<Option<Element<'a>>, MatError> {
        if self.pos + 8 > self.buf.len() {
            return Ok(None);
        }

        let first = self.endian.u32(&self.buf[self.pos..self.pos + 4]);
        let small_bytes = (first >> 16) as usize;

        // Small data element: type and size packed in the first word, payload in the second.
        if small_bytes != 0 {
            if small_bytes > 4 {
                return Err(MatError::Corrupt(format!(
                    "small element claims {} bytes",
                    small_bytes
                )));
            }
            let start = self.pos + 4;
            let data = &self.buf[start..start + small_bytes];
            self.pos += 8;
            return Ok(Some(Element {
                data_type: first & 0xFFFF,
                data,
            }));
        }

        let data_type = first;
        let nbytes = self.endian.u32(&self.buf[self.pos + 4..self.pos + 8]) as usize;
        let start = self.pos + 8;
        let end = start
            .checked_add(nbytes)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                MatError::Truncated(format!("element of type {} ({} bytes)", data_type, nbytes))
            })?;

        // Compressed elements are not padded to the 8-byte boundary.
        self.pos = if data_type == MI_COMPRESSED {
            end
        } else {
            (end + 7) & !7
        };

        Ok(Some(Element {
            data_type,
            data: &self.buf[start..end],
        }))
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Fail unless `count` more nested elements could fit in what is left.
    fn ensure_room(&self, count: usize, what: &str) -> std::result::Result<(), MatError> {
        match count.checked_mul(MIN_ELEMENT_LEN) {
            Some(needed) if needed <= self.remaining() => Ok(()),
            _ => Err(MatError::Corrupt(format!(
                "{} {} elements declared but only {} bytes remain",
                count,
                what,
                self.remaining()
            ))),
        }
    }

    fn require(&mut self, what: &str) -> std::result::Result<Element<'a>, MatError> {
        self.next_element()?
            .ok_or_else(|| MatError::Truncated(what.to_string()))
    }
}

fn inflate(data: &[u8]) -> std::result::Result<Vec<u8>, MatError> {
    let mut out = Vec::with_capacity(data.len() * 4);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| MatError::Decompress(e.to_string()))?;
    Ok(out)
}

fn parse_matrix(
    data: &[u8],
    endian: Endian,
    depth: usize,
) -> std::result::Result<MatArray, MatError> {
    if depth > MAX_NESTING {
        return Err(MatError::Corrupt(format!(
            "arrays nested deeper than {} levels",
            MAX_NESTING
        )));
    }
    // An miMATRIX with no payload stands for an empty array (e.g. an unset cell).
    if data.is_empty() {
        return Ok(MatArray::numeric("", vec![0, 0], Vec::new()));
    }

    let mut reader = ElementReader::new(data, endian);

    let flags_el = reader.require("array flags")?;
    if flags_el.data.len() < 4 {
        return Err(MatError::Corrupt("array flags shorter than 4 bytes".to_string()));
    }
    let flags = endian.u32(&flags_el.data[..4]);
    let class_id = (flags & 0xFF) as u8;
    let class = MatClass::from_id(class_id)
        .ok_or_else(|| MatError::Unsupported(format!("array class {}", class_id)))?;

    let dims_el = reader.require("dimensions")?;
    let dims = decode_numeric(dims_el.data_type, dims_el.data, endian)?
        .into_iter()
        .map(|d| {
            if d >= 0.0 {
                Ok(d as usize)
            } else {
                Err(MatError::Corrupt(format!("negative dimension {}", d)))
            }
        })
        .collect::<std::result::Result<Vec<usize>, MatError>>()?;
    let numel = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| MatError::Corrupt(format!("dimensions {:?} overflow", dims)))?;

    let name_el = reader.require("array name")?;
    let name = String::from_utf8_lossy(name_el.data)
        .trim_end_matches('\0')
        .to_string();

    let value = match class {
        MatClass::Sparse => {
            return Err(MatError::Unsupported(format!("sparse array '{}'", name)));
        }
        MatClass::Cell => {
            reader.ensure_room(numel, "cell")?;
            let mut items = Vec::with_capacity(numel);
            for _ in 0..numel {
                let el = reader.require("cell element")?;
                if el.data_type != MI_MATRIX {
                    return Err(MatError::Corrupt(format!(
                        "cell '{}' holds element of type {}",
                        name, el.data_type
                    )));
                }
                items.push(parse_matrix(el.data, endian, depth + 1)?);
            }
            MatValue::Cell(items)
        }
        MatClass::Struct | MatClass::Object => {
            if class == MatClass::Object {
                reader.require("object class name")?;
            }
            let len_el = reader.require("field name length")?;
            let name_len = decode_numeric(len_el.data_type, len_el.data, endian)?
                .first()
                .copied()
                .unwrap_or(0.0) as usize;
            let names_el = reader.require("field names")?;
            let fields: Vec<String> = if name_len == 0 {
                Vec::new()
            } else {
                names_el
                    .data
                    .chunks(name_len)
                    .map(|chunk| {
                        let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
                        String::from_utf8_lossy(&chunk[..end]).to_string()
                    })
                    .collect()
            };

            if fields.is_empty() {
                // Field-less elements carry no payload; bound them by the header itself.
                if numel > data.len() {
                    return Err(MatError::Corrupt(format!(
                        "struct '{}' declares {} field-less elements",
                        name, numel
                    )));
                }
            } else {
                let count = numel.checked_mul(fields.len()).ok_or_else(|| {
                    MatError::Corrupt(format!("struct '{}' dimensions {:?} overflow", name, dims))
                })?;
                reader.ensure_room(count, "struct field")?;
            }
            let mut elements = Vec::with_capacity(numel);
            for _ in 0..numel {
                let mut values = Vec::with_capacity(fields.len());
                for field in &fields {
                    let el = reader.require("struct field")?;
                    if el.data_type != MI_MATRIX {
                        return Err(MatError::Corrupt(format!(
                            "field '{}' of '{}' holds element of type {}",
                            field, name, el.data_type
                        )));
                    }
                    values.push(parse_matrix(el.data, endian, depth + 1)?);
                }
                elements.push(values);
            }
            MatValue::Struct { fields, elements }
        }
        MatClass::Char => {
            let el = reader.require("char data")?;
            let mut chars = decode_chars(el.data_type, el.data, endian)?;
            // Every encoding spends at least one byte per character.
            if numel > el.data.len() {
                return Err(MatError::Corrupt(format!(
                    "char array '{}' declares {} characters in {} bytes",
                    name,
                    numel,
                    el.data.len()
                )));
            }
            if chars.len() != numel {
                log::debug!(
                    "Char array '{}' decoded to {} chars for {} elements",
                    name,
                    chars.len(),
                    numel
                );
                chars.resize(numel, ' ');
            }
            MatValue::Char(chars)
        }
        _ => {
            let re = reader.require("real part")?;
            let real = decode_numeric(re.data_type, re.data, endian)?;
            if real.len() != numel {
                return Err(MatError::Corrupt(format!(
                    "array '{}' has {} values for dimensions {:?}",
                    name,
                    real.len(),
                    dims
                )));
            }
            let imag = if flags & FLAG_COMPLEX != 0 {
                let im = reader.require("imaginary part")?;
                Some(decode_numeric(im.data_type, im.data, endian)?)
            } else {
                None
            };
            MatValue::Numeric {
                class,
                logical: flags & FLAG_LOGICAL != 0,
                real,
                imag,
            }
        }
    };

    Ok(MatArray { name, dims, value })
}

/// Widen a numeric element to `f64`. The storage type may be narrower than the array class.
fn decode_numeric(
    data_type: u32,
    bytes: &[u8],
    endian: Endian,
) -> std::result::Result<Vec<f64>, MatError> {
    let values = match data_type {
        MI_INT8 => bytes.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8 => bytes.iter().map(|&b| b as f64).collect(),
        MI_INT16 => bytes.chunks_exact(2).map(|b| endian.i16(b) as f64).collect(),
        MI_UINT16 => bytes.chunks_exact(2).map(|b| endian.u16(b) as f64).collect(),
        MI_INT32 => bytes.chunks_exact(4).map(|b| endian.i32(b) as f64).collect(),
        MI_UINT32 => bytes.chunks_exact(4).map(|b| endian.u32(b) as f64).collect(),
        MI_SINGLE => bytes.chunks_exact(4).map(|b| endian.f32(b) as f64).collect(),
        MI_DOUBLE => bytes.chunks_exact(8).map(|b| endian.f64(b)).collect(),
        MI_INT64 => bytes.chunks_exact(8).map(|b| endian.i64(b) as f64).collect(),
        MI_UINT64 => bytes.chunks_exact(8).map(|b| endian.u64(b) as f64).collect(),
        other => {
            return Err(MatError::Corrupt(format!(
                "element type {} is not numeric",
                other
            )))
        }
    };
    Ok(values)
}

fn decode_chars(
    data_type: u32,
    bytes: &[u8],
    endian: Endian,
) -> std::result::Result<Vec<char>, MatError> {
    let chars = match data_type {
        MI_UINT16 | MI_UTF16 => {
            let units: Vec<u16> = bytes.chunks_exact(2).map(|b| endian.u16(b)).collect();
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        MI_UTF8 => String::from_utf8_lossy(bytes).chars().collect(),
        MI_UINT8 | MI_INT8 => bytes.iter().map(|&b| b as char).collect(),
        MI_UTF32 | MI_UINT32 => bytes
            .chunks_exact(4)
            .map(|b| char::from_u32(endian.u32(b)).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
        other => {
            return Err(MatError::Corrupt(format!(
                "element type {} cannot hold characters",
                other
            )))
        }
    };
    Ok(chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::write_mat;

    fn header(endian: &[u8; 2], version: [u8; 2]) -> Vec<u8> {
        let mut bytes = vec![b' '; HEADER_TEXT_LEN];
        bytes[..10].copy_from_slice(b"MATLAB 5.0");
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&version);
        bytes.extend_from_slice(endian);
        bytes
    }

    #[test]
    fn test_rejects_hdf5_signature() {
        let mut bytes = HDF5_SIGNATURE.to_vec();
        bytes.resize(512, 0);
        assert!(matches!(MatFile::parse(&bytes), Err(MatError::Hdf5)));
    }

    #[test]
    fn test_rejects_v73_version() {
        let bytes = header(b"IM", [0x00, 0x02]);
        assert!(matches!(MatFile::parse(&bytes), Err(MatError::Hdf5)));
    }

    #[test]
    fn test_rejects_short_and_unknown_headers() {
        assert!(matches!(
            MatFile::parse(b"MATLAB"),
            Err(MatError::BadHeader(_))
        ));
        let bytes = header(b"XX", [0x00, 0x01]);
        assert!(matches!(MatFile::parse(&bytes), Err(MatError::BadHeader(_))));
    }

    #[test]
    fn test_empty_file_has_no_variables() {
        let bytes = header(b"IM", [0x00, 0x01]);
        let mat = MatFile::parse(&bytes).unwrap();
        assert!(mat.arrays().is_empty());
        assert_eq!(mat.endian(), Endian::Little);
        assert!(mat.header_text().starts_with("MATLAB 5.0"));
    }

    #[test]
    fn test_big_endian_double_matrix() {
        // Hand-assembled big-endian file: x = [1 3; 2 4]
        let mut bytes = header(b"MI", [0x01, 0x00]);
        let mut body = Vec::new();
        // array flags: mxDOUBLE_CLASS
        body.extend_from_slice(&6u32.to_be_bytes());
        body.extend_from_slice(&8u32.to_be_bytes());
        body.extend_from_slice(&6u32.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        // dimensions
        body.extend_from_slice(&5u32.to_be_bytes());
        body.extend_from_slice(&8u32.to_be_bytes());
        body.extend_from_slice(&2i32.to_be_bytes());
        body.extend_from_slice(&2i32.to_be_bytes());
        // name "x" as a small element
        body.extend_from_slice(&((1u32 << 16) | 1).to_be_bytes());
        body.extend_from_slice(&[b'x', 0, 0, 0]);
        // real part
        body.extend_from_slice(&9u32.to_be_bytes());
        body.extend_from_slice(&32u32.to_be_bytes());
        for v in [1.0f64, 2.0, 3.0, 4.0] {
            body.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&MI_MATRIX.to_be_bytes());
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);

        let mat = MatFile::parse(&bytes).unwrap();
        assert_eq!(mat.endian(), Endian::Big);
        let x = mat.find("x").unwrap();
        assert_eq!(x.dims, vec![2, 2]);
        assert_eq!(x.real().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_nested_structs_survive_compression() {
        let run = MatArray::cell(
            "run",
            vec![1, 2],
            vec![
                MatArray::structure(
                    "",
                    vec![
                        ("eeg", MatArray::numeric("", vec![3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
                        ("name", MatArray::string("", "first")),
                    ],
                ),
                MatArray::structure(
                    "",
                    vec![
                        ("eeg", MatArray::numeric("", vec![0, 0], Vec::new())),
                        ("name", MatArray::string("", "second")),
                    ],
                ),
            ],
        );

        for compress in [false, true] {
            let mut bytes = Vec::new();
            write_mat(&mut bytes, std::slice::from_ref(&run), compress).unwrap();
            let mut mat = MatFile::parse(&bytes).unwrap();
            assert_eq!(mat.variable_names(), vec!["run"]);
            let parsed = mat.take("run").unwrap();
            assert_eq!(parsed, run);
            assert!(mat.find("run").is_none());
        }
    }

    #[test]
    fn test_truncated_element_is_reported() {
        let arr = MatArray::column("pos", vec![1.0, 2.0, 3.0]);
        let mut bytes = Vec::new();
        write_mat(&mut bytes, &[arr], false).unwrap();
        bytes.truncate(bytes.len() - 12);
        assert!(matches!(MatFile::parse(&bytes), Err(MatError::Truncated(_))));
    }

    fn written(arr: MatArray) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_mat(&mut bytes, &[arr], false).unwrap();
        bytes
    }

    #[test]
    fn test_oversized_cell_dimensions_are_corrupt() {
        let huge = i32::MAX as usize;
        let bytes = written(MatArray::cell("run", vec![huge, huge], Vec::new()));
        assert!(matches!(MatFile::parse(&bytes), Err(MatError::Corrupt(_))));

        let bytes = written(MatArray::cell("run", vec![huge, huge, huge], Vec::new()));
        assert!(matches!(MatFile::parse(&bytes), Err(MatError::Corrupt(_))));
    }

    #[test]
    fn test_oversized_struct_and_char_dimensions_are_corrupt() {
        let mut trial_header = MatArray::structure("header", vec![("TYP", MatArray::scalar("", 5.0))]);
        trial_header.dims = vec![1 << 20, 1 << 20];
        assert!(matches!(
            MatFile::parse(&written(trial_header)),
            Err(MatError::Corrupt(_))
        ));

        let mut label = MatArray::string("label", "Cz");
        label.dims = vec![1, 1 << 30];
        assert!(matches!(
            MatFile::parse(&written(label)),
            Err(MatError::Corrupt(_))
        ));
    }

    #[test]
    fn test_deep_nesting_is_corrupt() {
        let mut arr = MatArray::numeric("", vec![0, 0], Vec::new());
        for _ in 0..=MAX_NESTING + 1 {
            arr = MatArray::cell("", vec![1, 1], vec![arr]);
        }
        arr.name = "deep".to_string();
        assert!(matches!(
            MatFile::parse(&written(arr)),
            Err(MatError::Corrupt(_))
        ));

        let mut shallow = MatArray::numeric("", vec![0, 0], Vec::new());
        for _ in 0..8 {
            shallow = MatArray::cell("", vec![1, 1], vec![shallow]);
        }
        shallow.name = "shallow".to_string();
        assert!(MatFile::parse(&written(shallow)).is_ok());
    }

    #[test]
    fn test_narrow_storage_is_widened() {
        let bytes = [0xFFu8, 0x01];
        assert_eq!(
            decode_numeric(MI_INT8, &bytes, Endian::Little).unwrap(),
            vec![-1.0, 1.0]
        );
        assert_eq!(
            decode_numeric(MI_UINT8, &bytes, Endian::Little).unwrap(),
            vec![255.0, 1.0]
        );
        assert_eq!(
            decode_numeric(MI_INT16, &bytes, Endian::Little).unwrap(),
            vec![0x01FF as f64]
        );
        assert!(decode_numeric(MI_MATRIX, &bytes, Endian::Little).is_err());
    }

    #[test]
    fn test_utf8_and_utf16_chars() {
        assert_eq!(
            decode_chars(MI_UTF8, "Cz".as_bytes(), Endian::Little).unwrap(),
            vec!['C', 'z']
        );
        let utf16: Vec<u8> = "FCz".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(
            decode_chars(MI_UINT16, &utf16, Endian::Little).unwrap(),
            vec!['F', 'C', 'z']
        );
    }
}
