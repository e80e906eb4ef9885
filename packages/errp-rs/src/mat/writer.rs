use super::reader::{
    HEADER_TEXT_LEN, MI_COMPRESSED, MI_DOUBLE, MI_INT16, MI_INT32, MI_INT64, MI_INT8, MI_MATRIX,
    MI_SINGLE, MI_UINT16, MI_UINT32, MI_UINT64, MI_UINT8, VERSION_5,
};
use super::value::{MatArray, MatClass, MatValue};
use super::MatError;
use crate::error::{ErrpError, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `arrays` as a little-endian level-5 MAT file.
///
/// With `compress` every variable is stored as a zlib-compressed element,
/// as MATLAB does for `-v7` files.
pub fn write_mat<W: Write>(
    mut out: W,
    arrays: &[MatArray],
    compress: bool,
) -> std::result::Result<(), MatError> {
    let mut header = format!(
        "MATLAB 5.0 MAT-file, Platform: {}, Created by: errp-rs {}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    )
    .into_bytes();
    header.resize(HEADER_TEXT_LEN, b' ');
    out.write_all(&header)?;
    out.write_all(&[0u8; 8])?;
    out.write_u16::<LittleEndian>(VERSION_5)?;
    out.write_all(b"IM")?;

    for array in arrays {
        let element = matrix_element(array)?;
        if compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&element)?;
            let compressed = encoder.finish()?;
            out.write_u32::<LittleEndian>(MI_COMPRESSED)?;
            out.write_u32::<LittleEndian>(compressed.len() as u32)?;
            out.write_all(&compressed)?;
        } else {
            out.write_all(&element)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Write `arrays` to `path`, creating or truncating the file.
pub fn save(path: &Path, arrays: &[MatArray], compress: bool) -> Result<()> {
    let file = File::create(path)?;
    write_mat(BufWriter::new(file), arrays, compress)
        .map_err(|e| ErrpError::format(path.display().to_string(), e.to_string()))
}

fn matrix_element(array: &MatArray) -> std::result::Result<Vec<u8>, MatError> {
    let mut body = Vec::new();

    let mut flags = array.class().id() as u32;
    if let MatValue::Numeric { logical, imag, .. } = &array.value {
        if *logical {
            flags |= 0x0200;
        }
        if imag.is_some() {
            flags |= 0x0800;
        }
    }
    let mut flag_bytes = Vec::with_capacity(8);
    flag_bytes.write_u32::<LittleEndian>(flags)?;
    flag_bytes.write_u32::<LittleEndian>(0)?;
    write_element(&mut body, MI_UINT32, &flag_bytes)?;

    let mut dim_bytes = Vec::with_capacity(array.dims.len() * 4);
    for &d in &array.dims {
        dim_bytes.write_i32::<LittleEndian>(d as i32)?;
    }
    write_element(&mut body, MI_INT32, &dim_bytes)?;
    write_element(&mut body, MI_INT8, array.name.as_bytes())?;

    match &array.value {
        MatValue::Numeric {
            class, real, imag, ..
        } => {
            let (data_type, bytes) = encode_numeric(*class, real)?;
            write_element(&mut body, data_type, &bytes)?;
            if let Some(imag) = imag {
                let (data_type, bytes) = encode_numeric(*class, imag)?;
                write_element(&mut body, data_type, &bytes)?;
            }
        }
        MatValue::Char(chars) => {
            let text: String = chars.iter().collect();
            let mut bytes = Vec::with_capacity(chars.len() * 2);
            for unit in text.encode_utf16() {
                bytes.write_u16::<LittleEndian>(unit)?;
            }
            write_element(&mut body, MI_UINT16, &bytes)?;
        }
        MatValue::Cell(items) => {
            for item in items {
                body.extend_from_slice(&matrix_element(item)?);
            }
        }
        MatValue::Struct { fields, elements } => {
            let name_len = fields.iter().map(|f| f.len() + 1).max().unwrap_or(1);
            let mut len_bytes = Vec::with_capacity(4);
            len_bytes.write_i32::<LittleEndian>(name_len as i32)?;
            write_element(&mut body, MI_INT32, &len_bytes)?;

            let mut names = vec![0u8; name_len * fields.len()];
            for (i, field) in fields.iter().enumerate() {
                names[i * name_len..i * name_len + field.len()].copy_from_slice(field.as_bytes());
            }
            write_element(&mut body, MI_INT8, &names)?;

            for element in elements {
                if element.len() != fields.len() {
                    return Err(MatError::Corrupt(format!(
                        "struct '{}' element has {} values for {} fields",
                        array.name,
                        element.len(),
                        fields.len()
                    )));
                }
                for value in element {
                    body.extend_from_slice(&matrix_element(value)?);
                }
            }
        }
    }

    let mut element = Vec::with_capacity(body.len() + 8);
    element.write_u32::<LittleEndian>(MI_MATRIX)?;
    element.write_u32::<LittleEndian>(body.len() as u32)?;
    element.extend_from_slice(&body);
    Ok(element)
}

/// Append one data element, using the packed small form for payloads of up to 4 bytes.
fn write_element(
    out: &mut Vec<u8>,
    data_type: u32,
    data: &[u8],
) -> std::result::Result<(), MatError> {
    if data.len() <= 4 {
        out.write_u32::<LittleEndian>(((data.len() as u32) << 16) | data_type)?;
        out.extend_from_slice(data);
        out.resize(out.len() + (4 - data.len()), 0);
        return Ok(());
    }

    out.write_u32::<LittleEndian>(data_type)?;
    out.write_u32::<LittleEndian>(data.len() as u32)?;
    out.extend_from_slice(data);
    let padding = (8 - data.len() % 8) % 8;
    out.resize(out.len() + padding, 0);
    Ok(())
}

fn encode_numeric(
    class: MatClass,
    values: &[f64],
) -> std::result::Result<(u32, Vec<u8>), MatError> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    let data_type = match class {
        MatClass::Double => {
            for &v in values {
                bytes.write_f64::<LittleEndian>(v)?;
            }
            MI_DOUBLE
        }
        MatClass::Single => {
            for &v in values {
                bytes.write_f32::<LittleEndian>(v as f32)?;
            }
            MI_SINGLE
        }
        MatClass::Int8 => {
            for &v in values {
                bytes.write_i8(v as i8)?;
            }
            MI_INT8
        }
        MatClass::UInt8 => {
            for &v in values {
                bytes.write_u8(v as u8)?;
            }
            MI_UINT8
        }
        MatClass::Int16 => {
            for &v in values {
                bytes.write_i16::<LittleEndian>(v as i16)?;
            }
            MI_INT16
        }
        MatClass::UInt16 => {
            for &v in values {
                bytes.write_u16::<LittleEndian>(v as u16)?;
            }
            MI_UINT16
        }
        MatClass::Int32 => {
            for &v in values {
                bytes.write_i32::<LittleEndian>(v as i32)?;
            }
            MI_INT32
        }
        MatClass::UInt32 => {
            for &v in values {
                bytes.write_u32::<LittleEndian>(v as u32)?;
            }
            MI_UINT32
        }
        MatClass::Int64 => {
            for &v in values {
                bytes.write_i64::<LittleEndian>(v as i64)?;
            }
            MI_INT64
        }
        MatClass::UInt64 => {
            for &v in values {
                bytes.write_u64::<LittleEndian>(v as u64)?;
            }
            MI_UINT64
        }
        other => {
            return Err(MatError::Unsupported(format!(
                "cannot write numeric data with class {:?}",
                other
            )))
        }
    };
    Ok((data_type, bytes))
}
