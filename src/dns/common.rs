use bitstream_io::{BitRead, BitReader, BitWrite, BitWriter, Endianness};

use super::ParseError;
use super::constants::{MAX_NAME_LENGTH, MAX_POINTER_HOPS};

pub trait PacketComponent {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError>;

    /// Read the component at the reader's position. `packet` is the whole
    /// message, needed to follow compression pointers.
    fn read<E: Endianness>(
        &mut self,
        reader: &mut BitReader<&[u8], E>,
        packet: &[u8],
    ) -> Result<(), ParseError>;

    fn read_labels<E: Endianness>(
        &mut self,
        reader: &mut BitReader<&[u8], E>,
        packet: &[u8],
    ) -> Result<Vec<String>, ParseError> {
        let mut labels = Vec::new();
        let mut encoded_len = 0;
        loop {
            let label_len = reader.read_var::<u8>(8)?;
            match label_len & 0xC0 {
                0x00 => {
                    if label_len == 0 {
                        labels.push(String::new());
                        break;
                    }
                    let mut buf = vec![0; label_len as usize];
                    reader.read_bytes(&mut buf)?;
                    encoded_len += buf.len() + 1;
                    if encoded_len > MAX_NAME_LENGTH {
                        return Err(ParseError::NameTooLong);
                    }
                    labels.push(label_from_bytes(&buf));
                }
                0xC0 => {
                    let low = reader.read_var::<u8>(8)?;
                    let mut pos = pointer_offset(label_len, low);
                    let rest = read_name(packet, &mut pos, packet)?;
                    let rest_len: usize = rest.iter().map(|l| label_wire_len(l) + 1).sum();
                    if encoded_len + rest_len > MAX_NAME_LENGTH {
                        return Err(ParseError::NameTooLong);
                    }
                    labels.extend(rest);
                    break;
                }
                _ => return Err(ParseError::InvalidLabel),
            }
        }

        Ok(labels)
    }

    fn write_labels<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
        labels: &[String],
    ) -> Result<(), ParseError> {
        write_name(writer, labels)
    }
}

/// Write labels uncompressed. A trailing empty label is the root terminator;
/// it is added when missing.
pub fn write_name<E: Endianness>(
    writer: &mut BitWriter<&mut Vec<u8>, E>,
    labels: &[String],
) -> Result<(), ParseError> {
    for label in labels.iter().filter(|l| !l.is_empty()) {
        let bytes = label_to_bytes(label)?;
        if bytes.len() > 63 {
            return Err(ParseError::InvalidLabel);
        }
        writer.write_var::<u8>(8, bytes.len() as u8)?;
        writer.write_bytes(&bytes)?;
    }
    writer.write_var::<u8>(8, 0)?;
    Ok(())
}

/// Decode a possibly compressed name starting at `data[*pos]`.
///
/// `data` is either the packet itself or a record's RDATA; pointers always
/// refer to offsets in `packet`. On return `pos` is just past the name as it
/// appears in `data`.
pub fn read_name(data: &[u8], pos: &mut usize, packet: &[u8]) -> Result<Vec<String>, ParseError> {
    let mut labels = Vec::new();
    let mut buf = data;
    let mut cursor = *pos;
    let mut jumped = false;
    let mut hops = 0;
    let mut encoded_len = 0;

    loop {
        let label_len = *buf.get(cursor).ok_or(ParseError::InvalidLabel)?;
        match label_len & 0xC0 {
            0x00 => {
                cursor += 1;
                if label_len == 0 {
                    labels.push(String::new());
                    if !jumped {
                        *pos = cursor;
                    }
                    return Ok(labels);
                }
                let end = cursor + label_len as usize;
                let bytes = buf.get(cursor..end).ok_or(ParseError::InvalidLabel)?;
                encoded_len += bytes.len() + 1;
                if encoded_len > MAX_NAME_LENGTH {
                    return Err(ParseError::NameTooLong);
                }
                labels.push(label_from_bytes(bytes));
                cursor = end;
            }
            0xC0 => {
                let low = *buf.get(cursor + 1).ok_or(ParseError::InvalidLabel)?;
                if !jumped {
                    *pos = cursor + 2;
                    jumped = true;
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(ParseError::PointerLoop);
                }
                buf = packet;
                cursor = pointer_offset(label_len, low);
            }
            _ => return Err(ParseError::InvalidLabel),
        }
    }
}

/// Split a presentation-format name into wire labels, root terminator included.
/// A backslash escapes the following character, so `\.` stays inside its label.
pub fn labels_from_name(name: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '.' => {
                if !current.is_empty() {
                    labels.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        labels.push(current);
    }
    labels.push(String::new());
    labels
}

/// Join wire labels into a fully qualified name with a trailing dot.
pub fn name_from_labels(labels: &[String]) -> String {
    let joined = labels
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(".");
    format!("{}.", joined)
}

fn pointer_offset(high: u8, low: u8) -> usize {
    (((high & 0x3F) as usize) << 8) | low as usize
}

/// Presentation form of a wire label. Label octets are arbitrary
/// (RFC 2181 section 11): dots and backslashes are escaped with a backslash,
/// anything outside printable ASCII becomes `\DDD`.
fn label_from_bytes(bytes: &[u8]) -> String {
    let mut label = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'.' | b'\\' => {
                label.push('\\');
                label.push(b as char);
            }
            0x21..=0x7E => label.push(b as char),
            _ => label.push_str(&format!("\\{:03}", b)),
        }
    }
    label
}

/// Wire octets of a presentation-form label, undoing `label_from_bytes`.
fn label_to_bytes(label: &str) -> Result<Vec<u8>, ParseError> {
    let mut bytes = Vec::with_capacity(label.len());
    let mut chars = label.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut utf8 = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            continue;
        }
        match chars.peek().copied() {
            Some(d) if d.is_ascii_digit() => {
                let mut value: u16 = 0;
                for _ in 0..3 {
                    let digit = chars
                        .next()
                        .and_then(|d| d.to_digit(10))
                        .ok_or(ParseError::InvalidLabel)?;
                    value = value * 10 + digit as u16;
                }
                bytes.push(u8::try_from(value).map_err(|_| ParseError::InvalidLabel)?);
            }
            Some(other) => {
                chars.next();
                let mut utf8 = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut utf8).as_bytes());
            }
            None => return Err(ParseError::InvalidLabel),
        }
    }
    Ok(bytes)
}

fn label_wire_len(label: &str) -> usize {
    label_to_bytes(label).map_or(label.len(), |bytes| bytes.len())
}
