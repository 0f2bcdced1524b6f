//! Distinguished name parsing (RFC 4514 string form).
//!
//! Only used to reject malformed DNs at configuration load; the parsed
//! structure is exposed for callers that want to inspect it.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnError {
    #[error("incomplete type, value pair")]
    IncompletePair,

    #[error("DN ended with incomplete type, value pair")]
    TrailingPair,

    #[error("got corrupted escaped character")]
    CorruptedEscape,

    #[error("failed to decode escaped character: {0}")]
    InvalidEscape(String),

    #[error("failed to decode hex-encoded value: {0}")]
    InvalidHexValue(String),
}

/// One `type=value` component of an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    pub attr_type: String,
    pub value: String,
}

/// Relative distinguished name: one or more pairs joined by `+`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rdn {
    pub attributes: Vec<AttributeTypeAndValue>,
}

/// A parsed distinguished name. The empty string parses to an empty DN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dn {
    pub rdns: Vec<Rdn>,
}

impl Dn {
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }
}

/// Accumulates the bytes of the component currently being read.
#[derive(Default)]
struct Buffer {
    bytes: Vec<u8>,
    trailing_spaces: usize,
}

impl Buffer {
    fn push(&mut self, byte: u8, escaped: bool) {
        if byte == b' ' && !escaped {
            self.trailing_spaces += 1;
        } else {
            self.trailing_spaces = 0;
        }
        self.bytes.push(byte);
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take(&mut self) -> String {
        let keep = self.bytes.len() - self.trailing_spaces;
        self.bytes.truncate(keep);
        self.trailing_spaces = 0;
        String::from_utf8_lossy(&std::mem::take(&mut self.bytes)).into_owned()
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

fn decode_hex_pair(hi: u8, lo: u8) -> Option<u8> {
    Some(hex_value(hi)? << 4 | hex_value(lo)?)
}

/// Decode the hex digits of a `#` value and check they form one complete
/// BER element: a tag, a definite length and exactly that many content bytes.
fn is_ber_element(raw: &str) -> bool {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return false;
    }
    let Some(bytes) = raw
        .as_bytes()
        .chunks(2)
        .map(|pair| decode_hex_pair(pair[0], pair[1]))
        .collect::<Option<Vec<u8>>>()
    else {
        return false;
    };

    let Some(&first) = bytes.get(1) else {
        return false;
    };
    let (len, header) = if first & 0x80 == 0 {
        (usize::from(first), 2)
    } else {
        let count = usize::from(first & 0x7F);
        // Indefinite length, or a length wider than we can represent.
        if count == 0 || count > std::mem::size_of::<usize>() {
            return false;
        }
        let Some(len_bytes) = bytes.get(2..2 + count) else {
            return false;
        };
        let len = len_bytes
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
        (len, 2 + count)
    };
    bytes.len().checked_sub(header) == Some(len)
}

impl FromStr for Dn {
    type Err = DnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.as_bytes();
        let mut dn = Dn::default();
        let mut rdn = Rdn::default();
        let mut buffer = Buffer::default();
        let mut attr_type: Option<String> = None;
        // Set right after `,` or `+` until the next component starts.
        let mut after_separator = false;
        let mut i = 0;

        while i < input.len() {
            let byte = input[i];
            if !matches!(byte, b',' | b'+' | b' ') {
                after_separator = false;
            }
            match byte {
                b'\\' => {
                    let Some(&next) = input.get(i + 1) else {
                        return Err(DnError::CorruptedEscape);
                    };
                    if matches!(
                        next,
                        b' ' | b'"' | b'#' | b'+' | b',' | b';' | b'<' | b'=' | b'>' | b'\\'
                    ) {
                        buffer.push(next, true);
                        i += 2;
                        continue;
                    }
                    let Some(&lo) = input.get(i + 2) else {
                        return Err(DnError::CorruptedEscape);
                    };
                    let decoded = decode_hex_pair(next, lo).ok_or_else(|| {
                        DnError::InvalidEscape(String::from_utf8_lossy(&[next, lo]).into_owned())
                    })?;
                    buffer.push(decoded, true);
                    i += 3;
                    continue;
                }
                b'=' if attr_type.is_none() => {
                    attr_type = Some(buffer.take());
                    if input.get(i + 1) == Some(&b'#') {
                        let start = i + 2;
                        let end = input[start..]
                            .iter()
                            .position(|b| *b == b',' || *b == b'+')
                            .map_or(input.len(), |p| start + p);
                        let raw = &s[start..end];
                        if !is_ber_element(raw) {
                            return Err(DnError::InvalidHexValue(raw.to_string()));
                        }
                        for b in format!("#{raw}").bytes() {
                            buffer.push(b, true);
                        }
                        i = end;
                        continue;
                    }
                }
                b',' | b'+' => {
                    let attr_type = attr_type.take().filter(|t| !t.is_empty());
                    let Some(attr_type) = attr_type else {
                        return Err(DnError::IncompletePair);
                    };
                    rdn.attributes.push(AttributeTypeAndValue {
                        attr_type,
                        value: buffer.take(),
                    });
                    if byte == b',' {
                        dn.rdns.push(std::mem::take(&mut rdn));
                    }
                    after_separator = true;
                }
                // Unescaped leading spaces are insignificant.
                b' ' if buffer.is_empty() => {}
                _ => buffer.push(byte, false),
            }
            i += 1;
        }

        if after_separator {
            return Err(DnError::TrailingPair);
        }

        if !buffer.is_empty() || attr_type.is_some() || !rdn.attributes.is_empty() {
            let attr_type = attr_type.filter(|t| !t.is_empty());
            let Some(attr_type) = attr_type else {
                return Err(DnError::TrailingPair);
            };
            rdn.attributes.push(AttributeTypeAndValue {
                attr_type,
                value: buffer.take(),
            });
            dn.rdns.push(rdn);
        }

        Ok(dn)
    }
}

/// Parse a distinguished name.
///
/// # Errors
/// Returns [`DnError`] describing the first malformed component.
pub fn parse_dn(s: &str) -> Result<Dn, DnError> {
    s.parse()
}
