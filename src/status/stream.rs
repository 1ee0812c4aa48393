use crate::{varint::try_decode_varint, StatErr};
use tracing::trace;

/// Layout of a status response frame, known once its three leading VarInts arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Size of the whole frame, including the length VarInt itself.
    pub frame_len: usize,
    /// Where the JSON text begins.
    pub data_offset: usize,
    /// Where the JSON text ends, never past `frame_len`.
    pub data_end: usize,
}

/// Reassembles a [status response](https://wiki.vg/Server_List_Ping#Status_Response)
/// from reads of arbitrary size.
///
/// A chunk may end anywhere, even in the middle of a VarInt, so the header is
/// parsed from the accumulated bytes as soon as it is complete.
#[derive(Debug, Default)]
pub struct StatusStream {
    response: Vec<u8>,
    header: Option<FrameHeader>,
}

impl StatusStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<FrameHeader> {
        self.header
    }

    /// Bytes accumulated so far.
    pub fn buffered(&self) -> usize {
        self.response.len()
    }

    /// Append a chunk; returns the JSON text once the whole frame is in.
    ///
    /// Bytes after the end of the frame are dropped. Once a frame is returned the
    /// stream is empty again and the next push starts a new frame.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<String>, StatErr> {
        self.response.extend_from_slice(chunk);

        if self.header.is_none() {
            self.header = parse_header(&self.response)?;
        }

        match self.header {
            Some(header) if self.response.len() >= header.frame_len => {
                let response = std::mem::take(&mut self.response);
                self.header = None;

                trace!(frame_len = header.frame_len, "status frame complete");

                match String::from_utf8(response[header.data_offset..header.data_end].to_vec()) {
                    Ok(json) => Ok(Some(json)),
                    Err(_) => Err(StatErr::DecodeErr(
                        "JSON parse error: Server sent unexpected data.".into(),
                    )),
                }
            }
            _ => {
                trace!(buffered = self.response.len(), "status frame incomplete");

                Ok(None)
            }
        }
    }
}

/// Frame length, packet id and JSON length, all VarInts.
fn parse_header(bufs: &[u8]) -> Result<Option<FrameHeader>, StatErr> {
    let (len, len_size) = match try_decode_varint(bufs)? {
        Some(decoded) => decoded,
        None => return Ok(None),
    };
    let (_id, id_size) = match try_decode_varint(&bufs[len_size..])? {
        Some(decoded) => decoded,
        None => return Ok(None),
    };
    let (data_len, data_len_size) = match try_decode_varint(&bufs[len_size + id_size..])? {
        Some(decoded) => decoded,
        None => return Ok(None),
    };

    if len < 0 || data_len < 0 {
        return Err(StatErr::ProtocolErr(format!(
            "Status response declares a negative length, frame: {}, data: {}",
            len, data_len
        )));
    }

    let frame_len = len_size + len as usize;
    let data_offset = len_size + id_size + data_len_size;

    if data_offset > frame_len {
        return Err(StatErr::ProtocolErr(format!(
            "Status response header({} bytes) is longer than its frame({} bytes)",
            data_offset, frame_len
        )));
    }

    Ok(Some(FrameHeader {
        frame_len,
        data_offset,
        data_end: frame_len.min(data_offset + data_len as usize),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;

    fn frame(json: &str) -> Vec<u8> {
        let mut packet = Packet::new();

        packet.write_varint(0x00).write_string(json);
        packet.sign();
        packet.into_bytes()
    }

    #[test]
    fn test_single_chunk() {
        let mut stream = StatusStream::new();

        assert_eq!(
            stream.push(&frame(r#"{"a":1}"#)).unwrap(),
            Some(r#"{"a":1}"#.to_string())
        );
        assert_eq!(stream.buffered(), 0);
    }

    #[test]
    fn test_every_split_point() {
        let json = format!(r#"{{"description":{{"text":"{}"}}}}"#, "x".repeat(300));
        let bufs = frame(&json);

        for split in 1..bufs.len() {
            let mut stream = StatusStream::new();

            assert_eq!(stream.push(&bufs[..split]).unwrap(), None, "split {}", split);
            assert_eq!(
                stream.push(&bufs[split..]).unwrap(),
                Some(json.clone()),
                "split {}",
                split
            );
        }
    }

    #[test]
    fn test_byte_by_byte() {
        let json = r#"{"version":{"name":"Paper 1.19.2","protocol":760}}"#;
        let bufs = frame(json);
        let mut stream = StatusStream::new();
        let mut result = None;

        for (i, buf) in bufs.iter().enumerate() {
            result = stream.push(&[*buf]).unwrap();

            if i + 1 < bufs.len() {
                assert!(result.is_none());
            }
        }

        assert_eq!(result.as_deref(), Some(json));
    }

    #[test]
    fn test_header_offsets() {
        let json = "y".repeat(200);
        let bufs = frame(&json);
        let mut stream = StatusStream::new();

        stream.push(&bufs[..5]).unwrap();

        // 2 byte frame length, 1 byte id, 2 byte json length
        assert_eq!(
            stream.header(),
            Some(FrameHeader {
                frame_len: bufs.len(),
                data_offset: 5,
                data_end: bufs.len(),
            })
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bufs = frame("{}");
        bufs.extend_from_slice(&[0x09, 0x01]);

        assert_eq!(StatusStream::new().push(&bufs).unwrap(), Some("{}".into()));
    }

    #[test]
    fn test_next_frame_after_completion() {
        let first = frame(&"a".repeat(200));
        let second = frame(r#"{"b":2}"#);
        let mut stream = StatusStream::new();

        assert!(stream.push(&first).unwrap().is_some());
        assert_eq!(stream.header(), None);
        assert_eq!(stream.buffered(), 0);

        assert_eq!(stream.push(&second[..2]).unwrap(), None);
        assert_eq!(
            stream.push(&second[2..]).unwrap(),
            Some(r#"{"b":2}"#.to_string())
        );
    }

    #[test]
    fn test_invalid_frames() {
        let too_long = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            StatusStream::new().push(&too_long),
            Err(StatErr::ProtocolErr(_))
        ));

        // Frame of 1 byte that claims a 16 byte header
        let short_frame = [0x01, 0x00, 0x10];
        assert!(StatusStream::new().push(&short_frame).is_err());

        let not_utf8 = [0x04, 0x00, 0x02, 0xC3, 0x28];
        assert!(matches!(
            StatusStream::new().push(&not_utf8),
            Err(StatErr::DecodeErr(_))
        ));
    }
}
