//! Byte buffer used to craft and inspect [Server List Ping](https://wiki.vg/Server_List_Ping) packets.

use crate::{
    varint::{decode_varint, decode_varint_at, encode_varint},
    StatErr,
};

/// Wrapper around a byte vector.
///
/// An empty packet is built with [Packet::new] and filled through the `write_*`
/// methods, a received stream is wrapped with [Packet::from_bytes] and inspected
/// through the `read_*` methods. Reads never consume or mutate the bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Packet {
    data: Vec<u8>,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn get(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Prepend the current length as VarInt, as every packet on the wire is framed.
    ///
    /// Call once, after all other writes.
    pub fn sign(&mut self) {
        let mut signed = encode_varint(self.data.len() as i32);

        signed.append(&mut self.data);
        self.data = signed;
    }

    pub fn write_varint(&mut self, num: i32) -> &mut Self {
        self.data.append(&mut encode_varint(num));
        self
    }

    /// Unsigned short, big endian.
    pub fn write_short(&mut self, num: u16) -> &mut Self {
        self.data.extend_from_slice(&num.to_be_bytes());
        self
    }

    /// UTF-8 string prefixed with its size in bytes as a VarInt.
    pub fn write_string(&mut self, str: &str) -> &mut Self {
        self.write_varint(str.len() as i32);
        self.data.extend_from_slice(str.as_bytes());
        self
    }

    pub fn read_varint(&self) -> Result<i32, StatErr> {
        Ok(self.read_varint_with_len()?.0)
    }

    /// Read the leading VarInt together with the number of bytes it occupies.
    pub fn read_varint_with_len(&self) -> Result<(i32, usize), StatErr> {
        decode_varint(&self.data)
    }

    pub fn read_varint_at(&self, idx: usize) -> Result<i32, StatErr> {
        Ok(self.read_varint_with_len_at(idx)?.0)
    }

    pub fn read_varint_with_len_at(&self, idx: usize) -> Result<(i32, usize), StatErr> {
        decode_varint_at(&self.data, idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_prepends_length() {
        let mut packet = Packet::new();

        packet.write_varint(0x00).write_string("localhost").write_short(25565);

        let content = packet.get().to_vec();

        packet.sign();

        let mut expected = encode_varint(content.len() as i32);
        expected.extend_from_slice(&content);
        assert_eq!(packet.get(), expected.as_slice());
    }

    #[test]
    fn test_sign_long_content_uses_multi_byte_prefix() {
        let mut packet = Packet::new();

        packet.write_string(&"a".repeat(200));
        packet.sign();

        // 2 byte string prefix + 200 bytes = 202 = [0xCA, 0x01]
        assert_eq!(&packet.get()[..3], &[0xCA, 0x01, 0xC8]);
        assert_eq!(packet.get().len(), 2 + 202);
    }

    #[test]
    fn test_write_short_is_big_endian() {
        let mut packet = Packet::new();

        packet.write_short(0x63DD);

        assert_eq!(packet.into_bytes(), vec![0x63, 0xDD]);
    }

    #[test]
    fn test_write_string_prefix_counts_bytes() {
        let mut packet = Packet::new();

        packet.write_string("§a");

        assert_eq!(packet.get(), &[0x03, 0xC2, 0xA7, b'a']);
    }

    #[test]
    fn test_reads_do_not_mutate() {
        let packet = Packet::from_bytes(vec![0xAC, 0x02, 0x00, 0x05]);

        assert_eq!(packet.read_varint().unwrap(), 300);
        assert_eq!(packet.read_varint_with_len().unwrap(), (300, 2));
        assert_eq!(packet.read_varint_at(3).unwrap(), 5);
        assert_eq!(packet.read_varint_with_len_at(2).unwrap(), (0, 1));
        assert_eq!(packet.get(), &[0xAC, 0x02, 0x00, 0x05]);
    }

    #[test]
    fn test_out_of_range_read_fails() {
        let packet = Packet::from_bytes(vec![0x80, 0x80]);

        assert!(packet.read_varint().is_err());
        assert!(packet.read_varint_at(7).is_err());
    }
}
