use crate::StatErr;

const SEGMENT_BITS: u32 = 0x7F;
const CHECKER_BIT: u8 = 0x80;
const MAX_VARINT_LEN: usize = 5;

/// Encode the given number as a [VarInt](https://wiki.vg/Protocol#VarInt_and_VarLong).
pub fn encode_varint(num: i32) -> Vec<u8> {
    // The protocol documentation mentions: "negative values always use the maximum number of bytes."
    // Encoding a negative number therefore encodes its two's complement, which is
    // exactly what the unsigned shift of the `u32` cast gives us.
    let mut num = num as u32;
    let mut result = Vec::<u8>::with_capacity(MAX_VARINT_LEN);

    loop {
        if (num & (!SEGMENT_BITS)) == 0 {
            result.push(num as u8);

            return result;
        }

        result.push(((num & SEGMENT_BITS) as u8) | CHECKER_BIT);
        num >>= 7;
    }
}

/// Decode a VarInt from the start of `bufs`, returning the value and how many bytes it used.
///
/// Running out of input before the terminating byte is a bounds error, just like
/// a VarInt longer than 5 bytes.
pub fn decode_varint(bufs: &[u8]) -> Result<(i32, usize), StatErr> {
    match try_decode_varint(bufs)? {
        Some(decoded) => Ok(decoded),
        None => Err(StatErr::ProtocolErr(format!(
            "VarInt exceeds buffer bounds, got {} byte(s) without a terminator",
            bufs.len()
        ))),
    }
}

/// Decode a VarInt starting at `idx`.
pub fn decode_varint_at(bufs: &[u8], idx: usize) -> Result<(i32, usize), StatErr> {
    match bufs.get(idx..) {
        Some(sub) => decode_varint(sub),
        None => Err(StatErr::ProtocolErr(format!(
            "VarInt offset {} is out of bounds for {} byte(s)",
            idx,
            bufs.len()
        ))),
    }
}

/// Streaming flavour of [decode_varint].
///
/// Returns `Ok(None)` when `bufs` holds the valid beginning of a VarInt whose
/// remaining bytes have not arrived yet.
pub fn try_decode_varint(bufs: &[u8]) -> Result<Option<(i32, usize)>, StatErr> {
    let mut result = 0u32;

    for (i, &buf) in bufs.iter().enumerate() {
        result |= (buf as u32 & SEGMENT_BITS) << (i * 7);

        if buf & CHECKER_BIT == 0 {
            return Ok(Some((result as i32, i + 1)));
        }

        // VarInts are never longer than 5 bytes
        if i + 1 >= MAX_VARINT_LEN {
            return Err(StatErr::ProtocolErr(format!(
                "VarInt too long, it exceeds allowed bounds: [{}]",
                bufs[..=i]
                    .iter()
                    .map(|x| format!("0x{:02X}", x))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }

    Ok(None)
}
