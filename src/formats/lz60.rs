//! Nintendo LZ60 (compression type 0x60): the LZ40 stream under a
//! different type byte.

use crate::errors::CodecError;

use super::lz40;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    lz40::decode_typed(input, 0x60)
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    lz40::encode_typed(input, 0x60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_under_its_own_type_byte() {
        let input = b"sixty sixty sixty sixty";
        let packed = encode(input).unwrap();
        assert_eq!(packed[0], 0x60);
        assert_eq!(decode(&packed).unwrap(), input);
    }

    #[test]
    fn rejects_the_lz40_type_byte() {
        let packed = lz40::encode(b"forty forty").unwrap();
        assert!(decode(&packed).is_err());
    }
}
