/// Calculate the key tag for a DNSKEY record (RFC 4034 Appendix B)
pub fn calculate_key_tag(flags: u16, protocol: u8, algorithm: u8, public_key: &[u8]) -> u16 {
    // RSA/MD5 keys: most significant 16 of the least significant 24 bits of the modulus
    if algorithm == 1 {
        let len = public_key.len();
        if len >= 3 {
            return u16::from_be_bytes([public_key[len - 3], public_key[len - 2]]);
        }
        return 0;
    }

    let mut rdata = Vec::with_capacity(4 + public_key.len());
    rdata.extend_from_slice(&flags.to_be_bytes());
    rdata.push(protocol);
    rdata.push(algorithm);
    rdata.extend_from_slice(public_key);

    let mut accumulator: u32 = 0;
    for (i, &byte) in rdata.iter().enumerate() {
        if i % 2 == 0 {
            accumulator += u32::from(byte) << 8;
        } else {
            accumulator += u32::from(byte);
        }
    }

    accumulator += (accumulator >> 16) & 0xFFFF;
    (accumulator & 0xFFFF) as u16
}

/// Secure Entry Point flag (RFC 4034 section 2.1.1), bit 15 in wire order
pub const SEP_FLAG: u16 = 0x0001;

pub fn is_secure_entry_point(flags: u16) -> bool {
    flags & SEP_FLAG != 0
}
