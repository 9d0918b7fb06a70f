/// DNS Response Code constants from RFC 1035 and subsequent RFCs
pub struct DNSRcode;

impl DNSRcode {
    pub const NOERROR: u8 = 0; // No error
    pub const FORMERR: u8 = 1; // Format error
    pub const SERVFAIL: u8 = 2; // Server failure
    pub const NXDOMAIN: u8 = 3; // Name error
    pub const NOTIMP: u8 = 4; // Not implemented
    pub const REFUSED: u8 = 5; // Query refused
}

/// Standard DNS port
pub const DNS_PORT: u16 = 53;

/// Largest message a UDP or TCP response can carry
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// Upper bound on compression pointers followed while decoding one name
pub const MAX_POINTER_HOPS: usize = 32;

/// Maximum encoded length of a domain name (RFC 1035 section 2.3.4)
pub const MAX_NAME_LENGTH: usize = 255;
