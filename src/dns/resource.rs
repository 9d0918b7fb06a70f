use bitstream_io::{BitRead, BitReader, BitWrite, BitWriter, Endianness};
use tracing::debug;

use super::{
    ParseError,
    common::{PacketComponent, labels_from_name, name_from_labels},
    enums::{DNSResourceClass, DNSResourceType},
    rdata::RData,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSResource {
    pub labels: Vec<String>,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    /// Class field as sent; OPT records carry the UDP payload size here
    pub raw_class: u16,
    pub ttl: u32,
    pub rdlength: u16,
    pub rdata: Vec<u8>,
    pub parsed_rdata: Option<RData>,
}

impl DNSResource {
    /// Build an IN-class record from decoded RDATA.
    pub fn new(name: &str, ttl: u32, data: RData) -> Result<Self, ParseError> {
        let rdata = data.to_bytes()?;
        Ok(Self {
            labels: labels_from_name(name),
            rtype: data.rtype(),
            rclass: DNSResourceClass::IN,
            raw_class: DNSResourceClass::IN.into(),
            ttl,
            rdlength: rdata.len() as u16,
            rdata,
            parsed_rdata: Some(data),
        })
    }

    pub fn name(&self) -> String {
        name_from_labels(&self.labels)
    }
}

impl PacketComponent for DNSResource {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        self.write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.rtype.into())?;
        writer.write_var::<u16>(16, self.raw_class)?;
        writer.write_var::<u32>(32, self.ttl)?;
        writer.write_var::<u16>(16, self.rdata.len() as u16)?;
        writer.write_bytes(&self.rdata)?;
        Ok(())
    }

    fn read<E: Endianness>(
        &mut self,
        reader: &mut BitReader<&[u8], E>,
        packet: &[u8],
    ) -> Result<(), ParseError> {
        self.labels = self.read_labels(reader, packet)?;
        self.rtype = reader.read_var::<u16>(16)?.into();
        self.raw_class = reader.read_var::<u16>(16)?;
        self.rclass = self.raw_class.into();
        self.ttl = reader.read_var::<u32>(32)?;
        self.rdlength = reader.read_var::<u16>(16)?;
        let mut buf = vec![0_u8; self.rdlength as usize];
        reader.read_bytes(&mut buf)?;
        self.rdata = buf;

        self.parsed_rdata = match RData::parse(self.rtype, &self.rdata, packet) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Leaving {} rdata undecoded: {}", self.rtype, e);
                None
            }
        };

        Ok(())
    }
}
