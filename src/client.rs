use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::dns::DNSPacket;
use crate::dns::constants::MAX_MESSAGE_SIZE;
use crate::dns::enums::DNSResourceType;
use crate::error::{DnsError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transport {
    Udp,
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Udp => f.write_str("UDP"),
            Transport::Tcp => f.write_str("TCP"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdnsRequest {
    pub payload_size: u16,
    pub dnssec_ok: bool,
}

/// One question to ask one server.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Query {
    pub name: String,
    pub qtype: DNSResourceType,
    pub transport: Transport,
    pub recursion_desired: bool,
    pub edns: Option<EdnsRequest>,
}

impl Query {
    /// Recursive UDP query without EDNS.
    pub fn new(name: impl Into<String>, qtype: DNSResourceType) -> Self {
        Self {
            name: name.into(),
            qtype,
            transport: Transport::Udp,
            recursion_desired: true,
            edns: None,
        }
    }

    pub fn over(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Clear the RD bit, for questions aimed at authoritative servers.
    pub fn non_recursive(mut self) -> Self {
        self.recursion_desired = false;
        self
    }

    pub fn with_edns(mut self, payload_size: u16, dnssec_ok: bool) -> Self {
        self.edns = Some(EdnsRequest {
            payload_size,
            dnssec_ok,
        });
        self
    }

    pub fn to_packet(&self, id: u16) -> DNSPacket {
        let mut packet = DNSPacket::query(id, &self.name, self.qtype, self.recursion_desired);
        if let Some(edns) = self.edns {
            packet.add_edns(edns.payload_size, edns.dnssec_ok);
        }
        packet
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} over {}", self.name, self.qtype, self.transport)?;
        if let Some(edns) = self.edns {
            write!(f, " with EDNS0 ({}", edns.payload_size)?;
            if edns.dnssec_ok {
                f.write_str(", DO")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Sends a single query to a single server and returns its response.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn query(&self, query: &Query, server: SocketAddr) -> Result<DNSPacket>;
}

/// `QueryClient` over real sockets. Each query opens its own socket or
/// connection and drops it when the exchange ends, however it ends.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    timeout: Duration,
}

impl NetworkClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn send_udp_query(
        &self,
        query_bytes: &[u8],
        query_id: u16,
        server: SocketAddr,
    ) -> Result<DNSPacket> {
        let bind_addr = if server.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(server).await?;
        socket.send(query_bytes).await?;

        let mut response_buf = vec![0u8; MAX_MESSAGE_SIZE];
        loop {
            let response_len = socket.recv(&mut response_buf).await?;
            trace!(
                "Raw UDP response data ({} bytes): {:02x?}",
                response_len,
                &response_buf[..response_len.min(64)]
            );
            let datagram = &response_buf[..response_len];
            let response = match DNSPacket::parse(datagram) {
                Ok(response) => response,
                // A malformed answer carrying our id is the answer
                Err(e) if datagram.len() >= 2 && datagram[..2] == query_id.to_be_bytes() => {
                    debug!("Failed to parse UDP response from {}: {}", server, e);
                    return Err(e.into());
                }
                Err(e) => {
                    debug!("Ignoring unparseable UDP datagram from {}: {}", server, e);
                    continue;
                }
            };

            // Stray datagrams are skipped; the timeout bounds the wait
            if response.header.id != query_id {
                debug!(
                    "Ignoring UDP response with id {} from {} (expected {})",
                    response.header.id, server, query_id
                );
                continue;
            }
            return Ok(response);
        }
    }

    async fn send_tcp_query(
        &self,
        query_bytes: &[u8],
        query_id: u16,
        server: SocketAddr,
    ) -> Result<DNSPacket> {
        let mut stream = TcpStream::connect(server).await?;

        let query_length = query_bytes.len() as u16;
        stream.write_all(&query_length.to_be_bytes()).await?;
        stream.write_all(query_bytes).await?;
        stream.flush().await?;

        let mut length_buf = [0u8; 2];
        stream.read_exact(&mut length_buf).await?;
        let response_length = u16::from_be_bytes(length_buf) as usize;

        let mut response_buf = vec![0; response_length];
        stream.read_exact(&mut response_buf).await?;
        trace!(
            "Raw TCP response data ({} bytes): {:02x?}",
            response_length,
            &response_buf[..response_length.min(64)]
        );

        let response = DNSPacket::parse(&response_buf).map_err(|e| {
            debug!("Failed to parse TCP response from {}: {}", server, e);
            DnsError::from(e)
        })?;
        if response.header.id != query_id {
            return Err(DnsError::IdMismatch {
                expected: query_id,
                got: response.header.id,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl QueryClient for NetworkClient {
    async fn query(&self, query: &Query, server: SocketAddr) -> Result<DNSPacket> {
        let query_id: u16 = rand::random();
        let query_bytes = query.to_packet(query_id).serialize()?;
        trace!("Sending {} ({} bytes) to {}", query, query_bytes.len(), server);

        let exchange = async {
            match query.transport {
                Transport::Udp => self.send_udp_query(&query_bytes, query_id, server).await,
                Transport::Tcp => self.send_tcp_query(&query_bytes, query_id, server).await,
            }
        };

        let response = timeout(self.timeout, exchange)
            .await
            .map_err(|_| DnsError::Timeout)??;

        if !response.header.qr {
            return Err(DnsError::InvalidPacket(
                "Response does not have the QR bit set".to_string(),
            ));
        }

        debug!(
            "{} answered {}: rcode={}, answers={}, edns={}",
            server,
            query,
            response.header.rcode,
            response.answers.len(),
            response.supports_edns()
        );
        Ok(response)
    }
}
