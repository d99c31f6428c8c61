//! Service port mappings

use k8s_openapi::api::core::v1::{Service, ServicePort};
use nsxlb_core::{NsxlbError, NsxlbResult, Pool, TcpMonitor, VirtualServer};
use std::str::FromStr;

use crate::tags::{check_tags, port_tag};

/// Port protocol of a Service port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Sctp => "SCTP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = NsxlbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            "SCTP" => Ok(Protocol::Sctp),
            other => Err(NsxlbError::InvalidProtocol(other.to_string())),
        }
    }
}

/// Port mapping of one Service port: source port, node port and protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping {
    /// Service port
    pub source_port: u16,
    /// Node port traffic is forwarded to, 0 if not allocated yet
    pub node_port: u16,
    pub protocol: Protocol,
}

impl Mapping {
    /// Whether the virtual server listens on this mapping's port and protocol
    pub fn match_virtual_server(&self, server: &VirtualServer) -> bool {
        server.port == format_port(self.source_port) && server.ip_protocol == self.protocol.as_str()
    }

    /// Whether the pool carries this mapping's port tag
    pub fn match_pool(&self, pool: &Pool) -> bool {
        check_tags(&pool.tags, &[port_tag(self)])
    }

    /// Whether the monitor carries this mapping's port tag
    pub fn match_tcp_monitor(&self, monitor: &TcpMonitor) -> bool {
        check_tags(&monitor.tags, &[port_tag(self)])
    }

    /// Whether the virtual server forwards to this mapping's node port
    pub fn match_node_port(&self, server: &VirtualServer) -> bool {
        server.default_pool_member_port == format_port(self.node_port)
    }
}

impl TryFrom<&ServicePort> for Mapping {
    type Error = NsxlbError;

    fn try_from(port: &ServicePort) -> Result<Self, Self::Error> {
        let source_port = u16::try_from(port.port)
            .map_err(|_| NsxlbError::InvalidServicePort(format!("port {}", port.port)))?;
        let node_port = match port.node_port {
            Some(p) => u16::try_from(p)
                .map_err(|_| NsxlbError::InvalidServicePort(format!("node port {}", p)))?,
            None => 0,
        };
        let protocol = match port.protocol.as_deref() {
            Some(p) => p.parse()?,
            None => Protocol::Tcp,
        };
        Ok(Mapping {
            source_port,
            node_port,
            protocol,
        })
    }
}

impl std::fmt::Display for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}->{}", self.protocol, self.source_port, self.node_port)
    }
}

impl FromStr for Mapping {
    type Err = NsxlbError;

    /// Parse the `PROTOCOL/source->node` form produced by `Display`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NsxlbError::InvalidServicePort(s.to_string());
        let (protocol, ports) = s.split_once('/').ok_or_else(invalid)?;
        let (source, node) = ports.split_once("->").ok_or_else(invalid)?;
        Ok(Mapping {
            source_port: source.parse().map_err(|_| invalid())?,
            node_port: node.parse().map_err(|_| invalid())?,
            protocol: protocol.parse()?,
        })
    }
}

/// Mappings for all ports of a Service, in declaration order
pub fn mappings_for_service(service: &Service) -> NsxlbResult<Vec<Mapping>> {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_ref())
        .map(|ports| {
            ports
                .iter()
                .map(Mapping::try_from)
                .collect::<NsxlbResult<Vec<_>>>()
        })
        .unwrap_or_else(|| Ok(Vec::new()))
}

fn format_port(port: u16) -> String {
    port.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsxlb_core::Tag;

    fn tcp_80() -> Mapping {
        Mapping {
            source_port: 80,
            node_port: 30080,
            protocol: Protocol::Tcp,
        }
    }

    #[test]
    fn test_match_virtual_server() {
        let mut server = VirtualServer {
            port: "80".to_string(),
            ip_protocol: "TCP".to_string(),
            default_pool_member_port: "30080".to_string(),
            ..Default::default()
        };
        let mapping = tcp_80();
        assert!(mapping.match_virtual_server(&server));
        assert!(mapping.match_node_port(&server));

        server.ip_protocol = "UDP".to_string();
        assert!(!mapping.match_virtual_server(&server));

        server.ip_protocol = "TCP".to_string();
        server.port = "080".to_string();
        assert!(!mapping.match_virtual_server(&server));

        server.default_pool_member_port = "30081".to_string();
        assert!(!mapping.match_node_port(&server));
    }

    #[test]
    fn test_match_pool_and_monitor_by_port_tag() {
        let pool = Pool {
            id: "pool-1".to_string(),
            tags: vec![Tag::new("cluster", "prod"), Tag::new("port", "TCP/80")],
            ..Default::default()
        };
        let monitor = TcpMonitor {
            id: "mon-1".to_string(),
            tags: vec![Tag::new("port", "UDP/80")],
            ..Default::default()
        };

        assert!(tcp_80().match_pool(&pool));
        assert!(!tcp_80().match_tcp_monitor(&monitor));

        let udp = Mapping {
            protocol: Protocol::Udp,
            ..tcp_80()
        };
        assert!(udp.match_tcp_monitor(&monitor));
        assert!(!udp.match_pool(&pool));
    }

    #[test]
    fn test_display_and_parse() {
        let mapping = tcp_80();
        assert_eq!(mapping.to_string(), "TCP/80->30080");
        assert_eq!("TCP/80->30080".parse::<Mapping>().unwrap(), mapping);
        assert!("TCP/80".parse::<Mapping>().is_err());
        assert!("HTTP/80->1".parse::<Mapping>().is_err());
        assert!("TCP/99999->1".parse::<Mapping>().is_err());
    }

    #[test]
    fn test_from_service_port() {
        let port = ServicePort {
            port: 53,
            node_port: Some(30053),
            protocol: Some("UDP".to_string()),
            ..Default::default()
        };
        let mapping = Mapping::try_from(&port).unwrap();
        assert_eq!(mapping.source_port, 53);
        assert_eq!(mapping.node_port, 30053);
        assert_eq!(mapping.protocol, Protocol::Udp);

        let port = ServicePort {
            port: 8080,
            ..Default::default()
        };
        let mapping = Mapping::try_from(&port).unwrap();
        assert_eq!(mapping.node_port, 0);
        assert_eq!(mapping.protocol, Protocol::Tcp);

        let port = ServicePort {
            port: 70000,
            ..Default::default()
        };
        assert!(matches!(
            Mapping::try_from(&port),
            Err(NsxlbError::InvalidServicePort(_))
        ));
    }

    #[test]
    fn test_mappings_for_service() {
        let service: Service = serde_json::from_value(serde_json::json!({
            "metadata": { "namespace": "default", "name": "web" },
            "spec": {
                "type": "LoadBalancer",
                "ports": [
                    { "port": 80, "nodePort": 30080, "protocol": "TCP" },
                    { "port": 443, "nodePort": 30443 }
                ]
            }
        }))
        .unwrap();

        let mappings = mappings_for_service(&service).unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0], tcp_80());
        assert_eq!(mappings[1].source_port, 443);

        assert!(mappings_for_service(&Service::default()).unwrap().is_empty());
    }
}
