//! Constants: immutable literals, each reporting its own type (§3.5).

use ast_error::Result;

use crate::types::{Type, TypeKind};

/// An immutable literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantKind {
    Integer(i64, u8, bool),
    Bool(bool),
    String(String),
    Double(f64),
    Address(String),
    Network(String, u8),
    Port(u16, PortProtocol),
    Interval(i64),
    Time(i64),
    EnumLabel { enum_name: String, label: String },
    Bitset { enum_name: String, labels: Vec<String> },
    Tuple(Vec<Constant>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortProtocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    kind: ConstantKind,
}

impl Constant {
    pub fn new(kind: ConstantKind) -> Self {
        Constant { kind }
    }

    pub fn kind(&self) -> &ConstantKind {
        &self.kind
    }

    pub fn ty(&self) -> Type {
        match &self.kind {
            ConstantKind::Integer(_, width, signed) => Type::new(TypeKind::Integer {
                width: *width,
                signed: *signed,
            }),
            ConstantKind::Bool(_) => Type::new(TypeKind::Bool),
            ConstantKind::String(_) => Type::new(TypeKind::String),
            ConstantKind::Double(_) => Type::new(TypeKind::Double),
            ConstantKind::Address(_) => Type::new(TypeKind::Address),
            ConstantKind::Network(_, _) => Type::new(TypeKind::Network),
            ConstantKind::Port(_, _) => Type::new(TypeKind::Port),
            ConstantKind::Interval(_) => Type::new(TypeKind::Interval),
            ConstantKind::Time(_) => Type::new(TypeKind::Time),
            ConstantKind::EnumLabel { enum_name, .. } => Type::new(TypeKind::EnumLabel {
                enum_name: enum_name.clone(),
            }),
            ConstantKind::Bitset { labels, .. } => Type::new(TypeKind::Bitset {
                labels: labels.clone(),
            }),
            ConstantKind::Tuple(elems) => {
                Type::new(TypeKind::Tuple(elems.iter().map(Constant::ty).collect()))
            }
        }
    }

    /// Parses a dotted-quad or colon-separated address literal. Kept
    /// minimal (representative parsing, not a full validating parser).
    pub fn parse_address(text: &str) -> Result<Constant> {
        if text.parse::<std::net::IpAddr>().is_ok() {
            Ok(Constant::new(ConstantKind::Address(text.to_string())))
        } else {
            Err(ast_error::Error::constant_parse_failed(format!(
                "'{}' is not a valid address literal",
                text
            )))
        }
    }

    /// Parses a `addr/prefix` network literal.
    pub fn parse_network(text: &str) -> Result<Constant> {
        let (addr, prefix) = text
            .split_once('/')
            .ok_or_else(|| {
                ast_error::Error::constant_parse_failed(format!(
                    "'{}' is missing a '/prefix' suffix",
                    text
                ))
            })?;
        if addr.parse::<std::net::IpAddr>().is_err() {
            return Err(ast_error::Error::constant_parse_failed(format!(
                "'{}' is not a valid network address",
                addr
            )));
        }
        let prefix: u8 = prefix.parse().map_err(|_| {
            ast_error::Error::constant_parse_failed(format!(
                "'{}' is not a valid prefix length",
                prefix
            ))
        })?;
        Ok(Constant::new(ConstantKind::Network(
            addr.to_string(),
            prefix,
        )))
    }

    /// Parses a `N/proto` port literal, e.g. `80/tcp`.
    pub fn parse_port(text: &str) -> Result<Constant> {
        let (num, proto) = text.split_once('/').ok_or_else(|| {
            ast_error::Error::constant_parse_failed(format!(
                "'{}' is missing a '/tcp' or '/udp' suffix",
                text
            ))
        })?;
        let num: u16 = num.parse().map_err(|_| {
            ast_error::Error::constant_parse_failed(format!("'{}' is not a valid port number", num))
        })?;
        let proto = match proto {
            "tcp" => PortProtocol::Tcp,
            "udp" => PortProtocol::Udp,
            other => {
                return Err(ast_error::Error::constant_parse_failed(format!(
                    "unknown port protocol '{}'",
                    other
                )))
            }
        };
        Ok(Constant::new(ConstantKind::Port(num, proto)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_constant_reports_its_width() {
        let c = Constant::new(ConstantKind::Integer(42, 32, true));
        assert_eq!(
            c.ty(),
            Type::new(TypeKind::Integer {
                width: 32,
                signed: true
            })
        );
    }

    #[test]
    fn tuple_constant_type_is_elementwise() {
        let c = Constant::new(ConstantKind::Tuple(vec![
            Constant::new(ConstantKind::Bool(true)),
            Constant::new(ConstantKind::Integer(1, 64, false)),
        ]));
        let ty = c.ty();
        assert_eq!(ty.type_list().unwrap().len(), 2);
    }

    #[test]
    fn parse_address_accepts_valid_ipv4() {
        let c = Constant::parse_address("192.168.1.1").unwrap();
        assert_eq!(c.ty(), Type::new(TypeKind::Address));
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(Constant::parse_address("not-an-address").is_err());
    }

    #[test]
    fn parse_network_requires_prefix() {
        assert!(Constant::parse_network("10.0.0.0").is_err());
        let c = Constant::parse_network("10.0.0.0/8").unwrap();
        assert_eq!(c.ty(), Type::new(TypeKind::Network));
    }

    #[test]
    fn parse_port_accepts_tcp_and_udp() {
        assert!(Constant::parse_port("80/tcp").is_ok());
        assert!(Constant::parse_port("53/udp").is_ok());
        assert!(Constant::parse_port("80/sctp").is_err());
        assert!(Constant::parse_port("notanumber/tcp").is_err());
    }
}
