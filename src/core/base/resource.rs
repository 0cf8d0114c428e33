//! Resource/Traffic Wrappers
use crate::utils::format_time_nanos_curr;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceType {
    Common = 0,
    Web,
    RPC,
    APIGateway,
    DBSQL,
    Cache,
    MQ,
}

impl Default for ResourceType {
    fn default() -> ResourceType {
        ResourceType::Common
    }
}

impl From<u8> for ResourceType {
    fn from(num: u8) -> ResourceType {
        match num {
            1 => ResourceType::Web,
            2 => ResourceType::RPC,
            3 => ResourceType::APIGateway,
            4 => ResourceType::DBSQL,
            5 => ResourceType::Cache,
            6 => ResourceType::MQ,
            _ => ResourceType::Common,
        }
    }
}

/// TrafficType describes the direction of traffic relative to this process.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrafficType {
    /// traffic this process sends to others
    Outbound,
    /// traffic this process receives
    Inbound,
}

impl Default for TrafficType {
    fn default() -> TrafficType {
        TrafficType::Outbound
    }
}

/// ResourceWrapper uniquely identifies a resource by name; the resource type and
/// traffic direction are metadata carried alongside the identity, not part of it.
#[derive(Debug, Clone)]
pub struct ResourceWrapper {
    name: String,
    resource_type: ResourceType,
    flow_type: TrafficType,
}

impl Default for ResourceWrapper {
    fn default() -> Self {
        ResourceWrapper {
            name: format_time_nanos_curr(),
            resource_type: ResourceType::default(),
            flow_type: TrafficType::default(),
        }
    }
}

impl fmt::Display for ResourceWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResourceWrapper{{name={}, flow_type={:?}, resource_type={:?}}}",
            self.name, self.flow_type, self.resource_type
        )
    }
}

impl ResourceWrapper {
    pub fn new(name: String, resource_type: ResourceType, flow_type: TrafficType) -> Self {
        ResourceWrapper {
            name,
            resource_type,
            flow_type,
        }
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn flow_type(&self) -> &TrafficType {
        &self.flow_type
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resource_type_roundtrip() {
        for t in 0u8..=6u8 {
            let rt: ResourceType = t.into();
            assert_eq!(rt as u8, t);
        }
        let rt: ResourceType = 200u8.into();
        assert_eq!(rt, ResourceType::Common);
    }

    #[test]
    fn display() {
        let rw = ResourceWrapper::new("abc".into(), ResourceType::Web, TrafficType::Inbound);
        assert_eq!(rw.name(), "abc");
        assert!(format!("{}", rw).contains("abc"));
    }
}
