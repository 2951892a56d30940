//! Object-type factory
//!
//! Maps numeric COSEM class ids to object constructors. The registry is the
//! only process-wide state in the engine: populated once under a lock on
//! first use and read-only thereafter. It exists to tag decoded values with
//! their interface class; class semantics live outside this engine.

use cosem_core::ObisCode;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// COSEM interface classes known to this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Data,
    Register,
    ExtendedRegister,
    DemandRegister,
    RegisterActivation,
    ProfileGeneric,
    Clock,
    ScriptTable,
    Schedule,
    SpecialDaysTable,
    AssociationShortName,
    AssociationLogicalName,
    SapAssignment,
    ImageTransfer,
    IecLocalPortSetup,
    ActivityCalendar,
    RegisterMonitor,
    SingleActionSchedule,
    IecHdlcSetup,
    IecTwistedPairSetup,
    MBusSlavePortSetup,
    ModemConfiguration,
    AutoConnect,
    PushSetup,
    TcpUdpSetup,
    Ip4Setup,
    MacAddressSetup,
    Ip6Setup,
    GprsSetup,
    SecuritySetup,
    DisconnectControl,
    Limiter,
    CompactData,
}

impl ObjectType {
    pub fn class_id(self) -> u16 {
        match self {
            ObjectType::Data => 1,
            ObjectType::Register => 3,
            ObjectType::ExtendedRegister => 4,
            ObjectType::DemandRegister => 5,
            ObjectType::RegisterActivation => 6,
            ObjectType::ProfileGeneric => 7,
            ObjectType::Clock => 8,
            ObjectType::ScriptTable => 9,
            ObjectType::Schedule => 10,
            ObjectType::SpecialDaysTable => 11,
            ObjectType::AssociationShortName => 12,
            ObjectType::AssociationLogicalName => 15,
            ObjectType::SapAssignment => 17,
            ObjectType::ImageTransfer => 18,
            ObjectType::IecLocalPortSetup => 19,
            ObjectType::ActivityCalendar => 20,
            ObjectType::RegisterMonitor => 21,
            ObjectType::SingleActionSchedule => 22,
            ObjectType::IecHdlcSetup => 23,
            ObjectType::IecTwistedPairSetup => 24,
            ObjectType::MBusSlavePortSetup => 25,
            ObjectType::ModemConfiguration => 27,
            ObjectType::AutoConnect => 29,
            ObjectType::PushSetup => 40,
            ObjectType::TcpUdpSetup => 41,
            ObjectType::Ip4Setup => 42,
            ObjectType::MacAddressSetup => 43,
            ObjectType::Ip6Setup => 48,
            ObjectType::GprsSetup => 45,
            ObjectType::SecuritySetup => 64,
            ObjectType::DisconnectControl => 70,
            ObjectType::Limiter => 71,
            ObjectType::CompactData => 62,
        }
    }
}

/// A decoded value tagged with its interface class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosemObject {
    pub object_type: ObjectType,
    pub logical_name: ObisCode,
}

const ALL_TYPES: [ObjectType; 33] = [
    ObjectType::Data,
    ObjectType::Register,
    ObjectType::ExtendedRegister,
    ObjectType::DemandRegister,
    ObjectType::RegisterActivation,
    ObjectType::ProfileGeneric,
    ObjectType::Clock,
    ObjectType::ScriptTable,
    ObjectType::Schedule,
    ObjectType::SpecialDaysTable,
    ObjectType::AssociationShortName,
    ObjectType::AssociationLogicalName,
    ObjectType::SapAssignment,
    ObjectType::ImageTransfer,
    ObjectType::IecLocalPortSetup,
    ObjectType::ActivityCalendar,
    ObjectType::RegisterMonitor,
    ObjectType::SingleActionSchedule,
    ObjectType::IecHdlcSetup,
    ObjectType::IecTwistedPairSetup,
    ObjectType::MBusSlavePortSetup,
    ObjectType::ModemConfiguration,
    ObjectType::AutoConnect,
    ObjectType::PushSetup,
    ObjectType::TcpUdpSetup,
    ObjectType::Ip4Setup,
    ObjectType::MacAddressSetup,
    ObjectType::Ip6Setup,
    ObjectType::GprsSetup,
    ObjectType::SecuritySetup,
    ObjectType::DisconnectControl,
    ObjectType::Limiter,
    ObjectType::CompactData,
];

static REGISTRY: Lazy<HashMap<u16, ObjectType>> = Lazy::new(|| {
    ALL_TYPES
        .into_iter()
        .map(|object_type| (object_type.class_id(), object_type))
        .collect()
});

/// Construct a tagged object for `class_id`, or `None` for classes this
/// engine does not know.
pub fn create_object(class_id: u16, logical_name: ObisCode) -> Option<CosemObject> {
    REGISTRY.get(&class_id).map(|&object_type| CosemObject {
        object_type,
        logical_name,
    })
}
