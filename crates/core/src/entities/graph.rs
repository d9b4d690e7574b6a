//! Static entity schema graph.
//!
//! Every entity type the portal stores is a variant of [`EntityType`], which
//! names its table, its identity attribute and the fields that embed other
//! entities. Response schema keys map onto [`SchemaShape`] roots through
//! [`root_schema`].

use std::fmt;

/// Identity attribute used unless a type declares its own.
pub const DEFAULT_ID_ATTRIBUTE: &str = "id";

/// Whether a relation embeds one entity or an array of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// A single nested object.
    One,
    /// An array of nested objects.
    Many,
}

/// A field of an entity (or root object) that holds other entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    /// Field name in the payload.
    pub field: &'static str,
    /// Entity type stored in the field.
    pub target: EntityType,
    /// One object or an array of objects.
    pub cardinality: Cardinality,
}

impl Relation {
    /// A field holding one entity.
    pub const fn one(field: &'static str, target: EntityType) -> Self {
        Self {
            field,
            target,
            cardinality: Cardinality::One,
        }
    }

    /// A field holding an array of entities.
    pub const fn many(field: &'static str, target: EntityType) -> Self {
        Self {
            field,
            target,
            cardinality: Cardinality::Many,
        }
    }
}

/// Shape of a response body, selected by its schema key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaShape {
    /// A single entity.
    Entity(EntityType),
    /// An array of entities.
    List(EntityType),
    /// A plain object whose listed fields hold entities.
    Object(&'static [Relation]),
}

/// Every entity type the portal normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    /// Logged-in user.
    User,
    /// Role granted to a user.
    Role,
    /// Service member (customer, internal API).
    ServiceMember,
    /// Orders issued to a service member.
    Order,
    /// A move under a set of orders.
    Move,
    /// Personally procured move.
    PersonallyProcuredMove,
    /// Service member backup contact.
    BackupContact,
    /// Duty location.
    DutyLocation,
    /// Uploaded document.
    Document,
    /// One file of a document.
    Upload,
    /// Customer (GHC API).
    Customer,
    /// Move task order.
    MoveTaskOrder,
    /// Shipment of a move task order.
    MtoShipment,
    /// Service item of a move task order.
    MtoServiceItem,
    /// Releasing or receiving agent of a shipment.
    MtoAgent,
    /// Payment request.
    PaymentRequest,
    /// Service item billed by a payment request.
    PaymentServiceItem,
    /// Shipment (generic shipment resource).
    Shipment,
}

const USER_RELATIONS: &[Relation] = &[
    Relation::one("service_member", EntityType::ServiceMember),
    Relation::many("roles", EntityType::Role),
];

const SERVICE_MEMBER_RELATIONS: &[Relation] = &[
    Relation::many("orders", EntityType::Order),
    Relation::many("backup_contacts", EntityType::BackupContact),
    Relation::one("current_location", EntityType::DutyLocation),
];

const ORDER_RELATIONS: &[Relation] = &[
    Relation::many("moves", EntityType::Move),
    Relation::one("new_duty_location", EntityType::DutyLocation),
    Relation::one("uploaded_orders", EntityType::Document),
];

const MOVE_RELATIONS: &[Relation] = &[Relation::many(
    "personally_procured_moves",
    EntityType::PersonallyProcuredMove,
)];

const DOCUMENT_RELATIONS: &[Relation] = &[Relation::many("uploads", EntityType::Upload)];

const MOVE_TASK_ORDER_RELATIONS: &[Relation] = &[
    Relation::many("mtoShipments", EntityType::MtoShipment),
    Relation::many("mtoServiceItems", EntityType::MtoServiceItem),
    Relation::many("paymentRequests", EntityType::PaymentRequest),
];

const PAYMENT_REQUEST_RELATIONS: &[Relation] =
    &[Relation::many("serviceItems", EntityType::PaymentServiceItem)];

const MOVE_TASK_ORDER_DETAILS: &[Relation] = &[
    Relation::one("moveTaskOrder", EntityType::MoveTaskOrder),
    Relation::many("mtoShipments", EntityType::MtoShipment),
];

impl EntityType {
    /// Every entity type.
    pub const ALL: [EntityType; 18] = [
        EntityType::User,
        EntityType::Role,
        EntityType::ServiceMember,
        EntityType::Order,
        EntityType::Move,
        EntityType::PersonallyProcuredMove,
        EntityType::BackupContact,
        EntityType::DutyLocation,
        EntityType::Document,
        EntityType::Upload,
        EntityType::Customer,
        EntityType::MoveTaskOrder,
        EntityType::MtoShipment,
        EntityType::MtoServiceItem,
        EntityType::MtoAgent,
        EntityType::PaymentRequest,
        EntityType::PaymentServiceItem,
        EntityType::Shipment,
    ];

    /// Name of the table the type is stored under.
    pub fn table(self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Role => "roles",
            EntityType::ServiceMember => "serviceMembers",
            EntityType::Order => "orders",
            EntityType::Move => "moves",
            EntityType::PersonallyProcuredMove => "personallyProcuredMoves",
            EntityType::BackupContact => "backupContacts",
            EntityType::DutyLocation => "dutyLocations",
            EntityType::Document => "documents",
            EntityType::Upload => "upload",
            EntityType::Customer => "customer",
            EntityType::MoveTaskOrder => "moveTaskOrder",
            EntityType::MtoShipment => "mtoShipments",
            EntityType::MtoServiceItem => "mtoServiceItems",
            EntityType::MtoAgent => "mtoAgents",
            EntityType::PaymentRequest => "paymentRequests",
            EntityType::PaymentServiceItem => "paymentServiceItems",
            EntityType::Shipment => "shipments",
        }
    }

    /// Field whose value identifies an entity of this type.
    pub fn id_attribute(self) -> &'static str {
        DEFAULT_ID_ATTRIBUTE
    }

    /// Fields that embed other entities.
    pub fn relations(self) -> &'static [Relation] {
        match self {
            EntityType::User => USER_RELATIONS,
            EntityType::ServiceMember => SERVICE_MEMBER_RELATIONS,
            EntityType::Order => ORDER_RELATIONS,
            EntityType::Move => MOVE_RELATIONS,
            EntityType::Document => DOCUMENT_RELATIONS,
            EntityType::MoveTaskOrder => MOVE_TASK_ORDER_RELATIONS,
            EntityType::PaymentRequest => PAYMENT_REQUEST_RELATIONS,
            EntityType::Role
            | EntityType::PersonallyProcuredMove
            | EntityType::BackupContact
            | EntityType::DutyLocation
            | EntityType::Upload
            | EntityType::Customer
            | EntityType::MtoShipment
            | EntityType::MtoServiceItem
            | EntityType::MtoAgent
            | EntityType::PaymentServiceItem
            | EntityType::Shipment => &[],
        }
    }

    /// Look a type up by its table name.
    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.table() == table)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Schema key → root shape. Keys are camel-cased definition names.
const ROOT_SCHEMAS: &[(&str, SchemaShape)] = &[
    // internal
    ("user", SchemaShape::Entity(EntityType::User)),
    ("loggedInUser", SchemaShape::Entity(EntityType::User)),
    ("serviceMember", SchemaShape::Entity(EntityType::ServiceMember)),
    ("orders", SchemaShape::Entity(EntityType::Order)),
    ("move", SchemaShape::Entity(EntityType::Move)),
    (
        "personallyProcuredMove",
        SchemaShape::Entity(EntityType::PersonallyProcuredMove),
    ),
    (
        "indexPersonallyProcuredMove",
        SchemaShape::List(EntityType::PersonallyProcuredMove),
    ),
    ("serviceMemberBackupContact", SchemaShape::Entity(EntityType::BackupContact)),
    (
        "indexServiceMemberBackupContacts",
        SchemaShape::List(EntityType::BackupContact),
    ),
    ("dutyLocation", SchemaShape::Entity(EntityType::DutyLocation)),
    ("dutyLocations", SchemaShape::List(EntityType::DutyLocation)),
    ("document", SchemaShape::Entity(EntityType::Document)),
    ("upload", SchemaShape::Entity(EntityType::Upload)),
    // ghc
    ("order", SchemaShape::Entity(EntityType::Order)),
    ("customer", SchemaShape::Entity(EntityType::Customer)),
    ("moveTaskOrder", SchemaShape::Entity(EntityType::MoveTaskOrder)),
    ("moveTaskOrders", SchemaShape::List(EntityType::MoveTaskOrder)),
    ("moveTaskOrderDetails", SchemaShape::Object(MOVE_TASK_ORDER_DETAILS)),
    ("mtoShipment", SchemaShape::Entity(EntityType::MtoShipment)),
    ("mTOShipment", SchemaShape::Entity(EntityType::MtoShipment)),
    ("mtoShipments", SchemaShape::List(EntityType::MtoShipment)),
    ("mTOShipments", SchemaShape::List(EntityType::MtoShipment)),
    ("mtoServiceItem", SchemaShape::Entity(EntityType::MtoServiceItem)),
    ("mTOServiceItem", SchemaShape::Entity(EntityType::MtoServiceItem)),
    ("mtoServiceItems", SchemaShape::List(EntityType::MtoServiceItem)),
    ("mTOServiceItems", SchemaShape::List(EntityType::MtoServiceItem)),
    ("mtoAgent", SchemaShape::Entity(EntityType::MtoAgent)),
    ("mTOAgents", SchemaShape::List(EntityType::MtoAgent)),
    ("paymentRequest", SchemaShape::Entity(EntityType::PaymentRequest)),
    ("paymentRequests", SchemaShape::List(EntityType::PaymentRequest)),
    ("paymentServiceItem", SchemaShape::Entity(EntityType::PaymentServiceItem)),
    ("paymentServiceItems", SchemaShape::List(EntityType::PaymentServiceItem)),
    ("shipment", SchemaShape::Entity(EntityType::Shipment)),
    ("shipments", SchemaShape::List(EntityType::Shipment)),
];

/// Root shape registered for a schema key.
pub fn root_schema(key: &str) -> Option<SchemaShape> {
    ROOT_SCHEMAS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, shape)| *shape)
}

/// Every registered schema key.
pub fn schema_keys() -> impl Iterator<Item = &'static str> {
    ROOT_SCHEMAS.iter().map(|(name, _)| *name)
}
