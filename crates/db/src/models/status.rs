//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Emergency request lifecycle status.
    ///
    /// `live → accepted → in_progress → completed`; any non-terminal
    /// status may move to `cancelled`. Terminal: completed, cancelled.
    RequestStatus {
        Live = 1,
        Accepted = 2,
        InProgress = 3,
        Completed = 4,
        Cancelled = 5,
    }
}

define_status_enum! {
    /// Nurse offer status. Offers are never deleted; a withdrawn offer
    /// becomes `Rejected`.
    OfferStatus {
        Pending = 1,
        Accepted = 2,
        Rejected = 3,
    }
}

define_status_enum! {
    /// Forward-only tracking progress of the accepted nurse.
    TrackingStatus {
        EnRoute = 1,
        Arrived = 2,
        InService = 3,
    }
}

impl RequestStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl TrackingStatus {
    /// Map a raw status ID back to the enum. `None` for unknown ids.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(TrackingStatus::EnRoute),
            2 => Some(TrackingStatus::Arrived),
            3 => Some(TrackingStatus::InService),
            _ => None,
        }
    }

    /// The immediate successor in the fixed order, or `None` at the end.
    ///
    /// `advance` accepts exactly this successor; everything else (other
    /// than an idempotent repeat) is a state conflict.
    pub fn successor(self) -> Option<Self> {
        match self {
            TrackingStatus::EnRoute => Some(TrackingStatus::Arrived),
            TrackingStatus::Arrived => Some(TrackingStatus::InService),
            TrackingStatus::InService => None,
        }
    }
}
