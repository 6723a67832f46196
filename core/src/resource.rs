//! Resource catalog: where each entity lives and which key wraps it.

use serde::de::DeserializeOwned;

use crate::types::{Customer, Project, Service, TimeEntry, User};

/// An entity type exposed as a REST collection.
pub trait Resource: DeserializeOwned {
    /// Collection path without the `.json` suffix, e.g. `"projects"`.
    const PATH: &'static str;
    /// Key mite nests each record under, e.g. `"project"`.
    const ENVELOPE: &'static str;
}

/// Resources with an `/<path>/archived.json` listing.
pub trait Archivable: Resource {}

/// Resources that accept create, update and delete.
pub trait Writable: Resource {}

macro_rules! resource {
    ($ty:ty, $path:literal, $envelope:literal $(, $marker:ident)*) => {
        impl Resource for $ty {
            const PATH: &'static str = $path;
            const ENVELOPE: &'static str = $envelope;
        }
        $(impl $marker for $ty {})*
    };
}

resource!(Customer, "customers", "customer", Archivable, Writable);
resource!(Project, "projects", "project", Archivable, Writable);
resource!(Service, "services", "service", Archivable, Writable);
resource!(User, "users", "user", Archivable);
resource!(TimeEntry, "time_entries", "time_entry", Writable);

/// Envelope of `GET /account.json`.
pub const ACCOUNT_ENVELOPE: &str = "account";
/// Envelope of `GET /myself.json`.
pub const MYSELF_ENVELOPE: &str = User::ENVELOPE;
/// Envelope of every `/tracker` response.
pub const TRACKER_ENVELOPE: &str = "tracker";
