use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};
use crate::user::UserId;

pub mod db;

pub type PartnerId = TypedId<Partner>;

/// An organization account that owns campaigns. Belongs to exactly one user identity.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Partner {
    #[serde(rename = "_id")]
    pub id: PartnerId,
    pub user_id: UserId,
    pub organization: String,
    pub contact_email: String,
}

impl TypedIdMarker for Partner {
    fn tag() -> &'static str {
        "PTR"
    }
}
