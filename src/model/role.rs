use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Principal = 2,
    Director = 3,
    Hod = 4,
    Staff = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Principal),
            3 => Some(Role::Director),
            4 => Some(Role::Hod),
            5 => Some(Role::Staff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Principal => "princi",
            Role::Director => "dir",
            Role::Hod => "hod",
            Role::Staff => "staff",
        }
    }

    pub fn from_role_str(role: &str) -> Option<Self> {
        match role {
            "admin" => Some(Role::Admin),
            "princi" => Some(Role::Principal),
            "dir" => Some(Role::Director),
            "hod" => Some(Role::Hod),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }

    /// The reviewing tier this role occupies in the escalation chain.
    /// Staff holds none; admin bypasses the chain entirely.
    pub fn tier(&self) -> Option<ReviewTier> {
        match self {
            Role::Hod => Some(ReviewTier::Hod),
            Role::Director => Some(ReviewTier::Director),
            Role::Principal => Some(ReviewTier::Principal),
            _ => None,
        }
    }
}

/// Ordered reviewing tiers. Variant order is the escalation order,
/// so `Hod < Director < Principal` holds via the derived `Ord`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Display, EnumString,
)]
pub enum ReviewTier {
    #[strum(serialize = "HOD")]
    #[serde(rename = "HOD")]
    Hod,
    Director,
    Principal,
}

impl ReviewTier {
    /// The tier whose recommendation must already be on a request before
    /// this tier may act on it in the strict escalation chain.
    pub fn predecessor(&self) -> Option<ReviewTier> {
        match self {
            ReviewTier::Hod => None,
            ReviewTier::Director => Some(ReviewTier::Hod),
            ReviewTier::Principal => Some(ReviewTier::Director),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering_follows_escalation_chain() {
        assert!(ReviewTier::Hod < ReviewTier::Director);
        assert!(ReviewTier::Director < ReviewTier::Principal);
    }

    #[test]
    fn role_round_trips_through_id_and_str() {
        for id in 1..=5u8 {
            let role = Role::from_id(id).unwrap();
            assert_eq!(Role::from_role_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_role_str("hr"), None);
    }

    #[test]
    fn only_reviewing_roles_have_tiers() {
        assert_eq!(Role::Staff.tier(), None);
        assert_eq!(Role::Admin.tier(), None);
        assert_eq!(Role::Hod.tier(), Some(ReviewTier::Hod));
        assert_eq!(Role::Principal.tier(), Some(ReviewTier::Principal));
    }

    #[test]
    fn tier_wire_format_matches_recommended_by_values() {
        assert_eq!(ReviewTier::Hod.to_string(), "HOD");
        assert_eq!("Director".parse::<ReviewTier>(), Ok(ReviewTier::Director));
        assert_eq!(
            ReviewTier::Principal.predecessor(),
            Some(ReviewTier::Director)
        );
    }
}
