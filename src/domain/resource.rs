//! Backend collections exposed by the dashboard.
//!
//! Each [`Resource`] is one table in the remote store. Resources are the unit of
//! cache invalidation: a successful mutation on a resource marks every cached list
//! result for that resource stale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::AdminError;

/// A backend collection with uniform CRUD operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Businesses,
    BusinessCategories,
    BusinessSubCategories,
    PostCategories,
    Posts,
    Services,
    Events,
    Opportunities,
    /// Customer accounts, stored in the `profiles` table.
    Customers,
    Feedbacks,
    Subscribers,
}

impl Resource {
    /// Every resource, in sidebar order.
    pub const ALL: [Self; 11] = [
        Self::Businesses,
        Self::BusinessCategories,
        Self::BusinessSubCategories,
        Self::PostCategories,
        Self::Posts,
        Self::Services,
        Self::Events,
        Self::Opportunities,
        Self::Customers,
        Self::Feedbacks,
        Self::Subscribers,
    ];

    /// Name of the backing table.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Businesses => "businesses",
            Self::BusinessCategories => "business_categories",
            Self::BusinessSubCategories => "business_sub_categories",
            Self::PostCategories => "post_categories",
            Self::Posts => "posts",
            Self::Services => "services",
            Self::Events => "events",
            Self::Opportunities => "opportunities",
            Self::Customers => "profiles",
            Self::Feedbacks => "feedbacks",
            Self::Subscribers => "subscribers",
        }
    }

    /// Collection whose list results embed this resource's rows.
    ///
    /// Subcategories are only ever displayed inside a category listing, so a
    /// write to them must also invalidate the category family.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::BusinessSubCategories => Some(Self::BusinessCategories),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for Resource {
    type Err = AdminError;

    /// Parses a table name or one of the short aliases used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let resource = match normalized.as_str() {
            "businesses" | "business" => Self::Businesses,
            "business_categories" | "categories" => Self::BusinessCategories,
            "business_sub_categories" | "subcategories" | "sub_categories" => {
                Self::BusinessSubCategories
            }
            "post_categories" => Self::PostCategories,
            "posts" => Self::Posts,
            "services" => Self::Services,
            "events" => Self::Events,
            "opportunities" => Self::Opportunities,
            "profiles" | "customers" => Self::Customers,
            "feedbacks" | "feedback" => Self::Feedbacks,
            "subscribers" => Self::Subscribers,
            _ => return Err(AdminError::Config(format!("unknown resource: {s}"))),
        };
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customers_live_in_profiles() {
        assert_eq!(Resource::Customers.table(), "profiles");
        assert_eq!("customers".parse::<Resource>().unwrap(), Resource::Customers);
        assert_eq!("profiles".parse::<Resource>().unwrap(), Resource::Customers);
    }

    #[test]
    fn table_names_round_trip_through_from_str() {
        for resource in Resource::ALL {
            assert_eq!(resource.table().parse::<Resource>().unwrap(), resource);
        }
    }

    #[test]
    fn unknown_resource_is_config_error() {
        assert!(matches!("widgets".parse::<Resource>(), Err(AdminError::Config(_))));
    }

    #[test]
    fn only_subcategories_have_a_parent() {
        assert_eq!(
            Resource::BusinessSubCategories.parent(),
            Some(Resource::BusinessCategories)
        );
        assert_eq!(Resource::Posts.parent(), None);
    }
}
