//! Permission flags for caller capabilities.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Permission flags that define what a caller can do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Permission: u32 {
        /// View records.
        const VIEW_RECORDS = 1 << 0;

        /// Create new records.
        const CREATE_RECORDS = 1 << 1;

        /// Edit existing records.
        const EDIT_RECORDS = 1 << 2;

        /// View transactions.
        const VIEW_TRANSACTIONS = 1 << 3;

        /// Create new transactions.
        const CREATE_TRANSACTIONS = 1 << 4;

        /// Edit existing transactions.
        const EDIT_TRANSACTIONS = 1 << 5;

        /// View agency-tier attribute values.
        const VIEW_AGENCY_DATA = 1 << 6;

        /// View admin-tier attribute values.
        const VIEW_ADMIN_DATA = 1 << 7;

        /// Update admin-tier attribute values.
        const EDIT_ADMIN_DATA = 1 << 8;

        /// Admin operations.
        const ADMIN = 1 << 9;

        /// No permissions.
        const NONE = 0;

        /// Public caller access: work with their own transactions and view
        /// the public projection of records.
        const PUBLIC_ACCESS = Self::VIEW_RECORDS.bits()
            | Self::VIEW_TRANSACTIONS.bits()
            | Self::CREATE_TRANSACTIONS.bits()
            | Self::EDIT_TRANSACTIONS.bits();

        /// Agency caller access: everything public callers have, plus record
        /// management and agency-tier data.
        const AGENCY_ACCESS = Self::PUBLIC_ACCESS.bits()
            | Self::CREATE_RECORDS.bits()
            | Self::EDIT_RECORDS.bits()
            | Self::VIEW_AGENCY_DATA.bits();

        /// All permissions.
        const ALL = Self::AGENCY_ACCESS.bits()
            | Self::VIEW_ADMIN_DATA.bits()
            | Self::EDIT_ADMIN_DATA.bits()
            | Self::ADMIN.bits();
    }
}

impl Default for Permission {
    fn default() -> Self {
        Permission::PUBLIC_ACCESS
    }
}

impl Permission {
    /// Check if this permission set allows viewing records.
    pub fn can_view_records(&self) -> bool {
        self.contains(Permission::VIEW_RECORDS)
    }

    /// Check if this permission set allows editing records.
    pub fn can_edit_records(&self) -> bool {
        self.contains(Permission::EDIT_RECORDS)
    }

    /// Check if this permission set allows viewing admin-tier data.
    pub fn can_view_admin_data(&self) -> bool {
        self.contains(Permission::VIEW_ADMIN_DATA)
    }

    /// Check if this permission set allows updating admin-tier data.
    pub fn can_edit_admin_data(&self) -> bool {
        self.contains(Permission::EDIT_ADMIN_DATA)
    }

    /// Check if this is an admin permission set.
    pub fn is_admin(&self) -> bool {
        self.contains(Permission::ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_defaults() {
        let p = Permission::default();
        assert!(p.can_view_records());
        assert!(!p.can_edit_records());
        assert!(!p.is_admin());
    }

    #[test]
    fn permission_presets_are_monotonic() {
        assert!(Permission::AGENCY_ACCESS.contains(Permission::PUBLIC_ACCESS));
        assert!(Permission::ALL.contains(Permission::AGENCY_ACCESS));

        assert!(Permission::AGENCY_ACCESS.can_edit_records());
        assert!(!Permission::AGENCY_ACCESS.can_view_admin_data());
        assert!(Permission::ALL.can_edit_admin_data());
        assert!(Permission::ALL.is_admin());
    }

    #[test]
    fn permission_combinations() {
        let p = Permission::VIEW_RECORDS | Permission::EDIT_ADMIN_DATA;
        assert!(p.can_view_records());
        assert!(p.can_edit_admin_data());
        assert!(!p.can_edit_records());
    }
}
