//! Default allowances by role.

use crate::models::{Allowances, FinanceSettings};

/// Builds the transport, housing and position allowances an employee is
/// entitled to by default.  Managers receive each category's
/// `manager_bonus` on top of its default amount.
///
/// Configured values are not validated here; negative settings pass
/// through unchanged.
pub fn calculate_default_allowances(is_manager: bool, settings: &FinanceSettings) -> Allowances {
    let config = &settings.allowances;
    Allowances {
        transport: config.transport.amount_for(is_manager),
        housing: config.housing.amount_for(is_manager),
        position: config.position.amount_for(is_manager),
    }
}
